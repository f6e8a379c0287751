//! Property tests for store-assigned identities.

use platelog::{ImportRecord, LocalConfig, LocalStore, RecordDraft, RecordStore, Timestamp};
use proptest::prelude::*;
use std::collections::HashSet;
use tempfile::TempDir;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// No sequence of creates and imports ever produces two records with
    /// the same identity, even when rows share a creation timestamp.
    #[test]
    fn identities_stay_unique_across_mixed_writes(batches in prop::collection::vec(0usize..4, 1..6)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let expected: usize = batches.iter().map(|&rows| rows.max(1)).sum();
        let (total, unique) = runtime.block_on(async {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("records.json");
            std::fs::write(&path, b"[]").unwrap();
            let store = LocalStore::open(LocalConfig::immediate(path)).await.unwrap();

            for (round, &rows) in batches.iter().enumerate() {
                if rows == 0 {
                    store
                        .create(RecordDraft {
                            description: format!("round {round}"),
                            ..Default::default()
                        })
                        .await
                        .unwrap();
                } else {
                    // Deliberately collide timestamps across rows.
                    let batch = (0..rows)
                        .map(|_| ImportRecord {
                            created_at_millis: Some(Timestamp(round as i64)),
                            ..Default::default()
                        })
                        .collect();
                    store.import_many(batch).await.unwrap();
                }
            }

            let mut handle = store.subscribe().await.unwrap();
            let snapshot = handle.next().await.unwrap();
            let ids: HashSet<_> = snapshot
                .iter()
                .map(|entry| entry.record.identity.clone())
                .collect();
            (snapshot.len(), ids.len())
        });

        prop_assert_eq!(total, expected);
        prop_assert_eq!(unique, expected);
    }
}
