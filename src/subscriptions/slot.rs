//! Single-slot subscriber registration.

use super::snapshot::Snapshot;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

struct ActiveSubscriber {
    token: u64,
    sender: UnboundedSender<Snapshot>,
}

struct SlotInner {
    active: Mutex<Option<ActiveSubscriber>>,
    next_token: AtomicU64,
}

/// Holds at most one subscriber per store instance.
///
/// Registering a new subscriber replaces the previous one; the replaced
/// handle's channel closes, so a stale consumer observes end-of-stream
/// rather than silently missing deliveries.
#[derive(Clone)]
pub(crate) struct SubscriberSlot {
    inner: Arc<SlotInner>,
}

impl SubscriberSlot {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SlotInner {
                active: Mutex::new(None),
                next_token: AtomicU64::new(1),
            }),
        }
    }

    /// Register a subscriber, displacing any previous one.
    pub fn register(&self) -> SnapshotHandle {
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.inner.active.lock() = Some(ActiveSubscriber { token, sender });
        SnapshotHandle {
            token,
            receiver,
            slot: self.clone(),
        }
    }

    /// Deliver a snapshot to the active subscriber, if any. A subscriber
    /// whose receiving end is gone is dropped from the slot.
    pub fn publish(&self, snapshot: Snapshot) {
        let mut active = self.inner.active.lock();
        if let Some(subscriber) = active.as_ref() {
            if subscriber.sender.send(snapshot).is_err() {
                *active = None;
            }
        }
    }

    /// Detach the subscriber holding `token`. Idempotent; a handle that
    /// was already replaced detaches nothing.
    fn clear(&self, token: u64) {
        let mut active = self.inner.active.lock();
        if matches!(active.as_ref(), Some(subscriber) if subscriber.token == token) {
            *active = None;
        }
    }

    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.inner.active.lock().is_some()
    }
}

/// Receiving end of a subscription.
///
/// Snapshots queue unboundedly; [`next`](Self::next) yields them in
/// delivery order and returns `None` once the subscription ended (the
/// handle unsubscribed, or a newer subscriber took the slot). Dropping
/// the handle unsubscribes it.
pub struct SnapshotHandle {
    token: u64,
    receiver: UnboundedReceiver<Snapshot>,
    slot: SubscriberSlot,
}

impl SnapshotHandle {
    /// Wait for the next snapshot.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Take an already-delivered snapshot without waiting.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.receiver.try_recv().ok()
    }

    /// Stop further deliveries. Safe to call more than once.
    pub fn unsubscribe(&self) {
        self.slot.clear(self.token);
    }
}

impl Drop for SnapshotHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordDraft, RecordId, Timestamp};

    fn snapshot_of(n: usize) -> Snapshot {
        let records = (0..n)
            .map(|i| {
                RecordDraft::default()
                    .into_record(RecordId(format!("r{i}")), Timestamp(i as i64))
            })
            .collect();
        Snapshot::number(records)
    }

    #[test]
    fn test_publish_reaches_subscriber() {
        let slot = SubscriberSlot::new();
        let mut handle = slot.register();

        slot.publish(snapshot_of(2));
        assert_eq!(handle.try_next().unwrap().len(), 2);
        assert!(handle.try_next().is_none());
    }

    #[test]
    fn test_publish_without_subscriber_is_noop() {
        let slot = SubscriberSlot::new();
        slot.publish(snapshot_of(1));
        assert!(!slot.is_active());
    }

    #[test]
    fn test_new_subscriber_replaces_previous() {
        let slot = SubscriberSlot::new();
        let mut first = slot.register();
        let mut second = slot.register();

        slot.publish(snapshot_of(1));
        assert!(second.try_next().is_some());
        // Replaced handle sees end-of-stream, not a delivery.
        assert!(first.try_next().is_none());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let slot = SubscriberSlot::new();
        let handle = slot.register();

        handle.unsubscribe();
        handle.unsubscribe();
        assert!(!slot.is_active());
    }

    #[test]
    fn test_stale_unsubscribe_leaves_new_subscriber_attached() {
        let slot = SubscriberSlot::new();
        let old = slot.register();
        let mut new = slot.register();

        // The displaced handle must not tear down the new registration.
        old.unsubscribe();
        slot.publish(snapshot_of(1));
        assert!(new.try_next().is_some());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let slot = SubscriberSlot::new();
        {
            let _handle = slot.register();
            assert!(slot.is_active());
        }
        assert!(!slot.is_active());
    }

    #[test]
    fn test_dead_receiver_cleared_on_publish() {
        let slot = SubscriberSlot::new();
        let mut handle = slot.register();
        handle.receiver.close();

        slot.publish(snapshot_of(1));
        assert!(!slot.is_active());
    }
}
