//! Static configuration and backend selection.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the local variant's slot file.
#[derive(Clone, Debug)]
pub struct LocalConfig {
    /// Path of the slot file holding the serialized record set.
    pub path: PathBuf,

    /// Artificial latency for single-record mutations. The dashboard's
    /// loading states depend on writes not completing instantly.
    pub write_delay: Duration,

    /// Artificial latency for bulk import.
    pub import_delay: Duration,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./platelog.json"),
            write_delay: Duration::from_millis(200),
            import_delay: Duration::from_millis(500),
        }
    }
}

impl LocalConfig {
    /// Config for `path` with latency simulation turned off.
    pub fn immediate(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_delay: Duration::ZERO,
            import_delay: Duration::ZERO,
        }
    }
}

/// Connection parameters for the cloud-synced variant.
///
/// A non-empty API key is the whole selection signal: present means the
/// process runs against the hosted collection, absent means local slot
/// storage.
#[derive(Clone, Debug, Default)]
pub struct RemoteConfig {
    pub api_key: String,
    pub project_id: String,
}

impl RemoteConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// The static configuration block evaluated once at startup.
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    pub local: LocalConfig,
    pub remote: RemoteConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_requires_nonempty_api_key() {
        assert!(!RemoteConfig::default().is_configured());
        assert!(!RemoteConfig {
            api_key: "   ".into(),
            project_id: "demo".into(),
        }
        .is_configured());
        assert!(RemoteConfig {
            api_key: "AIza-demo".into(),
            project_id: "demo".into(),
        }
        .is_configured());
    }
}
