use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicI64, AtomicU64, Ordering},
    },
};

use chrono::{DateTime, Utc};

/// Shared reference to a registered instance.
///
/// Handed out by the registry and by the authorization gate; cheap to clone.
pub type InstanceHandle = Arc<Instance>;

// No ping recorded yet.
const NEVER: i64 = i64::MIN;

/// A supervised server instance as seen by the control plane.
pub struct Instance {
    key: String,
    secret: Option<String>,
    last_ping_millis: AtomicI64,
    ping_count: AtomicU64,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the configured secret
        f.debug_struct("Instance")
            .field("key", &self.key)
            .field("has_secret", &self.has_secret())
            .field("last_ping", &self.last_ping())
            .field("ping_count", &self.ping_count())
            .finish()
    }
}

impl Instance {
    pub fn new(key: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            key: key.into(),
            secret,
            last_ping_millis: AtomicI64::new(NEVER),
            ping_count: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Configured secret. `None` and `Some("")` both mean "not provisioned yet".
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    /// Secret usable for authorization: set and non-empty.
    pub fn configured_secret(&self) -> Option<&str> {
        self.secret().filter(|s| !s.is_empty())
    }

    pub fn has_secret(&self) -> bool {
        self.configured_secret().is_some()
    }

    /// Record a liveness signal from the instance.
    pub fn ping_received(&self) {
        let now = Utc::now();
        self.last_ping_millis
            .store(now.timestamp_millis(), Ordering::Relaxed);
        let count = self.ping_count.fetch_add(1, Ordering::Relaxed) + 1;

        tracing::debug!(key = %self.key, count, "ping received");
    }

    pub fn last_ping(&self) -> Option<DateTime<Utc>> {
        match self.last_ping_millis.load(Ordering::Relaxed) {
            NEVER => None,
            millis => DateTime::from_timestamp_millis(millis),
        }
    }

    pub fn ping_count(&self) -> u64 {
        self.ping_count.load(Ordering::Relaxed)
    }
}
