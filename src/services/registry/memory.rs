use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::services::registry::{Instance, InstanceHandle, InstanceRegistry};

/// In-process registry, built once at start-up from configuration.
///
/// The key set is fixed after construction, so lookups need no locking;
/// per-instance liveness state lives behind each `InstanceHandle`.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    instances: HashMap<String, InstanceHandle>,
}

impl InMemoryRegistry {
    /// Build a registry from `(key, secret)` pairs. Later duplicates win.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        let instances = entries
            .into_iter()
            .map(|(key, secret)| {
                let key = key.into();
                let handle = Arc::new(Instance::new(key.clone(), secret));
                (key, handle)
            })
            .collect();

        Self { instances }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl InstanceRegistry for InMemoryRegistry {
    async fn lookup(&self, key: &str) -> Option<InstanceHandle> {
        self.instances.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_finds_registered_instances() {
        let registry = InMemoryRegistry::from_entries([
            ("alpha", Some("s3cr3t".to_string())),
            ("beta", None),
        ]);

        let alpha = registry.lookup("alpha").await.unwrap();
        assert_eq!(alpha.key(), "alpha");
        assert_eq!(alpha.secret(), Some("s3cr3t"));

        let beta = registry.lookup("beta").await.unwrap();
        assert_eq!(beta.secret(), None);

        assert!(registry.lookup("gamma").await.is_none());
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let registry = InMemoryRegistry::from_entries([("alpha", Some("x".to_string()))]);
        assert!(registry.lookup("Alpha").await.is_none());
    }

    #[tokio::test]
    async fn later_duplicate_wins() {
        let registry = InMemoryRegistry::from_entries([
            ("alpha", Some("one".to_string())),
            ("alpha", Some("two".to_string())),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.lookup("alpha").await.unwrap().secret(),
            Some("two")
        );
    }

    #[tokio::test]
    async fn lookups_share_liveness_state() {
        let registry = InMemoryRegistry::from_entries([("alpha", Some("x".to_string()))]);
        let first = registry.lookup("alpha").await.unwrap();
        let second = registry.lookup("alpha").await.unwrap();

        first.ping_received();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.ping_count(), 1);
    }

    #[test]
    fn default_registry_is_empty() {
        assert!(InMemoryRegistry::default().is_empty());
    }
}
