use pkg_types::status::{NamespaceGroup, ServiceKey, ServiceStatus};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Identifies the watch loop instance allowed to write into the store.
pub type Generation = u64;

/// In-memory, last-write-wins store of service status records.
///
/// Records are keyed by `(namespace, name)`. Every write carries the generation of
/// the watch loop that produced it; writes from a superseded generation are dropped,
/// so a loop that outlives a connection switch cannot overwrite fresh records.
#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    generation: Generation,
    services: BTreeMap<ServiceKey, ServiceStatus>,
}

impl StoreInner {
    fn accepts(&self, generation: Generation) -> bool {
        generation == self.generation
    }
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The generation currently allowed to write.
    pub async fn generation(&self) -> Generation {
        self.inner.read().await.generation
    }

    /// Hand ownership to a new watch loop instance. Clears all records so the new
    /// instance repopulates from scratch.
    pub async fn advance_generation(&self) -> Generation {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.services.clear();
        inner.generation
    }

    /// Insert or fully replace the record for `status`'s key.
    /// Returns `false` if the write came from a superseded generation.
    pub async fn upsert(&self, generation: Generation, status: ServiceStatus) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.accepts(generation) {
            debug!(
                "Dropping stale upsert for {} (generation {} < {})",
                status.key(),
                generation,
                inner.generation
            );
            return false;
        }
        inner.services.insert(status.key(), status);
        true
    }

    /// Delete the record for `key`. Returns `true` if a record was removed.
    pub async fn remove(&self, generation: Generation, key: &ServiceKey) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.accepts(generation) {
            debug!(
                "Dropping stale delete for {} (generation {} < {})",
                key, generation, inner.generation
            );
            return false;
        }
        inner.services.remove(key).is_some()
    }

    /// Drop every record whose key is not in `keep`. Returns how many were removed.
    pub async fn retain(&self, generation: Generation, keep: &HashSet<ServiceKey>) -> usize {
        let mut inner = self.inner.write().await;
        if !inner.accepts(generation) {
            return 0;
        }
        let before = inner.services.len();
        inner.services.retain(|key, _| keep.contains(key));
        before - inner.services.len()
    }

    /// Consistent copy of all records grouped by namespace. Groups are ordered by
    /// namespace and services within a group by name.
    pub async fn snapshot(&self) -> Vec<NamespaceGroup> {
        let inner = self.inner.read().await;
        let mut groups: Vec<NamespaceGroup> = Vec::new();
        // BTreeMap order is (namespace, name), so each namespace is one contiguous run.
        for (key, status) in inner.services.iter() {
            match groups.last_mut() {
                Some(group) if group.namespace == key.namespace => {
                    group.services.push(status.clone());
                }
                _ => groups.push(NamespaceGroup {
                    namespace: key.namespace.clone(),
                    services: vec![status.clone()],
                }),
            }
        }
        groups
    }

    pub async fn get(&self, key: &ServiceKey) -> Option<ServiceStatus> {
        self.inner.read().await.services.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.services.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
