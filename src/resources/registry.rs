use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};

use crate::resources::{ResourceKey, TextureResource};

/// Thread-safe, non-owning index of live resources by name.
///
/// Resources are registered when they are created and looked up by name when
/// a cache needs to locate one it does not hold. The registry never keeps a
/// resource alive: records whose resource has been dropped or disposed are
/// skipped on lookup and pruned lazily.
pub struct ResourceRegistry<T> {
    resources: RwLock<FxHashMap<ResourceKey, Vec<Weak<T>>>>,
}

impl<T: TextureResource> Default for ResourceRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn is_live<T: TextureResource>(resource: &Weak<T>) -> Option<Arc<T>> {
    resource.upgrade().filter(|r| !r.is_disposed())
}

impl<T: TextureResource> ResourceRegistry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: RwLock::default(),
        }
    }

    /// [Write] Tracks a resource under its own name.
    ///
    /// Resources with an invalid (empty) name cannot be located and are ignored.
    pub fn register(&self, resource: &Arc<T>) {
        let Ok(key) = ResourceKey::new(resource.name()) else {
            log::warn!("Resource with an empty name was not registered.");
            return;
        };

        let mut guard = self.resources.write();
        let records = guard.entry(key).or_default();
        records.retain(|r| r.strong_count() > 0);
        records.push(Arc::downgrade(resource));
    }

    /// [Read] Returns the first live resource registered under `name`.
    pub fn locate(&self, name: &str) -> Option<Arc<T>> {
        let key = ResourceKey::new(name).ok()?;

        let (found, has_stale) = {
            let guard = self.resources.read();
            let records = guard.get(&key)?;
            (
                records.iter().find_map(is_live),
                records.iter().any(|r| is_live(r).is_none()),
            )
        };

        if !has_stale {
            return found;
        }

        // Some records for this name are dead, drop them while we're here.
        let mut guard = self.resources.write();
        if let Some(records) = guard.get_mut(&key) {
            records.retain(|r| is_live(r).is_some());
            if records.is_empty() {
                guard.remove(&key);
            }
        }

        found
    }

    /// [Read] Returns every live resource registered under `name`.
    pub fn locate_all(&self, name: &str) -> Vec<Arc<T>> {
        let Ok(key) = ResourceKey::new(name) else {
            return Vec::new();
        };

        let guard = self.resources.read();
        guard
            .get(&key)
            .map(|records| records.iter().filter_map(is_live).collect())
            .unwrap_or_default()
    }

    /// [Write] Removes records of dropped or disposed resources.
    /// Returns the number of records removed.
    pub fn prune(&self) -> usize {
        let mut guard = self.resources.write();
        let mut removed = 0;

        guard.retain(|_, records| {
            let before = records.len();
            records.retain(|r| is_live(r).is_some());
            removed += before - records.len();
            !records.is_empty()
        });

        removed
    }

    /// Number of names with at least one record (live or not yet pruned).
    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }
}
