//! Texture Residency Cache
//!
//! Keeps textures resident for as long as something is using them.
//!
//! Textures are shared between many consumers because loading the same image
//! twice is wasteful, which raises the question of who disposes a shared
//! texture. The cache answers it with reference counting: every
//! [`acquire`](TextureCache::acquire_with) or [`find`](TextureCache::find)
//! that returns a texture counts one user, and every
//! [`release`](TextureCache::release) gives one back. The release that takes
//! the count to zero disposes the texture.
//!
//! # Ownership
//!
//! The cache never owns a texture. Callers hold `Arc<T>`; the cache keeps a
//! `Weak<T>` per name. If every caller drops its `Arc` (or something disposes
//! the texture directly), the entry goes stale and the next lookup resets it
//! and, for acquisitions, loads a fresh copy.
//!
//! # Load coalescing
//!
//! At most one load runs per name. A caller that asks for a name while another
//! caller is loading it waits (without spinning) until that load settles, then
//! looks again: it either finds the freshly loaded texture or, if the load
//! failed, starts its own.
//!
//! ```rust,ignore
//! let cache = TextureCache::new(registry);
//! let brick = cache
//!     .acquire_with("brick.png", |name| async move { loader.locate(name).await })
//!     .await?;
//!
//! // ... later, instead of disposing it:
//! if let Some(brick) = brick {
//!     cache.release(&brick)?;
//! }
//! ```

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

use crate::assets::entry::{CacheEntry, ReleaseOutcome};
use crate::errors::{CacheError, Result};
use crate::resources::{ResourceKey, ResourceRegistry, TextureResource};
use crate::settings::CacheSettings;

fn get_loader_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create texture loader runtime"))
}

// Names being loaded. Waiters hold a clone of the receiver; it disconnects
// when the loading caller's guard drops the matching sender.
type InFlightMap = FxHashMap<ResourceKey, flume::Receiver<()>>;

/// Marks a name as in flight for as long as it lives.
///
/// Dropping it (on success, failure, panic or cancellation) first removes the
/// name from the map and then drops the sender, which wakes every waiter.
struct LoadGuard<'a> {
    in_flight: &'a Mutex<InFlightMap>,
    key: ResourceKey,
    _done: flume::Sender<()>,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}

/// A concurrent, reference-counted, weakly-held texture cache.
///
/// All operations take `&self`; share the cache between threads with an `Arc`.
pub struct TextureCache<T: TextureResource> {
    entries: RwLock<FxHashMap<ResourceKey, Arc<CacheEntry<T>>>>,
    // `clear` holds this so no new load can register while the entries are
    // taken; no other operation takes it outside acquisition.
    in_flight: Mutex<InFlightMap>,
    registry: Arc<ResourceRegistry<T>>,
    settings: CacheSettings,
}

impl<T: TextureResource> TextureCache<T> {
    /// Creates a cache that falls back to `registry` when no loader is given.
    #[must_use]
    pub fn new(registry: Arc<ResourceRegistry<T>>) -> Self {
        Self::with_settings(registry, CacheSettings::default())
    }

    #[must_use]
    pub fn with_settings(registry: Arc<ResourceRegistry<T>>, settings: CacheSettings) -> Self {
        Self {
            entries: RwLock::default(),
            in_flight: Mutex::default(),
            registry,
            settings,
        }
    }

    #[inline]
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Number of tracked names, including entries whose texture is gone.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    // ========================================================================
    // Acquisition
    // ========================================================================

    /// Retrieves a cached texture, locating it in the resource registry when it
    /// is not cached.
    pub async fn acquire(&self, name: &str) -> Result<Option<Arc<T>>> {
        log::trace!("Defaulting to registry search for '{name}'.");
        let registry = Arc::clone(&self.registry);
        self.acquire_with(name, move |name| async move { registry.locate(&name) })
            .await
    }

    /// Retrieves a cached texture, calling `loader` when it is not cached or the
    /// cached copy was collected.
    ///
    /// Every texture returned counts as one user until it is handed back with
    /// [`release`](Self::release). `Ok(None)` means the loader produced nothing;
    /// the cache is left untouched in that case.
    ///
    /// Dropping the returned future cancels the acquisition; a load it started
    /// is abandoned and other waiters are free to retry.
    pub async fn acquire_with<F, Fut>(&self, name: &str, loader: F) -> Result<Option<Arc<T>>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Option<Arc<T>>>,
    {
        let key = ResourceKey::new(name)?;
        log::trace!("Retrieving texture '{key}'.");

        match self.settings.load_timeout {
            None => Ok(self.acquire_inner(key, loader).await),
            Some(timeout) => {
                let name = key.as_str().to_string();
                tokio::time::timeout(timeout, self.acquire_inner(key, loader))
                    .await
                    .map_err(|_| CacheError::Timeout { name, timeout })
            }
        }
    }

    /// Blocking variant of [`acquire_with`](Self::acquire_with), driven on a
    /// shared background runtime.
    ///
    /// Must not be called from within an async runtime.
    pub fn acquire_blocking<F, Fut>(&self, name: &str, loader: F) -> Result<Option<Arc<T>>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Option<Arc<T>>>,
    {
        get_loader_runtime().block_on(self.acquire_with(name, loader))
    }

    async fn acquire_inner<F, Fut>(&self, key: ResourceKey, loader: F) -> Option<Arc<T>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Option<Arc<T>>>,
    {
        let guard = loop {
            let pending = {
                let mut in_flight = self.in_flight.lock();

                if let Some(pending) = in_flight.get(&key) {
                    pending.clone()
                } else {
                    // Checked under the in-flight lock so no other caller can
                    // start a load for this name in between.
                    if let Some(texture) = self.retain_cached(&key) {
                        return Some(texture);
                    }

                    let (done, pending) = flume::bounded::<()>(1);
                    in_flight.insert(key.clone(), pending);
                    break LoadGuard {
                        in_flight: &self.in_flight,
                        key: key.clone(),
                        _done: done,
                    };
                }
            };

            log::trace!(
                "Requested texture '{key}' is currently being loaded, waiting for it to become available."
            );
            // Never sent on; resolves with a disconnect once the load settles.
            let _ = pending.recv_async().await;
        };

        log::debug!("Texture '{key}' not available, loading...");
        let Some(texture) = loader(key.as_str().to_string()).await else {
            log::warn!("The texture '{key}' was not loaded and not added to cache.");
            return None;
        };

        let texture = self.store_loaded(&key, texture);
        drop(guard);
        texture
    }

    fn retain_cached(&self, key: &ResourceKey) -> Option<Arc<T>> {
        let entry = self.entries.read().get(key).cloned()?;
        entry.retain()
    }

    fn entry_or_insert(&self, key: &ResourceKey) -> Arc<CacheEntry<T>> {
        if let Some(entry) = self.entries.read().get(key) {
            return Arc::clone(entry);
        }

        let mut entries = self.entries.write();
        Arc::clone(
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(CacheEntry::empty(key.clone()))),
        )
    }

    fn store_loaded(&self, key: &ResourceKey, texture: Arc<T>) -> Option<Arc<T>> {
        let entry = self.entry_or_insert(key);
        let mut state = entry.lock();

        if texture.is_disposed() {
            log::warn!("The loader returned a disposed texture for '{key}', not added to cache.");
            return None;
        }

        // An `add` may have installed a live copy while we were loading.
        if let Some(existing) = state.resolve(key) {
            let users = state.add_user();
            log::debug!(
                "Texture '{key}' was added while loading, keeping the cached copy with {users} users."
            );
            return Some(existing);
        }

        state.install(&texture, 1);
        log::debug!("Texture '{key}' loaded into cache with 1 user.");
        Some(texture)
    }

    // ========================================================================
    // Lookup & Registration
    // ========================================================================

    /// Retrieves a texture only if it is already cached and live. Never loads.
    ///
    /// A returned texture counts as one user, like an acquisition.
    pub fn find(&self, name: &str) -> Result<Option<Arc<T>>> {
        let key = ResourceKey::new(name)?;
        log::trace!("Locating texture '{key}'.");
        Ok(self.retain_cached(&key))
    }

    /// Adds an already loaded texture to the cache under its own name.
    ///
    /// If a live texture is already cached under that name, its user count is
    /// incremented and the cached texture is kept. Otherwise the entry is
    /// (re)pointed at `texture` with one user. Returns the resulting user count,
    /// or 0 if `texture` has been disposed and was not added.
    ///
    /// Once added, the texture must be returned with [`release`](Self::release)
    /// rather than disposed directly.
    pub fn add(&self, texture: &Arc<T>) -> Result<usize> {
        let key = ResourceKey::new(texture.name())?;
        let entry = self.entry_or_insert(&key);
        let mut state = entry.lock();

        if texture.is_disposed() {
            log::warn!("Texture '{key}' is disposed and was not added to cache.");
            return Ok(0);
        }

        if state.resolve(&key).is_some() {
            let users = state.add_user();
            log::debug!("Texture '{key}' exists in cache with {users} users.");
            return Ok(users);
        }

        state.install(texture, 1);
        log::debug!("Texture '{key}' added to cache with 1 user.");
        Ok(1)
    }

    /// Returns how many users the cache has recorded for this exact texture.
    ///
    /// Returns 0 when the texture is not cached. A stale entry that points at
    /// it (the texture was disposed elsewhere) is reset along the way.
    pub fn user_count(&self, texture: &Arc<T>) -> usize {
        let entries = self.entries.read();

        for entry in entries.values() {
            let mut state = entry.lock();
            if !state.holds(texture) {
                continue;
            }

            let live = state.resolve(entry.key()).is_some();
            return if live { state.users() } else { 0 };
        }

        0
    }

    // ========================================================================
    // Release
    // ========================================================================

    /// Hands a texture back to the cache.
    ///
    /// Returns `true` if the texture is no longer resident: either this was
    /// its last user and it has been disposed, or it had already been
    /// collected. Returns `false` when other users remain, or when the cache
    /// holds nothing for this name (an unknown texture, or more releases than
    /// acquisitions).
    ///
    /// The texture is disposed before any other call can look up its name
    /// again. Errors from disposing it are propagated.
    pub fn release(&self, texture: &Arc<T>) -> Result<bool> {
        let entry = ResourceKey::new(texture.name())
            .ok()
            .and_then(|key| self.entries.read().get(&key).cloned());

        let Some(entry) = entry else {
            log::warn!("Texture '{}' not found in cache.", texture.name());
            return Ok(false);
        };

        match entry.release()? {
            ReleaseOutcome::Unloaded => {
                log::warn!(
                    "Texture '{}' is not resident in the cache, nothing to release.",
                    entry.key()
                );
                Ok(false)
            }
            ReleaseOutcome::Collected => Ok(true),
            ReleaseOutcome::Retained(users) => {
                log::debug!(
                    "Texture '{}' still has {users} user(s), texture will stay resident.",
                    entry.key()
                );
                Ok(false)
            }
            ReleaseOutcome::Evicted => {
                log::debug!("Texture '{}' has been unloaded from the cache.", entry.key());
                Ok(true)
            }
        }
    }

    /// Disposes every live cached texture and forgets every entry.
    ///
    /// Not meant to run concurrently with other cache operations. Every live
    /// texture gets its dispose call even if an earlier one fails; the first
    /// failure is returned.
    pub fn clear(&self) -> Result<()> {
        let _cache_lock = self.in_flight.lock();
        let entries = std::mem::take(&mut *self.entries.write());

        if entries.is_empty() {
            return Ok(());
        }

        log::debug!("Clearing texture cache ({} entries).", entries.len());

        let mut first_error = None;
        for entry in entries.into_values() {
            let Some(result) = entry.evict() else {
                continue;
            };

            if let Err(err) = result {
                log::warn!("Texture '{}' failed to dispose: {err}", entry.key());
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Iterates the textures that are live at the time of the call.
    ///
    /// The set of entries is snapshotted up front; each entry is resolved as
    /// the iterator reaches it, and stale ones are skipped.
    pub fn iter(&self) -> Iter<T> {
        let snapshot: Vec<_> = self.entries.read().values().cloned().collect();
        Iter {
            entries: snapshot.into_iter(),
        }
    }
}

impl<T: TextureResource> Drop for TextureCache<T> {
    fn drop(&mut self) {
        if !self.settings.clear_on_drop {
            return;
        }

        if let Err(err) = self.clear() {
            log::error!("Failed to clear texture cache on drop: {err}");
        }
    }
}

/// Iterator over the live textures of a [`TextureCache`].
pub struct Iter<T: TextureResource> {
    entries: std::vec::IntoIter<Arc<CacheEntry<T>>>,
}

impl<T: TextureResource> Iterator for Iter<T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.by_ref().find_map(|entry| entry.peek())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.entries.size_hint().1)
    }
}

impl<T: TextureResource> IntoIterator for &TextureCache<T> {
    type Item = Arc<T>;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
