//! Cache Entry
//!
//! One entry per cached name. The entry is created once and mutated in place
//! across generations of the texture it points at; it is only removed from the
//! cache by a whole-cache clear.
//!
//! All bookkeeping sits behind a single per-entry mutex so that resolving the
//! weak reference and adjusting the user count are observed as one step by
//! every acquire, release and add on that name. Eviction disposes the texture
//! before that mutex is released, so no caller can resolve or reinstall a
//! texture that is still being disposed.

use parking_lot::{Mutex, MutexGuard};
use std::sync::{Arc, Weak};

use crate::errors::Result;
use crate::resources::{ResourceKey, TextureResource};

/// Bookkeeping for one cached name.
pub(crate) struct CacheEntry<T> {
    key: ResourceKey,
    state: Mutex<EntryState<T>>,
}

/// Mutable part of a [`CacheEntry`], only reachable through its lock.
pub(crate) struct EntryState<T> {
    texture: Option<Weak<T>>,
    users: usize,
}

/// Result of decrementing the user count.
pub(crate) enum ReleaseOutcome {
    /// The entry held nothing (never loaded, or already unloaded).
    Unloaded,
    /// The texture had been dropped or disposed elsewhere; bookkeeping was reset.
    Collected,
    /// Other users remain.
    Retained(usize),
    /// Last user gone; the texture has been disposed.
    Evicted,
}

impl<T: TextureResource> CacheEntry<T> {
    /// An entry that holds no texture yet.
    pub(crate) fn empty(key: ResourceKey) -> Self {
        Self {
            key,
            state: Mutex::new(EntryState {
                texture: None,
                users: 0,
            }),
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> &ResourceKey {
        &self.key
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, EntryState<T>> {
        self.state.lock()
    }

    /// Resolves and retains the texture in one step. `None` if it is not live.
    pub(crate) fn retain(&self) -> Option<Arc<T>> {
        let mut state = self.lock();
        let texture = state.resolve(&self.key)?;
        state.users += 1;
        log::trace!(
            "Texture '{}' exists in cache with {} users.",
            self.key,
            state.users
        );
        Some(texture)
    }

    /// Resolves the texture without touching the user count.
    pub(crate) fn peek(&self) -> Option<Arc<T>> {
        self.lock().resolve(&self.key)
    }

    /// Gives back one user, disposing the texture when none remain.
    ///
    /// The entry is emptied before `dispose` runs, so a failed dispose still
    /// leaves the entry unloaded.
    pub(crate) fn release(&self) -> Result<ReleaseOutcome> {
        let mut state = self.lock();

        if state.texture.is_none() {
            return Ok(ReleaseOutcome::Unloaded);
        }

        let Some(texture) = state.resolve(&self.key) else {
            return Ok(ReleaseOutcome::Collected);
        };

        state.users = state.users.saturating_sub(1);
        if state.users > 0 {
            return Ok(ReleaseOutcome::Retained(state.users));
        }

        state.clear();
        texture.dispose()?;
        Ok(ReleaseOutcome::Evicted)
    }

    /// Empties the entry and disposes its live texture, if any.
    pub(crate) fn evict(&self) -> Option<Result<()>> {
        let mut state = self.lock();
        let texture = state.resolve(&self.key)?;
        state.clear();
        Some(texture.dispose())
    }
}

impl<T: TextureResource> EntryState<T> {
    /// Upgrades the weak reference.
    ///
    /// A texture that was dropped or disposed behind the cache's back makes the
    /// user count meaningless, so both fields are reset when that is observed.
    pub(crate) fn resolve(&mut self, key: &ResourceKey) -> Option<Arc<T>> {
        let weak = self.texture.as_ref()?;

        match weak.upgrade() {
            Some(texture) if !texture.is_disposed() => Some(texture),
            _ => {
                log::warn!(
                    "Texture '{}' exists in the cache with {} users, but was collected!",
                    key,
                    self.users
                );
                self.clear();
                None
            }
        }
    }

    /// Points the entry at a new texture generation.
    pub(crate) fn install(&mut self, texture: &Arc<T>, users: usize) {
        self.texture = Some(Arc::downgrade(texture));
        self.users = users;
    }

    #[inline]
    pub(crate) fn users(&self) -> usize {
        self.users
    }

    #[inline]
    pub(crate) fn add_user(&mut self) -> usize {
        self.users += 1;
        self.users
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.texture = None;
        self.users = 0;
    }

    /// Whether the entry points at `texture` (by identity), without resolving.
    pub(crate) fn holds(&self, texture: &Arc<T>) -> bool {
        self.texture
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(texture)))
    }
}
