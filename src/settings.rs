//! Cache Settings
//!
//! Runtime configuration for [`TextureCache`](crate::assets::TextureCache).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use gpu_texture_cache::{CacheSettings, TextureCache};
//!
//! // Default: wait indefinitely for loads, dispose everything on drop
//! let cache = TextureCache::new(registry.clone());
//!
//! // Give up on slow loads after two seconds
//! let settings = CacheSettings {
//!     load_timeout: Some(Duration::from_secs(2)),
//!     ..Default::default()
//! };
//! let cache = TextureCache::with_settings(registry, settings);
//! ```

use std::time::Duration;

/// Configuration for a texture cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Upper bound on a single acquisition, covering both the wait for another
    /// caller's in-flight load and the caller's own load.
    ///
    /// `None` waits indefinitely. Requires a tokio runtime with the time
    /// driver enabled when set.
    pub load_timeout: Option<Duration>,

    /// Dispose every live cached texture when the cache is dropped.
    pub clear_on_drop: bool,
}

impl Default for CacheSettings {
    #[inline]
    fn default() -> Self {
        Self {
            load_timeout: None,
            clear_on_drop: true,
        }
    }
}

impl CacheSettings {
    /// Returns a copy of these settings with the given load timeout.
    #[inline]
    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = Some(timeout);
        self
    }
}
