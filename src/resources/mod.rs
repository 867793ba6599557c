//! Texture resource definitions
//!
//! Contains the types the cache works against, independent of any GPU backend:
//! - [`TextureResource`]: the contract a cacheable texture fulfils
//! - [`ResourceKey`]: validated, case-insensitive resource name
//! - [`ResourceRegistry`]: weak name lookup over live resources
//! - [`Texture`] / [`TextureInfo`]: a concrete CPU-side texture record

pub mod key;
pub mod registry;
pub mod texture;

pub use key::ResourceKey;
pub use registry::ResourceRegistry;
pub use texture::{Texture, TextureInfo};

use crate::errors::Result;

/// A named texture object whose lifetime the cache can track.
///
/// Strong ownership lives with callers as `Arc<T>`; the cache only keeps a
/// `Weak<T>`. Implementors must tolerate `dispose` being called exactly once per
/// cache generation and should report `true` from [`is_disposed`] afterwards so
/// that stale cache entries are detected.
///
/// [`is_disposed`]: TextureResource::is_disposed
pub trait TextureResource: Send + Sync + 'static {
    /// The logical name of the texture. Used (case-insensitively) as the cache key.
    fn name(&self) -> &str;

    /// Releases the resources held by the texture.
    fn dispose(&self) -> Result<()>;

    /// Whether [`dispose`](TextureResource::dispose) has already run.
    fn is_disposed(&self) -> bool {
        false
    }
}
