//! # GPU Texture Cache
//!
//! A residency cache for shared GPU textures.
//!
//! [`TextureCache`] hands out `Arc`-shared textures by name, counts how many
//! users each one has, and disposes a texture when its last user returns it.
//! It only holds textures weakly, so it never keeps one alive by itself, and it
//! coalesces concurrent requests so that each name is loaded at most once at a
//! time.
//!
//! - [`assets`]: the cache and a file-based texture loader
//! - [`resources`]: the texture contract, a concrete texture type and a
//!   name registry used as the default loader
//! - [`settings`]: cache configuration
//! - [`errors`]: error types

pub mod assets;
pub mod errors;
pub mod resources;
pub mod settings;

pub use assets::{ColorSpace, FileTextureLoader, TextureCache};
pub use errors::{CacheError, Result};
pub use resources::{ResourceKey, ResourceRegistry, Texture, TextureInfo, TextureResource};
pub use settings::CacheSettings;
