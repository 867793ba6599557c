use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use uuid::Uuid;
use wgpu::{TextureDimension, TextureFormat};

use crate::errors::{CacheError, Result};
use crate::resources::TextureResource;

// Global texture ID generator (uses u64 for cheap identity checks)
static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// 1. Texture Description
// ============================================================================

/// Size, layout and format of a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub name: String,

    pub width: u32,
    pub height: u32,
    // Depth for 3D textures, layer count for arrays and cube maps
    pub depth_or_array_layers: u32,
    pub mip_level_count: u32,

    pub dimension: TextureDimension,
    pub format: TextureFormat,
}

impl TextureInfo {
    /// Describes a single-layer 2D texture with one mip level.
    pub fn new_2d(name: &str, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            depth_or_array_layers: 1,
            mip_level_count: 1,
            dimension: TextureDimension::D2,
            format,
        }
    }

    /// Describes a cube map (six 2D layers).
    pub fn new_cube(name: &str, size: u32, format: TextureFormat) -> Self {
        Self {
            depth_or_array_layers: 6,
            ..Self::new_2d(name, size, size, format)
        }
    }

    #[must_use]
    pub fn with_mip_levels(mut self, mip_level_count: u32) -> Self {
        self.mip_level_count = mip_level_count.max(1);
        self
    }

    /// Byte size of the top mip level across all layers.
    ///
    /// Returns `None` for formats without a single copyable block size
    /// (combined depth-stencil formats).
    pub fn size_in_bytes(&self) -> Option<u64> {
        let block_size = self
            .format
            .block_copy_size(Some(wgpu::TextureAspect::All))?;
        let (block_width, block_height) = self.format.block_dimensions();

        let blocks_x = u64::from(self.width.div_ceil(block_width));
        let blocks_y = u64::from(self.height.div_ceil(block_height));

        Some(blocks_x * blocks_y * u64::from(block_size) * u64::from(self.depth_or_array_layers))
    }
}

// ============================================================================
// 2. Texture
// ============================================================================

/// A named texture with optional CPU-side pixel data.
///
/// Disposing a texture drops its pixel data; the object itself stays valid
/// (callers may still hold it) but reports [`is_disposed`](TextureResource::is_disposed).
#[derive(Debug)]
pub struct Texture {
    id: u64,
    uuid: Uuid,
    info: TextureInfo,

    data: RwLock<Option<Vec<u8>>>,
    disposed: AtomicBool,
}

impl Texture {
    pub fn new(info: TextureInfo, data: Option<Vec<u8>>) -> Self {
        Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            uuid: Uuid::new_v4(),
            info,
            data: RwLock::new(data),
            disposed: AtomicBool::new(false),
        }
    }

    /// Helper constructor: 2D texture without pixel data.
    pub fn new_2d(name: &str, width: u32, height: u32, format: TextureFormat) -> Self {
        Self::new(TextureInfo::new_2d(name, width, height, format), None)
    }

    /// Process-unique identifier.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[inline]
    pub fn info(&self) -> &TextureInfo {
        &self.info
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.info.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.info.height
    }

    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.info.format
    }

    /// Read access to the pixel data. `None` once disposed.
    pub fn data(&self) -> RwLockReadGuard<'_, Option<Vec<u8>>> {
        self.data.read()
    }

    /// Replaces the pixel data. Ignored after disposal.
    pub fn set_data(&self, data: Vec<u8>) {
        if self.is_disposed() {
            log::warn!("Texture '{}' is disposed, pixel data was not updated.", self.info.name);
            return;
        }
        *self.data.write() = Some(data);
    }
}

impl TextureResource for Texture {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn dispose(&self) -> Result<()> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Err(CacheError::dispose_failed(
                &self.info.name,
                "texture was already disposed",
            ));
        }

        self.data.write().take();
        log::debug!("Texture '{}' ({}) disposed.", self.info.name, self.id);
        Ok(())
    }

    #[inline]
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
