use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use wgpu::TextureFormat;

use crate::errors::Result;
use crate::resources::{ResourceRegistry, Texture, TextureInfo};

/// How decoded 8-bit color data should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

impl ColorSpace {
    #[inline]
    #[must_use]
    pub fn rgba8_format(self) -> TextureFormat {
        match self {
            ColorSpace::Srgb => TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => TextureFormat::Rgba8Unorm,
        }
    }
}

/// Loads textures from image files under a root directory.
///
/// Intended as the loader for [`TextureCache::acquire_with`]: the texture name
/// is the file path relative to the root.
///
/// ```rust,ignore
/// let loader = FileTextureLoader::new("assets/textures").with_registry(registry.clone());
/// let brick = cache
///     .acquire_with("brick.png", |name| async move { loader.locate(name).await })
///     .await?;
/// ```
///
/// [`TextureCache::acquire_with`]: crate::assets::TextureCache::acquire_with
pub struct FileTextureLoader {
    root_path: PathBuf,
    color_space: ColorSpace,
    registry: Option<Arc<ResourceRegistry<Texture>>>,
}

impl FileTextureLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };

        Self {
            root_path,
            color_space: ColorSpace::default(),
            registry: None,
        }
    }

    #[must_use]
    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    /// Registers every loaded texture in `registry`.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ResourceRegistry<Texture>>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[inline]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Reads and decodes `name`, returning a new texture named `name`.
    pub async fn load(&self, name: &str) -> Result<Arc<Texture>> {
        let path = self.root_path.join(name);
        log::debug!("Reading texture '{name}' from {}.", path.display());

        let bytes = tokio::fs::read(&path).await?;

        let label = name.to_string();
        let color_space = self.color_space;
        let texture =
            tokio::task::spawn_blocking(move || decode_texture(&bytes, &label, color_space))
                .await??;

        let texture = Arc::new(texture);
        if let Some(registry) = &self.registry {
            registry.register(&texture);
        }

        Ok(texture)
    }

    /// Loads several textures concurrently, in order.
    pub async fn load_all(&self, names: &[&str]) -> Vec<Result<Arc<Texture>>> {
        join_all(names.iter().map(|name| self.load(name))).await
    }

    /// Cache-loader form of [`load`](Self::load): failures are logged and
    /// reported as `None`.
    pub async fn locate(&self, name: String) -> Option<Arc<Texture>> {
        match self.load(&name).await {
            Ok(texture) => Some(texture),
            Err(err) => {
                log::warn!("Texture '{name}' could not be loaded: {err}");
                None
            }
        }
    }
}

/// CPU image decoding, run on a blocking worker.
fn decode_texture(bytes: &[u8], label: &str, color_space: ColorSpace) -> Result<Texture> {
    let img = image::load_from_memory(bytes)?;

    let (width, height) = (img.width(), img.height());
    let rgba = img.into_rgba8();

    let info = TextureInfo::new_2d(label, width, height, color_space.rgba8_format());
    Ok(Texture::new(info, Some(rgba.into_raw())))
}
