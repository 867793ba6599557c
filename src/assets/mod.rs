pub mod cache;
mod entry;
pub mod io;

pub use cache::{Iter, TextureCache};
pub use io::{ColorSpace, FileTextureLoader};
