//! Mesh and texture data for the pickview engine.
//!
//! Everything in this crate is CPU-side: geometry and pixels are parsed or
//! generated here, then handed to a [`ResourceLoader`] which owns the GPU
//! copies and returns opaque handles.
//!
//! # Invariants
//! - A [`MeshData`] that passed [`MeshData::validate`] has one tex coord and
//!   one normal per position and every index is in range.
//! - Loaders never return a zero or placeholder handle on failure; they
//!   return an [`AssetError`].
//! - [`TextureData::rgba`] is always `width * height * 4` bytes.

mod loader;
mod mesh;
mod obj;
mod terrain;
mod texture;

pub use loader::{HeadlessLoader, Mesh, ResourceLoader};
pub use mesh::{MeshData, cube, quad};
pub use obj::{load_obj, parse_obj};
pub use terrain::{TERRAIN_SIZE, TERRAIN_VERTEX_COUNT, terrain_grid};
pub use texture::TextureData;

use std::path::PathBuf;

/// Errors from loading or generating asset data.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("OBJ parse error on line {line}: {message}")]
    ObjParse { line: usize, message: String },
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("mesh has no geometry")]
    EmptyMesh,
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
    #[error("invalid texture: {0}")]
    InvalidTexture(String),
    #[error("GPU upload failed: {0}")]
    Upload(String),
}
