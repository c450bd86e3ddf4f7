use std::collections::BTreeMap;
use std::path::Path;

use pickview_common::{ModelHandle, TextureHandle};

use crate::{AssetError, MeshData, TextureData, obj};

/// Uploaded geometry as seen by the render core: an opaque handle plus
/// the counts needed to issue draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    pub handle: ModelHandle,
    pub vertex_count: u32,
    pub index_count: u32,
    /// Radius of an origin-centred sphere enclosing the geometry.
    pub bounding_radius: f32,
}

/// Owner of GPU-resident geometry and textures.
///
/// Implementations validate input and return typed errors instead of
/// placeholder handles. Handles stay valid until released.
pub trait ResourceLoader {
    fn load_model(&mut self, mesh: &MeshData) -> Result<Mesh, AssetError>;
    fn load_texture(&mut self, texture: &TextureData) -> Result<TextureHandle, AssetError>;
    fn release_model(&mut self, handle: ModelHandle);
    fn release_texture(&mut self, handle: TextureHandle);

    fn load_obj_file(&mut self, path: &Path) -> Result<Mesh, AssetError> {
        let mesh = obj::load_obj(path)?;
        self.load_model(&mesh)
    }

    fn load_texture_file(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        let texture = TextureData::open(path)?;
        self.load_texture(&texture)
    }
}

/// Loader that keeps no GPU state: it validates data and hands out
/// sequential handles. Used by the CLI and by tests.
#[derive(Debug, Default)]
pub struct HeadlessLoader {
    next_model: u32,
    next_texture: u32,
    models: BTreeMap<ModelHandle, Mesh>,
    textures: BTreeMap<TextureHandle, (u32, u32)>,
}

impl HeadlessLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn mesh(&self, handle: ModelHandle) -> Option<&Mesh> {
        self.models.get(&handle)
    }

    pub fn texture_size(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(&handle).copied()
    }
}

impl ResourceLoader for HeadlessLoader {
    fn load_model(&mut self, mesh: &MeshData) -> Result<Mesh, AssetError> {
        mesh.validate()?;
        self.next_model += 1;
        let loaded = Mesh {
            handle: ModelHandle(self.next_model),
            vertex_count: mesh.vertex_count() as u32,
            index_count: mesh.index_count() as u32,
            bounding_radius: mesh.bounding_radius(),
        };
        self.models.insert(loaded.handle, loaded);
        Ok(loaded)
    }

    fn load_texture(&mut self, texture: &TextureData) -> Result<TextureHandle, AssetError> {
        self.next_texture += 1;
        let handle = TextureHandle(self.next_texture);
        self.textures
            .insert(handle, (texture.width, texture.height));
        Ok(handle)
    }

    fn release_model(&mut self, handle: ModelHandle) {
        self.models.remove(&handle);
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube;

    #[test]
    fn handles_are_distinct_and_nonzero() {
        let mut loader = HeadlessLoader::new();
        let a = loader.load_model(&cube(1.0)).unwrap();
        let b = loader.load_model(&cube(1.0)).unwrap();
        assert_ne!(a.handle, b.handle);
        assert_ne!(a.handle.0, 0);
        assert_eq!(a.index_count, 36);
        assert_eq!(loader.model_count(), 2);
    }

    #[test]
    fn invalid_mesh_is_rejected() {
        let mut loader = HeadlessLoader::new();
        assert!(loader.load_model(&MeshData::default()).is_err());
        assert_eq!(loader.model_count(), 0);
    }

    #[test]
    fn release_forgets_handles() {
        let mut loader = HeadlessLoader::new();
        let mesh = loader.load_model(&cube(1.0)).unwrap();
        let tex = loader
            .load_texture(&TextureData::solid(2, 2, [1, 2, 3, 4]))
            .unwrap();
        assert_eq!(loader.texture_size(tex), Some((2, 2)));
        loader.release_model(mesh.handle);
        loader.release_texture(tex);
        assert!(loader.mesh(mesh.handle).is_none());
        assert_eq!(loader.texture_count(), 0);
    }

    #[test]
    fn missing_texture_file_is_typed_error() {
        let mut loader = HeadlessLoader::new();
        let err = loader
            .load_texture_file(Path::new("/no/such/texture.png"))
            .unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
