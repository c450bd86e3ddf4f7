use glam::Vec3;
use pickview_assets::{
    AssetError, Mesh, ResourceLoader, TERRAIN_SIZE, TERRAIN_VERTEX_COUNT, terrain_grid,
};
use pickview_common::Transform;

use crate::ModelTexture;

/// One square terrain tile placed on the world grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terrain {
    pub grid_x: i32,
    pub grid_z: i32,
    pub mesh: Mesh,
    pub texture: ModelTexture,
}

impl Terrain {
    /// Generate and upload a fresh tile mesh.
    pub fn generate(
        grid_x: i32,
        grid_z: i32,
        loader: &mut impl ResourceLoader,
        texture: ModelTexture,
    ) -> Result<Self, AssetError> {
        let mesh = loader.load_model(&terrain_grid(TERRAIN_SIZE, TERRAIN_VERTEX_COUNT))?;
        Ok(Self::with_mesh(grid_x, grid_z, mesh, texture))
    }

    /// Place a tile reusing an already uploaded grid mesh.
    pub fn with_mesh(grid_x: i32, grid_z: i32, mesh: Mesh, texture: ModelTexture) -> Self {
        Self {
            grid_x,
            grid_z,
            mesh,
            texture,
        }
    }

    /// World-space corner of the tile.
    pub fn origin(&self) -> Vec3 {
        Vec3::new(
            self.grid_x as f32 * TERRAIN_SIZE,
            0.0,
            self.grid_z as f32 * TERRAIN_SIZE,
        )
    }

    pub fn transform(&self) -> Transform {
        Transform::at(self.origin())
    }
}
