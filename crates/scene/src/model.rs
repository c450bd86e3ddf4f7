use glam::Vec2;
use pickview_assets::Mesh;
use pickview_common::TextureHandle;

/// Texture plus the material parameters the shading programs read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTexture {
    pub handle: TextureHandle,
    pub shine_damper: f32,
    pub reflectivity: f32,
    /// Disables back-face culling for models using this texture.
    pub has_transparency: bool,
    /// Shade as if every normal pointed up.
    pub use_fake_lighting: bool,
    number_of_rows: u32,
}

impl ModelTexture {
    pub fn new(handle: TextureHandle) -> Self {
        Self {
            handle,
            shine_damper: 1.0,
            reflectivity: 0.0,
            has_transparency: false,
            use_fake_lighting: false,
            number_of_rows: 1,
        }
    }

    pub fn with_specular(mut self, shine_damper: f32, reflectivity: f32) -> Self {
        self.shine_damper = shine_damper.max(f32::EPSILON);
        self.reflectivity = reflectivity.max(0.0);
        self
    }

    pub fn with_transparency(mut self, has_transparency: bool) -> Self {
        self.has_transparency = has_transparency;
        self
    }

    pub fn with_fake_lighting(mut self, use_fake_lighting: bool) -> Self {
        self.use_fake_lighting = use_fake_lighting;
        self
    }

    /// Treat the texture as a `rows x rows` atlas. Zero becomes one.
    pub fn with_rows(mut self, rows: u32) -> Self {
        self.number_of_rows = rows.max(1);
        self
    }

    pub fn number_of_rows(&self) -> u32 {
        self.number_of_rows
    }

    /// Highest addressable atlas cell, saturated to `i32::MAX` so it can
    /// bound a signed index.
    pub fn max_atlas_index(&self) -> u32 {
        let cells = u64::from(self.number_of_rows) * u64::from(self.number_of_rows);
        (cells - 1).min(i32::MAX as u64) as u32
    }

    /// Clamp an atlas index into `[0, rows * rows - 1]`.
    pub fn clamp_atlas_index(&self, index: i32) -> u32 {
        index.clamp(0, self.max_atlas_index() as i32) as u32
    }

    /// UV offset of an atlas cell, row-major with rows going down.
    pub fn atlas_offset(&self, index: i32) -> Vec2 {
        let index = self.clamp_atlas_index(index);
        let rows = self.number_of_rows;
        let column = index % rows;
        let row = index / rows;
        Vec2::new(column as f32 / rows as f32, row as f32 / rows as f32)
    }
}

/// Geometry and material drawn together. Entities sharing one of these
/// are batched into a single group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedModel {
    pub mesh: Mesh,
    pub texture: ModelTexture,
}

impl TexturedModel {
    pub fn new(mesh: Mesh, texture: ModelTexture) -> Self {
        Self { mesh, texture }
    }
}
