use glam::{Vec2, Vec3};
use pickview_common::{EntityId, Transform};

use crate::TexturedModel;

/// What happens when an entity is picked.
#[derive(Debug, Clone, Copy)]
pub enum EntityAction {
    /// Toggle the scene light at this index.
    ToggleLight(usize),
    /// Add this rotation (degrees) once.
    Rotate(Vec3),
    /// Step to the next atlas cell, wrapping.
    CycleTexture,
    /// Arbitrary change to the picked entity.
    Custom(fn(&mut Entity)),
}

/// One drawable instance of a textured model.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub model: TexturedModel,
    pub transform: Transform,
    /// Atlas cell, clamped when the offset is computed.
    pub texture_index: i32,
    /// Rotation added every scene tick, in degrees.
    pub spin: Vec3,
    pub action: Option<EntityAction>,
}

impl Entity {
    pub fn new(model: TexturedModel, transform: Transform) -> Self {
        Self {
            id: EntityId::new(),
            model,
            transform,
            texture_index: 0,
            spin: Vec3::ZERO,
            action: None,
        }
    }

    pub fn with_texture_index(mut self, index: i32) -> Self {
        self.texture_index = index;
        self
    }

    pub fn with_spin(mut self, spin: Vec3) -> Self {
        self.spin = spin;
        self
    }

    pub fn with_action(mut self, action: EntityAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn increase_position(&mut self, delta: Vec3) {
        self.transform.position += delta;
    }

    pub fn increase_rotation(&mut self, delta: Vec3) {
        self.transform.rotation += delta;
    }

    /// Atlas UV offset for the current texture index.
    pub fn texture_offset(&self) -> Vec2 {
        self.model.texture.atlas_offset(self.texture_index)
    }

    /// Advance to the next atlas cell, wrapping to the first.
    pub fn cycle_texture(&mut self) {
        let cells = i64::from(self.model.texture.max_atlas_index()) + 1;
        let current = i64::from(self.model.texture.clamp_atlas_index(self.texture_index));
        self.texture_index = ((current + 1) % cells) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelTexture;
    use pickview_assets::Mesh;
    use pickview_common::{ModelHandle, TextureHandle};

    fn model(rows: u32) -> TexturedModel {
        TexturedModel::new(
            Mesh {
                handle: ModelHandle(1),
                vertex_count: 3,
                index_count: 3,
                bounding_radius: 1.0,
            },
            ModelTexture::new(TextureHandle(1)).with_rows(rows),
        )
    }

    #[test]
    fn increase_helpers_accumulate() {
        let mut e = Entity::new(model(1), Transform::default());
        e.increase_position(Vec3::new(1.0, 0.0, 0.0));
        e.increase_position(Vec3::new(0.5, 2.0, 0.0));
        e.increase_rotation(Vec3::new(0.0, 90.0, 0.0));
        assert_eq!(e.transform.position, Vec3::new(1.5, 2.0, 0.0));
        assert_eq!(e.transform.rotation.y, 90.0);
    }

    #[test]
    fn cycle_texture_wraps() {
        let mut e = Entity::new(model(2), Transform::default()).with_texture_index(3);
        e.cycle_texture();
        assert_eq!(e.texture_index, 0);
        e.cycle_texture();
        assert_eq!(e.texture_offset(), Vec2::new(0.5, 0.0));
    }

    #[test]
    fn out_of_range_index_is_clamped_for_offset() {
        let e = Entity::new(model(2), Transform::default()).with_texture_index(42);
        assert_eq!(e.texture_offset(), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn huge_atlas_cycles_without_overflow() {
        let mut e = Entity::new(model(u32::MAX), Transform::default()).with_texture_index(i32::MAX);
        e.cycle_texture();
        assert_eq!(e.texture_index, 0);

        let mut e = Entity::new(model(46_341), Transform::default()).with_texture_index(5);
        e.cycle_texture();
        assert_eq!(e.texture_index, 6);
        assert_eq!(e.texture_offset(), Vec2::new(6.0 / 46_341.0, 0.0));
    }
}
