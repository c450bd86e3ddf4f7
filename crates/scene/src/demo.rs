//! The hard-coded showcase scene both apps render.

use glam::Vec3;
use pickview_assets::{
    AssetError, ResourceLoader, TERRAIN_SIZE, TERRAIN_VERTEX_COUNT, TextureData, cube, quad,
    terrain_grid,
};
use pickview_common::Transform;

use crate::{Camera, Entity, EntityAction, Light, ModelTexture, Scene, Terrain, TexturedModel};

/// Light index of the sun in the demo scene. Locked on.
pub const SUN_LIGHT: usize = 0;
/// Light index of the lamp that follows the camera.
pub const CAMERA_LIGHT: usize = 1;

fn lift(entity: &mut Entity) {
    entity.increase_position(Vec3::new(0.0, 0.5, 0.0));
}

/// Build the demo scene, uploading its meshes and textures through
/// `loader`.
///
/// Contents: two spinning "dragon" stand-ins sharing one model, a
/// transparent fake-lit billboard, a row of atlas-textured crates, four
/// terrain tiles around the origin, a locked sun, a camera lamp and two
/// cameras.
pub fn build_demo_scene(loader: &mut impl ResourceLoader) -> Result<Scene, AssetError> {
    let dragon_mesh = loader.load_model(&cube(1.0))?;
    let dragon_tex = loader.load_texture(&TextureData::checker(
        64,
        8,
        [200, 180, 60, 255],
        [120, 40, 30, 255],
    ))?;
    let dragon = TexturedModel::new(
        dragon_mesh,
        ModelTexture::new(dragon_tex).with_specular(10.0, 1.0),
    );

    let grass_mesh = loader.load_model(&quad(2.0, 2.0))?;
    let grass_tex = loader.load_texture(&TextureData::stripes(32, 4, [40, 160, 40, 255]))?;
    let grass = TexturedModel::new(
        grass_mesh,
        ModelTexture::new(grass_tex)
            .with_transparency(true)
            .with_fake_lighting(true),
    );

    let crate_mesh = loader.load_model(&cube(0.5))?;
    let crate_tex = loader.load_texture(&TextureData::atlas(
        32,
        2,
        &[
            [150, 100, 50, 255],
            [90, 90, 200, 255],
            [200, 60, 60, 255],
            [220, 220, 220, 255],
        ],
    ))?;
    let crates = TexturedModel::new(
        crate_mesh,
        ModelTexture::new(crate_tex)
            .with_rows(2)
            .with_specular(5.0, 0.3),
    );

    let ground_mesh = loader.load_model(&terrain_grid(TERRAIN_SIZE, TERRAIN_VERTEX_COUNT))?;
    let ground_tex = loader.load_texture(&TextureData::checker(
        128,
        16,
        [60, 110, 50, 255],
        [70, 125, 55, 255],
    ))?;
    let ground = ModelTexture::new(ground_tex);

    let mut scene = Scene::new(Camera::new(Vec3::new(0.0, 4.0, 14.0), 15.0, 0.0, 0.0));
    scene.add_camera(Camera::new(Vec3::new(12.0, 6.0, 4.0), 20.0, 60.0, 0.0));

    let sun = scene.add_light(
        Light::new(Vec3::new(0.0, 1000.0, -700.0), Vec3::new(0.8, 0.8, 0.8)).locked(),
    );
    let lamp = scene.add_light(
        Light::new(Vec3::ZERO, Vec3::new(1.0, 0.9, 0.6))
            .with_attenuation(Vec3::new(1.0, 0.01, 0.002)),
    );
    debug_assert_eq!((sun, lamp), (SUN_LIGHT, CAMERA_LIGHT));
    scene.attach_light_to_camera(lamp);

    scene.add_entity(
        Entity::new(dragon, Transform::at(Vec3::new(-3.0, 1.0, 0.0)))
            .with_spin(Vec3::new(0.0, 0.5, 0.0))
            .with_action(EntityAction::ToggleLight(lamp)),
    );
    scene.add_entity(
        Entity::new(dragon, Transform::at(Vec3::new(3.0, 1.0, 0.0)))
            .with_spin(Vec3::new(0.0, -0.5, 0.0))
            .with_action(EntityAction::Rotate(Vec3::new(0.0, 0.0, 45.0))),
    );
    scene.add_entity(
        Entity::new(grass, Transform::at(Vec3::new(0.0, 0.0, 3.0)))
            .with_action(EntityAction::Custom(lift)),
    );
    for (i, x) in [-3.0_f32, -1.0, 1.0, 3.0].into_iter().enumerate() {
        scene.add_entity(
            Entity::new(crates, Transform::at(Vec3::new(x, 0.5, -4.0)))
                .with_texture_index(i as i32)
                .with_action(EntityAction::CycleTexture),
        );
    }

    for (gx, gz) in [(-1, -1), (0, -1), (-1, 0), (0, 0)] {
        scene.add_terrain(Terrain::with_mesh(gx, gz, ground_mesh, ground));
    }

    tracing::info!(
        entities = scene.entities().len(),
        terrains = scene.terrains().len(),
        lights = scene.lights().len(),
        cameras = scene.cameras().len(),
        "demo scene built"
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickview_assets::HeadlessLoader;

    #[test]
    fn demo_scene_contents() {
        let mut loader = HeadlessLoader::new();
        let scene = build_demo_scene(&mut loader).unwrap();
        assert_eq!(scene.entities().len(), 7);
        assert_eq!(scene.terrains().len(), 4);
        assert_eq!(scene.lights().len(), 2);
        assert_eq!(scene.cameras().len(), 2);
        assert_eq!(scene.camera_light(), Some(CAMERA_LIGHT));
        assert!(!scene.lights()[SUN_LIGHT].can_toggle());
        assert_eq!(loader.model_count(), 4);
        assert_eq!(loader.texture_count(), 4);
    }

    #[test]
    fn dragons_share_a_model() {
        let mut loader = HeadlessLoader::new();
        let scene = build_demo_scene(&mut loader).unwrap();
        let e = scene.entities();
        assert_eq!(e[0].model, e[1].model);
        assert!(e[2].model.texture.has_transparency);
    }

    #[test]
    fn picking_first_dragon_toggles_lamp() {
        let mut loader = HeadlessLoader::new();
        let mut scene = build_demo_scene(&mut loader).unwrap();
        let id = scene.entities()[0].id;
        scene.trigger(id);
        assert!(!scene.lights()[CAMERA_LIGHT].is_enabled());
    }
}
