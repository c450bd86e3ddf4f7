use glam::Vec3;
use pickview_common::EntityId;

use crate::{Camera, CameraRegistry, Entity, EntityAction, Light, Terrain};

/// Sky colour used when no configuration overrides it.
pub const DEFAULT_SKY_COLOUR: Vec3 = Vec3::new(0.4, 0.1, 0.2);

/// Everything one frame draws: entities, terrain tiles, lights and the
/// camera registry.
///
/// Entities are kept in insertion order, which is also their submission
/// order. A light attached to the camera follows the active camera after
/// every camera change made through this type.
#[derive(Debug, Clone)]
pub struct Scene {
    entities: Vec<Entity>,
    terrains: Vec<Terrain>,
    lights: Vec<Light>,
    cameras: CameraRegistry,
    camera_light: Option<usize>,
    pub sky_colour: Vec3,
    tick: u64,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            entities: Vec::new(),
            terrains: Vec::new(),
            lights: Vec::new(),
            cameras: CameraRegistry::new(camera),
            camera_light: None,
            sky_colour: DEFAULT_SKY_COLOUR,
            tick: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn add_terrain(&mut self, terrain: Terrain) {
        self.terrains.push(terrain);
    }

    pub fn terrains(&self) -> &[Terrain] {
        &self.terrains
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    /// Flip a light on or off. Returns false for locked or unknown lights.
    pub fn toggle_light(&mut self, index: usize) -> bool {
        let changed = self.lights.get_mut(index).is_some_and(Light::toggle);
        tracing::debug!(index, changed, "toggle light");
        changed
    }

    /// Make light `index` follow the active camera.
    pub fn attach_light_to_camera(&mut self, index: usize) -> bool {
        if index >= self.lights.len() {
            return false;
        }
        self.camera_light = Some(index);
        self.sync_camera_light();
        true
    }

    pub fn detach_camera_light(&mut self) {
        self.camera_light = None;
    }

    pub fn camera_light(&self) -> Option<usize> {
        self.camera_light
    }

    pub fn camera(&self) -> &Camera {
        self.cameras.active()
    }

    pub fn cameras(&self) -> &CameraRegistry {
        &self.cameras
    }

    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.add(camera)
    }

    /// Mutate the active camera, then move the attached light with it.
    pub fn update_camera<R>(&mut self, f: impl FnOnce(&mut Camera) -> R) -> R {
        let out = f(self.cameras.active_mut());
        self.sync_camera_light();
        out
    }

    pub fn next_camera(&mut self) {
        self.cameras.next();
        self.sync_camera_light();
        tracing::info!(camera = self.cameras.active_index(), "switched camera");
    }

    pub fn previous_camera(&mut self) {
        self.cameras.previous();
        self.sync_camera_light();
        tracing::info!(camera = self.cameras.active_index(), "switched camera");
    }

    /// Run the picked entity's action. Returns the action that fired.
    pub fn trigger(&mut self, id: EntityId) -> Option<EntityAction> {
        let entity = self.entities.iter_mut().find(|e| e.id == id)?;
        let action = entity.action?;
        match action {
            EntityAction::Rotate(delta) => entity.increase_rotation(delta),
            EntityAction::CycleTexture => entity.cycle_texture(),
            EntityAction::Custom(f) => f(entity),
            EntityAction::ToggleLight(index) => {
                self.toggle_light(index);
            }
        }
        tracing::debug!(entity = %id.short(), ?action, "entity action");
        Some(action)
    }

    /// Advance per-tick animation.
    pub fn step(&mut self) {
        self.tick += 1;
        for entity in &mut self.entities {
            if entity.spin != Vec3::ZERO {
                let spin = entity.spin;
                entity.increase_rotation(spin);
            }
        }
    }

    fn sync_camera_light(&mut self) {
        let position = self.cameras.active().position();
        if let Some(light) = self.camera_light.and_then(|i| self.lights.get_mut(i)) {
            light.position = position;
        }
    }
}
