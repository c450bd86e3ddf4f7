use std::collections::BTreeMap;

use glam::Vec2;
use pickview_assets::Mesh;
use pickview_common::{EntityId, ModelHandle, TextureHandle, Transform};
use pickview_scene::{Entity, ModelTexture, Terrain, TexturedModel};

/// Shared GPU resources and material that make entities batchable.
/// Ordering of keys is draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey {
    pub model: ModelHandle,
    pub texture: TextureHandle,
    pub material: MaterialKey,
}

impl BatchKey {
    pub fn of(model: &TexturedModel) -> Self {
        Self {
            model: model.mesh.handle,
            texture: model.texture.handle,
            material: MaterialKey::of(&model.texture),
        }
    }
}

/// Bitwise identity of a texture's material parameters. Entities sharing
/// handles but not material land in separate groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialKey {
    shine_damper: u32,
    reflectivity: u32,
    has_transparency: bool,
    use_fake_lighting: bool,
    rows: u32,
}

impl MaterialKey {
    pub fn of(texture: &ModelTexture) -> Self {
        Self {
            shine_damper: texture.shine_damper.to_bits(),
            reflectivity: texture.reflectivity.to_bits(),
            has_transparency: texture.has_transparency,
            use_fake_lighting: texture.use_fake_lighting,
            rows: texture.number_of_rows(),
        }
    }
}

/// Per-instance data captured at submission time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    pub entity: EntityId,
    pub transform: Transform,
    pub tex_offset: Vec2,
}

/// All instances sharing one textured model, in submission order.
#[derive(Debug, Clone)]
pub struct Batch {
    pub model: TexturedModel,
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainInstance {
    pub mesh: Mesh,
    pub texture: ModelTexture,
    pub transform: Transform,
}

/// One frame's submissions: entity batches keyed by shared resources and a
/// flat list of terrain tiles.
///
/// Iteration order (key order, then submission order within a batch) is
/// the traversal order of both passes; flattened instance positions in that
/// order are what object indices refer to.
#[derive(Debug, Clone, Default)]
pub struct BatchMap {
    batches: BTreeMap<BatchKey, Batch>,
    terrains: Vec<TerrainInstance>,
}

impl BatchMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, entity: &Entity) {
        let instance = Instance {
            entity: entity.id,
            transform: entity.transform,
            tex_offset: entity.texture_offset(),
        };
        self.batches
            .entry(BatchKey::of(&entity.model))
            .or_insert_with(|| Batch {
                model: entity.model,
                instances: Vec::new(),
            })
            .instances
            .push(instance);
    }

    pub fn submit_terrain(&mut self, terrain: &Terrain) {
        self.terrains.push(TerrainInstance {
            mesh: terrain.mesh,
            texture: terrain.texture,
            transform: terrain.transform(),
        });
    }

    pub fn batches(&self) -> impl Iterator<Item = (&BatchKey, &Batch)> {
        self.batches.iter()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn terrains(&self) -> &[TerrainInstance] {
        &self.terrains
    }

    pub fn instance_count(&self) -> usize {
        self.batches.values().map(|b| b.instances.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty() && self.terrains.is_empty()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
        self.terrains.clear();
    }

    /// Every entity instance in traversal order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.batches.values().flat_map(|b| b.instances.iter())
    }

    /// Instance at a flattened traversal position.
    pub fn instance_at(&self, mut flat: usize) -> Option<&Instance> {
        for batch in self.batches.values() {
            if flat < batch.instances.len() {
                return batch.instances.get(flat);
            }
            flat -= batch.instances.len();
        }
        None
    }

    /// Instance for a 1-based object index; 0 is background.
    pub fn resolve_object(&self, object_id: u32) -> Option<&Instance> {
        let flat = object_id.checked_sub(1)?;
        self.instance_at(flat as usize)
    }
}

/// Two batch maps used alternately: one collects and renders the current
/// frame, the other keeps the previous frame for pick lookups.
///
/// Lookups must only go to [`BatchBuffers::last_used`]. The swap is the
/// only hand-off point; sharing across threads would need a lock around it.
#[derive(Debug, Clone, Default)]
pub struct BatchBuffers {
    buffers: [BatchMap; 2],
    active: usize,
}

impl BatchBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &BatchMap {
        &self.buffers[self.active]
    }

    pub fn active_mut(&mut self) -> &mut BatchMap {
        &mut self.buffers[self.active]
    }

    pub fn last_used(&self) -> &BatchMap {
        &self.buffers[1 - self.active]
    }

    /// Make the active map queryable and start the next frame on an empty
    /// map.
    pub fn swap(&mut self) {
        self.active = 1 - self.active;
        self.buffers[self.active].clear();
    }
}
