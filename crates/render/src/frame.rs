use std::ops::Range;

use glam::{Mat4, Vec2, Vec3};
use pickview_assets::Mesh;
use pickview_common::{EntityId, Viewport};
use pickview_scene::{Entity, ModelTexture, Scene, Terrain};

use crate::{
    BatchBuffers, BatchKey, BatchMap, Instance, LightBlock, PickBufferError, PickEncoder,
    PickTarget, PickedPixel, Projection, RayCaster, RenderToggles, ShadingMode,
    config::RenderConfig,
    ray::sphere_intersection,
};

/// One model group of the frame: bind once, draw `instances`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDraw {
    pub key: BatchKey,
    pub mesh: Mesh,
    pub texture: ModelTexture,
    /// Back-face culling for this group only: off for transparent textures
    /// or when culling is globally off.
    pub cull_back_faces: bool,
    /// Range into [`FramePlan::instances`].
    pub instances: Range<u32>,
}

/// One instance draw, shared by both passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceDraw {
    pub entity: EntityId,
    pub model_matrix: Mat4,
    pub tex_offset: Vec2,
    /// 1-based pick index.
    pub object_index: u32,
    /// Ordinal of the owning group.
    pub draw_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainDraw {
    pub mesh: Mesh,
    pub texture: ModelTexture,
    pub model_matrix: Mat4,
}

/// Everything a backend needs to draw one frame, in draw order.
///
/// Pick pass: when `pick_enabled`, draw every group's instances with the
/// picking program, loading `0` before each group and `object_index` before
/// each instance. Terrain is not part of the pick pass.
/// Shaded pass: clear to `sky_colour`, draw groups with the program for
/// `shading`, then the terrain tiles.
#[derive(Debug, Clone)]
pub struct FramePlan {
    pub frame: u64,
    pub viewport: Viewport,
    pub projection: Mat4,
    pub view: Mat4,
    pub camera_position: Vec3,
    pub sky_colour: Vec3,
    pub lights: LightBlock,
    pub shading: ShadingMode,
    pub wireframe: bool,
    pub culling: bool,
    pub pick_enabled: bool,
    pub groups: Vec<GroupDraw>,
    pub instances: Vec<InstanceDraw>,
    pub terrains: Vec<TerrainDraw>,
}

impl FramePlan {
    /// Values loaded into the picking program's index uniform, in order.
    pub fn pick_index_sequence(&self) -> Vec<u32> {
        let mut loads = Vec::with_capacity(self.groups.len() + self.instances.len());
        for group in &self.groups {
            loads.push(0);
            let range = group.instances.start as usize..group.instances.end as usize;
            loads.extend(self.instances[range].iter().map(|i| i.object_index));
        }
        loads
    }

    pub fn group_instances(&self, group: &GroupDraw) -> &[InstanceDraw] {
        &self.instances[group.instances.start as usize..group.instances.end as usize]
    }
}

/// Runs frames: collects submissions, plans the two passes, swaps the
/// double-buffered batch map and answers pick queries against the last
/// rendered frame.
///
/// Frame order: `process_*` calls, [`Self::plan_frame`], backend draws the
/// plan, [`Self::finish_frame`]. Pick queries between frames read only the
/// last-used map.
#[derive(Debug, Clone)]
pub struct RenderOrchestrator {
    buffers: BatchBuffers,
    toggles: RenderToggles,
    projection: Projection,
    pick_requested: bool,
    pick_available: bool,
    frame: u64,
}

impl RenderOrchestrator {
    pub fn new(config: &RenderConfig, viewport: Viewport) -> Self {
        Self {
            buffers: BatchBuffers::new(),
            toggles: RenderToggles::default(),
            projection: Projection::new(&config.projection, viewport),
            pick_requested: config.picking,
            pick_available: config.picking,
            frame: 0,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn toggles(&self) -> &RenderToggles {
        &self.toggles
    }

    pub fn toggles_mut(&mut self) -> &mut RenderToggles {
        &mut self.toggles
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.projection.resize(viewport);
        tracing::debug!(width = viewport.width, height = viewport.height, "projection rebuilt");
    }

    /// Record whether the pick target is usable. While unavailable the pick
    /// pass is skipped and every click misses.
    pub fn set_pick_available(&mut self, available: bool) {
        let available = available && self.pick_requested;
        if available != self.pick_available {
            if available {
                tracing::info!("picking enabled");
            } else {
                tracing::warn!("picking disabled, clicks will miss");
            }
        }
        self.pick_available = available;
    }

    pub fn pick_available(&self) -> bool {
        self.pick_available
    }

    pub fn process_entity(&mut self, entity: &Entity) {
        self.buffers.active_mut().submit(entity);
    }

    pub fn process_terrain(&mut self, terrain: &Terrain) {
        self.buffers.active_mut().submit_terrain(terrain);
    }

    /// Submit every entity and terrain tile of `scene`.
    pub fn submit_scene(&mut self, scene: &Scene) {
        for entity in scene.entities() {
            self.process_entity(entity);
        }
        for terrain in scene.terrains() {
            self.process_terrain(terrain);
        }
    }

    pub fn active(&self) -> &BatchMap {
        self.buffers.active()
    }

    pub fn last_used(&self) -> &BatchMap {
        self.buffers.last_used()
    }

    /// Build the draw plan for the active map.
    pub fn plan_frame(&self, scene: &Scene) -> FramePlan {
        let camera = scene.camera();
        let active = self.buffers.active();
        let mut encoder = PickEncoder::new();
        let mut groups = Vec::with_capacity(active.batch_count());
        let mut instances = Vec::with_capacity(active.instance_count());

        for (key, batch) in active.batches() {
            let (_, draw_index) = encoder.begin_group();
            let start = instances.len() as u32;
            for instance in &batch.instances {
                instances.push(InstanceDraw {
                    entity: instance.entity,
                    model_matrix: instance.transform.matrix(),
                    tex_offset: instance.tex_offset,
                    object_index: encoder.next_instance(),
                    draw_index,
                });
            }
            groups.push(GroupDraw {
                key: *key,
                mesh: batch.model.mesh,
                texture: batch.model.texture,
                cull_back_faces: self.toggles.culling() && !batch.model.texture.has_transparency,
                instances: start..instances.len() as u32,
            });
        }

        let terrains = active
            .terrains()
            .iter()
            .map(|t| TerrainDraw {
                mesh: t.mesh,
                texture: t.texture,
                model_matrix: t.transform.matrix(),
            })
            .collect();

        tracing::trace!(
            frame = self.frame,
            groups = groups.len(),
            instances = instances.len(),
            "frame planned"
        );

        FramePlan {
            frame: self.frame,
            viewport: self.projection.viewport(),
            projection: self.projection.matrix(),
            view: camera.view_matrix(),
            camera_position: camera.position(),
            sky_colour: scene.sky_colour,
            lights: LightBlock::from_lights(scene.lights()),
            shading: self.toggles.shading(),
            wireframe: self.toggles.wireframe(),
            culling: self.toggles.culling(),
            pick_enabled: self.pick_available,
            groups,
            instances,
            terrains,
        }
    }

    /// Hand the rendered map over to pick lookups and start a new frame.
    pub fn finish_frame(&mut self) {
        self.buffers.swap();
        self.frame += 1;
    }

    /// Instance for a decoded pick pixel, looked up in the last rendered
    /// frame. Background resolves to `None`.
    pub fn resolve_pick(&self, pixel: PickedPixel) -> Option<&Instance> {
        self.buffers.last_used().resolve_object(pixel.object_id)
    }

    /// Read the pick target at a window point and resolve it.
    pub fn pick_at(
        &self,
        target: &mut impl PickTarget,
        x: u32,
        y: u32,
    ) -> Result<Option<&Instance>, PickBufferError> {
        if !self.pick_available {
            return Ok(None);
        }
        let pixel = target.read_pixel_at(x, y)?;
        tracing::debug!(x, y, ?pixel, "picked pixel");
        Ok(self.resolve_pick(pixel))
    }

    /// Geometric fallback: nearest bounding sphere of the last rendered
    /// frame hit by the ray through window point `point`.
    pub fn ray_pick(&self, scene: &Scene, point: Vec2) -> Option<(EntityId, f32)> {
        let caster = RayCaster::new(self.projection.matrix(), self.projection.viewport());
        let ray = caster.ray_from(scene.camera(), point);
        self.buffers
            .last_used()
            .batches()
            .flat_map(|(_, batch)| {
                let radius = batch.model.mesh.bounding_radius;
                batch.instances.iter().map(move |i| (i, radius))
            })
            .filter_map(|(instance, radius)| {
                sphere_intersection(
                    &ray,
                    instance.transform.position,
                    radius * instance.transform.scale,
                )
                .map(|t| (instance.entity, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PickImage, TexelOrigin};
    use pickview_common::{ModelHandle, TextureHandle, Transform};
    use pickview_scene::{Camera, Light, TexturedModel};

    fn model(handle: u32, transparent: bool) -> TexturedModel {
        TexturedModel::new(
            Mesh {
                handle: ModelHandle(handle),
                vertex_count: 24,
                index_count: 36,
                bounding_radius: 1.0,
            },
            ModelTexture::new(TextureHandle(handle)).with_transparency(transparent),
        )
    }

    fn scene() -> Scene {
        let mut scene = Scene::new(Camera::new(Vec3::new(0.0, 0.0, 10.0), 0.0, 0.0, 0.0));
        scene.add_light(Light::new(Vec3::Y * 100.0, Vec3::ONE));
        scene.add_entity(Entity::new(model(2, false), Transform::at(Vec3::new(-2.0, 0.0, 0.0))));
        scene.add_entity(Entity::new(model(1, true), Transform::at(Vec3::new(0.0, 0.0, 0.0))));
        scene.add_entity(Entity::new(model(2, false), Transform::at(Vec3::new(2.0, 0.0, 0.0))));
        scene.add_entity(Entity::new(model(3, false), Transform::at(Vec3::new(0.0, 3.0, 0.0))));
        scene
    }

    fn orchestrator() -> RenderOrchestrator {
        RenderOrchestrator::new(&RenderConfig::default(), Viewport::new(700, 700))
    }

    #[test]
    fn nth_instance_gets_index_n_plus_one() {
        let scene = scene();
        let mut orch = orchestrator();
        orch.submit_scene(&scene);
        let plan = orch.plan_frame(&scene);
        let traversal: Vec<_> = orch.active().instances().map(|i| i.entity).collect();
        assert_eq!(plan.instances.len(), 4);
        for (n, draw) in plan.instances.iter().enumerate() {
            assert_eq!(draw.object_index, n as u32 + 1);
            assert_eq!(draw.entity, traversal[n]);
        }
        assert_eq!(plan.pick_index_sequence(), vec![0, 1, 0, 2, 3, 0, 4]);
    }

    #[test]
    fn groups_carry_draw_index_and_culling() {
        let scene = scene();
        let mut orch = orchestrator();
        orch.submit_scene(&scene);
        let plan = orch.plan_frame(&scene);
        assert_eq!(plan.groups.len(), 3);
        assert!(!plan.groups[0].cull_back_faces, "transparent group");
        assert!(plan.groups[1].cull_back_faces);
        assert_eq!(plan.group_instances(&plan.groups[1]).len(), 2);
        assert!(plan.group_instances(&plan.groups[1]).iter().all(|d| d.draw_index == 1));

        orch.toggles_mut().toggle_culling();
        let plan = orch.plan_frame(&scene);
        assert!(plan.groups.iter().all(|g| !g.cull_back_faces));
    }

    #[test]
    fn plan_reflects_toggles_and_scene() {
        let scene = scene();
        let mut orch = orchestrator();
        orch.toggles_mut().enable_flat_shading();
        orch.toggles_mut().set_wireframe(true);
        let plan = orch.plan_frame(&scene);
        assert_eq!(plan.shading, ShadingMode::Flat);
        assert!(plan.wireframe);
        assert_eq!(plan.sky_colour, scene.sky_colour);
        assert_eq!(plan.lights.used, 1);
        assert_eq!(plan.view, scene.camera().view_matrix());
        assert!(plan.groups.is_empty());
    }

    #[test]
    fn pick_resolves_against_last_rendered_frame() {
        let scene = scene();
        let mut orch = orchestrator();
        orch.submit_scene(&scene);
        let plan = orch.plan_frame(&scene);

        let mut target = PickImage::new(700, 700).unwrap();
        let third = plan.instances[2];
        target.fill_rect(
            100,
            200,
            10,
            10,
            PickedPixel {
                object_id: third.object_index,
                draw_id: third.draw_index,
                prim_id: 0,
            },
        );
        orch.finish_frame();
        assert!(orch.active().is_empty());

        let hit = orch.pick_at(&mut target, 105, 205).unwrap();
        assert_eq!(hit.map(|i| i.entity), Some(third.entity));
        assert!(orch.pick_at(&mut target, 5, 5).unwrap().is_none());

        // submissions for the next frame do not disturb lookups
        orch.submit_scene(&scene);
        let hit = orch.pick_at(&mut target, 105, 205).unwrap();
        assert_eq!(hit.map(|i| i.entity), Some(third.entity));
    }

    #[test]
    fn unavailable_pick_target_always_misses() {
        let scene = scene();
        let mut orch = orchestrator();
        orch.submit_scene(&scene);
        orch.set_pick_available(false);
        let plan = orch.plan_frame(&scene);
        assert!(!plan.pick_enabled);
        orch.finish_frame();
        let mut target = PickImage::new(4, 4).unwrap();
        target.fill_rect(0, 0, 4, 4, PickedPixel::from_texel([1.0, 0.0, 0.0]));
        assert!(orch.pick_at(&mut target, 1, 1).unwrap().is_none());
        orch.set_pick_available(true);
        assert!(orch.pick_at(&mut target, 1, 1).unwrap().is_some());
    }

    #[test]
    fn picking_disabled_in_config_stays_disabled() {
        let config = RenderConfig {
            picking: false,
            ..RenderConfig::default()
        };
        let mut orch = RenderOrchestrator::new(&config, Viewport::new(10, 10));
        orch.set_pick_available(true);
        assert!(!orch.pick_available());
    }

    #[test]
    fn ray_pick_finds_nearest_sphere() {
        let scene = scene();
        let mut orch = orchestrator();
        orch.submit_scene(&scene);
        orch.finish_frame();
        let (id, t) = orch.ray_pick(&scene, Vec2::new(350.0, 350.0)).unwrap();
        assert_eq!(id, scene.entities()[1].id);
        assert!((t - 9.0).abs() < 1e-3);
        assert!(orch.ray_pick(&scene, Vec2::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn y_flip_is_applied_before_lookup() {
        let img = PickImage::new(8, 8).unwrap();
        assert_eq!(TexelOrigin::BottomLeft.to_texel_y(0, 8), 7);
        assert_eq!(img.size(), (8, 8));
    }
}
