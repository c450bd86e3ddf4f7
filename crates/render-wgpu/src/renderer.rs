use pickview_common::Viewport;
use pickview_render::{FramePlan, PickBufferError};

use crate::pick_buffer::{GpuPickTarget, PickBuffer};
use crate::pipelines::{DEPTH_FORMAT, PipelineKey, Pipelines, Program};
use crate::resources::{GpuLoader, GpuResources};
use crate::uniforms::{self, FrameUniforms, InstanceData, MATERIAL_STRIDE};
use crate::RenderError;

/// Executes [`FramePlan`]s with wgpu: the pick pass into the offscreen
/// [`PickBuffer`], then the shaded pass into the caller's target.
pub struct SceneRenderer {
    pipelines: Pipelines,
    resources: GpuResources,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
    material_capacity: u64,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u64,
    depth_view: wgpu::TextureView,
    pick: Option<PickBuffer>,
    viewport: Viewport,
    wireframe_warned: bool,
}

impl SceneRenderer {
    /// Build pipelines for `surface_format`. Fails if any program does not
    /// compile. A pick buffer that cannot be created is not fatal: the
    /// renderer runs without one and [`Self::pick_ready`] reports false.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
    ) -> Result<Self, RenderError> {
        let line_mode = device.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        let pipelines = Pipelines::new(device, surface_format, line_mode)?;
        let resources = GpuResources::new(device);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &pipelines.frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let material_capacity = 16;
        let (material_buffer, material_bind_group) =
            Self::create_materials(device, &pipelines, material_capacity);
        let instance_capacity = 256;
        let instance_buffer = Self::create_instances(device, instance_capacity);
        let depth_view = Self::create_depth_texture(device, viewport);
        let pick = match PickBuffer::new(device, viewport.width, viewport.height) {
            Ok(pick) => Some(pick),
            Err(err) => {
                tracing::warn!(%err, "pick buffer unavailable");
                None
            }
        };

        Ok(Self {
            pipelines,
            resources,
            frame_buffer,
            frame_bind_group,
            material_buffer,
            material_bind_group,
            material_capacity,
            instance_buffer,
            instance_capacity,
            depth_view,
            pick,
            viewport,
            wireframe_warned: false,
        })
    }

    pub fn resources(&self) -> &GpuResources {
        &self.resources
    }

    /// Borrow as a [`pickview_assets::ResourceLoader`] for one loading
    /// session.
    pub fn loader<'a>(&'a mut self, device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> GpuLoader<'a> {
        GpuLoader {
            device,
            queue,
            texture_layout: &self.pipelines.texture_layout,
            resources: &mut self.resources,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn pick_ready(&self) -> bool {
        self.pick.is_some()
    }

    /// Pick target for reading back the last rendered frame.
    pub fn pick_target<'a>(
        &'a self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
    ) -> Option<GpuPickTarget<'a>> {
        self.pick.as_ref().map(|pick| GpuPickTarget { pick, device, queue })
    }

    /// Recreate size-dependent attachments. On error the pick buffer is
    /// dropped until the next successful resize.
    pub fn resize(&mut self, device: &wgpu::Device, viewport: Viewport) -> Result<(), PickBufferError> {
        self.viewport = viewport;
        self.depth_view = Self::create_depth_texture(device, viewport);
        if let Some(old) = self.pick.take() {
            old.destroy();
        }
        let pick = PickBuffer::new(device, viewport.width, viewport.height)?;
        self.pick = Some(pick);
        Ok(())
    }

    /// Draw one frame into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        plan: &FramePlan,
    ) {
        let line_mode = plan.wireframe && self.pipelines.supports_line_mode();
        if plan.wireframe && !line_mode && !self.wireframe_warned {
            tracing::warn!("POLYGON_MODE_LINE unavailable, wireframe drawn as untextured fill");
            self.wireframe_warned = true;
        }

        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_plan(plan)),
        );

        let instances = uniforms::pack_instances(plan);
        if !instances.is_empty() {
            self.ensure_instance_capacity(device, instances.len() as u64);
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        let materials = uniforms::pack_materials(plan);
        if !materials.is_empty() {
            self.ensure_material_capacity(device, materials.len() as u64 / MATERIAL_STRIDE);
            queue.write_buffer(&self.material_buffer, 0, &materials);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        if plan.pick_enabled {
            if let Some(pick) = &self.pick {
                let mut pass = pick.begin_write(&mut encoder);
                self.draw_pick_pass(&mut pass, plan);
            }
        }

        {
            let sky = plan.sky_colour.as_dvec3();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shaded_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: sky.x,
                            g: sky.y,
                            b: sky.z,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            self.draw_shaded_pass(&mut pass, plan, line_mode);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_pick_pass(&self, pass: &mut wgpu::RenderPass<'_>, plan: &FramePlan) {
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        for (slot, group) in plan.groups.iter().enumerate() {
            let key = PipelineKey {
                program: Program::Picking,
                cull_back_faces: group.cull_back_faces,
                line_mode: false,
            };
            self.draw_group(
                pass,
                key,
                group.key.model,
                group.key.texture,
                slot,
                group.instances.clone(),
            );
        }
    }

    fn draw_shaded_pass(&self, pass: &mut wgpu::RenderPass<'_>, plan: &FramePlan, line_mode: bool) {
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        let entity_program = Program::entity(plan.shading);
        for (slot, group) in plan.groups.iter().enumerate() {
            let key = PipelineKey {
                program: entity_program,
                cull_back_faces: group.cull_back_faces,
                line_mode,
            };
            self.draw_group(
                pass,
                key,
                group.key.model,
                group.key.texture,
                slot,
                group.instances.clone(),
            );
        }

        let first_terrain = plan.instances.len() as u32;
        for (i, terrain) in plan.terrains.iter().enumerate() {
            let key = PipelineKey {
                program: Program::Terrain,
                cull_back_faces: plan.culling,
                line_mode,
            };
            let instance = first_terrain + i as u32;
            self.draw_group(
                pass,
                key,
                terrain.mesh.handle,
                terrain.texture.handle,
                plan.groups.len() + i,
                instance..instance + 1,
            );
        }
    }

    fn draw_group(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        key: PipelineKey,
        model: pickview_common::ModelHandle,
        texture: pickview_common::TextureHandle,
        material_slot: usize,
        instances: std::ops::Range<u32>,
    ) {
        let (Some(mesh), Some(tex)) = (self.resources.mesh(model), self.resources.texture(texture))
        else {
            tracing::warn!(model = model.0, texture = texture.0, "missing resource, group skipped");
            return;
        };
        let Some(pipeline) = self.pipelines.get(key) else {
            return;
        };
        let offset = (material_slot as u64 * MATERIAL_STRIDE) as u32;
        pass.set_pipeline(pipeline);
        pass.set_bind_group(1, &tex.bind_group, &[]);
        pass.set_bind_group(2, &self.material_bind_group, &[offset]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, instances);
    }

    fn ensure_instance_capacity(&mut self, device: &wgpu::Device, needed: u64) {
        if needed > self.instance_capacity {
            self.instance_capacity = needed.next_power_of_two();
            self.instance_buffer = Self::create_instances(device, self.instance_capacity);
            tracing::debug!(capacity = self.instance_capacity, "instance buffer grown");
        }
    }

    fn ensure_material_capacity(&mut self, device: &wgpu::Device, needed: u64) {
        if needed > self.material_capacity {
            self.material_capacity = needed.next_power_of_two();
            let (buffer, bind_group) =
                Self::create_materials(device, &self.pipelines, self.material_capacity);
            self.material_buffer = buffer;
            self.material_bind_group = bind_group;
        }
    }

    fn create_instances(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: capacity * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_materials(
        device: &wgpu::Device,
        pipelines: &Pipelines,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("material_uniforms"),
            size: capacity * MATERIAL_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout: &pipelines.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: std::num::NonZeroU64::new(
                        std::mem::size_of::<uniforms::MaterialUniforms>() as u64,
                    ),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_depth_texture(device: &wgpu::Device, viewport: Viewport) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: viewport.width.max(1),
                height: viewport.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}
