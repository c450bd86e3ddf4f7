use std::collections::BTreeMap;

use pickview_assets::{AssetError, Mesh, MeshData, ResourceLoader, TextureData};
use pickview_common::{ModelHandle, TextureHandle};
use wgpu::util::DeviceExt;

use crate::uniforms::interleave;

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

pub struct GpuTexture {
    texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

/// GPU-resident meshes and textures, keyed by the handles given out by
/// [`GpuLoader`].
pub struct GpuResources {
    sampler: wgpu::Sampler,
    meshes: BTreeMap<ModelHandle, GpuMesh>,
    textures: BTreeMap<TextureHandle, GpuTexture>,
    next_model: u32,
    next_texture: u32,
}

impl GpuResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("model_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            sampler,
            meshes: BTreeMap::new(),
            textures: BTreeMap::new(),
            next_model: 0,
            next_texture: 0,
        }
    }

    pub fn mesh(&self, handle: ModelHandle) -> Option<&GpuMesh> {
        self.meshes.get(&handle)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(&handle)
    }

    pub fn model_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

/// Uploads through a device and queue into [`GpuResources`].
pub struct GpuLoader<'a> {
    pub(crate) device: &'a wgpu::Device,
    pub(crate) queue: &'a wgpu::Queue,
    pub(crate) texture_layout: &'a wgpu::BindGroupLayout,
    pub(crate) resources: &'a mut GpuResources,
}

impl ResourceLoader for GpuLoader<'_> {
    fn load_model(&mut self, mesh: &MeshData) -> Result<Mesh, AssetError> {
        mesh.validate()?;
        let vertices = interleave(mesh);
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model_index_buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let res = &mut *self.resources;
        res.next_model += 1;
        let handle = ModelHandle(res.next_model);
        let index_count = mesh.index_count() as u32;
        res.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count,
            },
        );
        tracing::debug!(model = handle.0, vertices = vertices.len(), index_count, "model uploaded");
        Ok(Mesh {
            handle,
            vertex_count: vertices.len() as u32,
            index_count,
            bounding_radius: mesh.bounding_radius(),
        })
    }

    fn load_texture(&mut self, data: &TextureData) -> Result<TextureHandle, AssetError> {
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("model_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * data.width),
                rows_per_image: Some(data.height),
            },
            size,
        );
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(AssetError::Upload(err.to_string()));
        }

        let res = &mut *self.resources;
        let view = texture.create_view(&Default::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture_bind_group"),
            layout: self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&res.sampler),
                },
            ],
        });
        res.next_texture += 1;
        let handle = TextureHandle(res.next_texture);
        res.textures.insert(handle, GpuTexture { texture, bind_group });
        tracing::debug!(texture = handle.0, width = data.width, height = data.height, "texture uploaded");
        Ok(handle)
    }

    fn release_model(&mut self, handle: ModelHandle) {
        if let Some(mesh) = self.resources.meshes.remove(&handle) {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if let Some(texture) = self.resources.textures.remove(&handle) {
            texture.texture.destroy();
        }
    }
}
