//! Byte layouts shared with the WGSL programs, and packing from a
//! [`FramePlan`].

use bytemuck::{Pod, Zeroable};
use pickview_assets::MeshData;
use pickview_render::{FramePlan, MAX_LIGHTS};
use pickview_scene::ModelTexture;

/// Dynamic-offset stride for the material block.
pub const MATERIAL_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub projection_matrix: [[f32; 4]; 4],
    pub view_matrix: [[f32; 4]; 4],
    pub light_position: [[f32; 4]; MAX_LIGHTS],
    pub light_colour: [[f32; 4]; MAX_LIGHTS],
    pub attenuation: [[f32; 4]; MAX_LIGHTS],
    pub sky_colour: [f32; 4],
    pub camera_position: [f32; 4],
    pub wireframe: f32,
    pub _pad: [f32; 3],
}

impl FrameUniforms {
    /// The wireframe flag follows the plan whatever the raster mode, so
    /// outlines are never textured.
    pub fn from_plan(plan: &FramePlan) -> Self {
        let lights = &plan.lights;
        Self {
            projection_matrix: plan.projection.to_cols_array_2d(),
            view_matrix: plan.view.to_cols_array_2d(),
            light_position: lights.positions.map(|p| p.extend(1.0).to_array()),
            light_colour: lights.colours.map(|c| c.extend(1.0).to_array()),
            attenuation: lights.attenuations.map(|a| a.extend(0.0).to_array()),
            sky_colour: plan.sky_colour.extend(1.0).to_array(),
            camera_position: plan.camera_position.extend(1.0).to_array(),
            wireframe: if plan.wireframe { 1.0 } else { 0.0 },
            _pad: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub shine_damper: f32,
    pub reflectivity: f32,
    pub use_fake_lighting: f32,
    pub number_of_texture_rows: f32,
}

impl From<&ModelTexture> for MaterialUniforms {
    fn from(texture: &ModelTexture) -> Self {
        Self {
            shine_damper: texture.shine_damper,
            reflectivity: texture.reflectivity,
            use_fake_lighting: if texture.use_fake_lighting { 1.0 } else { 0.0 },
            number_of_texture_rows: texture.number_of_rows() as f32,
        }
    }
}

/// Materials for every group then every terrain tile, each padded to
/// [`MATERIAL_STRIDE`].
pub fn pack_materials(plan: &FramePlan) -> Vec<u8> {
    let textures = plan
        .groups
        .iter()
        .map(|g| &g.texture)
        .chain(plan.terrains.iter().map(|t| &t.texture));
    let mut bytes = Vec::new();
    for texture in textures {
        let start = bytes.len();
        bytes.extend_from_slice(bytemuck::bytes_of(&MaterialUniforms::from(texture)));
        bytes.resize(start + MATERIAL_STRIDE as usize, 0);
    }
    bytes
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleave a mesh's attribute streams. Expects a validated mesh.
pub fn interleave(mesh: &MeshData) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .zip(&mesh.tex_coords)
        .zip(&mesh.normals)
        .map(|((&position, &tex_coords), &normal)| Vertex {
            position,
            tex_coords,
            normal,
        })
        .collect()
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub tex_offset: [f32; 2],
    pub object_index: f32,
    pub draw_index: f32,
}

impl InstanceData {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x2,
        8 => Float32,
        9 => Float32,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    fn new(model: glam::Mat4, tex_offset: glam::Vec2, object_index: u32, draw_index: u32) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            tex_offset: tex_offset.to_array(),
            object_index: object_index as f32,
            draw_index: draw_index as f32,
        }
    }
}

/// Entity instances in plan order, then one instance per terrain tile.
/// Terrain instances carry object index `0`.
pub fn pack_instances(plan: &FramePlan) -> Vec<InstanceData> {
    let entities = plan
        .instances
        .iter()
        .map(|d| InstanceData::new(d.model_matrix, d.tex_offset, d.object_index, d.draw_index));
    let terrains = plan
        .terrains
        .iter()
        .map(|t| InstanceData::new(t.model_matrix, glam::Vec2::ZERO, 0, 0));
    entities.chain(terrains).collect()
}
