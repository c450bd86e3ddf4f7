use std::collections::HashMap;
use std::num::NonZeroU64;

use pickview_render::ShadingMode;

use crate::RenderError;
use crate::shaders;
use crate::uniforms::{InstanceData, MaterialUniforms, Vertex};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    EntitySmooth,
    EntityFlat,
    Terrain,
    Picking,
}

impl Program {
    pub fn entity(shading: ShadingMode) -> Self {
        match shading {
            ShadingMode::Smooth => Program::EntitySmooth,
            ShadingMode::Flat => Program::EntityFlat,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Program::EntitySmooth => "entity_smooth",
            Program::EntityFlat => "entity_flat",
            Program::Terrain => "terrain",
            Program::Picking => "picking",
        }
    }

    fn source(self) -> String {
        match self {
            Program::EntitySmooth => shaders::entity_source(ShadingMode::Smooth),
            Program::EntityFlat => shaders::entity_source(ShadingMode::Flat),
            Program::Terrain => shaders::terrain_source(),
            Program::Picking => shaders::picking_source(),
        }
    }

    fn entry_points(self) -> (&'static str, &'static str) {
        match self {
            Program::EntitySmooth | Program::EntityFlat => ("vs_entity", "fs_entity"),
            Program::Terrain => ("vs_terrain", "fs_terrain"),
            Program::Picking => ("vs_pick", "fs_pick"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: Program,
    pub cull_back_faces: bool,
    pub line_mode: bool,
}

/// Every pipeline variant the frame can ask for, created up front.
pub struct Pipelines {
    pub frame_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub material_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    line_mode: bool,
}

impl Pipelines {
    /// `line_mode` requests polygon-line variants; the device must have
    /// `POLYGON_MODE_LINE`.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        line_mode: bool,
    ) -> Result<Self, RenderError> {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<MaterialUniforms>() as u64),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("model_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &texture_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::new();
        for program in [
            Program::EntitySmooth,
            Program::EntityFlat,
            Program::Terrain,
            Program::Picking,
        ] {
            let module = compile(device, program)?;
            let format = match program {
                Program::Picking => PICK_FORMAT,
                _ => surface_format,
            };
            let line_variants: &[bool] = match program {
                Program::Picking => &[false],
                _ if line_mode => &[false, true],
                _ => &[false],
            };
            for &cull_back_faces in &[false, true] {
                for &line in line_variants {
                    let key = PipelineKey {
                        program,
                        cull_back_faces,
                        line_mode: line,
                    };
                    let pipeline = build(device, &module, &layout, format, key)?;
                    pipelines.insert(key, pipeline);
                }
            }
        }
        tracing::debug!(count = pipelines.len(), line_mode, "pipelines created");

        Ok(Self {
            frame_layout,
            texture_layout,
            material_layout,
            pipelines,
            line_mode,
        })
    }

    pub fn supports_line_mode(&self) -> bool {
        self.line_mode
    }

    pub fn get(&self, key: PipelineKey) -> Option<&wgpu::RenderPipeline> {
        let key = PipelineKey {
            line_mode: key.line_mode && self.line_mode,
            ..key
        };
        self.pipelines.get(&key)
    }
}

fn compile(device: &wgpu::Device, program: Program) -> Result<wgpu::ShaderModule, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program.label()),
        source: wgpu::ShaderSource::Wgsl(program.source().into()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::ShaderCompile {
            program: program.label(),
            message: err.to_string(),
        });
    }
    Ok(module)
}

fn build(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    key: PipelineKey,
) -> Result<wgpu::RenderPipeline, RenderError> {
    let (vs, fs) = key.program.entry_points();
    let blend = match key.program {
        Program::Picking => None,
        _ => Some(wgpu::BlendState::REPLACE),
    };
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(key.program.label()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some(vs),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout(), InstanceData::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: key.cull_back_faces.then_some(wgpu::Face::Back),
            polygon_mode: if key.line_mode {
                wgpu::PolygonMode::Line
            } else {
                wgpu::PolygonMode::Fill
            },
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::Pipeline {
            program: key.program.label(),
            message: err.to_string(),
        });
    }
    Ok(pipeline)
}
