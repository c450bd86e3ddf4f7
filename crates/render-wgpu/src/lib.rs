//! wgpu backend for the pickview render core.
//!
//! Executes a [`pickview_render::FramePlan`] in two passes: the picking
//! program into an offscreen float target, then the shading programs into
//! the window surface. Meshes and textures are uploaded through
//! [`GpuLoader`], which implements [`pickview_assets::ResourceLoader`].
//!
//! # Invariants
//! - The pick pass ends before the shaded pass begins, within one submit.
//! - The pick target clears to zero, so background reads as object `0`.
//! - Instance data is uploaded in plan order; instance `n` of the frame
//!   carries object index `n + 1`.
//! - The renderer never mutates scene state.

mod pick_buffer;
mod pipelines;
mod renderer;
mod resources;
pub mod shaders;
mod uniforms;

pub use pick_buffer::{GpuPickTarget, PickBuffer};
pub use pipelines::{DEPTH_FORMAT, PICK_FORMAT, PipelineKey, Program};
pub use renderer::SceneRenderer;
pub use resources::{GpuLoader, GpuMesh, GpuResources, GpuTexture};
pub use uniforms::{FrameUniforms, InstanceData, MaterialUniforms, Vertex};

use pickview_render::PickBufferError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shader program {program} failed to compile: {message}")]
    ShaderCompile {
        program: &'static str,
        message: String,
    },
    #[error("pipeline for {program} rejected: {message}")]
    Pipeline {
        program: &'static str,
        message: String,
    },
    #[error(transparent)]
    PickBuffer(#[from] PickBufferError),
}

pub fn crate_info() -> &'static str {
    "pickview-render-wgpu v0.1.0"
}
