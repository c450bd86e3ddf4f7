//! Rendering core: everything about a frame that does not need a GPU.
//!
//! Entities and terrain tiles are submitted into a double-buffered
//! [`BatchMap`]; [`RenderOrchestrator::plan_frame`] turns the active map into
//! a [`FramePlan`] (pick pass then shaded pass) for a backend to execute;
//! [`RenderOrchestrator::finish_frame`] swaps the buffers so pick queries
//! see the frame that was just drawn.
//!
//! # Invariants
//! - Traversal order of a batch map is key order, then submission order;
//!   the Nth instance in that order has pick index `N + 1`.
//! - Pick lookups only read the last-used map, never the active one.
//! - Every light uniform slot is populated; unused slots are black with
//!   neutral attenuation.

pub mod batch;
pub mod config;
mod frame;
mod lights;
mod pick;
mod projection;
pub mod ray;
mod renderer;
mod toggles;

pub use batch::{Batch, BatchBuffers, BatchKey, BatchMap, Instance, MaterialKey, TerrainInstance};
pub use config::{ConfigError, ProjectionConfig, RenderConfig, WindowConfig};
pub use frame::{FramePlan, GroupDraw, InstanceDraw, RenderOrchestrator, TerrainDraw};
pub use lights::{LightBlock, MAX_LIGHTS, NEUTRAL_ATTENUATION};
pub use pick::{PickBufferError, PickEncoder, PickImage, PickTarget, PickedPixel, TexelOrigin};
pub use projection::Projection;
pub use ray::{Ray, RayCaster};
pub use renderer::{DebugTextRenderer, Renderer};
pub use toggles::{RenderToggles, ShadingMode};

pub fn crate_info() -> &'static str {
    "pickview-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
