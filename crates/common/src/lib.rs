//! Shared types for the pickview engine: entity ids, opaque GPU resource
//! handles, entity placement and viewport size.

mod types;

pub use types::{EntityId, ModelHandle, TextureHandle, Transform, Viewport};
