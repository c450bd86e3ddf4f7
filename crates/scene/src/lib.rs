//! Scene state for the pickview engine: orbit cameras, lights, textured
//! models, entities and terrain tiles.
//!
//! # Invariants
//! - A camera's position and view matrix always match its target, zoom and
//!   orbit angles; the vertical angle stays in `[-90, 90]`, zoom stays `>= 0`.
//! - A disabled light keeps its colour; only the effective colour is zero.
//! - Atlas indices are clamped to `[0, rows * rows - 1]`.
//! - Entity order is insertion order.

mod camera;
pub mod demo;
mod entity;
mod light;
mod model;
mod scene;
mod terrain;

pub use camera::{Camera, CameraRegistry, CameraState, STANDARD_ZOOM};
pub use entity::{Entity, EntityAction};
pub use light::Light;
pub use model::{ModelTexture, TexturedModel};
pub use scene::{DEFAULT_SKY_COLOUR, Scene};
pub use terrain::Terrain;
