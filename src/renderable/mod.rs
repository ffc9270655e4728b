//! Renderable Module
//!
//! - [`ModelRenderable`]: model data carrying an optional skeleton rig
//! - [`RenderableInstance`]: per-node render state with the live bone buffer
//! - [`SkinningModifier`]: hook the render layer calls before uploading bones

pub mod instance;
pub mod model;

pub use instance::{RenderableInstance, SkinningModifier};
pub use model::{ModelRenderable, ModelRenderableBuilder};
