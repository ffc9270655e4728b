//! Resource Module
//!
//! CPU-side data handed to the render layer:
//! - [`SkinningBuffer`]: packed per-bone matrices for vertex skinning

pub mod buffer;

pub use buffer::{BYTES_PER_BONE, FLOATS_PER_BONE, SkinningBuffer};
