//! Utility Module
//!
//! - [`time`]: frame timer and per-frame timing snapshot

pub mod time;

pub use time::{FrameTime, Timer};
