//! Animation Module
//!
//! - [`SkeletonRig`]: runtime bone accessor attached to a renderable
//! - [`RigFactory`]: injected rig construction
//! - [`AnimationData`]: named animation metadata

pub mod data;
pub mod rig;

pub use data::AnimationData;
pub use rig::{RestPoseRig, RestPoseRigFactory, RigFactory, SkeletonRig};
