#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! # Myth Skeleton
//!
//! Bone attachments and GPU skinning buffers for a scene graph.
//!
//! - [`SkeletonNode`] binds named bones of a rigged model to scene nodes and
//!   keeps them on their bones every animating frame.
//! - Moving a bound node by hand bends the mesh: the matching slots of the
//!   packed skinning buffer are rebuilt lazily before the next draw.
//! - [`FaceRegionsNode`] drives such a skeleton from a face tracker.

pub mod animation;
pub mod assets;
pub mod errors;
pub mod face;
pub mod renderable;
pub mod resources;
pub mod scene;
pub mod skeleton;
pub mod utils;

pub use animation::{AnimationData, RestPoseRig, RestPoseRigFactory, RigFactory, SkeletonRig};
pub use assets::{MaterialBoneMap, SkeletonDef};
pub use errors::{Result, SkeletonError};
pub use face::{FacePose, FaceRegion, FaceRegionsNode, FaceTracker};
pub use renderable::{ModelRenderable, RenderableInstance, SkinningModifier};
pub use resources::SkinningBuffer;
pub use scene::{Node, NodeHandle, Scene, SceneNode, TransformChange, TransformListener};
pub use skeleton::SkeletonNode;
pub use utils::{FrameTime, Timer};
