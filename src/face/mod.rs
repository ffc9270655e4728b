//! Face regions.
//!
//! [`FaceRegionsNode`] drives a face-regions model from a face tracker: the
//! node follows the tracked face's center pose and one child node per
//! [`FaceRegion`] follows the region's pose. The region nodes are bound to
//! the bones of the same name, so anything attached to them (or skinned by
//! those bones) tracks the face.

use std::f32::consts::PI;

use glam::{Quat, Vec3};

use crate::errors::Result;
use crate::renderable::ModelRenderable;
use crate::scene::{Node, NodeHandle, Scene};
use crate::skeleton::SkeletonNode;
use crate::utils::FrameTime;

/// Tracked face regions, each driving the bone with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceRegion {
    NoseTip,
    ForeheadLeft,
    ForeheadRight,
}

impl FaceRegion {
    pub const ALL: [FaceRegion; 3] = [
        FaceRegion::NoseTip,
        FaceRegion::ForeheadLeft,
        FaceRegion::ForeheadRight,
    ];

    #[must_use]
    pub fn bone_name(self) -> &'static str {
        match self {
            FaceRegion::NoseTip => "NOSE_TIP",
            FaceRegion::ForeheadLeft => "FOREHEAD_LEFT",
            FaceRegion::ForeheadRight => "FOREHEAD_RIGHT",
        }
    }
}

/// World-space pose reported by a tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl FacePose {
    #[must_use]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }
}

/// Source of tracked face poses.
pub trait FaceTracker {
    fn is_tracking(&self) -> bool;

    fn center_pose(&self) -> FacePose;

    fn region_pose(&self, region: FaceRegion) -> FacePose;
}

/// Node hierarchy following a tracked face.
///
/// Call [`FaceRegionsNode::clear`] before dropping it.
#[derive(Debug)]
pub struct FaceRegionsNode {
    node: NodeHandle,
    skeleton: SkeletonNode,
}

impl FaceRegionsNode {
    /// Builds the face node, its skeleton child and one region node per bone.
    pub fn new(scene: &mut Scene) -> Result<Self> {
        let node = scene.create_node_with_name("FaceRegionsNode");
        let skeleton_node = scene.add_to_parent(Node::with_name("FaceRegionsSkeleton"), node)?;
        let mut skeleton = SkeletonNode::with_node(skeleton_node);

        for region in FaceRegion::ALL {
            let region_node = scene.add_to_parent(Node::with_name(region.bone_name()), skeleton_node)?;
            skeleton.set_bone_attachment(scene, region.bone_name(), Some(region_node))?;
        }

        Ok(Self { node, skeleton })
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> &SkeletonNode {
        &self.skeleton
    }

    #[inline]
    pub fn skeleton_mut(&mut self) -> &mut SkeletonNode {
        &mut self.skeleton
    }

    /// Node bound to a region's bone.
    #[must_use]
    pub fn region_node(&self, region: FaceRegion) -> Option<NodeHandle> {
        self.skeleton.bone_attachment(region.bone_name())
    }

    pub fn set_regions_renderable(&mut self, scene: &mut Scene, renderable: Option<ModelRenderable>) {
        self.skeleton.set_renderable(scene, renderable);
    }

    #[must_use]
    pub fn regions_renderable(&self) -> Option<&ModelRenderable> {
        self.skeleton.renderable()
    }

    /// Releases the region bindings and their scene listeners.
    pub fn clear(&mut self, scene: &mut Scene) {
        self.skeleton.clear_bone_attachments(scene);
    }

    /// Per-frame tick. Regions are only shown while the tracker is tracking.
    pub fn update(&mut self, scene: &mut Scene, frame: &FrameTime, tracker: Option<&dyn FaceTracker>) {
        let tracker = tracker.filter(|t| t.is_tracking());
        scene.set_enabled(self.skeleton.node(), tracker.is_some());

        if let Some(tracker) = tracker {
            let center = tracker.center_pose();
            scene
                .node(self.node)
                .set_world_position(center.translation)
                .set_world_rotation(center.rotation);

            // Region bones are authored facing -Z.
            let flip = Quat::from_rotation_y(PI);
            for region in FaceRegion::ALL {
                let Some(region_node) = self.region_node(region) else {
                    continue;
                };
                let pose = tracker.region_pose(region);
                scene
                    .node(region_node)
                    .set_world_position(pose.translation)
                    .set_world_rotation(pose.rotation * flip);
            }
        }

        self.skeleton.on_update(scene, frame);
    }
}
