//! Bone pose propagation onto bound nodes.

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::animation::SkeletonRig;
use crate::scene::{NodeHandle, Scene};
use crate::skeleton::binding::{BoneBinding, BoneBindingTable, DirtyFlag};

/// Writes the rig's current bone poses into the local transforms of the
/// nodes bound to those bones.
pub struct TransformPropagator<'a> {
    skeleton: NodeHandle,
    rig: &'a dyn SkeletonRig,
    relative_transform: Option<Mat4>,
    bindings: &'a BoneBindingTable,
    aggregate: &'a DirtyFlag,
}

impl<'a> TransformPropagator<'a> {
    #[must_use]
    pub fn new(
        skeleton: NodeHandle,
        rig: &'a dyn SkeletonRig,
        relative_transform: Option<Mat4>,
        bindings: &'a BoneBindingTable,
        aggregate: &'a DirtyFlag,
    ) -> Self {
        Self {
            skeleton,
            rig,
            relative_transform,
            bindings,
            aggregate,
        }
    }

    /// Local matrix `node` needs so that it sits on bone `bone_index`.
    ///
    /// Nodes parented directly to the skeleton node (or not parented at all)
    /// take the skeleton-space pose as is; others are re-expressed relative
    /// to their own parent.
    #[must_use]
    pub fn bone_pose(&self, scene: &Scene, bone_index: usize, node: NodeHandle) -> Mat4 {
        let mut pose = self.rig.current_bone_transform(bone_index);
        if let Some(relative) = self.relative_transform {
            pose = relative * pose;
        }

        if let Some(parent) = scene.parent(node)
            && parent != self.skeleton
        {
            let skeleton_world = scene
                .world_matrix(self.skeleton)
                .map_or(Mat4::IDENTITY, Mat4::from);
            let parent_world = scene.world_matrix(parent).map_or(Mat4::IDENTITY, Mat4::from);
            pose = parent_world.inverse() * skeleton_world * pose;
        }
        pose
    }

    /// Snaps one bound node onto its bone.
    pub fn apply(&self, scene: &mut Scene, bone_index: usize, binding: &BoneBinding) {
        let node = binding.node();
        let pose = self.bone_pose(scene, bone_index, node);
        let (translation, rotation, scale) = decompose(&pose);

        let pending = self.aggregate.get();
        scene.set_local_transform(node, translation, rotation, scale);
        binding.dirty().clear();
        self.aggregate.replace(pending);
    }

    /// Refreshes every bound, active node in bone order.
    pub fn update_all(&self, scene: &mut Scene) {
        for bone_index in 0..self.rig.bone_count() {
            let Some(binding) = self.bindings.get(self.rig.bone_name(bone_index)) else {
                continue;
            };
            if !scene.is_active(binding.node()) {
                continue;
            }
            self.apply(scene, bone_index, binding);
        }
    }
}

/// Splits an affine matrix into translation, rotation and per-axis scale.
///
/// Scale is the length of each basis vector. A zero-length axis is left as is
/// when the rotation basis is normalized.
#[must_use]
pub fn decompose(matrix: &Mat4) -> (Vec3, Quat, Vec3) {
    let translation = matrix.w_axis.truncate();
    let axes = [
        matrix.x_axis.truncate(),
        matrix.y_axis.truncate(),
        matrix.z_axis.truncate(),
    ];
    let scale = Vec3::new(axes[0].length(), axes[1].length(), axes[2].length());

    let normalized = |axis: Vec3, length: f32| if length == 0.0 { axis } else { axis / length };
    let basis = Mat3::from_cols(
        normalized(axes[0], scale.x),
        normalized(axes[1], scale.y),
        normalized(axes[2], scale.z),
    );
    (translation, Quat::from_mat3(&basis), scale)
}
