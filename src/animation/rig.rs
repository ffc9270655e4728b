//! Skeleton rigs.
//!
//! A [`SkeletonRig`] is the runtime view of a skeleton attached to a
//! renderable: bone lookup, the current pose of every bone and the initial
//! skinning buffer. The base implementation, [`RestPoseRig`], only reproduces
//! the reference pose; animated rigs override [`SkeletonRig::current_bone_transform`]
//! and [`SkeletonRig::is_animating`].
//!
//! Rigs are created through an injected [`RigFactory`].

use std::fmt::Debug;
use std::sync::Arc;

use glam::Mat4;

use crate::assets::{MaterialBoneMap, NO_PARENT, SkeletonDef};
use crate::resources::SkinningBuffer;

/// Runtime accessor for a skeleton and its material-bone slots.
///
/// Index arguments are contract-checked: an out-of-range bone index or
/// material slot panics with the offending index and the valid count.
pub trait SkeletonRig: Debug {
    fn skeleton(&self) -> &SkeletonDef;

    fn material_bones(&self) -> &MaterialBoneMap;

    /// Initial skinning buffer, one identity slot per material bone.
    fn material_bone_transforms(&self) -> &SkinningBuffer;

    fn boxed_clone(&self) -> Box<dyn SkeletonRig>;

    #[inline]
    fn bone_count(&self) -> usize {
        self.skeleton().bone_count()
    }

    #[track_caller]
    fn bone_name(&self, index: usize) -> &str {
        let count = self.bone_count();
        match self.skeleton().bone_name(index) {
            Some(name) => name,
            None => panic!("bone index out of range. index={index}, bone_count={count}"),
        }
    }

    /// Parent bone index, `None` for roots.
    #[track_caller]
    fn bone_parent_index(&self, index: usize) -> Option<usize> {
        let count = self.bone_count();
        match self.skeleton().bone_parent(index) {
            Some(NO_PARENT) => None,
            Some(parent) => Some(usize::from(parent)),
            None => panic!("bone index out of range. index={index}, bone_count={count}"),
        }
    }

    #[inline]
    fn material_bone_count(&self) -> usize {
        self.material_bones().len()
    }

    /// Skeleton bone index feeding shader slot `slot`.
    #[track_caller]
    fn material_bone_index(&self, slot: usize) -> usize {
        let count = self.material_bone_count();
        match self.material_bones().get(slot) {
            Some(bone) => bone,
            None => panic!(
                "material bone index out of range. index={slot}, material_bone_count={count}"
            ),
        }
    }

    /// Linear search by name.
    fn bone_index(&self, name: &str) -> Option<usize> {
        self.skeleton().find_bone(name)
    }

    /// The stored bind-relative matrix of a bone.
    #[track_caller]
    fn reference_bone_transform(&self, index: usize) -> Mat4 {
        let count = self.bone_count();
        match self.skeleton().bone_matrix(index) {
            Some(matrix) => matrix,
            None => panic!("bone index out of range. index={index}, bone_count={count}"),
        }
    }

    /// Current bone pose in skeleton space.
    ///
    /// The base pose is the inverse of the reference matrix.
    #[track_caller]
    fn current_bone_transform(&self, index: usize) -> Mat4 {
        self.reference_bone_transform(index).inverse()
    }

    fn is_animating(&self) -> bool {
        false
    }

    /// Called after the animation engine advanced; rigs that evaluate poses
    /// lazily refresh them here.
    fn update_bone_transforms(&mut self) {}
}

impl Clone for Box<dyn SkeletonRig> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Rig that always sits in the reference pose.
#[derive(Debug, Clone)]
pub struct RestPoseRig {
    skeleton: Arc<SkeletonDef>,
    material_bones: Arc<MaterialBoneMap>,
    initial_transforms: SkinningBuffer,
}

impl RestPoseRig {
    #[must_use]
    pub fn new(skeleton: Arc<SkeletonDef>, material_bones: Arc<MaterialBoneMap>) -> Self {
        let initial_transforms = SkinningBuffer::identity(material_bones.len());
        Self {
            skeleton,
            material_bones,
            initial_transforms,
        }
    }
}

impl SkeletonRig for RestPoseRig {
    fn skeleton(&self) -> &SkeletonDef {
        &self.skeleton
    }

    fn material_bones(&self) -> &MaterialBoneMap {
        &self.material_bones
    }

    fn material_bone_transforms(&self) -> &SkinningBuffer {
        &self.initial_transforms
    }

    fn boxed_clone(&self) -> Box<dyn SkeletonRig> {
        Box::new(self.clone())
    }
}

/// Creates rigs for renderables. May decline by returning `None`.
pub trait RigFactory {
    fn create(
        &self,
        skeleton: Arc<SkeletonDef>,
        material_bones: Arc<MaterialBoneMap>,
    ) -> Option<Box<dyn SkeletonRig>>;
}

impl<F> RigFactory for F
where
    F: Fn(Arc<SkeletonDef>, Arc<MaterialBoneMap>) -> Option<Box<dyn SkeletonRig>>,
{
    fn create(
        &self,
        skeleton: Arc<SkeletonDef>,
        material_bones: Arc<MaterialBoneMap>,
    ) -> Option<Box<dyn SkeletonRig>> {
        self(skeleton, material_bones)
    }
}

/// Default factory producing [`RestPoseRig`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestPoseRigFactory;

impl RigFactory for RestPoseRigFactory {
    fn create(
        &self,
        skeleton: Arc<SkeletonDef>,
        material_bones: Arc<MaterialBoneMap>,
    ) -> Option<Box<dyn SkeletonRig>> {
        Some(Box::new(RestPoseRig::new(skeleton, material_bones)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn rig() -> RestPoseRig {
        let skeleton = SkeletonDef::builder("arm")
            .bone("shoulder", None, Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)))
            .bone("elbow", Some(0), Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)))
            .build()
            .unwrap();
        RestPoseRig::new(Arc::new(skeleton), Arc::new(MaterialBoneMap::new(vec![1])))
    }

    #[test]
    fn rest_pose_is_inverse_reference() {
        let rig = rig();
        let current = rig.current_bone_transform(1);
        assert!(current.abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)), 1e-6));
        assert!(!rig.is_animating());
    }

    #[test]
    fn parent_indices() {
        let rig = rig();
        assert_eq!(rig.bone_parent_index(0), None);
        assert_eq!(rig.bone_parent_index(1), Some(0));
        assert_eq!(rig.material_bone_index(0), 1);
    }

    #[test]
    fn initial_buffer_matches_slot_count() {
        let rig = rig();
        assert_eq!(rig.material_bone_transforms().bone_count(), 1);
    }

    #[test]
    #[should_panic(expected = "material bone index out of range")]
    fn material_slot_out_of_range() {
        let _ = rig().material_bone_index(1);
    }
}
