//! Skinning buffer rebuilds.
//!
//! Only slots whose bound node moved since the last pass are recomputed. When
//! no slot is stale the previous buffer is handed back untouched; otherwise
//! it is copied once into a scratch buffer that persists across frames and
//! the stale slots are patched in place.

use glam::Mat4;

use crate::animation::SkeletonRig;
use crate::renderable::RenderableInstance;
use crate::resources::{FLOATS_PER_BONE, SkinningBuffer};
use crate::scene::{NodeHandle, Scene};
use crate::skeleton::binding::{BoneBindingTable, DirtyFlag};

/// Scratch storage reused by successive builds.
#[derive(Debug, Default)]
pub struct SkinningWorkspace {
    scratch: SkinningBuffer,
    written: bool,
}

impl SkinningWorkspace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn scratch(&self) -> &SkinningBuffer {
        &self.scratch
    }

    /// Whether the last build produced new data that was not committed yet.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.written
    }

    /// Moves the last build's result into `live`.
    ///
    /// Equal-length buffers are swapped so neither side reallocates.
    /// Returns `false` when there was nothing to commit.
    pub fn commit(&mut self, live: &mut SkinningBuffer) -> bool {
        if !self.written {
            return false;
        }
        if live.len() == self.scratch.len() {
            live.swap_contents(&mut self.scratch);
        } else {
            live.copy_from(self.scratch.as_slice());
        }
        self.written = false;
        true
    }
}

/// Computes skinning matrices for the bound slots of one skeleton.
pub struct SkinningBufferBuilder<'a> {
    scene: &'a Scene,
    skeleton: NodeHandle,
    rig: &'a dyn SkeletonRig,
    instance: Option<&'a RenderableInstance>,
    bindings: &'a BoneBindingTable,
    aggregate: &'a DirtyFlag,
}

impl<'a> SkinningBufferBuilder<'a> {
    #[must_use]
    pub fn new(
        scene: &'a Scene,
        skeleton: NodeHandle,
        rig: &'a dyn SkeletonRig,
        instance: Option<&'a RenderableInstance>,
        bindings: &'a BoneBindingTable,
        aggregate: &'a DirtyFlag,
    ) -> Self {
        Self {
            scene,
            skeleton,
            rig,
            instance,
            bindings,
            aggregate,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.aggregate.get()
    }

    /// Skinning matrix for `bone` driven by `node`.
    #[must_use]
    pub fn slot_matrix(&self, node: NodeHandle, bone: usize) -> Mat4 {
        let reparented = self
            .scene
            .parent(node)
            .is_some_and(|parent| parent != self.skeleton);

        let attachment = if reparented {
            let skeleton_world = self
                .scene
                .world_matrix(self.skeleton)
                .map_or(Mat4::IDENTITY, Mat4::from);
            let node_world = self.scene.world_matrix(node).map_or(Mat4::IDENTITY, Mat4::from);
            skeleton_world.inverse() * node_world
        } else {
            self.scene.local_matrix(node).map_or(Mat4::IDENTITY, Mat4::from)
        };

        let attachment = match self.instance.and_then(RenderableInstance::relative_transform_inverse) {
            Some(relative_inverse) => relative_inverse * attachment,
            None => attachment,
        };
        attachment * self.rig.reference_bone_transform(bone)
    }

    /// Rebuilds stale slots on top of `previous`.
    ///
    /// Returns `previous` itself when no slot needed work, otherwise the
    /// workspace scratch. The aggregate flag is cleared either way.
    ///
    /// # Panics
    /// Panics if `previous` does not hold one matrix per material bone.
    pub fn build<'b>(&self, previous: &'b [f32], workspace: &'b mut SkinningWorkspace) -> &'b [f32] {
        let slot_count = self.rig.material_bone_count();
        assert_eq!(
            previous.len(),
            slot_count * FLOATS_PER_BONE,
            "skinning buffer does not match material bone count {slot_count}"
        );

        let mut written = false;
        for slot in 0..slot_count {
            let bone = self.rig.material_bone_index(slot);
            let Some(binding) = self.bindings.get(self.rig.bone_name(bone)) else {
                continue;
            };
            let node = binding.node();
            if !binding.dirty().get() || !self.scene.is_active(node) {
                continue;
            }

            if !written {
                if workspace.scratch.copy_from(previous) {
                    log::trace!("Skinning scratch resized to {slot_count} slots");
                }
                written = true;
            }
            workspace.scratch.write_bone(slot, &self.slot_matrix(node, bone));
            binding.dirty().clear();
        }

        self.aggregate.clear();
        workspace.written = written;

        if written {
            workspace.scratch.as_slice()
        } else {
            previous
        }
    }
}
