//! Skeleton Module
//!
//! [`SkeletonNode`] binds named bones of a rigged [`ModelRenderable`] to
//! arbitrary scene nodes:
//!
//! - every animating frame, bound nodes are moved onto their bones
//!   ([`TransformPropagator`])
//! - when a bound node is moved by anything else, the matching skinning slot
//!   is rebuilt so the mesh follows it ([`SkinningBufferBuilder`])
//!
//! # Example
//!
//! ```rust,ignore
//! let mut skeleton = SkeletonNode::new(&mut scene);
//! skeleton.set_renderable(&mut scene, Some(model));
//! skeleton.set_bone_attachment(&mut scene, "head", Some(hat))?;
//!
//! // per frame
//! skeleton.on_update(&mut scene, &timer.tick());
//! if let Some(bones) = skeleton.sync_skinning(&scene) {
//!     queue.write_buffer(&bone_buffer, 0, bytemuck::cast_slice(bones));
//! }
//! ```

pub mod binding;
pub mod propagator;
pub mod skinning;

pub use binding::{BindingListener, BoneBinding, BoneBindingTable, DirtyFlag};
pub use propagator::{TransformPropagator, decompose};
pub use skinning::{SkinningBufferBuilder, SkinningWorkspace};

use crate::errors::{Result, SkeletonError};
use crate::renderable::{ModelRenderable, RenderableInstance, SkinningModifier};
use crate::scene::{NodeHandle, Scene};
use crate::utils::FrameTime;

/// Scene node that drives bone attachments and skinning overrides.
///
/// Bindings register listeners in the [`Scene`], and dropping the node does
/// not remove them. Call [`SkeletonNode::clear_bone_attachments`] before
/// dropping it.
#[derive(Debug)]
pub struct SkeletonNode {
    node: NodeHandle,
    renderable: Option<ModelRenderable>,
    instance: Option<RenderableInstance>,
    bindings: BoneBindingTable,
    modified: DirtyFlag,
    workspace: SkinningWorkspace,
}

impl SkeletonNode {
    /// Creates a skeleton node at the root of `scene`.
    pub fn new(scene: &mut Scene) -> Self {
        let node = scene.create_node_with_name("SkeletonNode");
        Self::with_node(node)
    }

    /// Uses an existing scene node as the skeleton node.
    #[must_use]
    pub fn with_node(node: NodeHandle) -> Self {
        Self {
            node,
            renderable: None,
            instance: None,
            bindings: BoneBindingTable::new(),
            modified: DirtyFlag::default(),
            workspace: SkinningWorkspace::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    // ========================================================================
    // Bone attachments
    // ========================================================================

    /// Node currently bound to `bone_name`.
    #[must_use]
    pub fn bone_attachment(&self, bone_name: &str) -> Option<NodeHandle> {
        self.bindings.lookup(bone_name)
    }

    #[must_use]
    pub fn bindings(&self) -> &BoneBindingTable {
        &self.bindings
    }

    /// Binds `node` to `bone_name`, replacing any previous binding, or
    /// removes the binding when `node` is `None`.
    ///
    /// A new attachment is snapped onto its bone right away when the current
    /// rig knows the bone.
    pub fn set_bone_attachment(
        &mut self,
        scene: &mut Scene,
        bone_name: &str,
        node: Option<NodeHandle>,
    ) -> Result<()> {
        if bone_name.is_empty() {
            return Err(SkeletonError::InvalidArgument {
                param: "bone_name",
                reason: "must not be empty",
            });
        }
        if let Some(node) = node
            && !scene.contains(node)
        {
            return Err(SkeletonError::NodeNotFound(node));
        }

        if let Some(previous) = self.bindings.remove(bone_name) {
            log::debug!("Detaching {:?} from bone '{bone_name}'", previous.node());
            previous.cancel(scene);
        }

        let Some(node) = node else {
            return Ok(());
        };

        let binding = BoneBinding::subscribe(scene, node, self.node, &self.modified)
            .ok_or(SkeletonError::NodeNotFound(node))?;
        log::debug!("Attaching {node:?} to bone '{bone_name}'");
        self.bindings.insert(bone_name, binding);

        if let Some(rig) = self.renderable.as_ref().and_then(ModelRenderable::rig)
            && let Some(bone_index) = rig.bone_index(bone_name)
            && let Some(binding) = self.bindings.get(bone_name)
        {
            let relative = self.instance.as_ref().and_then(RenderableInstance::relative_transform);
            TransformPropagator::new(self.node, rig, relative, &self.bindings, &self.modified)
                .apply(scene, bone_index, binding);
        }
        Ok(())
    }

    /// Removes every binding and its node listener.
    pub fn clear_bone_attachments(&mut self, scene: &mut Scene) {
        for (_, binding) in self.bindings.drain() {
            binding.cancel(scene);
        }
    }

    // ========================================================================
    // Renderable
    // ========================================================================

    /// Replaces the rendered model and snaps all bindings onto the new rig.
    pub fn set_renderable(&mut self, scene: &mut Scene, renderable: Option<ModelRenderable>) {
        match &renderable {
            Some(model) => log::debug!(
                "Skeleton {:?} now renders '{}' ({} bones)",
                self.node,
                model.name,
                model.bone_count()
            ),
            None => log::debug!("Skeleton {:?} renderable cleared", self.node),
        }
        self.instance = renderable.as_ref().map(ModelRenderable::create_instance);
        self.renderable = renderable;
        self.update_bound_nodes(scene);
    }

    #[inline]
    #[must_use]
    pub fn renderable(&self) -> Option<&ModelRenderable> {
        self.renderable.as_ref()
    }

    #[inline]
    pub fn renderable_mut(&mut self) -> Option<&mut ModelRenderable> {
        self.renderable.as_mut()
    }

    #[inline]
    #[must_use]
    pub fn renderable_instance(&self) -> Option<&RenderableInstance> {
        self.instance.as_ref()
    }

    /// Changes the model-to-node transform of the current instance.
    pub fn set_relative_transform(&mut self, scene: &mut Scene, transform: Option<glam::Mat4>) {
        if let Some(instance) = self.instance.as_mut() {
            instance.set_relative_transform(transform);
            self.update_bound_nodes(scene);
        }
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.renderable
            .as_ref()
            .and_then(ModelRenderable::rig)
            .is_some_and(|rig| rig.is_animating())
    }

    /// Per-frame tick: moves bound nodes onto an animating rig's bones.
    pub fn on_update(&mut self, scene: &mut Scene, frame: &FrameTime) {
        if self.is_animating() {
            log::trace!("Skeleton {:?} update, frame {}", self.node, frame.frame_count);
            self.update_bound_nodes(scene);
        }
    }

    fn update_bound_nodes(&self, scene: &mut Scene) {
        let Some(rig) = self.renderable.as_ref().and_then(ModelRenderable::rig) else {
            return;
        };
        let relative = self.instance.as_ref().and_then(RenderableInstance::relative_transform);
        TransformPropagator::new(self.node, rig, relative, &self.bindings, &self.modified)
            .update_all(scene);
    }

    // ========================================================================
    // Skinning
    // ========================================================================

    /// Rebuilds the instance's live skinning buffer if a bound node moved.
    ///
    /// Returns the live buffer, or `None` when there is no rigged renderable.
    pub fn sync_skinning(&mut self, scene: &Scene) -> Option<&[f32]> {
        let rig = self.renderable.as_ref().and_then(ModelRenderable::rig)?;
        let instance = self.instance.as_mut()?;

        if self.modified.get() {
            SkinningBufferBuilder::new(
                scene,
                self.node,
                rig,
                Some(&*instance),
                &self.bindings,
                &self.modified,
            )
            .build(instance.bone_transforms().as_slice(), &mut self.workspace);

            if self.workspace.commit(instance.bone_transforms_mut()) {
                log::trace!("Skeleton {:?} skinning buffer rebuilt", self.node);
            }
        }
        Some(instance.bone_transforms().as_slice())
    }
}

impl SkinningModifier for SkeletonNode {
    fn is_modified_since_last_render(&self) -> bool {
        self.modified.get()
    }

    fn modify_material_bone_transforms<'a>(
        &'a mut self,
        scene: &Scene,
        original: &'a [f32],
    ) -> &'a [f32] {
        let Some(rig) = self.renderable.as_ref().and_then(ModelRenderable::rig) else {
            return original;
        };
        SkinningBufferBuilder::new(
            scene,
            self.node,
            rig,
            self.instance.as_ref(),
            &self.bindings,
            &self.modified,
        )
        .build(original, &mut self.workspace)
    }
}
