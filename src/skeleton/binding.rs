//! Bone bindings.
//!
//! A [`BoneBinding`] ties one bone name to a scene node. Each binding owns a
//! per-binding dirty flag and a transform subscription on its node; the
//! subscription's [`BindingListener`] flags the binding (and the skeleton's
//! aggregate flag) whenever the node moves for a reason other than the
//! skeleton itself moving.

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::scene::{NodeHandle, Scene, SubscriptionGuard, TransformChange, TransformListener};

/// Shared boolean flag.
///
/// Clones share the same cell, so a listener and the binding table observe
/// each other's writes.
#[derive(Debug, Clone, Default)]
pub struct DirtyFlag(Rc<Cell<bool>>);

impl DirtyFlag {
    #[must_use]
    pub fn new(value: bool) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> bool {
        self.0.get()
    }

    #[inline]
    pub fn set(&self) {
        self.0.set(true);
    }

    #[inline]
    pub fn clear(&self) {
        self.0.set(false);
    }

    /// Stores `value`, returning the previous one.
    #[inline]
    pub fn replace(&self, value: bool) -> bool {
        self.0.replace(value)
    }
}

/// Transform listener installed on every bound node.
pub struct BindingListener {
    skeleton: NodeHandle,
    binding: DirtyFlag,
    aggregate: DirtyFlag,
}

impl BindingListener {
    #[must_use]
    pub fn new(skeleton: NodeHandle, binding: DirtyFlag, aggregate: DirtyFlag) -> Self {
        Self {
            skeleton,
            binding,
            aggregate,
        }
    }

    /// A move is ignored only when it was caused by the skeleton node (or an
    /// ancestor of it) and the moved node sits inside the skeleton subtree:
    /// its skeleton-relative pose is then unchanged.
    ///
    /// Costs two ancestry walks, so O(depth) per notification.
    fn is_relevant(&self, scene: &Scene, change: TransformChange) -> bool {
        let moved_by_skeleton = change.origin == self.skeleton
            || scene.is_descendant_of(self.skeleton, change.origin);
        let inside_skeleton = scene.is_descendant_of(change.node, self.skeleton);
        !moved_by_skeleton || !inside_skeleton
    }
}

impl TransformListener for BindingListener {
    fn on_transform_changed(&self, scene: &Scene, change: TransformChange) {
        if self.is_relevant(scene, change) {
            self.binding.set();
            self.aggregate.set();
        }
    }
}

/// One bone name bound to one node.
#[derive(Debug)]
pub struct BoneBinding {
    node: NodeHandle,
    dirty: DirtyFlag,
    subscription: SubscriptionGuard,
}

impl BoneBinding {
    /// Creates a dirty binding and subscribes its listener on `node`.
    ///
    /// Returns `None` when `node` is not part of the scene.
    pub fn subscribe(
        scene: &mut Scene,
        node: NodeHandle,
        skeleton: NodeHandle,
        aggregate: &DirtyFlag,
    ) -> Option<Self> {
        let dirty = DirtyFlag::new(true);
        let listener = BindingListener::new(skeleton, dirty.clone(), aggregate.clone());
        let subscription = scene.subscribe(node, Box::new(listener))?;
        Some(Self {
            node,
            dirty,
            subscription,
        })
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }

    /// Removes the node listener.
    pub fn cancel(self, scene: &mut Scene) {
        if !self.subscription.cancel(scene) {
            log::trace!("Binding listener on {:?} was already gone", self.node);
        }
    }
}

/// Bone name to binding map.
#[derive(Debug, Default)]
pub struct BoneBindingTable {
    bindings: FxHashMap<String, BoneBinding>,
}

impl BoneBindingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a binding, returning the one it replaced.
    pub fn insert(&mut self, bone_name: &str, binding: BoneBinding) -> Option<BoneBinding> {
        self.bindings.insert(bone_name.to_string(), binding)
    }

    pub fn remove(&mut self, bone_name: &str) -> Option<BoneBinding> {
        self.bindings.remove(bone_name)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, bone_name: &str) -> Option<&BoneBinding> {
        self.bindings.get(bone_name)
    }

    /// Node bound to `bone_name`.
    #[inline]
    #[must_use]
    pub fn lookup(&self, bone_name: &str) -> Option<NodeHandle> {
        self.bindings.get(bone_name).map(BoneBinding::node)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoneBinding)> {
        self.bindings.iter().map(|(name, b)| (name.as_str(), b))
    }

    /// Empties the table, handing back every binding.
    pub fn drain(&mut self) -> impl Iterator<Item = (String, BoneBinding)> + '_ {
        self.bindings.drain()
    }
}
