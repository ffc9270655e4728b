use glam::{Affine3A, Quat, Vec3};
use slotmap::SlotMap;
use smallvec::{SmallVec, smallvec};

use crate::errors::{Result, SkeletonError};
use crate::scene::node::Node;
use crate::scene::observer::{Subscription, SubscriptionGuard, TransformChange, TransformListener};
use crate::scene::wrapper::SceneNode;
use crate::scene::{NodeHandle, SubscriptionKey};

/// Scene graph
///
/// Owns the node hierarchy and the transform subscription registry.
///
/// Every transform or hierarchy mutation goes through the scene, which
/// immediately refreshes the world matrices of the affected subtree and then
/// notifies the listeners registered on any node of that subtree.
/// Writes that do not change anything are dropped without notification.
///
/// Setters silently no-op on stale handles; getters return `None`.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeHandle, Node>,
    root_nodes: Vec<NodeHandle>,
    subscriptions: SlotMap<SubscriptionKey, Subscription>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Node creation & removal
    // ========================================================================

    pub fn create_node(&mut self) -> NodeHandle {
        self.add_node(Node::new())
    }

    pub fn create_node_with_name(&mut self, name: &str) -> NodeHandle {
        self.add_node(Node::with_name(name))
    }

    /// Adds a node at the root of the scene.
    pub fn add_node(&mut self, mut node: Node) -> NodeHandle {
        node.parent = None;
        node.children.clear();
        node.subscriptions.clear();
        node.transform.world_matrix = node.transform.local_matrix;

        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Adds a node directly under `parent`.
    pub fn add_to_parent(&mut self, node: Node, parent: NodeHandle) -> Result<NodeHandle> {
        if !self.nodes.contains_key(parent) {
            return Err(SkeletonError::NodeNotFound(parent));
        }
        let handle = self.add_node(node);
        self.set_parent(handle, Some(parent))?;
        Ok(handle)
    }

    /// Removes a node and its whole subtree, cancelling every subscription
    /// registered on the removed nodes. Returns `false` for stale handles.
    pub fn remove_node(&mut self, handle: NodeHandle) -> bool {
        if !self.nodes.contains_key(handle) {
            return false;
        }

        self.unlink(handle);

        let mut stack: SmallVec<[NodeHandle; 16]> = smallvec![handle];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            for key in node.subscriptions {
                self.subscriptions.remove(key);
            }
            stack.extend(node.children);
        }
        true
    }

    /// Re-parents `child` (or moves it to the root with `None`), keeping its
    /// local transform.
    pub fn set_parent(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        if !self.nodes.contains_key(child) {
            return Err(SkeletonError::NodeNotFound(child));
        }
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                return Err(SkeletonError::NodeNotFound(p));
            }
            if p == child || self.is_descendant_of(p, child) {
                return Err(SkeletonError::HierarchyCycle { child, parent: p });
            }
        }
        if self.nodes[child].parent == parent {
            return Ok(());
        }

        self.unlink(child);
        match parent {
            Some(p) => self.nodes[p].children.push(child),
            None => self.root_nodes.push(child),
        }
        self.nodes[child].parent = parent;

        self.propagate(child);
        Ok(())
    }

    /// Detaches a node from its parent's child list (or from the roots).
    fn unlink(&mut self, handle: NodeHandle) {
        let old_parent = self.nodes.get(handle).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(parent) = self.nodes.get_mut(p)
                && let Some(i) = parent.children.iter().position(|&c| c == handle)
            {
                parent.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&r| r == handle) {
            self.root_nodes.remove(i);
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.parent = None;
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn root_nodes(&self) -> &[NodeHandle] {
        &self.root_nodes
    }

    #[must_use]
    pub fn name(&self, handle: NodeHandle) -> Option<&str> {
        self.nodes.get(handle).map(Node::name)
    }

    pub fn set_name(&mut self, handle: NodeHandle, name: &str) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.name = name.to_string();
        }
    }

    #[must_use]
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.nodes
            .get(handle)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `node`.
    #[must_use]
    pub fn is_descendant_of(&self, node: NodeHandle, ancestor: NodeHandle) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    // ========================================================================
    // Enabled / active state
    // ========================================================================

    pub fn set_enabled(&mut self, handle: NodeHandle, enabled: bool) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.enabled = enabled;
        }
    }

    #[must_use]
    pub fn is_enabled(&self, handle: NodeHandle) -> bool {
        self.nodes.get(handle).is_some_and(|n| n.enabled)
    }

    /// A node is active when it and all of its ancestors are enabled.
    #[must_use]
    pub fn is_active(&self, handle: NodeHandle) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            let Some(node) = self.nodes.get(h) else {
                return false;
            };
            if !node.enabled {
                return false;
            }
            current = node.parent;
        }
        true
    }

    // ========================================================================
    // Transform getters
    // ========================================================================

    #[must_use]
    pub fn local_position(&self, handle: NodeHandle) -> Option<Vec3> {
        self.nodes.get(handle).map(|n| n.transform.position)
    }

    #[must_use]
    pub fn local_rotation(&self, handle: NodeHandle) -> Option<Quat> {
        self.nodes.get(handle).map(|n| n.transform.rotation)
    }

    #[must_use]
    pub fn local_scale(&self, handle: NodeHandle) -> Option<Vec3> {
        self.nodes.get(handle).map(|n| n.transform.scale)
    }

    #[must_use]
    pub fn local_matrix(&self, handle: NodeHandle) -> Option<Affine3A> {
        self.nodes.get(handle).map(|n| n.transform.local_matrix)
    }

    #[must_use]
    pub fn world_matrix(&self, handle: NodeHandle) -> Option<Affine3A> {
        self.nodes.get(handle).map(|n| n.transform.world_matrix)
    }

    #[must_use]
    pub fn world_position(&self, handle: NodeHandle) -> Option<Vec3> {
        self.world_matrix(handle).map(|m| Vec3::from(m.translation))
    }

    #[must_use]
    pub fn world_rotation(&self, handle: NodeHandle) -> Option<Quat> {
        self.world_matrix(handle).map(|m| m.to_scale_rotation_translation().1)
    }

    fn parent_world_matrix(&self, handle: NodeHandle) -> Affine3A {
        self.parent(handle)
            .and_then(|p| self.nodes.get(p))
            .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix)
    }

    // ========================================================================
    // Transform setters
    // ========================================================================

    pub fn set_local_position(&mut self, handle: NodeHandle, position: Vec3) {
        if let Some((_, rotation, scale)) = self.local_trs(handle) {
            self.set_local_transform(handle, position, rotation, scale);
        }
    }

    pub fn set_local_rotation(&mut self, handle: NodeHandle, rotation: Quat) {
        if let Some((position, _, scale)) = self.local_trs(handle) {
            self.set_local_transform(handle, position, rotation, scale);
        }
    }

    pub fn set_local_scale(&mut self, handle: NodeHandle, scale: Vec3) {
        if let Some((position, rotation, _)) = self.local_trs(handle) {
            self.set_local_transform(handle, position, rotation, scale);
        }
    }

    fn local_trs(&self, handle: NodeHandle) -> Option<(Vec3, Quat, Vec3)> {
        self.nodes
            .get(handle)
            .map(|n| (n.transform.position, n.transform.rotation, n.transform.scale))
    }

    /// Writes all three local TRS components with a single notification.
    pub fn set_local_transform(
        &mut self,
        handle: NodeHandle,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) {
        let Some(node) = self.nodes.get_mut(handle) else {
            log::debug!("Ignoring transform write to stale node {handle:?}");
            return;
        };
        if node.transform.set_trs(position, rotation, scale) {
            self.propagate(handle);
        }
    }

    /// Positions the node in world space by solving for its local position.
    pub fn set_world_position(&mut self, handle: NodeHandle, position: Vec3) {
        if !self.contains(handle) {
            return;
        }
        let local = self
            .parent_world_matrix(handle)
            .inverse()
            .transform_point3(position);
        self.set_local_position(handle, local);
    }

    /// Orients the node in world space by solving for its local rotation.
    pub fn set_world_rotation(&mut self, handle: NodeHandle, rotation: Quat) {
        if !self.contains(handle) {
            return;
        }
        let (_, parent_rotation, _) = self
            .parent_world_matrix(handle)
            .to_scale_rotation_translation();
        self.set_local_rotation(handle, parent_rotation.inverse() * rotation);
    }

    /// Chainable mutation wrapper for one node.
    pub fn node(&mut self, handle: NodeHandle) -> SceneNode<'_> {
        SceneNode::new(self, handle)
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Registers a transform listener on `handle`.
    ///
    /// Returns `None` when the node does not exist.
    pub fn subscribe(
        &mut self,
        handle: NodeHandle,
        listener: Box<dyn TransformListener>,
    ) -> Option<SubscriptionGuard> {
        if !self.nodes.contains_key(handle) {
            return None;
        }
        let key = self.subscriptions.insert(Subscription {
            node: handle,
            listener,
        });
        self.nodes[handle].subscriptions.push(key);
        Some(SubscriptionGuard::new(key))
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, key: SubscriptionKey) -> bool {
        let Some(subscription) = self.subscriptions.remove(key) else {
            return false;
        };
        if let Some(node) = self.nodes.get_mut(subscription.node)
            && let Some(i) = node.subscriptions.iter().position(|&k| k == key)
        {
            node.subscriptions.swap_remove(i);
        }
        true
    }

    #[must_use]
    pub fn subscription_count(&self, handle: NodeHandle) -> usize {
        self.nodes.get(handle).map_or(0, Node::subscription_count)
    }

    #[must_use]
    pub fn total_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    // ========================================================================
    // Propagation
    // ========================================================================

    /// Refreshes world matrices below `origin` (inclusive), then notifies.
    fn propagate(&mut self, origin: NodeHandle) {
        let parent_world = self.parent_world_matrix(origin);

        let mut stack: SmallVec<[(NodeHandle, Affine3A); 16]> = smallvec![(origin, parent_world)];
        while let Some((handle, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            let world = parent_world * node.transform.local_matrix;
            node.transform.world_matrix = world;
            stack.extend(node.children.iter().rev().map(|&c| (c, world)));
        }

        if !self.subscriptions.is_empty() {
            self.notify(origin);
        }
    }

    fn notify(&self, origin: NodeHandle) {
        let mut stack: SmallVec<[NodeHandle; 16]> = smallvec![origin];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            for &key in &node.subscriptions {
                if let Some(subscription) = self.subscriptions.get(key) {
                    subscription.listener.on_transform_changed(
                        self,
                        TransformChange {
                            node: handle,
                            origin,
                        },
                    );
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }
    }
}
