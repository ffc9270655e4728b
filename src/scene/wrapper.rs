//! Chainable node operation wrapper.
//!
//! [`SceneNode`] borrows a [`Scene`] mutably and provides a fluent API
//! for transforming nodes. Every call goes through the scene setters, so
//! world matrices and transform listeners stay in sync.
//!
//! All methods silently no-op when the handle is stale.
//!
//! # Example
//!
//! ```rust,ignore
//! scene.node(hat)
//!     .set_position(0.0, 0.2, 0.0)
//!     .set_scale(1.5)
//!     .set_enabled(true);
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]
use glam::{Quat, Vec3};

use crate::scene::NodeHandle;
use crate::scene::scene::Scene;

/// Temporary mutable borrow of a scene node for chainable operations.
pub struct SceneNode<'a> {
    scene: &'a mut Scene,
    handle: NodeHandle,
}

impl<'a> SceneNode<'a> {
    #[inline]
    pub fn new(scene: &'a mut Scene, handle: NodeHandle) -> Self {
        Self { scene, handle }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    // -- Local transform setters (chainable) --

    /// Sets the node's local position.
    #[inline]
    pub fn set_position(self, x: f32, y: f32, z: f32) -> Self {
        self.scene.set_local_position(self.handle, Vec3::new(x, y, z));
        self
    }

    /// Sets the node's local position from a Vec3.
    #[inline]
    pub fn set_position_vec(self, pos: Vec3) -> Self {
        self.scene.set_local_position(self.handle, pos);
        self
    }

    /// Sets uniform scale.
    #[inline]
    pub fn set_scale(self, s: f32) -> Self {
        self.scene.set_local_scale(self.handle, Vec3::splat(s));
        self
    }

    /// Sets non-uniform scale.
    #[inline]
    pub fn set_scale_xyz(self, x: f32, y: f32, z: f32) -> Self {
        self.scene.set_local_scale(self.handle, Vec3::new(x, y, z));
        self
    }

    /// Sets rotation from a quaternion.
    #[inline]
    pub fn set_rotation(self, quat: Quat) -> Self {
        self.scene.set_local_rotation(self.handle, quat);
        self
    }

    /// Rotates around the Y axis by `angle` radians (cumulative).
    #[inline]
    pub fn rotate_y(self, angle: f32) -> Self {
        if let Some(rotation) = self.scene.local_rotation(self.handle) {
            self.scene
                .set_local_rotation(self.handle, rotation * Quat::from_rotation_y(angle));
        }
        self
    }

    // -- World transform setters --

    /// Places the node at a world-space position.
    #[inline]
    pub fn set_world_position(self, pos: Vec3) -> Self {
        self.scene.set_world_position(self.handle, pos);
        self
    }

    /// Orients the node in world space.
    #[inline]
    pub fn set_world_rotation(self, quat: Quat) -> Self {
        self.scene.set_world_rotation(self.handle, quat);
        self
    }

    // -- State --

    /// Enables or disables the node.
    #[inline]
    pub fn set_enabled(self, enabled: bool) -> Self {
        self.scene.set_enabled(self.handle, enabled);
        self
    }
}
