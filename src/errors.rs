//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`SkeletonError`] covers the recoverable failure modes:
//! - Invalid skeleton definitions and material-bone maps
//! - Missing or invalid arguments to the bone attachment API
//! - Stale node handles and hierarchy cycles in the scene graph
//!
//! Index bounds violations on rig accessors are *not* represented here. They
//! are contract violations and panic at the call site.
//!
//! # Usage
//!
//! Fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, SkeletonError>`.
//!
//! ```rust,ignore
//! use myth_skeleton::errors::Result;
//!
//! fn bind(skeleton: &mut SkeletonNode, scene: &mut Scene, hat: NodeHandle) -> Result<()> {
//!     skeleton.set_bone_attachment(scene, "head", Some(hat))?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::scene::NodeHandle;

/// The main error type for skeleton bindings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkeletonError {
    // ========================================================================
    // Argument Errors
    // ========================================================================
    /// A required argument was missing or empty.
    #[error("Invalid argument `{param}`: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter
        param: &'static str,
        /// What was wrong with it
        reason: &'static str,
    },

    // ========================================================================
    // Scene Graph Errors
    // ========================================================================
    /// The node handle does not refer to a live node of the scene.
    #[error("Node not found in scene: {0:?}")]
    NodeNotFound(NodeHandle),

    /// Re-parenting would make a node its own ancestor.
    #[error("Cannot parent {child:?} under its own descendant {parent:?}")]
    HierarchyCycle {
        /// The node being re-parented
        child: NodeHandle,
        /// The requested parent
        parent: NodeHandle,
    },

    // ========================================================================
    // Skeleton Definition Errors
    // ========================================================================
    /// The skeleton definition is malformed.
    #[error("Invalid skeleton '{name}': {reason}")]
    InvalidSkeleton {
        /// Skeleton name
        name: String,
        /// Description of the defect
        reason: String,
    },

    /// A material-bone slot references a bone the skeleton does not have.
    #[error("Material bone slot {slot} references bone {bone} (bone count: {bone_count})")]
    MaterialBoneOutOfRange {
        /// The shader slot
        slot: usize,
        /// The referenced skeleton bone index
        bone: usize,
        /// Number of bones in the skeleton
        bone_count: usize,
    },
}

/// Alias for `Result<T, SkeletonError>`.
pub type Result<T> = std::result::Result<T, SkeletonError>;
