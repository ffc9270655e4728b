//! Scene Graph Module
//!
//! The node hierarchy that bone attachments live in:
//! - [`Node`]: hierarchy links, transform, enabled state
//! - [`Transform`]: local TRS with cached local/world matrices
//! - [`Scene`]: node storage, hierarchy edits, change propagation
//! - [`TransformListener`]: synchronous transform change subscriptions
//! - [`SceneNode`]: chainable mutation wrapper

pub mod node;
pub mod observer;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod transform;
pub mod wrapper;

pub use node::Node;
pub use observer::{SubscriptionGuard, TransformChange, TransformListener};
pub use scene::Scene;
pub use transform::Transform;
pub use wrapper::SceneNode;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct SubscriptionKey;
}
