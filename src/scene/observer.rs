//! Transform change subscriptions.
//!
//! Listeners are registered per node through [`Scene::subscribe`] and
//! removed with the returned [`SubscriptionKey`]. They are invoked
//! synchronously from inside the mutating scene call, once for every node
//! whose world transform changed.

use crate::scene::{NodeHandle, Scene, SubscriptionKey};

/// Describes one world-transform change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformChange {
    /// The node whose world transform changed (the subscribed node).
    pub node: NodeHandle,
    /// The node whose local transform or parent was actually mutated.
    /// Equal to `node` for direct writes, an ancestor otherwise.
    pub origin: NodeHandle,
}

/// Receives transform change notifications.
///
/// Callbacks get a shared borrow of the scene and therefore cannot mutate
/// it; implementations record state through interior mutability.
pub trait TransformListener {
    fn on_transform_changed(&self, scene: &Scene, change: TransformChange);
}

impl<F> TransformListener for F
where
    F: Fn(&Scene, TransformChange),
{
    fn on_transform_changed(&self, scene: &Scene, change: TransformChange) {
        self(scene, change);
    }
}

pub(crate) struct Subscription {
    pub(crate) node: NodeHandle,
    pub(crate) listener: Box<dyn TransformListener>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

/// Cancellation handle helper: unsubscribes on [`SubscriptionGuard::cancel`].
///
/// Dropping the guard without cancelling leaves the subscription alive, since
/// cancelling needs the scene.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a subscription guard must be cancelled to remove the listener"]
pub struct SubscriptionGuard {
    key: SubscriptionKey,
}

impl SubscriptionGuard {
    pub(crate) fn new(key: SubscriptionKey) -> Self {
        Self { key }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> SubscriptionKey {
        self.key
    }

    /// Removes the listener. Returns `false` if it was already gone
    /// (e.g. the node was removed from the scene).
    pub fn cancel(self, scene: &mut Scene) -> bool {
        scene.unsubscribe(self.key)
    }
}
