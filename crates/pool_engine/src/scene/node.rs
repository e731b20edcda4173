//! Scene node and pooled-lifecycle capabilities

use crate::foundation::collections::{InstanceKey, TemplateKey};
use crate::foundation::math::Transform;

bitflags::bitflags! {
    /// Capability set a node declares for pooled-lifecycle dispatch
    ///
    /// Dispatch queries these flags before touching a node's behaviors, so
    /// nodes without a capability cost nothing beyond the flag test.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u8 {
        /// Behaviors want a notification when the instance leaves the pool
        const ACQUIRE_HOOK = 1 << 0;
        /// Behaviors want a notification when the instance returns to the pool
        const RELEASE_HOOK = 1 << 1;
        /// Behaviors must be suspended while the instance sits in the pool
        const SUSPEND_WHILE_POOLED = 1 << 2;
    }
}

/// How a node participates in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// World-space node; reparenting preserves its world transform
    Spatial,
    /// Layout-driven node; reparenting preserves its local offsets
    Widget,
}

/// Optional per-node lifecycle behavior
///
/// Behaviors are attached when an instance is built from its template and
/// receive notifications as the instance cycles between active and pooled.
/// All methods are fire-and-forget: they return nothing and cannot fail, so
/// one behavior can never abort the pool operation that invoked it.
pub trait PooledBehavior {
    /// Called when the owning instance is handed out by its pool
    fn on_acquired(&mut self) {}

    /// Called when the owning instance is returned to its pool,
    /// before the instance is deactivated
    fn on_released(&mut self) {}

    /// Toggle suspension for behaviors that must not run while pooled
    fn set_suspended(&mut self, _suspended: bool) {}
}

/// One node in the scene hierarchy
pub struct SceneNode {
    /// Display name; pooled instances get a per-acquire unique suffix
    pub name: String,
    /// Hierarchy participation mode
    pub kind: NodeKind,
    /// Transform relative to the parent node
    pub local: Transform,
    /// Whether the node is live in the scene or parked in a pool
    pub active: bool,
    /// Parent node, if any
    pub parent: Option<InstanceKey>,
    /// Child nodes in attach order
    pub children: Vec<InstanceKey>,
    /// Originating template, recorded on instance roots only
    pub template: Option<TemplateKey>,
    /// Declared lifecycle capabilities
    pub capabilities: Capabilities,
    /// Attached lifecycle behaviors
    pub behaviors: Vec<Box<dyn PooledBehavior>>,
}

impl SceneNode {
    /// Create a detached, inactive node
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            local: Transform::identity(),
            active: false,
            parent: None,
            children: Vec::new(),
            template: None,
            capabilities: Capabilities::empty(),
            behaviors: Vec::new(),
        }
    }
}

impl std::fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("active", &self.active)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("capabilities", &self.capabilities)
            .field("behaviors", &self.behaviors.len())
            .finish()
    }
}
