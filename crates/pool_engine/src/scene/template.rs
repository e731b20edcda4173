//! Templates — the prototypes instances are built from

use std::rc::Rc;

use crate::foundation::math::Transform;
use crate::scene::node::{Capabilities, NodeKind, PooledBehavior};

/// Factory producing a fresh behavior instance per instantiation
///
/// Each instantiated copy of a template must own its behavior state, so the
/// template stores constructors rather than behavior objects.
pub type BehaviorFactory = Rc<dyn Fn() -> Box<dyn PooledBehavior>>;

/// Specification of one node inside a template's tree
pub struct TemplateNode {
    /// Node name; the root's name seeds the pool's derived name
    pub name: String,
    /// Hierarchy participation mode of instantiated nodes
    pub kind: NodeKind,
    /// Local transform instantiated nodes start with
    pub local: Transform,
    /// Capabilities instantiated nodes declare
    pub capabilities: Capabilities,
    /// Behavior constructors, invoked once per instantiation
    pub behaviors: Vec<BehaviorFactory>,
    /// Child node specifications
    pub children: Vec<TemplateNode>,
}

impl TemplateNode {
    /// Create a leaf node specification
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            local: Transform::identity(),
            capabilities: Capabilities::empty(),
            behaviors: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the starting local transform
    pub fn with_local(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    /// Attach a behavior constructor and declare its capabilities
    pub fn with_behavior(
        mut self,
        capabilities: Capabilities,
        factory: impl Fn() -> Box<dyn PooledBehavior> + 'static,
    ) -> Self {
        self.capabilities |= capabilities;
        self.behaviors.push(Rc::new(factory));
        self
    }

    /// Add a child node specification
    pub fn with_child(mut self, child: TemplateNode) -> Self {
        self.children.push(child);
        self
    }
}

/// A registered template
///
/// Display names are not required to be unique across templates; pools are
/// therefore resolved by template identity first and by name only as a
/// fallback.
pub struct Template {
    /// Human-readable display name
    pub display_name: String,
    /// Root of the node specification tree
    pub root: TemplateNode,
}

impl Template {
    /// Create a template from its root node specification
    pub fn new(display_name: impl Into<String>, root: TemplateNode) -> Self {
        Self {
            display_name: display_name.into(),
            root,
        }
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("display_name", &self.display_name)
            .finish()
    }
}
