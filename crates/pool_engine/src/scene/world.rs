//! Scene world — instance storage and hierarchy operations
//!
//! `SceneWorld` owns every node and template and implements the operations
//! the pool system consumes: instantiation from a template, activation,
//! kind-aware reparenting, and lifecycle-hook dispatch over a subtree.

use crate::foundation::collections::{InstanceKey, InstanceMap, SlotMap, TemplateKey, TemplateMap};
use crate::foundation::math::Transform;
use crate::scene::node::{Capabilities, NodeKind, SceneNode};
use crate::scene::template::{Template, TemplateNode};

/// Errors from scene hierarchy operations
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// The template key does not resolve to a registered template
    #[error("template {0:?} is not registered")]
    TemplateNotFound(TemplateKey),

    /// The instance key does not resolve to a live node
    #[error("instance {0:?} is not alive")]
    InstanceNotFound(InstanceKey),

    /// The requested parent is the node itself or one of its descendants
    #[error("reparenting {node:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// Node being moved
        node: InstanceKey,
        /// Rejected parent
        parent: InstanceKey,
    },
}

/// Owner of all scene nodes and templates
#[derive(Default)]
pub struct SceneWorld {
    nodes: InstanceMap<SceneNode>,
    templates: TemplateMap<Template>,
}

impl SceneWorld {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            templates: SlotMap::with_key(),
        }
    }

    /// Register a template and return its identity
    pub fn add_template(&mut self, template: Template) -> TemplateKey {
        self.templates.insert(template)
    }

    /// Look up a registered template
    pub fn template(&self, key: TemplateKey) -> Option<&Template> {
        self.templates.get(key)
    }

    /// Check whether a template identity still resolves
    pub fn is_template_alive(&self, key: TemplateKey) -> bool {
        self.templates.contains_key(key)
    }

    /// Unregister a template
    ///
    /// Instances already built from it are unaffected; only future
    /// instantiation stops resolving. Returns `false` for a stale key.
    pub fn remove_template(&mut self, key: TemplateKey) -> bool {
        self.templates.remove(key).is_some()
    }

    /// Build a new instance from a template
    ///
    /// The whole node tree described by the template is created inactive and
    /// attached under `parent` (detached if `None`). The root node records
    /// its originating template identity.
    pub fn instantiate(
        &mut self,
        template: TemplateKey,
        parent: Option<InstanceKey>,
    ) -> Result<InstanceKey, SceneError> {
        if let Some(parent_key) = parent {
            if !self.nodes.contains_key(parent_key) {
                return Err(SceneError::InstanceNotFound(parent_key));
            }
        }

        let spec = self
            .templates
            .get(template)
            .ok_or(SceneError::TemplateNotFound(template))?;

        let root = Self::build_node(&mut self.nodes, &spec.root, parent);
        self.nodes[root].template = Some(template);

        if let Some(parent_key) = parent {
            self.nodes[parent_key].children.push(root);
        }

        Ok(root)
    }

    fn build_node(
        nodes: &mut InstanceMap<SceneNode>,
        spec: &TemplateNode,
        parent: Option<InstanceKey>,
    ) -> InstanceKey {
        let mut node = SceneNode::new(spec.name.clone(), spec.kind);
        node.local = spec.local.clone();
        node.parent = parent;
        node.capabilities = spec.capabilities;
        node.behaviors = spec.behaviors.iter().map(|factory| factory()).collect();

        let key = nodes.insert(node);

        for child_spec in &spec.children {
            let child = Self::build_node(nodes, child_spec, Some(key));
            nodes[key].children.push(child);
        }

        key
    }

    /// Check whether an instance key still resolves to a live node
    pub fn is_alive(&self, key: InstanceKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Check whether a live node is currently active
    pub fn is_active(&self, key: InstanceKey) -> bool {
        self.nodes.get(key).is_some_and(|node| node.active)
    }

    /// Set the active flag on a node and its whole subtree
    ///
    /// Returns `false` when the key is stale.
    pub fn set_active(&mut self, key: InstanceKey, active: bool) -> bool {
        if !self.nodes.contains_key(key) {
            return false;
        }
        for node_key in self.subtree(key) {
            self.nodes[node_key].active = active;
        }
        true
    }

    /// Borrow a node
    pub fn node(&self, key: InstanceKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Borrow a node mutably
    pub fn node_mut(&mut self, key: InstanceKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// Get a node's display name
    pub fn display_name(&self, key: InstanceKey) -> Option<&str> {
        self.nodes.get(key).map(|node| node.name.as_str())
    }

    /// Overwrite a node's display name
    pub fn set_display_name(&mut self, key: InstanceKey, name: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.name = name.into();
        }
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Compute a node's world transform by walking its ancestor chain
    pub fn world_transform(&self, key: InstanceKey) -> Option<Transform> {
        let mut chain = Vec::new();
        let mut cursor = Some(key);
        while let Some(node_key) = cursor {
            let node = self.nodes.get(node_key)?;
            chain.push(node_key);
            cursor = node.parent;
        }

        let mut world = Transform::identity();
        for node_key in chain.iter().rev() {
            world = world.combine(&self.nodes[*node_key].local);
        }
        Some(world)
    }

    /// Move a node under a new parent
    ///
    /// Spatial nodes keep their world transform across the move; widget nodes
    /// keep their local offsets and adopt the new parent's space.
    pub fn reparent(
        &mut self,
        key: InstanceKey,
        new_parent: Option<InstanceKey>,
    ) -> Result<(), SceneError> {
        if !self.nodes.contains_key(key) {
            return Err(SceneError::InstanceNotFound(key));
        }
        if let Some(parent_key) = new_parent {
            if !self.nodes.contains_key(parent_key) {
                return Err(SceneError::InstanceNotFound(parent_key));
            }
            // Walk up from the candidate parent; hitting the moved node
            // means the move would detach the subtree into a cycle.
            let mut cursor = Some(parent_key);
            while let Some(ancestor) = cursor {
                if ancestor == key {
                    return Err(SceneError::CycleDetected {
                        node: key,
                        parent: parent_key,
                    });
                }
                cursor = self.nodes[ancestor].parent;
            }
        }

        if self.nodes[key].parent == new_parent {
            return Ok(());
        }

        let preserved_world = match self.nodes[key].kind {
            NodeKind::Spatial => self.world_transform(key),
            NodeKind::Widget => None,
        };

        if let Some(old_parent) = self.nodes[key].parent {
            self.nodes[old_parent].children.retain(|child| *child != key);
        }
        self.nodes[key].parent = new_parent;
        if let Some(parent_key) = new_parent {
            self.nodes[parent_key].children.push(key);
        }

        if let Some(world) = preserved_world {
            let new_local = match new_parent {
                Some(parent_key) => {
                    let parent_world = self
                        .world_transform(parent_key)
                        .unwrap_or_else(Transform::identity);
                    parent_world.inverse().combine(&world)
                }
                None => world,
            };
            self.nodes[key].local = new_local;
        }

        Ok(())
    }

    /// Remove a node and its whole subtree from the scene
    ///
    /// Returns `false` when the key is already stale.
    pub fn despawn(&mut self, key: InstanceKey) -> bool {
        if !self.nodes.contains_key(key) {
            return false;
        }
        if let Some(parent) = self.nodes[key].parent {
            self.nodes[parent].children.retain(|child| *child != key);
        }
        for node_key in self.subtree(key) {
            self.nodes.remove(node_key);
        }
        true
    }

    /// Collect a node and all its descendants in preorder
    pub fn subtree(&self, key: InstanceKey) -> Vec<InstanceKey> {
        let mut keys = Vec::new();
        let mut stack = vec![key];
        while let Some(node_key) = stack.pop() {
            if let Some(node) = self.nodes.get(node_key) {
                keys.push(node_key);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        keys
    }

    /// Run acquire hooks over a subtree, root first
    pub fn notify_acquired(&mut self, root: InstanceKey) {
        self.dispatch(root, Capabilities::ACQUIRE_HOOK, |behavior| {
            behavior.on_acquired();
        });
    }

    /// Run release hooks over a subtree, root first
    pub fn notify_released(&mut self, root: InstanceKey) {
        self.dispatch(root, Capabilities::RELEASE_HOOK, |behavior| {
            behavior.on_released();
        });
    }

    /// Toggle suspension on every suspend-capable behavior in a subtree
    pub fn set_subtree_suspended(&mut self, root: InstanceKey, suspended: bool) {
        self.dispatch(root, Capabilities::SUSPEND_WHILE_POOLED, |behavior| {
            behavior.set_suspended(suspended);
        });
    }

    fn dispatch(
        &mut self,
        root: InstanceKey,
        capability: Capabilities,
        mut call: impl FnMut(&mut dyn super::node::PooledBehavior),
    ) {
        for node_key in self.subtree(root) {
            let node = &mut self.nodes[node_key];
            if !node.capabilities.contains(capability) {
                continue;
            }
            for behavior in &mut node.behaviors {
                call(behavior.as_mut());
            }
        }
    }
}
