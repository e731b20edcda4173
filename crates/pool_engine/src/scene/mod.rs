//! Scene model
//!
//! A minimal scene hierarchy acting as the template/instance provider for the
//! pool system. Instances are plain nodes in a parent/child tree with an
//! active flag, a local transform, and an optional set of pooled-lifecycle
//! behaviors. Templates describe the node tree an instance is built from.

pub mod node;
pub mod template;
pub mod world;

pub use node::{Capabilities, NodeKind, PooledBehavior, SceneNode};
pub use template::{Template, TemplateNode};
pub use world::{SceneError, SceneWorld};
