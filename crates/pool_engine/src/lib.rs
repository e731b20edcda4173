//! # Pool Engine
//!
//! A reusable scene-entity pool engine. Expensive-to-create instances are
//! built from templates once, then cycled between callers and their pools
//! instead of being destroyed and recreated.
//!
//! ## Features
//!
//! - **Identity-based registries**: pools are resolved by template identity
//!   first, so templates sharing a display name never share a pool
//! - **Hybrid expansion**: an exhausted pool grows by a policy-chosen step,
//!   with one instance created synchronously and the rest time-sliced
//! - **Time-sliced allocation**: background jobs drain under a per-tick
//!   instantiation budget, keeping large expansions off the frame spike
//! - **Lifecycle hooks**: nodes opt into acquire/release notifications and
//!   suspend-while-pooled behavior through declared capabilities
//!
//! ## Quick Start
//!
//! ```rust
//! use pool_engine::prelude::*;
//!
//! let mut world = SceneWorld::new();
//! let spark = world.add_template(Template::new(
//!     "spark",
//!     TemplateNode::new("spark", NodeKind::Spatial),
//! ));
//!
//! let mut manager = PoolManager::new(&PoolEngineConfig::default());
//! manager.register_pool(&mut world, PoolSettings::new(spark, 16));
//!
//! if let Some(instance) = manager.acquire(&mut world, spark) {
//!     // ... use the instance ...
//!     manager.release(&mut world, instance);
//! }
//!
//! // Drive background expansion from the frame loop:
//! manager.tick(&mut world);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod pool;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{Config, ConfigError, PoolEngineConfig},
        foundation::{
            collections::{InstanceKey, PoolKey, TemplateKey},
            math::{Mat4, Quat, Transform, Vec3},
            time::{Stopwatch, Timer},
        },
        pool::{GrowthPolicy, PoolManager, PoolManagerStats, PoolSettings},
        scene::{
            Capabilities, NodeKind, PooledBehavior, SceneNode, SceneWorld, Template, TemplateNode,
        },
    };
}
