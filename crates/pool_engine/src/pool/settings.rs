//! Per-pool creation settings

use crate::foundation::collections::{InstanceKey, TemplateKey};

/// Configuration for one pool
///
/// `count` is contextual: at registration it is the number of instances to
/// pre-create; when a pool expands it is reinterpreted as the growth-step
/// hint fed to the growth policy. Expansion always works on a fresh snapshot
/// so the values a pool was registered with are never corrupted.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Explicit pool name; derived from the template's display name if unset
    pub name: Option<String>,
    /// Template every instance of the pool is created from
    pub template: TemplateKey,
    /// Pre-create count at registration, growth-step hint afterwards
    pub count: u32,
    /// Node acquired and released instances are attached under
    pub placement: Option<InstanceKey>,
}

impl PoolSettings {
    /// Create settings for `count` instances of `template`
    pub fn new(template: TemplateKey, count: u32) -> Self {
        Self {
            name: None,
            template,
            count,
            placement: None,
        }
    }

    /// Set an explicit pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the placement target
    pub fn with_placement(mut self, placement: InstanceKey) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Snapshot these settings with the count reinterpreted as a growth step
    pub fn expansion_snapshot(&self, step: u32) -> Self {
        Self {
            count: step,
            ..self.clone()
        }
    }
}
