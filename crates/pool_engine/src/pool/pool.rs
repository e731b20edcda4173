//! A single pool of instances created from one template

use crate::foundation::collections::InstanceKey;
use crate::pool::settings::PoolSettings;
use crate::scene::SceneWorld;

/// The set of instances created from one template, tracked together
///
/// Instances are stored in creation order and the collection only ever
/// grows. A wrapping cursor remembers where the last successful scan ended
/// so consecutive acquires rotate through the pool instead of hammering the
/// first slots.
#[derive(Debug)]
pub struct Pool {
    settings: PoolSettings,
    instances: Vec<InstanceKey>,
    cursor: usize,
}

impl Pool {
    /// Create an empty pool
    pub fn new(settings: PoolSettings) -> Self {
        let capacity = settings.count as usize;
        Self {
            settings,
            instances: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// The settings the pool was created with
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Update the growth-step hint used for the next expansion
    pub fn set_count_hint(&mut self, hint: u32) {
        self.settings.count = hint;
    }

    /// All instance handles in creation order
    pub fn instances(&self) -> &[InstanceKey] {
        &self.instances
    }

    /// Total number of instances ever created for this pool
    pub fn total_count(&self) -> usize {
        self.instances.len()
    }

    /// Number of instances currently checked out
    pub fn active_count(&self, world: &SceneWorld) -> usize {
        self.instances
            .iter()
            .filter(|key| world.is_active(**key))
            .count()
    }

    /// Number of instances parked in the pool and eligible for reuse
    pub fn inactive_count(&self, world: &SceneWorld) -> usize {
        self.instances
            .iter()
            .filter(|key| world.is_alive(**key) && !world.is_active(**key))
            .count()
    }

    /// Append an already-created instance
    pub fn push_instance(&mut self, instance: InstanceKey) {
        self.instances.push(instance);
    }

    /// Create `count` fresh inactive instances and append them
    ///
    /// Returns how many were actually created; a failing template stops the
    /// batch early.
    pub fn spawn_instances(&mut self, world: &mut SceneWorld, count: u32) -> u32 {
        let mut created = 0;
        for _ in 0..count {
            match world.instantiate(self.settings.template, self.settings.placement) {
                Ok(instance) => {
                    self.instances.push(instance);
                    created += 1;
                }
                Err(err) => {
                    log::error!("instance creation failed mid-batch: {err}");
                    break;
                }
            }
        }
        created
    }

    /// Hand out the first inactive instance, or `None` when exhausted
    ///
    /// Scans from the cursor and wraps around once. The winner is reparented
    /// under the placement target, its suspended behaviors are resumed, it is
    /// activated, and acquire hooks run over its subtree. Exhaustion is a
    /// normal signal for the caller to expand, not an error.
    pub fn acquire(&mut self, world: &mut SceneWorld) -> Option<InstanceKey> {
        let len = self.instances.len();
        for offset in 0..len {
            let index = (self.cursor + offset) % len;
            let instance = self.instances[index];
            if !world.is_alive(instance) || world.is_active(instance) {
                continue;
            }

            self.cursor = index + 1;

            if let Some(placement) = self.settings.placement {
                if let Err(err) = world.reparent(instance, Some(placement)) {
                    log::warn!("could not attach acquired instance to placement: {err}");
                }
            }
            world.set_subtree_suspended(instance, false);
            world.set_active(instance, true);
            world.notify_acquired(instance);

            return Some(instance);
        }
        None
    }
}
