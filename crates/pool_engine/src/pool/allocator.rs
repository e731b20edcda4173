//! Time-sliced background allocator
//!
//! Drains queued expansion jobs under a fixed per-tick instantiation budget
//! so a large expansion never stalls the frame that requested it. The
//! allocator is passive: it has no thread and no timer, it only makes
//! progress when a driver calls [`TimeSlicedAllocator::tick`] once per
//! scheduling tick.

use std::collections::VecDeque;

use crate::foundation::collections::PoolMap;
use crate::pool::expansion::ExpansionJob;
use crate::pool::pool::Pool;
use crate::scene::SceneWorld;

/// FIFO queue of pending expansions, drained under a per-tick budget
///
/// The budget caps how many instances are created per tick across all queued
/// jobs combined. Jobs are serviced strictly in arrival order; a job that is
/// only partially drained stays at the head and resumes on the next tick.
/// The `warming` flag is the observable Idle/Draining state.
#[derive(Debug)]
pub struct TimeSlicedAllocator {
    queue: VecDeque<ExpansionJob>,
    tick_budget: u32,
    warming: bool,
}

impl TimeSlicedAllocator {
    /// Create an idle allocator with the given per-tick budget
    pub fn new(tick_budget: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            tick_budget: clamp_budget(tick_budget),
            warming: false,
        }
    }

    /// Replace the per-tick instantiation budget
    pub fn set_tick_budget(&mut self, tick_budget: u32) {
        self.tick_budget = clamp_budget(tick_budget);
    }

    /// The current per-tick instantiation budget
    pub fn tick_budget(&self) -> u32 {
        self.tick_budget
    }

    /// Whether any background expansion work is pending
    pub fn is_warming(&self) -> bool {
        self.warming
    }

    /// Number of queued jobs
    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Total instances still to be created across all queued jobs
    pub fn pending_instances(&self) -> u32 {
        self.queue.iter().map(|job| job.remaining).sum()
    }

    /// Queue an expansion job behind all existing work
    pub fn enqueue(&mut self, job: ExpansionJob) {
        log::debug!(
            "queued background expansion of {} instance(s) for pool {:?}",
            job.remaining,
            job.pool
        );
        self.queue.push_back(job);
        self.warming = true;
    }

    /// Drop all pending work and return to idle
    pub fn clear(&mut self) {
        self.queue.clear();
        self.warming = false;
    }

    /// Service the queue for one scheduling tick
    ///
    /// Creates at most the budgeted number of instances, front job first.
    /// Jobs whose pool or template has died, or whose remaining count is
    /// already zero, are dequeued and skipped without failing the loop.
    /// Returns how many instances were created this tick.
    pub fn tick(&mut self, pools: &mut PoolMap<Pool>, world: &mut SceneWorld) -> u32 {
        let mut budget = self.tick_budget;
        let mut created_this_tick = 0;

        while budget > 0 {
            let Some(job) = self.queue.front_mut() else {
                break;
            };

            if job.remaining == 0 || !world.is_template_alive(job.settings.template) {
                self.queue.pop_front();
                continue;
            }
            let Some(pool) = pools.get_mut(job.pool) else {
                log::debug!("dropping expansion job for dead pool {:?}", job.pool);
                self.queue.pop_front();
                continue;
            };

            let batch = job.remaining.min(budget);
            let mut created = 0;
            for _ in 0..batch {
                match world.instantiate(job.settings.template, job.settings.placement) {
                    Ok(instance) => {
                        pool.push_instance(instance);
                        created += 1;
                    }
                    Err(err) => {
                        log::error!("background expansion failed: {err}");
                        break;
                    }
                }
            }

            job.remaining -= created;
            budget -= created;
            created_this_tick += created;

            if created < batch {
                // The template broke mid-batch; retrying next tick would spin.
                self.queue.pop_front();
                continue;
            }
            if job.remaining == 0 {
                self.queue.pop_front();
            }
        }

        if self.queue.is_empty() && self.warming {
            log::debug!("expansion queue drained, allocator idle");
            self.warming = false;
        }

        created_this_tick
    }
}

fn clamp_budget(tick_budget: u32) -> u32 {
    if tick_budget == 0 {
        log::warn!("tick budget must be positive, clamping to 1");
        1
    } else {
        tick_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::SlotMap;
    use crate::pool::settings::PoolSettings;
    use crate::scene::{NodeKind, Template, TemplateNode};

    fn setup(
        display: &str,
        count: u32,
    ) -> (SceneWorld, PoolMap<Pool>, crate::foundation::collections::PoolKey) {
        let mut world = SceneWorld::new();
        let template = world.add_template(Template::new(
            display,
            TemplateNode::new(display, NodeKind::Spatial),
        ));
        let mut pools: PoolMap<Pool> = SlotMap::with_key();
        let key = pools.insert(Pool::new(PoolSettings::new(template, count)));
        (world, pools, key)
    }

    fn job_for(pools: &PoolMap<Pool>, key: crate::foundation::collections::PoolKey, remaining: u32) -> ExpansionJob {
        let settings = pools[key].settings().clone();
        ExpansionJob::new(key, settings.expansion_snapshot(remaining), remaining)
    }

    #[test]
    fn no_tick_exceeds_the_budget() {
        let (mut world, mut pools, key) = setup("spark", 0);
        let mut allocator = TimeSlicedAllocator::new(2);
        allocator.enqueue(job_for(&pools, key, 5));

        let mut per_tick = Vec::new();
        while allocator.is_warming() {
            per_tick.push(allocator.tick(&mut pools, &mut world));
        }

        assert!(per_tick.iter().all(|created| *created <= 2));
        assert_eq!(per_tick, vec![2, 2, 1]);
        assert_eq!(pools[key].total_count(), 5);
    }

    #[test]
    fn jobs_drain_in_fifo_order() {
        let (mut world, mut pools, first) = setup("spark", 0);
        let template = world.add_template(Template::new(
            "flare",
            TemplateNode::new("flare", NodeKind::Spatial),
        ));
        let second = pools.insert(Pool::new(PoolSettings::new(template, 0)));

        let mut allocator = TimeSlicedAllocator::new(2);
        allocator.enqueue(job_for(&pools, first, 3));
        allocator.enqueue(job_for(&pools, second, 2));

        allocator.tick(&mut pools, &mut world);
        assert_eq!(pools[first].total_count(), 2);
        assert_eq!(pools[second].total_count(), 0);

        // The partially drained head resumes before the second job starts.
        allocator.tick(&mut pools, &mut world);
        assert_eq!(pools[first].total_count(), 3);
        assert_eq!(pools[second].total_count(), 1);

        allocator.tick(&mut pools, &mut world);
        assert_eq!(pools[second].total_count(), 2);
        assert!(!allocator.is_warming());
    }

    #[test]
    fn stale_pool_jobs_are_skipped() {
        let (mut world, mut pools, key) = setup("spark", 0);
        let mut allocator = TimeSlicedAllocator::new(4);
        allocator.enqueue(job_for(&pools, key, 3));

        pools.remove(key);
        let created = allocator.tick(&mut pools, &mut world);

        assert_eq!(created, 0);
        assert!(!allocator.is_warming());
        assert_eq!(allocator.pending_jobs(), 0);
    }

    #[test]
    fn warming_tracks_queue_state() {
        let (mut world, mut pools, key) = setup("spark", 0);
        let mut allocator = TimeSlicedAllocator::new(8);
        assert!(!allocator.is_warming());

        allocator.enqueue(job_for(&pools, key, 3));
        assert!(allocator.is_warming());

        allocator.tick(&mut pools, &mut world);
        assert!(!allocator.is_warming());
    }

    #[test]
    fn zero_budget_is_clamped() {
        let allocator = TimeSlicedAllocator::new(0);
        assert_eq!(allocator.tick_budget(), 1);
    }
}
