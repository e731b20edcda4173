//! Swarm demo: projectile and impact-effect pooling under a frame loop
//!
//! Registers pools for a handful of templates, then fires random acquire
//! bursts at them for a fixed number of frames while instances auto-release
//! on countdown timers. Expansion work is drained by the manager's tick, so
//! watching the log shows the pools warming up in the background instead of
//! spiking a single frame.

use std::cell::Cell;
use std::rc::Rc;

use pool_engine::foundation::logging;
use pool_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FRAME_COUNT: u32 = 600;
const FRAME_DT: f32 = 1.0 / 60.0;
const TICK_BUDGET: u32 = 4;
const BOLT_POOL_SIZE: u32 = 12;
const FLASH_POOL_SIZE: u32 = 6;
const BURST_CHANCE: f64 = 0.35;
const MAX_BURST: u32 = 6;
const MIN_LIFETIME: f32 = 0.4;
const MAX_LIFETIME: f32 = 2.5;
const STATS_INTERVAL: u32 = 120;

/// Countdown wrapper that releases an instance when its time is up
struct ReleaseTimer {
    instance: InstanceKey,
    remaining: f32,
}

impl ReleaseTimer {
    fn new(instance: InstanceKey, duration: f32) -> Self {
        Self {
            instance,
            remaining: duration,
        }
    }

    /// Count down; returns true once expired
    fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

/// Pooled behavior that keeps a running count of thruster activations
struct ThrusterEmitter {
    ignitions: Rc<Cell<u64>>,
    suspended: bool,
}

impl PooledBehavior for ThrusterEmitter {
    fn on_acquired(&mut self) {
        // Acquire resumes suspended behaviors before the hooks run.
        if !self.suspended {
            self.ignitions.set(self.ignitions.get() + 1);
        }
    }

    fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }
}

fn bolt_template(ignitions: &Rc<Cell<u64>>) -> Template {
    let counter = Rc::clone(ignitions);
    let root = TemplateNode::new("bolt", NodeKind::Spatial)
        .with_behavior(
            Capabilities::ACQUIRE_HOOK | Capabilities::SUSPEND_WHILE_POOLED,
            move || {
                Box::new(ThrusterEmitter {
                    ignitions: Rc::clone(&counter),
                    suspended: true,
                })
            },
        )
        .with_child(TemplateNode::new("trail", NodeKind::Spatial));
    Template::new("bolt", root)
}

fn flash_template() -> Template {
    Template::new(
        "impact flash",
        TemplateNode::new("flash", NodeKind::Widget),
    )
}

fn main() {
    logging::init_with_default("info");

    let config = PoolEngineConfig::new()
        .with_tick_budget(TICK_BUDGET)
        .with_growth(GrowthPolicy::Doubling);
    if let Err(err) = config.validate() {
        log::error!("bad configuration: {err}");
        return;
    }

    let mut world = SceneWorld::new();
    let ignitions = Rc::new(Cell::new(0_u64));

    // A detached staging node keeps parked instances out of the live scene.
    let staging_template = Template::new("staging", TemplateNode::new("staging", NodeKind::Spatial));
    let staging_key = world.add_template(staging_template);
    let staging = world
        .instantiate(staging_key, None)
        .expect("staging node");

    let bolt = world.add_template(bolt_template(&ignitions));
    let flash = world.add_template(flash_template());

    let mut manager = PoolManager::new(&config);
    manager.attach_driver();
    manager.register_pool(
        &mut world,
        PoolSettings::new(bolt, BOLT_POOL_SIZE).with_placement(staging),
    );
    manager.register_pool(
        &mut world,
        PoolSettings::new(flash, FLASH_POOL_SIZE)
            .with_name("flashes")
            .with_placement(staging),
    );

    let mut rng = StdRng::seed_from_u64(0x5711);
    let mut timers: Vec<ReleaseTimer> = Vec::new();
    let mut frame_timer = Timer::new();
    let warmup = Stopwatch::start_new();

    for frame in 0..FRAME_COUNT {
        frame_timer.update();

        // Auto-release expired instances before spawning new ones.
        let mut index = 0;
        while index < timers.len() {
            if timers[index].tick(FRAME_DT) {
                let timer = timers.swap_remove(index);
                manager.release(&mut world, timer.instance);
            } else {
                index += 1;
            }
        }

        if rng.gen_bool(BURST_CHANCE) {
            let burst = rng.gen_range(1..=MAX_BURST);
            for _ in 0..burst {
                let instance = if rng.gen_bool(0.7) {
                    manager.acquire(&mut world, bolt)
                } else {
                    manager.acquire_named(&mut world, "flashes")
                };
                match instance {
                    Some(instance) => {
                        let lifetime = rng.gen_range(MIN_LIFETIME..MAX_LIFETIME);
                        timers.push(ReleaseTimer::new(instance, lifetime));
                    }
                    None => log::error!("acquire failed on frame {frame}"),
                }
            }
        }

        manager.tick(&mut world);

        if frame % STATS_INTERVAL == 0 {
            let stats = manager.stats(&world);
            log::info!(
                "frame {frame} (t={:.2}s): {} live / {} total instances, {} expansion(s), {} pending, expanding={}",
                frame_timer.total_time(),
                stats.live_instances,
                stats.total_instances,
                stats.expansions,
                stats.pending_instances,
                manager.is_expanding(),
            );
        }
    }

    // Let the allocator finish whatever is still queued.
    let mut drain_ticks = 0;
    while manager.is_expanding() {
        manager.tick(&mut world);
        drain_ticks += 1;
    }

    let stats = manager.stats(&world);
    log::info!(
        "done after {FRAME_COUNT} frames (+{drain_ticks} drain ticks, {:.1} ms wall): \
         {} pools, {} instances total, {} acquired, {} released, {} thruster ignitions",
        warmup.elapsed_millis(),
        stats.active_pools,
        stats.total_instances,
        stats.total_acquired,
        stats.total_released,
        ignitions.get(),
    );

    manager.reset();
}
