//! Growth policy and background expansion jobs

use serde::{Deserialize, Serialize};

use crate::foundation::collections::PoolKey;
use crate::pool::settings::PoolSettings;

/// Smallest growth step the clamping policy will produce
pub const MIN_STEP: u32 = 4;

/// Largest growth step the clamping policy will produce
pub const MAX_STEP: u32 = 32;

/// Upper bound on a single doubling step
const DOUBLING_CAP: u32 = 256;

/// How many instances to create when a pool runs dry
///
/// Both policies grow monotonically and stay bounded; neither ever produces
/// a zero step, so an exhausted pool always gains at least one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Clamp the pool's count hint into `[min, max]`
    Step {
        /// Lower clamp bound
        min: u32,
        /// Upper clamp bound
        max: u32,
    },
    /// Double the pool's count hint, capped to avoid allocation spikes
    Doubling,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::Doubling
    }
}

impl GrowthPolicy {
    /// The clamping policy with its stock bounds
    pub fn clamped() -> Self {
        Self::Step {
            min: MIN_STEP,
            max: MAX_STEP,
        }
    }

    /// Compute the number of instances to create for an exhausted pool
    pub fn growth_step(&self, hint: u32) -> u32 {
        match *self {
            Self::Step { min, max } => hint.clamp(min.max(1), max.max(1)),
            Self::Doubling => (hint.max(1) * 2).min(DOUBLING_CAP),
        }
    }

    /// Reject bounds the growth computation cannot work with
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::Step { min: 0, .. } => Err("step minimum must be at least 1".into()),
            Self::Step { min, max } if min > max => {
                Err(format!("step minimum {min} exceeds maximum {max}"))
            }
            _ => Ok(()),
        }
    }
}

/// Pending background work: create `remaining` more instances for one pool
///
/// Jobs live only inside the allocator's queue. The settings snapshot is
/// taken when the job is enqueued, so later changes to the pool's own
/// settings cannot retarget in-flight work.
#[derive(Debug, Clone)]
pub struct ExpansionJob {
    /// Pool the new instances belong to
    pub pool: PoolKey,
    /// Settings snapshot taken at enqueue time
    pub settings: PoolSettings,
    /// Instances still to create
    pub remaining: u32,
}

impl ExpansionJob {
    /// Create a job for `remaining` instances of `pool`
    pub fn new(pool: PoolKey, settings: PoolSettings, remaining: u32) -> Self {
        Self {
            pool,
            settings,
            remaining,
        }
    }
}
