//! # Engine Configuration
//!
//! Configuration for the pool engine: initial sizing of auto-registered
//! pools, the per-tick instantiation budget of the background allocator, and
//! the growth policy applied when a pool runs dry.
//!
//! Configuration files may be TOML or RON; both round-trip through the
//! [`Config`] trait.

use serde::{Deserialize, Serialize};

use crate::pool::GrowthPolicy;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A field holds a value the engine cannot operate with
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// # Pool Engine Configuration
///
/// Tuning knobs for the pool manager and its background allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEngineConfig {
    /// Instance count for pools registered implicitly on first acquire
    pub default_pool_size: u32,
    /// Maximum instances the background allocator creates per tick,
    /// across all queued jobs combined
    pub tick_budget: u32,
    /// Growth policy applied when a pool is exhausted
    pub growth: GrowthPolicy,
}

impl Default for PoolEngineConfig {
    fn default() -> Self {
        Self {
            default_pool_size: 4,
            tick_budget: 8,
            growth: GrowthPolicy::default(),
        }
    }
}

impl Config for PoolEngineConfig {}

impl PoolEngineConfig {
    /// Create a configuration with engine defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size of implicitly registered pools
    pub fn with_default_pool_size(mut self, size: u32) -> Self {
        self.default_pool_size = size;
        self
    }

    /// Set the allocator's per-tick instantiation budget
    pub fn with_tick_budget(mut self, budget: u32) -> Self {
        self.tick_budget = budget;
        self
    }

    /// Set the growth policy
    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_pool_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.tick_budget == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_budget",
                reason: "must be at least 1".to_string(),
            });
        }
        self.growth.validate().map_err(|reason| ConfigError::InvalidValue {
            field: "growth",
            reason,
        })
    }
}
