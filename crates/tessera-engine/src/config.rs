//! Simulation configuration, validation, and error types.
//!
//! [`SimulationConfig`] is the input for constructing a
//! [`Simulation`](crate::Simulation). [`validate()`](SimulationConfig::validate)
//! checks it at startup, before any step runs.

use std::error::Error;
use std::fmt;

use tessera_behavior::{PipelineError, StepParams};
use tessera_core::Aabb;
use tessera_space::GridConfig;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a [`SimulationConfig`] or building a
/// simulation from it.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A setting required by another setting is absent, e.g.
    /// `bound_space` without `bounds`. Fatal: the simulation cannot start.
    ConfigurationMissing {
        /// The missing setting.
        setting: &'static str,
        /// The setting that requires it.
        required_by: &'static str,
    },
    /// `threads` is zero.
    InvalidThreads {
        /// The configured value.
        value: usize,
    },
    /// `partitions` is zero or exceeds the partition id range.
    InvalidPartitions {
        /// The configured value.
        value: usize,
    },
    /// `chunk_size` is zero.
    InvalidChunkSize,
    /// A cell size is not positive and finite.
    InvalidCellSize {
        /// Which setting.
        setting: &'static str,
        /// The configured value.
        value: f64,
    },
    /// `bounds` is inverted or not finite.
    InvalidBounds {
        /// The configured box.
        bounds: Aabb,
    },
    /// `time_step` is not positive and finite.
    InvalidTimeStep {
        /// The configured value.
        value: f64,
    },
    /// `max_displacement` is negative or not finite.
    InvalidDisplacement {
        /// The configured value.
        value: f64,
    },
    /// The worker thread pool could not be built.
    ThreadPool {
        /// Description from the pool builder.
        reason: String,
    },
    /// Behavior pipeline validation failed.
    Pipeline(PipelineError),
}

impl ConfigError {
    /// Whether the process cannot meaningfully continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigurationMissing { .. })
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationMissing {
                setting,
                required_by,
            } => write!(f, "configuration missing: {setting} is required by {required_by}"),
            Self::InvalidThreads { value } => write!(f, "threads must be at least 1, got {value}"),
            Self::InvalidPartitions { value } => {
                write!(f, "partitions must be in 1..=65536, got {value}")
            }
            Self::InvalidChunkSize => write!(f, "chunk_size must be at least 1"),
            Self::InvalidCellSize { setting, value } => {
                write!(f, "{setting} must be finite and positive, got {value}")
            }
            Self::InvalidBounds { bounds } => write!(
                f,
                "bounds min {:?} must not exceed max {:?}",
                bounds.min.to_array(),
                bounds.max.to_array()
            ),
            Self::InvalidTimeStep { value } => {
                write!(f, "time_step must be finite and positive, got {value}")
            }
            Self::InvalidDisplacement { value } => {
                write!(f, "max_displacement must be finite and non-negative, got {value}")
            }
            Self::ThreadPool { reason } => write!(f, "thread pool: {reason}"),
            Self::Pipeline(e) => write!(f, "pipeline: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PipelineError> for ConfigError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Everything needed to construct a [`Simulation`](crate::Simulation).
///
/// The core only reads these values; loading them from files or the
/// command line is the caller's business.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Worker threads. `None` = `available_parallelism`.
    pub threads: Option<usize>,
    /// Storage partitions. Default: 1.
    pub partitions: usize,
    /// Agents per parallel task. Default: 1000.
    pub chunk_size: usize,
    /// Seed for the per-worker random generators. Default: 4357.
    pub seed: u64,
    /// Fixed spatial cell size. `None` = derive from the largest agent
    /// diameter at each rebuild.
    pub max_interaction_radius: Option<f64>,
    /// Lower bound on the derived cell size. Default: 1.0.
    pub min_cell_size: f64,
    /// Resolve mechanical forces between agents. Default: true.
    pub run_mechanical_interactions: bool,
    /// Keep agents inside `bounds`. Default: false.
    pub bound_space: bool,
    /// Simulation domain. Required when `bound_space` is set.
    pub bounds: Option<Aabb>,
    /// Simulated time per step. Default: 0.01.
    pub time_step: f64,
    /// Maximum distance an agent may move per step. Default: 3.0.
    pub max_displacement: f64,
    /// Rebalance partitions every this many steps. 0 = never. Default: 0.
    pub rebalance_interval: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let params = StepParams::default();
        Self {
            threads: None,
            partitions: 1,
            chunk_size: 1000,
            seed: 4357,
            max_interaction_radius: None,
            min_cell_size: GridConfig::default().min_cell_size,
            run_mechanical_interactions: params.run_mechanical_interactions,
            bound_space: params.bound_space,
            bounds: params.bounds,
            time_step: params.time_step,
            max_displacement: params.max_displacement,
            rebalance_interval: 0,
        }
    }
}

impl SimulationConfig {
    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Threads and work division.
        if let Some(0) = self.threads {
            return Err(ConfigError::InvalidThreads { value: 0 });
        }
        if self.partitions == 0 || self.partitions > u16::MAX as usize + 1 {
            return Err(ConfigError::InvalidPartitions {
                value: self.partitions,
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        // 2. Spatial index.
        check_cell_size("min_cell_size", self.min_cell_size)?;
        if let Some(r) = self.max_interaction_radius {
            check_cell_size("max_interaction_radius", r)?;
        }
        // 3. Domain.
        if self.bound_space && self.bounds.is_none() {
            return Err(ConfigError::ConfigurationMissing {
                setting: "bounds",
                required_by: "bound_space",
            });
        }
        if let Some(bounds) = self.bounds {
            if !bounds.is_valid() {
                return Err(ConfigError::InvalidBounds { bounds });
            }
        }
        // 4. Integration.
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(ConfigError::InvalidTimeStep {
                value: self.time_step,
            });
        }
        if !(self.max_displacement >= 0.0 && self.max_displacement.is_finite()) {
            return Err(ConfigError::InvalidDisplacement {
                value: self.max_displacement,
            });
        }
        Ok(())
    }

    /// Resolve the worker count, applying auto-detection if `None`.
    pub fn resolved_threads(&self) -> usize {
        match self.threads {
            Some(n) => n.max(1),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }

    /// Parameters exposed to behaviors.
    pub fn step_params(&self) -> StepParams {
        StepParams {
            time_step: self.time_step,
            max_displacement: self.max_displacement,
            run_mechanical_interactions: self.run_mechanical_interactions,
            bound_space: self.bound_space,
            bounds: self.bounds,
        }
    }

    /// Sizing rules for the spatial index.
    pub fn grid_config(&self) -> GridConfig {
        GridConfig {
            min_cell_size: self.min_cell_size,
            fixed_cell_size: self.max_interaction_radius,
        }
    }
}

fn check_cell_size(setting: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidCellSize { setting, value })
    }
}
