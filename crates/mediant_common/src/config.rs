//! Per-engine configuration.
//!
//! Every engine instance carries its own configuration value, passed at
//! construction; there is no process-wide mutable state shared between
//! strategy instances.

use serde::{Deserialize, Serialize};

/// Default time slot duration in host time units.
pub const DEFAULT_TIME_SLOT_DURATION: u64 = 1000;

/// Default cap on retained history entries per component field.
pub const DEFAULT_MAX_HISTORY_PER_FIELD: usize = 256;

/// Configuration of one correlation engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Duration of one discrete time slot. Knowledge values are aligned for
    /// correlation within these slots. Must be non-zero. Fixed for the
    /// engine's lifetime: changing it after history has been recorded would
    /// silently re-bucket already-aligned values, so there is no setter.
    pub time_slot_duration: u64,
    /// Upper bound on history entries retained per component field. The
    /// aligner consumes entries as it pairs them up, but if `plan` runs
    /// rarely relative to `monitor` the histories would otherwise grow
    /// without bound. Must be non-zero.
    pub max_history_per_field: usize,
    /// Emit per-phase progress logging.
    pub verbose: bool,
    /// Dump the knowledge history and distance tables while computing.
    pub dump_values: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            time_slot_duration: DEFAULT_TIME_SLOT_DURATION,
            max_history_per_field: DEFAULT_MAX_HISTORY_PER_FIELD,
            verbose: false,
            dump_values: false,
        }
    }
}

impl CorrelationConfig {
    /// Check the configuration for fatal errors. Called at engine
    /// construction; an invalid configuration is never retried.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_slot_duration == 0 {
            return Err("time_slot_duration must be non-zero".to_string());
        }
        if self.max_history_per_field == 0 {
            return Err("max_history_per_field must be non-zero".to_string());
        }
        Ok(())
    }
}
