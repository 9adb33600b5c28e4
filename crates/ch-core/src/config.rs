//! Engine and dispatcher configuration.
//!
//! Loading these from a file is the application's job; the structs are plain
//! data with `pub` fields so any config layer (TOML, CLI flags, env) can fill
//! them in.  Call `validate()` before handing them to the dispatcher.

use crate::{CoreError, CoreResult};

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Per-engine search settings.  Every worker gets a copy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Multiplied with the settled distance of each leg's destination to
    /// estimate travel time.  Graph-specific; 1.0 means "time == metres".
    pub travel_time_constant: f64,

    /// Stop scanning a node's incoming edges at the first up-edge during the
    /// backward marking pass.
    ///
    /// Only honoured when the graph reports that incoming edges are stored
    /// down-edges first (`GraphRep::in_edges_down_first`); otherwise the
    /// engine always scans the whole list.
    pub early_exit_in_edges: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            travel_time_constant: 1.0,
            early_exit_in_edges:  true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.travel_time_constant.is_finite() || self.travel_time_constant < 0.0 {
            return Err(CoreError::Config(format!(
                "travel_time_constant must be finite and non-negative, got {}",
                self.travel_time_constant
            )));
        }
        Ok(())
    }
}

// ── DispatcherConfig ──────────────────────────────────────────────────────────

/// Worker pool and queue sizing for the request dispatcher.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatcherConfig {
    /// Number of OS worker threads.  Each owns one engine and one scratch
    /// pool (≈ 4 bytes × (2 × nodes) + edges / 8 per worker).
    pub worker_threads: usize,

    /// Maximum number of requests waiting for a worker.  `submit` rejects
    /// once this many are queued.
    pub queue_capacity: usize,

    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,

    /// Search settings handed to every worker's engine.
    pub engine: EngineConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_threads:     std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            queue_capacity:     32,
            thread_name_prefix: "ch-worker".to_string(),
            engine:             EngineConfig::default(),
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.worker_threads == 0 {
            return Err(CoreError::Config("worker_threads must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(CoreError::Config("queue_capacity must be at least 1".into()));
        }
        self.engine.validate()
    }
}
