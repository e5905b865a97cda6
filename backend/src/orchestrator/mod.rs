//! Orchestrator - trial loop and Monte Carlo driver
//!
//! Implements the daily step of one trial, its configuration, checkpointing
//! and the parallel trial runner.
//!
//! See `engine.rs` for the day loop.

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod trials;

// Re-export main types for convenience
pub use config::{
    CreditConfig, DisasterConfig, DisasterScenario, LendingPolicyConfig, RecoveryBand,
    SimulationConfig,
};
pub use engine::{DayMetrics, Orchestrator, SimulationError};
pub use trials::{run_trial, run_trials, MonteCarloSummary, TrialOutcome};

// Re-export checkpoint types
pub use checkpoint::{compute_config_hash, StateSnapshot};
