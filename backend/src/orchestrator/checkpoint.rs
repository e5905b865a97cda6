//! Checkpoint - Save/Load Trial State
//!
//! Enables serialization and deserialization of a running trial for
//! pause/resume.
//!
//! # Critical Invariants
//!
//! - **Determinism**: a resumed trial produces the same series as an uninterrupted one
//! - **Balance Identity**: every firm in a snapshot satisfies the balance identity
//! - **Config Matching**: state can only be loaded with the config that produced it

use crate::models::{FirmId, SimulationState};
use crate::orchestrator::{DayMetrics, SimulationError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete trial snapshot
///
/// Captures everything needed to resume a trial at a day boundary. The event
/// log is not part of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Next day to simulate
    pub current_day: usize,

    /// Seed the trial was started with
    pub seed: u64,

    /// RNG state at time of snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    /// SHA256 hash of the config (for validation)
    pub config_hash: String,

    pub state: SimulationState,

    /// Metrics of the days already simulated
    pub series: Vec<DayMetrics>,

    pub value_added: BTreeMap<FirmId, Vec<f64>>,
}

impl StateSnapshot {
    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string(self).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot serialization failed: {}", e))
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot deserialization failed: {}", e))
        })
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// This hash is used to verify that a checkpoint's config matches
/// the config used to restore it.
///
/// Uses canonical JSON serialization with sorted keys.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    // Recursively sort all object keys for canonical representation
    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate state snapshot integrity
///
/// Checks:
/// - the day counter agrees with the recorded series
/// - balance identity of every firm
/// - damaged firms are registered
pub fn validate_snapshot(snapshot: &StateSnapshot) -> Result<(), SimulationError> {
    if snapshot.series.len() != snapshot.current_day {
        return Err(SimulationError::StateValidationError(format!(
            "Snapshot at day {} carries {} days of metrics",
            snapshot.current_day,
            snapshot.series.len()
        )));
    }

    let violations = snapshot.state.identity_violations();
    if let Some(firm) = violations.first() {
        return Err(SimulationError::StateValidationError(format!(
            "Balance identity violated for firm {} ({} firms in total)",
            firm,
            violations.len()
        )));
    }

    for id in snapshot.state.damaged_firms() {
        if snapshot.state.firm(*id).is_none() {
            return Err(SimulationError::StateValidationError(format!(
                "Damaged firm {} is not registered",
                id
            )));
        }
    }

    Ok(())
}
