//! Simulation configuration
//!
//! Every parameter of the model is an explicit field with a default, so a
//! configuration file only needs to name what it changes:
//!
//! ```rust
//! use disaster_simulator_core_rs::orchestrator::SimulationConfig;
//!
//! let config: SimulationConfig = serde_json::from_str(r#"{
//!     "horizon_days": 30,
//!     "disaster": { "damaged_fraction": 0.1 }
//! }"#).unwrap();
//!
//! assert_eq!(config.horizon_days, 30);
//! assert_eq!(config.credit.short_term_maturity, 53);
//! assert!(config.validate().is_ok());
//! ```

use crate::models::{Firm, InventoryHorizon, SectorId};
use crate::orchestrator::SimulationError;
use crate::policy::{LendingPolicy, NoRiskPolicy, PositiveEquityPolicy, RiskManagerPolicy};
use serde::{Deserialize, Serialize};

// ============================================================================
// Disaster
// ============================================================================

/// Which firms can be hit by the disaster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DisasterScenario {
    /// Any active firm
    WholeNetwork,
    /// Active firms of one location (prefecture)
    Location { location: u32 },
    /// Active firms of one sector
    Sector { sector: SectorId },
    /// Active firms of one community (not supported, rejected at validation)
    Community { community: u32 },
}

impl Default for DisasterScenario {
    fn default() -> Self {
        DisasterScenario::WholeNetwork
    }
}

impl DisasterScenario {
    /// True when `firm` belongs to the scenario's eligible set
    pub fn admits(&self, firm: &Firm) -> bool {
        match *self {
            DisasterScenario::WholeNetwork => true,
            DisasterScenario::Location { location } => firm.location() == location,
            DisasterScenario::Sector { sector } => firm.sector() == sector,
            DisasterScenario::Community { community } => firm.community() == community,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DisasterScenario::WholeNetwork => "WholeNetwork",
            DisasterScenario::Location { .. } => "Location",
            DisasterScenario::Sector { .. } => "Sector",
            DisasterScenario::Community { .. } => "Community",
        }
    }
}

/// Band `[GammaMin, GammaMax]` recovery rates are scaled into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryBand {
    pub min: f64,
    pub max: f64,
}

impl Default for RecoveryBand {
    fn default() -> Self {
        Self {
            min: 0.001,
            max: 0.004,
        }
    }
}

impl RecoveryBand {
    /// Map `x ∈ [lowest, highest]` linearly onto the band
    ///
    /// A degenerate range maps to the midpoint of the band.
    pub fn scale(&self, x: f64, lowest: f64, highest: f64) -> f64 {
        let span = highest - lowest;
        if !(span.abs() > f64::EPSILON) || !x.is_finite() {
            return (self.min + self.max) / 2.0;
        }
        self.min + (self.max - self.min) * (x - lowest) / span
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisasterConfig {
    pub scenario: DisasterScenario,

    /// Share of active firms damaged
    pub damaged_fraction: f64,

    /// Capacity loss Δ assigned to each damaged firm
    pub damage_magnitude: f64,

    pub recovery_band: RecoveryBand,

    /// First day on which Δ decays
    pub recovery_start_day: usize,

    /// Issue reconstruction loans to damaged firms
    pub long_term_loans: bool,
}

impl Default for DisasterConfig {
    fn default() -> Self {
        Self {
            scenario: DisasterScenario::WholeNetwork,
            damaged_fraction: 0.03,
            damage_magnitude: 0.512040958832949,
            recovery_band: RecoveryBand::default(),
            recovery_start_day: 5,
            long_term_loans: true,
        }
    }
}

// ============================================================================
// Credit
// ============================================================================

/// Lending policy selection
///
/// Determines how banks answer a firm's financing gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LendingPolicyConfig {
    /// Lend while the solvency ratio stays under `solvency_limit`
    RiskManager {
        solvency_limit: f64,
        /// Cover refused gaps with government support
        firm_support: bool,
    },

    /// Always lend
    NoRiskPolicy,

    /// Lend to firms with positive equity only
    PositiveEquity,
}

impl Default for LendingPolicyConfig {
    fn default() -> Self {
        LendingPolicyConfig::RiskManager {
            solvency_limit: 0.034,
            firm_support: true,
        }
    }
}

impl LendingPolicyConfig {
    /// Instantiate the configured policy
    pub fn build(&self) -> Box<dyn LendingPolicy> {
        match *self {
            LendingPolicyConfig::RiskManager {
                solvency_limit,
                firm_support,
            } => Box::new(RiskManagerPolicy::new(solvency_limit, firm_support)),
            LendingPolicyConfig::NoRiskPolicy => Box::new(NoRiskPolicy),
            LendingPolicyConfig::PositiveEquity => Box::new(PositiveEquityPolicy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditConfig {
    /// Number of payments of a short-term loan
    pub short_term_maturity: u32,

    /// Number of payments of a reconstruction loan
    pub long_term_maturity: u32,

    /// Fixed rate of reconstruction loans
    pub long_term_rate: f64,

    /// Price short-term loans by production shortfall (annuity); flat otherwise
    pub variable_rate: bool,

    /// Firms may request short-term loans
    pub short_term_loans: bool,

    /// Customers pay their suppliers
    pub with_payment: bool,

    /// Consecutive missed payments before a short-term loan defaults
    pub default_threshold: u32,

    pub lending_policy: LendingPolicyConfig,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            short_term_maturity: 53,
            long_term_maturity: 399,
            long_term_rate: 0.04,
            variable_rate: true,
            short_term_loans: true,
            with_payment: true,
            default_threshold: 10,
            lending_policy: LendingPolicyConfig::default(),
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Complete configuration of a Monte Carlo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Days simulated per trial
    pub horizon_days: usize,

    /// Independent repetitions
    pub num_trials: usize,

    /// Base seed; trial `k` uses `rng_seed + k`
    pub rng_seed: u64,

    /// Replenishment horizon `n`
    pub inventory_horizon: InventoryHorizon,

    /// Days over which an inventory shortfall is rebuilt (`tau`)
    pub inventory_adjustment_days: u32,

    /// Day on which the disaster strikes
    pub disaster_day: usize,

    pub disaster: DisasterConfig,

    pub credit: CreditConfig,

    /// Keep each firm's daily value added in the trial outcome
    pub record_firm_value_added: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon_days: 365,
            num_trials: 100,
            rng_seed: 0,
            inventory_horizon: InventoryHorizon::default(),
            inventory_adjustment_days: 6,
            disaster_day: 1,
            disaster: DisasterConfig::default(),
            credit: CreditConfig::default(),
            record_firm_value_added: false,
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json)
            .map_err(|e| SimulationError::InvalidConfig(format!("config parse failed: {}", e)))
    }

    /// Seed of trial `trial`
    pub fn trial_seed(&self, trial: usize) -> u64 {
        self.rng_seed.wrapping_add(trial as u64)
    }

    /// Fail fast on inconsistent parameters
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.horizon_days == 0 {
            return Err(invalid("horizon_days must be positive"));
        }
        if self.inventory_adjustment_days == 0 {
            return Err(invalid("inventory_adjustment_days must be positive"));
        }
        match self.inventory_horizon {
            InventoryHorizon::Fixed { days } if days == 0 => {
                return Err(invalid("fixed inventory horizon must be positive"));
            }
            InventoryHorizon::Poisson { mean } if !(mean.is_finite() && mean > 0.0) => {
                return Err(invalid("Poisson inventory horizon needs a positive mean"));
            }
            _ => {}
        }

        let disaster = &self.disaster;
        if !unit_interval(disaster.damaged_fraction) {
            return Err(invalid("damaged_fraction must lie in [0, 1]"));
        }
        if !unit_interval(disaster.damage_magnitude) {
            return Err(invalid("damage_magnitude must lie in [0, 1]"));
        }
        let band = disaster.recovery_band;
        if !(band.min.is_finite() && band.max.is_finite()) || band.min < 0.0 || band.min > band.max {
            return Err(invalid("recovery_band must satisfy 0 <= min <= max"));
        }
        if band.max > 1.0 {
            return Err(invalid("recovery rates above 1 would make damage negative"));
        }
        if let DisasterScenario::Community { .. } = disaster.scenario {
            return Err(SimulationError::UnsupportedScenario(
                disaster.scenario.name().to_string(),
            ));
        }

        let credit = &self.credit;
        if credit.short_term_maturity == 0 || credit.long_term_maturity == 0 {
            return Err(invalid("loan maturities must be positive"));
        }
        if credit.default_threshold == 0 {
            return Err(invalid("default_threshold must be positive"));
        }
        if !credit.long_term_rate.is_finite() || credit.long_term_rate < 0.0 {
            return Err(invalid("long_term_rate must be finite and non-negative"));
        }
        if let LendingPolicyConfig::RiskManager { solvency_limit, .. } = credit.lending_policy {
            if !solvency_limit.is_finite() {
                return Err(invalid("solvency_limit must be finite"));
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> SimulationError {
    SimulationError::InvalidConfig(message.to_string())
}

fn unit_interval(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}
