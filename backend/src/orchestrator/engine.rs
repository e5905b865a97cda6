//! Orchestrator Engine
//!
//! Main simulation loop of one trial, integrating all components:
//! - Demand propagation
//! - Production and rationing
//! - Credit (loan need, payment, amortization)
//! - Disaster injection and recovery
//! - Inventory roll-forward and daily metrics
//! - Event logging
//!
//! # Architecture
//!
//! ```text
//! For each day t:
//! 0. Strike the network if t is the disaster day
//! 1. Propagate demand (all firms)
//! 2. Produce + trade (each active firm)
//! 3a. Secure financing + settle payment (each active firm)
//! 3b. Reverse supplier revenue on handed-back deliveries
//! 3c. Amortize loans, settle balance sheets (each active firm)
//! 4. Refresh recovery rates of the damaged cohort
//! 5. Roll inventories forward (all firms)
//! 6. Aggregate metrics, log end of day
//! 7. Advance time
//! ```
//!
//! Inside phases 2, 3a and 3c a firm only writes its own balance sheet and
//! the per-pair accumulators it owns, so any processing order gives the same
//! state. `step_in_order` runs a day with a caller-chosen permutation.
//!
//! # Example
//!
//! ```rust
//! use disaster_simulator_core_rs::models::{BalanceSheet, FirmRecord, LinkRecord, NetworkData};
//! use disaster_simulator_core_rs::orchestrator::{DisasterConfig, Orchestrator, SimulationConfig};
//!
//! let firm = |id, pini, consumption| FirmRecord {
//!     id,
//!     sector: id,
//!     location: 0,
//!     community: 0,
//!     consumption: Some(consumption),
//!     initial_production: Some(pini),
//!     profit_to_sales: 0.1,
//!     balance_sheet: BalanceSheet::default(),
//! };
//! let network = NetworkData {
//!     firms: vec![firm(1, 10.0, 2.0), firm(2, 20.0, 20.0)],
//!     links: vec![LinkRecord { supplier: 1, customer: 2, weight: 8.0 }],
//!     ..Default::default()
//! };
//! let config = SimulationConfig {
//!     horizon_days: 5,
//!     disaster: DisasterConfig { damaged_fraction: 0.0, ..Default::default() },
//!     ..Default::default()
//! };
//!
//! let mut orchestrator = Orchestrator::new(config, &network).unwrap();
//! let series = orchestrator.run().unwrap();
//!
//! assert_eq!(series.len(), 5);
//! assert!((series[0].gdp - 22.0).abs() < 1e-9);
//! ```

use crate::core::DayClock;
use crate::demand::propagate_demand;
use crate::disaster;
use crate::models::{
    Event, EventLog, FirmId, LoanError, NetworkData, NetworkError, SimulationState,
};
use crate::orchestrator::checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
use crate::orchestrator::SimulationConfig;
use crate::policy::LendingPolicy;
use crate::production::produce;
use crate::rationing::trade;
use crate::rng::RngManager;
use crate::settlement::{apply_revenue_reversals, secure_financing, settle_payment, update_balance_sheet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Simulation error types
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration validation error
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported disaster scenario: {0}")]
    UnsupportedScenario(String),

    #[error("Scenario {scenario} admits {eligible} firms, {required} required")]
    EmptyDisasterCohort {
        scenario: String,
        eligible: usize,
        required: usize,
    },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Loan error: {0}")]
    Loan(#[from] LoanError),

    /// Processing order is not a permutation of the active firms
    #[error("Invalid processing order: {0}")]
    InvalidOrdering(String),

    #[error("Config hash mismatch: snapshot {snapshot}, config {config}")]
    ConfigMismatch { snapshot: String, config: String },

    #[error("Unknown firm: {0}")]
    UnknownFirm(FirmId),

    #[error("Trial already finished at day {0}")]
    HorizonReached(usize),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("State validation error: {0}")]
    StateValidationError(String),
}

// ============================================================================
// Daily Metrics
// ============================================================================

/// Aggregates reported once per simulated day
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DayMetrics {
    pub day: usize,

    /// Σ (realized demand − inputs used)
    pub gdp: f64,

    /// Outstanding healthy short-term principal
    pub loans: f64,

    /// Outstanding defaulted short-term principal
    pub npl: f64,

    pub npl_rate: f64,
    pub npl_count: usize,
    pub deposits: f64,

    /// Σ (margin on sales − instalments paid)
    pub deposit_flow: f64,

    pub equity: f64,

    /// Support granted on this day
    pub government_support: f64,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs one trial day by day
///
/// # Determinism
///
/// All randomness is via `rng` with seeded xorshift64*.
/// Same seed + same config + same network = identical series.
pub struct Orchestrator {
    config: SimulationConfig,

    /// Seed this trial was started with
    seed: u64,

    state: SimulationState,

    clock: DayClock,

    rng: RngManager,

    policy: Box<dyn LendingPolicy>,

    events: EventLog,

    series: Vec<DayMetrics>,

    /// Per-firm value added series (only when enabled in the config)
    value_added: BTreeMap<FirmId, Vec<f64>>,
}

impl Orchestrator {
    /// Create an orchestrator seeded with `config.rng_seed`
    pub fn new(config: SimulationConfig, network: &NetworkData) -> Result<Self, SimulationError> {
        let seed = config.rng_seed;
        Self::with_seed(config, network, seed)
    }

    /// Create the orchestrator of trial `trial` (seed `rng_seed + trial`)
    pub fn for_trial(
        config: SimulationConfig,
        network: &NetworkData,
        trial: usize,
    ) -> Result<Self, SimulationError> {
        let seed = config.trial_seed(trial);
        Self::with_seed(config, network, seed)
    }

    /// Create an orchestrator with an explicit seed
    ///
    /// Validates the config, then builds a fresh state from the network.
    /// A disaster scenario that cannot supply its cohort fails here rather
    /// than on the disaster day.
    pub fn with_seed(
        config: SimulationConfig,
        network: &NetworkData,
        seed: u64,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let mut rng = RngManager::new(seed);
        let state = SimulationState::from_network(network, config.inventory_horizon, &mut rng)?;
        if config.disaster_day < config.horizon_days {
            disaster::check_cohort(&state, config.disaster.scenario, config.disaster.damaged_fraction)?;
        }
        let clock = Self::clock_for(&config, 0);
        let policy = config.credit.lending_policy.build();

        Ok(Self {
            config,
            seed,
            state,
            clock,
            rng,
            policy,
            events: EventLog::new(),
            series: Vec::new(),
            value_added: BTreeMap::new(),
        })
    }

    fn clock_for(config: &SimulationConfig, day: usize) -> DayClock {
        DayClock::at_day(
            day,
            config.horizon_days,
            config.disaster_day,
            config.disaster.recovery_start_day,
        )
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Get mutable reference to simulation state
    ///
    /// Primarily for testing. Direct mutation bypasses orchestrator invariants.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn clock(&self) -> &DayClock {
        &self.clock
    }

    pub fn current_day(&self) -> usize {
        self.clock.current_day()
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    pub fn series(&self) -> &[DayMetrics] {
        &self.series
    }

    pub fn value_added(&self) -> &BTreeMap<FirmId, Vec<f64>> {
        &self.value_added
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    // ========================================================================
    // Day Loop
    // ========================================================================

    /// Run every remaining day; returns the full series
    pub fn run(&mut self) -> Result<&[DayMetrics], SimulationError> {
        while !self.clock.is_finished() {
            self.step()?;
        }
        Ok(&self.series)
    }

    /// Simulate one day, active firms in ascending id order
    pub fn step(&mut self) -> Result<DayMetrics, SimulationError> {
        let order = self.state.active_firm_ids();
        self.run_day(&order)
    }

    /// Simulate one day processing active firms in `order`
    ///
    /// `order` must be a permutation of the active firm ids. The result is
    /// identical to `step()` for every valid permutation.
    pub fn step_in_order(&mut self, order: &[FirmId]) -> Result<DayMetrics, SimulationError> {
        let expected: BTreeSet<FirmId> = self.state.active_firm_ids().into_iter().collect();
        let given: BTreeSet<FirmId> = order.iter().copied().collect();
        if given.len() != order.len() {
            return Err(SimulationError::InvalidOrdering(
                "order lists a firm more than once".to_string(),
            ));
        }
        if given != expected {
            if let Some(unknown) = given.iter().find(|id| self.state.firm(**id).is_none()) {
                return Err(SimulationError::UnknownFirm(*unknown));
            }
            return Err(SimulationError::InvalidOrdering(format!(
                "expected the {} active firms, got {} ids",
                expected.len(),
                order.len()
            )));
        }
        self.run_day(order)
    }

    fn run_day(&mut self, order: &[FirmId]) -> Result<DayMetrics, SimulationError> {
        if self.clock.is_finished() {
            return Err(SimulationError::HorizonReached(self.clock.current_day()));
        }
        let day = self.clock.current_day();
        let recovery_active = self.clock.recovery_active();

        for firm in self.state.firms.values_mut() {
            firm.reset_daily_flows();
        }

        // STEP 0: DISASTER
        if self.clock.is_disaster_day() {
            disaster::strike(
                &mut self.state,
                &self.config.disaster,
                &self.config.credit,
                day,
                &mut self.rng,
                &mut self.events,
            )?;
        }

        // STEP 1: DEMAND
        propagate_demand(&mut self.state, self.config.inventory_adjustment_days);

        // STEP 2: PRODUCTION + RATIONING
        for firm in order {
            produce(&mut self.state, *firm, recovery_active);
            trade(&mut self.state, *firm);
        }

        // STEP 3a: LOAN NEED + PAYMENT
        let credit = &self.config.credit;
        for firm in order {
            if credit.short_term_loans {
                secure_financing(
                    &mut self.state,
                    *firm,
                    self.policy.as_ref(),
                    credit,
                    day,
                    &mut self.events,
                )?;
            }
            if credit.with_payment {
                settle_payment(&mut self.state, *firm, day, &mut self.events);
            }
        }

        // STEP 3b: SUPPLIER REVERSALS
        apply_revenue_reversals(&mut self.state);

        // STEP 3c: AMORTIZATION
        for firm in order {
            update_balance_sheet(
                &mut self.state,
                *firm,
                day,
                credit.default_threshold,
                &mut self.events,
            )?;
        }

        // STEP 4: RECOVERY RATES
        if !self.state.damaged.is_empty() {
            disaster::refresh_recovery_rates(
                &mut self.state,
                &self.config.disaster,
                credit.long_term_maturity,
            );
        }

        // STEP 5: INVENTORY
        let value_added = self.roll_inventories();

        // STEP 6: METRICS
        let metrics = self.collect_metrics(day, &value_added);
        if self.config.record_firm_value_added {
            for (firm, added) in value_added {
                self.value_added.entry(firm).or_default().push(added);
            }
        }
        self.series.push(metrics);
        self.events.log(Event::EndOfDay {
            day,
            gdp: metrics.gdp,
            npl_count: metrics.npl_count,
            government_support: metrics.government_support,
        });
        tracing::debug!(
            day,
            gdp = metrics.gdp,
            loans = metrics.loans,
            npl = metrics.npl,
            "day complete"
        );

        // STEP 7: ADVANCE
        self.clock.advance_day();
        Ok(metrics)
    }

    /// Consume inputs and add deliveries; returns each firm's value added
    fn roll_inventories(&mut self) -> BTreeMap<FirmId, f64> {
        let state = &mut self.state;
        let mut value_added = BTreeMap::new();
        for (id, firm) in &state.firms {
            let usage_ratio = if firm.is_active() && firm.initial_production() > 0.0 {
                firm.production() / firm.initial_production()
            } else {
                0.0
            };
            let orders = &state.orders;
            let used = state
                .inventory
                .roll_forward(*id, usage_ratio, |supplier| orders.delivered(*id, supplier));
            value_added.insert(*id, firm.realized_demand() - used);
        }
        value_added
    }

    fn collect_metrics(&mut self, day: usize, value_added: &BTreeMap<FirmId, f64>) -> DayMetrics {
        let totals = self.state.ledger.short_term_totals();
        let support = self.state.orders.support_total();
        self.state.government_support += support;

        let deposit_flow = self
            .state
            .firms
            .values()
            .map(|firm| firm.profit_to_sales() * firm.realized_demand() - firm.amortization_paid())
            .sum();

        DayMetrics {
            day,
            gdp: value_added.values().sum(),
            loans: totals.loans,
            npl: totals.npl,
            npl_rate: totals.npl_rate(),
            npl_count: totals.npl_count,
            deposits: self.state.total_of(|sheet| sheet.deposit),
            deposit_flow,
            equity: self.state.total_of(|sheet| sheet.equity),
            government_support: support,
        }
    }

    // ========================================================================
    // Checkpointing
    // ========================================================================

    /// Snapshot the trial at the current day boundary
    pub fn checkpoint(&self) -> Result<StateSnapshot, SimulationError> {
        Ok(StateSnapshot {
            current_day: self.clock.current_day(),
            seed: self.seed,
            rng_state: self.rng.get_state(),
            config_hash: compute_config_hash(&self.config)?,
            state: self.state.clone(),
            series: self.series.clone(),
            value_added: self.value_added.clone(),
        })
    }

    /// Resume a trial from a snapshot taken with the same config
    ///
    /// The event log restarts empty.
    pub fn from_snapshot(
        config: SimulationConfig,
        snapshot: StateSnapshot,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let config_hash = compute_config_hash(&config)?;
        if config_hash != snapshot.config_hash {
            return Err(SimulationError::ConfigMismatch {
                snapshot: snapshot.config_hash,
                config: config_hash,
            });
        }
        validate_snapshot(&snapshot)?;

        let clock = Self::clock_for(&config, snapshot.current_day);
        let policy = config.credit.lending_policy.build();

        Ok(Self {
            config,
            seed: snapshot.seed,
            state: snapshot.state,
            clock,
            rng: RngManager::new(snapshot.rng_state),
            policy,
            events: EventLog::new(),
            series: snapshot.series,
            value_added: snapshot.value_added,
        })
    }
}

// Manual Debug implementation (policies don't implement Debug)
impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("seed", &self.seed)
            .field("current_day", &self.current_day())
            .field("num_firms", &self.state.num_firms())
            .field("policy", &self.policy.name())
            .field("event_count", &self.events.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
