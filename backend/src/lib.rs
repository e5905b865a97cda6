//! Disaster Simulator Core - Rust Engine
//!
//! Contagion of a natural disaster through a firm-to-firm production network
//! and the banks that finance it, with deterministic execution.
//!
//! # Architecture
//!
//! - **core**: Day clock
//! - **models**: Domain types (Firm, BalanceSheet, LoanContract, State)
//! - **demand**: Desired orders from realized demand and inventory targets
//! - **production**: Capacity, inventory and demand constrained output
//! - **rationing**: Allocation of scarce output across claimants
//! - **policy**: Bank lending policies
//! - **settlement**: Loan origination, payment and amortization
//! - **disaster**: Shock injection and recovery rates
//! - **orchestrator**: Day loop, checkpoints and Monte Carlo trials
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Every firm satisfies its balance identity after every day
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Results of a day do not depend on the order firms are processed in

// Module declarations
pub mod core;
pub mod demand;
pub mod disaster;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod production;
pub mod rationing;
pub mod rng;
pub mod settlement;

// Re-exports for convenience
pub use core::DayClock;
pub use models::{
    event::{Event, EventLog},
    firm::Firm,
    network::{NetworkData, NetworkError},
    state::SimulationState,
    LoanError,
};
pub use orchestrator::{
    run_trials, DayMetrics, MonteCarloSummary, Orchestrator, SimulationConfig, SimulationError,
    TrialOutcome,
};
pub use rng::RngManager;
