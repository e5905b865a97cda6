//! Domain models for the disaster contagion simulator

pub mod balance_sheet;
pub mod event;
pub mod firm;
pub mod inventory;
pub mod ledger;
pub mod loan;
pub mod network;
pub mod orders;
pub mod serde_pairs;
pub mod state;

/// Firm identifier (loader id)
pub type FirmId = u32;
/// Bank identifier
pub type BankId = u32;
/// Sector code
pub type SectorId = u32;

// Re-exports
pub use balance_sheet::BalanceSheet;
pub use event::{Event, EventLog};
pub use firm::Firm;
pub use inventory::{InventoryHorizon, InventoryTable};
pub use ledger::{BankAccount, BankAggregate, CreditLedger, CreditTotals};
pub use loan::{LoanContract, LoanError, LoanKey, LoanStatus, LoanTerm, MissOutcome, PaymentOutcome};
pub use network::{
    BankAccountRecord, FirmRecord, LinkAttrs, LinkRecord, LinkTable, NetworkData, NetworkError,
};
pub use orders::OrderBook;
pub use state::SimulationState;
