//! Event logging for simulation auditing.
//!
//! This module defines the Event enum which captures all significant state changes
//! during a trial. Events enable:
//! - Debugging (understand what happened and when)
//! - Auditing (verify correctness of the credit lifecycle)
//! - Analysis (extract default cascades and support flows)
//!
//! # Event Types
//!
//! Events are categorized by simulation phase:
//! - **Disaster**: cohort selection, damage and reconstruction loans
//! - **Credit**: loan origination, rejection, government support
//! - **Payment**: order reductions and cancellations of firms that cannot pay
//! - **Amortization**: loans paid off or defaulted
//! - **EOD**: end-of-day aggregates
//!
//! # Example
//!
//! ```rust
//! use disaster_simulator_core_rs::models::Event;
//!
//! let event = Event::FirmDamaged {
//!     day: 1,
//!     firm_id: 42,
//!     damage: 0.5,
//!     production_loss: 50.0,
//! };
//!
//! println!("Event at day {}: {:?}", event.day(), event);
//! ```

use crate::models::{BankId, FirmId};
use serde::{Deserialize, Serialize};

/// Simulation event capturing a state change.
///
/// All events include a day number for temporal ordering.
/// Events are logged in the order they occur within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Disaster cohort selected
    DisasterStruck {
        day: usize,
        scenario: String,
        damaged_count: usize,
    },

    /// Firm capacity hit by the disaster
    FirmDamaged {
        day: usize,
        firm_id: FirmId,
        damage: f64,
        production_loss: f64,
    },

    /// Reconstruction loan granted to a damaged firm
    LongTermLoanIssued {
        day: usize,
        firm_id: FirmId,
        bank_id: BankId,
        principal: f64,
    },

    /// Working-capital loan granted
    LoanOriginated {
        day: usize,
        firm_id: FirmId,
        bank_id: BankId,
        principal: f64,
        rate: f64,
    },

    /// Lending policy refused to cover the financing gap
    LoanRejected {
        day: usize,
        firm_id: FirmId,
        gap: f64,
        solvency_ratio: f64,
    },

    /// Financing gap covered by a direct transfer
    GovernmentSupport {
        day: usize,
        firm_id: FirmId,
        amount: f64,
    },

    /// Firm could only pay part of its orders
    OrdersReduced {
        day: usize,
        firm_id: FirmId,
        gross_orders: f64,
        returned: f64,
    },

    /// Firm could pay nothing; every delivery to it was reversed
    OrdersCancelled {
        day: usize,
        firm_id: FirmId,
        returned: f64,
    },

    LoanPaidOff {
        day: usize,
        firm_id: FirmId,
        bank_id: BankId,
        sequence: u32,
    },

    /// Missed payments reached the default threshold
    LoanDefaulted {
        day: usize,
        firm_id: FirmId,
        bank_id: BankId,
        sequence: u32,
        outstanding: f64,
    },

    /// End-of-day aggregates
    EndOfDay {
        day: usize,
        gdp: f64,
        npl_count: usize,
        government_support: f64,
    },
}

impl Event {
    /// Get the day when this event occurred
    pub fn day(&self) -> usize {
        match self {
            Event::DisasterStruck { day, .. } => *day,
            Event::FirmDamaged { day, .. } => *day,
            Event::LongTermLoanIssued { day, .. } => *day,
            Event::LoanOriginated { day, .. } => *day,
            Event::LoanRejected { day, .. } => *day,
            Event::GovernmentSupport { day, .. } => *day,
            Event::OrdersReduced { day, .. } => *day,
            Event::OrdersCancelled { day, .. } => *day,
            Event::LoanPaidOff { day, .. } => *day,
            Event::LoanDefaulted { day, .. } => *day,
            Event::EndOfDay { day, .. } => *day,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::DisasterStruck { .. } => "DisasterStruck",
            Event::FirmDamaged { .. } => "FirmDamaged",
            Event::LongTermLoanIssued { .. } => "LongTermLoanIssued",
            Event::LoanOriginated { .. } => "LoanOriginated",
            Event::LoanRejected { .. } => "LoanRejected",
            Event::GovernmentSupport { .. } => "GovernmentSupport",
            Event::OrdersReduced { .. } => "OrdersReduced",
            Event::OrdersCancelled { .. } => "OrdersCancelled",
            Event::LoanPaidOff { .. } => "LoanPaidOff",
            Event::LoanDefaulted { .. } => "LoanDefaulted",
            Event::EndOfDay { .. } => "EndOfDay",
        }
    }

    /// Get firm ID if event relates to a specific firm
    pub fn firm_id(&self) -> Option<FirmId> {
        match self {
            Event::FirmDamaged { firm_id, .. } => Some(*firm_id),
            Event::LongTermLoanIssued { firm_id, .. } => Some(*firm_id),
            Event::LoanOriginated { firm_id, .. } => Some(*firm_id),
            Event::LoanRejected { firm_id, .. } => Some(*firm_id),
            Event::GovernmentSupport { firm_id, .. } => Some(*firm_id),
            Event::OrdersReduced { firm_id, .. } => Some(*firm_id),
            Event::OrdersCancelled { firm_id, .. } => Some(*firm_id),
            Event::LoanPaidOff { firm_id, .. } => Some(*firm_id),
            Event::LoanDefaulted { firm_id, .. } => Some(*firm_id),
            _ => None,
        }
    }

    /// Get bank ID if event relates to a specific lender
    pub fn bank_id(&self) -> Option<BankId> {
        match self {
            Event::LongTermLoanIssued { bank_id, .. } => Some(*bank_id),
            Event::LoanOriginated { bank_id, .. } => Some(*bank_id),
            Event::LoanPaidOff { bank_id, .. } => Some(*bank_id),
            Event::LoanDefaulted { bank_id, .. } => Some(*bank_id),
            _ => None,
        }
    }
}

/// Event log for storing and querying simulation events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Append events collected by a phase, preserving their order
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific day
    pub fn events_at_day(&self, day: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.day() == day).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific firm
    pub fn events_for_firm(&self, firm_id: FirmId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.firm_id() == Some(firm_id))
            .collect()
    }

    /// Get events for a specific bank
    pub fn events_for_bank(&self, bank_id: BankId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.bank_id() == Some(bank_id))
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
