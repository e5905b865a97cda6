//! Production network and its loader-facing input records
//!
//! The loader (outside this crate) hands over a `NetworkData` value: the firm
//! roster, weighted supplier→customer links, and the firm–bank accounts.
//! `LinkTable` is the immutable relation `(supplier, customer) → LinkAttrs`
//! built from it, indexed both ways.
//!
//! # Critical Invariants
//!
//! 1. Every link endpoint and every bank account names a firm of the roster
//! 2. At most one link per (supplier, customer) pair
//! 3. Weights are finite and non-negative; `inverse_weight` is 0 for a zero weight

use crate::models::balance_sheet::BalanceSheet;
use crate::models::serde_pairs;
use crate::models::{BankId, FirmId, SectorId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors raised while validating network input
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("Duplicate firm ID: {0}")]
    DuplicateFirm(FirmId),

    #[error("Link {supplier}->{customer} references unknown firm {missing}")]
    UnknownLinkEndpoint {
        supplier: FirmId,
        customer: FirmId,
        missing: FirmId,
    },

    #[error("Duplicate link {supplier}->{customer}")]
    DuplicateLink { supplier: FirmId, customer: FirmId },

    #[error("Link {supplier}->{customer} has invalid weight {weight}")]
    InvalidWeight {
        supplier: FirmId,
        customer: FirmId,
        weight: f64,
    },

    #[error("Bank account of unknown firm {firm} at bank {bank}")]
    UnknownAccountHolder { firm: FirmId, bank: BankId },

    #[error("Duplicate bank account for firm {firm} at bank {bank}")]
    DuplicateAccount { firm: FirmId, bank: BankId },
}

// ============================================================================
// Loader records
// ============================================================================

/// One firm of the roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmRecord {
    pub id: FirmId,
    pub sector: SectorId,
    #[serde(default)]
    pub location: u32,
    #[serde(default)]
    pub community: u32,
    /// Final consumption `C`; absent for inactive firms
    #[serde(default)]
    pub consumption: Option<f64>,
    /// Baseline production `Pini`; absent for inactive firms
    #[serde(default)]
    pub initial_production: Option<f64>,
    #[serde(default)]
    pub profit_to_sales: f64,
    #[serde(default)]
    pub balance_sheet: BalanceSheet,
}

impl FirmRecord {
    /// A firm is active when it has both a capacity and a final demand
    pub fn is_active(&self) -> bool {
        self.consumption.is_some() && self.initial_production.is_some()
    }
}

/// Weighted supplier→customer link (baseline trade volume `A_ij`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub supplier: FirmId,
    pub customer: FirmId,
    pub weight: f64,
}

/// Initial loan/deposit position of one firm at one bank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankAccountRecord {
    pub firm: FirmId,
    pub bank: BankId,
    pub loan: f64,
    pub deposit: f64,
}

/// Everything the core consumes from the loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    pub firms: Vec<FirmRecord>,
    pub links: Vec<LinkRecord>,
    #[serde(default)]
    pub bank_accounts: Vec<BankAccountRecord>,
    /// Clustering statistics per firm; carried through, never read by the core
    #[serde(default)]
    pub cluster_statistics: BTreeMap<FirmId, Vec<f64>>,
}

impl NetworkData {
    /// Parse loader output serialized as JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check referential integrity of the roster, links and accounts
    pub fn validate(&self) -> Result<(), NetworkError> {
        let mut ids = BTreeSet::new();
        for firm in &self.firms {
            if !ids.insert(firm.id) {
                return Err(NetworkError::DuplicateFirm(firm.id));
            }
        }

        let mut pairs = BTreeSet::new();
        for link in &self.links {
            for endpoint in [link.supplier, link.customer] {
                if !ids.contains(&endpoint) {
                    return Err(NetworkError::UnknownLinkEndpoint {
                        supplier: link.supplier,
                        customer: link.customer,
                        missing: endpoint,
                    });
                }
            }
            if !link.weight.is_finite() || link.weight < 0.0 {
                return Err(NetworkError::InvalidWeight {
                    supplier: link.supplier,
                    customer: link.customer,
                    weight: link.weight,
                });
            }
            if !pairs.insert((link.supplier, link.customer)) {
                return Err(NetworkError::DuplicateLink {
                    supplier: link.supplier,
                    customer: link.customer,
                });
            }
        }

        let mut accounts = BTreeSet::new();
        for account in &self.bank_accounts {
            if !ids.contains(&account.firm) {
                return Err(NetworkError::UnknownAccountHolder {
                    firm: account.firm,
                    bank: account.bank,
                });
            }
            if !accounts.insert((account.firm, account.bank)) {
                return Err(NetworkError::DuplicateAccount {
                    firm: account.firm,
                    bank: account.bank,
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Link table
// ============================================================================

/// Static attributes of one supplier→customer link
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkAttrs {
    /// Baseline trade volume `A_ij`
    pub weight: f64,
    /// `1 / A_ij`, or 0 when the weight is 0
    pub inverse_weight: f64,
    pub supplier_sector: SectorId,
    pub customer_sector: SectorId,
}

impl LinkAttrs {
    pub fn new(weight: f64, supplier_sector: SectorId, customer_sector: SectorId) -> Self {
        let inverse_weight = if weight > 0.0 { 1.0 / weight } else { 0.0 };
        Self {
            weight,
            inverse_weight,
            supplier_sector,
            customer_sector,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkTable {
    /// (supplier, customer) → attributes
    #[serde(with = "serde_pairs")]
    links: BTreeMap<(FirmId, FirmId), LinkAttrs>,

    /// (customer, supplier) index for inbound lookups
    inbound: BTreeSet<(FirmId, FirmId)>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, supplier: FirmId, customer: FirmId, attrs: LinkAttrs) {
        self.links.insert((supplier, customer), attrs);
        self.inbound.insert((customer, supplier));
    }

    pub fn get(&self, supplier: FirmId, customer: FirmId) -> Option<&LinkAttrs> {
        self.links.get(&(supplier, customer))
    }

    /// Customers of `supplier`, ascending by id
    pub fn customers_of(&self, supplier: FirmId) -> impl Iterator<Item = (FirmId, &LinkAttrs)> {
        self.links
            .range((supplier, FirmId::MIN)..=(supplier, FirmId::MAX))
            .map(|((_, customer), attrs)| (*customer, attrs))
    }

    /// Suppliers of `customer`, ascending by id
    pub fn suppliers_of(&self, customer: FirmId) -> impl Iterator<Item = (FirmId, &LinkAttrs)> {
        self.inbound
            .range((customer, FirmId::MIN)..=(customer, FirmId::MAX))
            .filter_map(move |(_, supplier)| {
                self.links
                    .get(&(*supplier, customer))
                    .map(|attrs| (*supplier, attrs))
            })
    }

    /// True when `supplier` sells to at least one firm
    pub fn has_customers(&self, supplier: FirmId) -> bool {
        self.customers_of(supplier).next().is_some()
    }

    /// Total baseline input requirement of `customer`
    pub fn total_input(&self, customer: FirmId) -> f64 {
        self.suppliers_of(customer).map(|(_, attrs)| attrs.weight).sum()
    }

    /// Total baseline intermediate sales of `supplier`
    pub fn total_output(&self, supplier: FirmId) -> f64 {
        self.customers_of(supplier).map(|(_, attrs)| attrs.weight).sum()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
