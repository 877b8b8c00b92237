//! Core billing and reconciliation logic for Rentflow.
//!
//! Pure business rules with no database or web dependencies:
//! - `access` - actor context and role checks
//! - `invoice` - invoice lifecycle and numbering
//! - `payment` - payment submission and confirmation planning
//! - `ledger` - landlord ledger entries and balance folds
//! - `payout` - payout requests and decisions
//! - `overdue` - overdue sweep selection
//! - `webhook` - provider signatures and payload normalization

pub mod access;
pub mod invoice;
pub mod ledger;
pub mod overdue;
pub mod payment;
pub mod payout;
pub mod webhook;
