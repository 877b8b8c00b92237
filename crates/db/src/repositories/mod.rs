//! Repositories for database operations.
//!
//! Repositories take an [`Actor`](rentflow_core::access::Actor) where the
//! operation is access controlled, run the pure rules from `rentflow-core`
//! against locked rows and persist the result.

pub mod invoice;
pub mod ledger;
pub mod overdue;
pub mod payout;
pub mod reconciliation;
mod snapshot;
pub mod user;

pub use invoice::{InvoiceFilter, InvoiceRepository, MAX_NUMBER_ATTEMPTS};
pub use ledger::LedgerRepository;
pub use overdue::OverdueRepository;
pub use payout::{PayoutDecisionOutcome, PayoutFilter, PayoutRepository};
pub use reconciliation::{
    ConfirmOutcome, FailOutcome, PaymentDetails, ProviderEventOutcome, ReconciliationRepository,
};
pub use user::UserRepository;
