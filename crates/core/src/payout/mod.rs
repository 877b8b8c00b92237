//! Landlord payouts.
//!
//! - `types` - statuses, decisions and actions
//! - `error` - payout error taxonomy
//! - `service` - request resolution and decision rules

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::PayoutError;
pub use service::PayoutEngine;
pub use types::{PayoutAction, PayoutDecision, PayoutPlan, PayoutSnapshot, PayoutStatus};
