//! Payment reconciliation.
//!
//! - `types` - payment statuses, snapshots and confirmation plans
//! - `error` - payment error taxonomy
//! - `service` - submission, confirmation and failure rules

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::PaymentError;
pub use service::{MAX_REFERENCE_LEN, PaymentReconciler};
pub use types::{
    ConfirmationEffects, ConfirmationPlan, ConfirmationSource, FailurePlan, NewReceipt,
    PaymentSnapshot, PaymentStatus, SubmitPaymentInput,
};
