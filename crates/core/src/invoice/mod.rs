//! Invoice lifecycle.
//!
//! - `types` - statuses, snapshots and transition actions
//! - `number` - `INV-YYYYMMDD-XXXXX` numbering
//! - `error` - invoice error taxonomy
//! - `service` - the state machine

pub mod error;
pub mod number;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::InvoiceError;
pub use number::InvoiceNumber;
pub use service::InvoiceStateMachine;
pub use types::{InvoiceAction, InvoiceSnapshot, InvoiceStatus, NewInvoice};
