//! Overdue sweep.

pub mod service;

#[cfg(test)]
mod service_props;

pub use service::{OverdueSweeper, SweepReport};
