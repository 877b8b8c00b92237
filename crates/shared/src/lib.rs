//! Shared types, configuration, tokens and notifications for Rentflow.
//!
//! This crate provides common building blocks used across all other crates:
//! - Money in integer minor units with a closed currency set
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Layered configuration
//! - Bearer token handling
//! - Best-effort notification channels

pub mod config;
pub mod email;
pub mod jwt;
pub mod notify;
pub mod types;

pub use config::AppConfig;
pub use email::EmailNotifier;
pub use jwt::{Claims, JwtError, JwtService};
pub use notify::{LogNotifier, Notification, Notifier, NotifyError};
