//! Payment provider webhooks.
//!
//! - `verifier` - provider policy and HMAC checks
//! - `signature` - hex and timestamped HMAC-SHA256 formats
//! - `normalize` - provider payloads to [`NormalizedEvent`]

pub mod error;
pub mod normalize;
pub mod signature;
pub mod types;
pub mod verifier;

pub use error::WebhookError;
pub use normalize::{PayloadFormat, normalize_event};
pub use types::{NormalizedEvent, PaymentRef, ProviderStatus};
pub use verifier::WebhookVerifier;
