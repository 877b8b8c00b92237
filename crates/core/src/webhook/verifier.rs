//! Provider policy and signature checks.

use std::collections::HashMap;
use std::fmt;

use rentflow_shared::config::{SignatureScheme, WebhookConfig};

use crate::webhook::error::WebhookError;
use crate::webhook::signature;

#[derive(Clone)]
struct ProviderPolicy {
    secret: Option<Vec<u8>>,
    trusted: bool,
    scheme: SignatureScheme,
    header: String,
}

/// Checks webhook deliveries against the configured providers.
///
/// Trusted providers skip signature checks. Every other configured provider
/// must present a valid signature. Unknown providers are always rejected.
#[derive(Clone)]
pub struct WebhookVerifier {
    providers: HashMap<String, ProviderPolicy>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    /// Builds the verifier from configuration.
    #[must_use]
    pub fn from_config(config: &WebhookConfig) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|(name, provider)| {
                (
                    name.to_ascii_lowercase(),
                    ProviderPolicy {
                        secret: provider
                            .secret
                            .as_ref()
                            .filter(|s| !s.is_empty())
                            .map(|s| s.as_bytes().to_vec()),
                        trusted: provider.trusted,
                        scheme: provider.scheme,
                        header: provider.header.to_ascii_lowercase(),
                    },
                )
            })
            .collect();
        Self {
            providers,
            tolerance_secs: config.tolerance_secs,
        }
    }

    /// Header the provider's signature arrives in.
    #[must_use]
    pub fn signature_header(&self, provider: &str) -> Option<&str> {
        self.providers
            .get(&provider.to_ascii_lowercase())
            .map(|p| p.header.as_str())
    }

    /// Verifies a delivery.
    ///
    /// Runs before any parsing or store access.
    pub fn verify(
        &self,
        provider: &str,
        signature: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), WebhookError> {
        let Some(policy) = self.providers.get(&provider.to_ascii_lowercase()) else {
            return Err(WebhookError::unauthorized(provider, "unknown provider"));
        };
        if policy.trusted {
            return Ok(());
        }
        let Some(secret) = policy.secret.as_deref() else {
            return Err(WebhookError::unauthorized(provider, "no signing secret configured"));
        };
        let Some(signature) = signature.map(str::trim).filter(|s| !s.is_empty()) else {
            return Err(WebhookError::unauthorized(provider, "missing signature"));
        };

        let valid = match policy.scheme {
            SignatureScheme::Hex => signature::verify_hex(secret, body, signature),
            SignatureScheme::Timestamped => {
                signature::verify_timestamped(secret, body, signature, now, self.tolerance_secs)
            }
        };
        if valid {
            Ok(())
        } else {
            Err(WebhookError::unauthorized(provider, "invalid signature"))
        }
    }
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("WebhookVerifier")
            .field("providers", &names)
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}
