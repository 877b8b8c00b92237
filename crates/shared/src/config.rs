//! Application configuration management.
//!
//! Sources, later ones winning:
//! `config/default.*`, `config/{RUN_MODE}.*`, then `RENTFLOW__SECTION__KEY`
//! environment variables.

use std::collections::HashMap;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Payment provider webhook configuration.
    #[serde(default)]
    pub webhooks: WebhookConfig,
    /// Overdue sweeper schedule.
    #[serde(default)]
    pub sweeper: SweeperConfig,
    /// SMTP settings. Notifications are only logged when absent.
    #[serde(default)]
    pub email: Option<EmailConfig>,
    /// Log output settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://...` or `sqlite://...`).
    pub url: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of pooled connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending migrations on server start.
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret.
    pub secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// How a provider signs its webhook deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureScheme {
    /// Hex HMAC-SHA256 of the raw body.
    #[default]
    Hex,
    /// `t=<unix>,v1=<hex>` where the MAC covers `"{t}.{body}"`.
    Timestamped,
}

/// Per-provider webhook policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Shared HMAC secret.
    #[serde(default)]
    pub secret: Option<String>,
    /// Internal providers skip signature verification.
    #[serde(default)]
    pub trusted: bool,
    /// Signature format.
    #[serde(default)]
    pub scheme: SignatureScheme,
    /// Header carrying the signature.
    #[serde(default = "default_signature_header")]
    pub header: String,
}

fn default_signature_header() -> String {
    "x-signature".to_string()
}

/// Webhook ingestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Accepted clock skew for timestamped signatures.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: i64,
    /// Known providers keyed by the `{provider}` path segment.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: default_tolerance_secs(),
            providers: HashMap::new(),
        }
    }
}

fn default_tolerance_secs() -> i64 {
    300
}

/// Overdue sweeper schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
    /// Run the sweeper inside the server process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_sweep_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    3600
}

/// SMTP configuration for notification email.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_username: String,
    /// SMTP password.
    pub smtp_password: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Rentflow".to_string()
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a required key is missing.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("RENTFLOW").separator("__"))
            .build()?
            .try_deserialize()
    }
}
