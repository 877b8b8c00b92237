//! SMTP notification channel.
//!
//! Uses `lettre` for SMTP transport.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::EmailConfig;
use crate::notify::{Notification, Notifier, NotifyError};

/// Delivers notifications over SMTP.
pub struct EmailNotifier {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl EmailNotifier {
    /// Builds the SMTP transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender address or relay host is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::InvalidAddress(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self { from, transport })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let to = notification
            .recipient()
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::InvalidAddress(e.to_string()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = self.build_message(notification)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        tracing::debug!(kind = notification.kind(), "Notification email sent");
        Ok(())
    }
}
