//! Notification sink for out-of-band token delivery.
//!
//! Delivery is fire-and-forget from the orchestrator's point of view: send
//! failures are logged by the caller and never surfaced to the client.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SmtpConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    ResetPassword,
    VerifyEmail,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient: &str,
        kind: Notification,
        token: &str,
    ) -> Result<(), anyhow::Error>;
}

/// SMTP-backed notifier.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    from_address: String,
    base_url: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig, base_url: String) -> Result<Self, anyhow::Error> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| anyhow::anyhow!("SMTP relay setup failed: {}", e))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "SMTP notifier initialized");

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            base_url,
        })
    }

    fn render(&self, kind: Notification, token: &str) -> (String, String) {
        match kind {
            Notification::ResetPassword => {
                let link = format!("{}/reset-password?token={}", self.base_url, token);
                (
                    "Reset password".to_string(),
                    format!(
                        "Dear user,\nTo reset your password, click on this link: {}\n\
                         If you did not request any password resets, then ignore this email.",
                        link
                    ),
                )
            }
            Notification::VerifyEmail => {
                let link = format!("{}/verify-email?token={}", self.base_url, token);
                (
                    "Email Verification".to_string(),
                    format!(
                        "Dear user,\nTo verify your email, click on this link: {}\n\
                         If you did not create an account, then ignore this email.",
                        link
                    ),
                )
            }
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(
        &self,
        recipient: &str,
        kind: Notification,
        token: &str,
    ) -> Result<(), anyhow::Error> {
        let (subject, body) = self.render(kind, token);

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(recipient.parse()?)
            .subject(subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        // SmtpTransport is blocking; keep it off the async runtime.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email)).await?;

        match result {
            Ok(_) => {
                tracing::info!(to = %recipient, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!("Failed to send email: {}", e)),
        }
    }
}

/// Development notifier that logs instead of sending, used when no SMTP host
/// is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &str,
        kind: Notification,
        token: &str,
    ) -> Result<(), anyhow::Error> {
        tracing::info!(to = %recipient, kind = ?kind, token = %token, "email dispatch (dev mode)");
        Ok(())
    }
}

/// Test notifier that records every dispatch so tests can pick up the
/// out-of-band tokens.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Notification, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, Notification, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Latest token dispatched to `recipient` for `kind`, if any.
    pub fn last_token(&self, recipient: &str, kind: Notification) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, k, _)| to == recipient && *k == kind)
            .map(|(_, _, token)| token.clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient: &str,
        kind: Notification,
        token: &str,
    ) -> Result<(), anyhow::Error> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), kind, token.to_string()));
        Ok(())
    }
}
