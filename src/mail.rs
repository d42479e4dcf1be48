// Outbound email is a collaborator: the core only sees the `Mailer` trait.
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

pub type DynMailer = Arc<dyn Mailer>;

/// Writes mail to the log instead of delivering it.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        tracing::info!(
            from = %self.from,
            to = %mail.to,
            subject = %mail.subject,
            "outgoing mail (not delivered)"
        );
        tracing::debug!(body = %mail.html);
        Ok(())
    }
}

/// Keeps every message in memory. Used by tests to read reset links.
#[derive(Default, Clone)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mailbox lock poisoned"))?
            .push(mail);
        Ok(())
    }
}

/// Password reset message pointing at `{public_url}/change-password/{token}`.
pub fn password_reset_mail(to: &str, public_url: &url::Url, token: &str) -> OutgoingMail {
    let link = public_url
        .join(&format!("change-password/{}", token))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("{}/change-password/{}", public_url, token));

    OutgoingMail {
        to: to.to_string(),
        subject: "Change password".to_string(),
        html: format!(
            "<h1>Trouble signing in?</h1>\
             <p>We've received a request to reset the password for the account with this email.</p>\
             <p><a href=\"{link}\">Reset your password</a></p>\
             <p>If you didn't ask to reset your password, you can ignore this email.</p>"
        ),
    }
}
