//! Transactional email over SMTP via lettre.
//!
//! Deliveries are detached from the request path: `spawn_send` runs the send
//! on a background task and only logs failures, so a slow or broken SMTP
//! relay never fails or delays the originating request.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
    store_name: String,
}

impl Mailer {
    pub fn new(config: Option<&SmtpConfig>, store_name: &str) -> anyhow::Result<Self> {
        let (transport, from) = match config {
            Some(smtp) => {
                let credentials =
                    Credentials::new(smtp.username.clone(), smtp.password.clone());
                let transport =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
                        .port(smtp.port)
                        .credentials(credentials)
                        .build();
                let from: Mailbox = format!("{} <{}>", store_name, smtp.from_address)
                    .parse()
                    .map_err(|_| {
                        anyhow::anyhow!("invalid SMTP from address: {}", smtp.from_address)
                    })?;
                (Some(transport), Some(from))
            }
            None => (None, None),
        };

        Ok(Self {
            transport,
            from,
            store_name: store_name.to_string(),
        })
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            tracing::info!(to, subject, "email delivery disabled, skipping send");
            return Ok(());
        };

        let recipient: Mailbox = to
            .parse()
            .map_err(|_| MailerError::InvalidAddress(to.to_string()))?;

        let message = Message::builder()
            .from(from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(message).await?;
        Ok(())
    }

    /// Best-effort delivery on a background task. Failures are logged and
    /// never surface to the caller.
    pub fn spawn_send(&self, to: &str, subject: &str, body: &str) {
        let mailer = self.clone();
        let to = to.to_string();
        let subject = subject.to_string();
        let body = body.to_string();
        tokio::spawn(async move {
            if let Err(err) = mailer.send(&to, &subject, &body).await {
                tracing::warn!(error = %err, to, subject, "email delivery failed");
            } else {
                tracing::info!(to, subject, "email sent");
            }
        });
    }
}
