use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::debug;

use crate::NotifyError;

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Sends one HTML message addressed to every recipient.
    async fn send(&self, recipients: &[String], subject: &str, html_body: &str)
    -> Result<(), NotifyError>;
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|err| NotifyError::Smtp(err.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: parse_mailbox(&config.from)?,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse::<Mailbox>().map_err(|err| NotifyError::Address {
        address: address.to_string(),
        reason: err.to_string(),
    })
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML);
        for recipient in recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        let message = builder
            .body(html_body.to_string())
            .map_err(|err| NotifyError::Message(err.to_string()))?;
        self.transport
            .send(message)
            .await
            .map_err(|err| NotifyError::Smtp(err.to_string()))?;
        debug!(recipients = recipients.len(), subject, "email delivered");
        Ok(())
    }
}
