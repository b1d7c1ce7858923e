//! SMTP implementation of [`Mailer`] over lettre.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::traits::Mailer;
use crate::config::SmtpConfig;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a transport from config: implicit TLS on 465, STARTTLS
    /// otherwise.
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .context("invalid SMTP host")?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        let from: Mailbox = config
            .from
            .parse()
            .context("SMTP_FROM must be a valid mailbox")?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().with_context(|| format!("invalid recipient {to}"))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("building outreach message")?;

        self.transport
            .send(message)
            .await
            .context("smtp delivery failed")?;
        Ok(())
    }
}
