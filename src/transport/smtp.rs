//! SMTP delivery via lettre.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use crate::config::{SmtpConfig, SmtpTls};

use super::backend::{MailTransport, OutgoingMessage, TransportError};

/// Sends mail through an SMTP relay.
///
/// Wraps `lettre::AsyncSmtpTransport<Tokio1Executor>`. One connection is
/// opened per send; the relay settings come from [`SmtpConfig`].
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reply_to: Option<Mailbox>,
    bcc: Option<Mailbox>,
}

impl SmtpTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, TransportError> {
        let builder = match config.tls {
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| TransportError::InvalidConfig(format!("Invalid SMTP relay: {}", e)))?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| TransportError::InvalidConfig(format!("Invalid SMTP relay: {}", e)))?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        let from = Mailbox::new(config.from_name.clone(), parse_address(&config.from_email).map_err(TransportError::InvalidConfig)?);
        let reply_to = config
            .reply_to
            .as_deref()
            .filter(|addr| !addr.is_empty())
            .map(|addr| {
                parse_address(addr)
                    .map(|a| Mailbox::new(None, a))
                    .map_err(TransportError::InvalidConfig)
            })
            .transpose()?;
        let bcc = config
            .bcc
            .as_deref()
            .filter(|addr| !addr.is_empty())
            .map(|addr| {
                parse_address(addr)
                    .map(|a| Mailbox::new(None, a))
                    .map_err(TransportError::InvalidConfig)
            })
            .transpose()?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            tls = ?config.tls,
            authenticated = !config.username.is_empty(),
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            from,
            reply_to,
            bcc,
        })
    }

    fn build_message(&self, message: &OutgoingMessage, message_id: &str) -> Result<Message, TransportError> {
        // A bare address doubles as its own display name; don't repeat it
        let to_name = Some(message.to_name.clone()).filter(|name| name != &message.to_email);
        let to = Mailbox::new(to_name, parse_address(&message.to_email).map_err(TransportError::DeliveryFailed)?);

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .message_id(Some(message_id.to_string()));

        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }
        if let Some(bcc) = &self.bcc {
            builder = builder.bcc(bcc.clone());
        }

        let built = match &message.html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                html.clone(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(message.text.clone()),
        };

        built.map_err(|e| TransportError::DeliveryFailed(format!("Failed to build email: {}", e)))
    }

    fn new_message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<String, TransportError> {
        let message_id = self.new_message_id();
        let email = self.build_message(message, &message_id)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| TransportError::DeliveryFailed(e.to_string()))?;

        tracing::debug!(
            message_id = %message_id,
            code = %response.code(),
            "SMTP relay accepted message"
        );

        Ok(message_id)
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

fn parse_address(address: &str) -> Result<Address, String> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| format!("Invalid address '{}': {}", address, e))
}
