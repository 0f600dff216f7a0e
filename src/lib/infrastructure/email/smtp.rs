//! SMTP transport implementation

use std::{fmt, time::Duration};

use anyhow::anyhow;
use async_trait::async_trait;
use clap::Parser;
use lettre::{
    address::AddressError,
    message::{Mailbox, MultiPart},
    transport::smtp::{
        authentication::{Credentials, DEFAULT_MECHANISMS},
        client::{AsyncSmtpConnection, TlsParameters},
        extension::ClientId,
    },
    Message,
};
use tracing::debug;

use crate::domain::communication::mailer::{
    OutgoingMessage, Session, Transport, TransportError,
};

/// SMTP connection options
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
pub struct SMTPConfig {
    /// Upgrade plain connections with STARTTLS
    #[clap(long, env = "SMTP_STARTTLS", default_value = "true", action = clap::ArgAction::Set)]
    pub starttls: bool,

    /// Connect over TLS from the start (usually port 465)
    #[clap(long, env = "SMTP_IMPLICIT_TLS", default_value = "false", action = clap::ArgAction::Set)]
    pub implicit_tls: bool,

    /// Verify the TLS certificate
    #[clap(long, env = "SMTP_VERIFY_TLS", default_value = "true", action = clap::ArgAction::Set)]
    pub verify_tls: bool,

    /// Connection timeout in seconds
    #[clap(long, env = "SMTP_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,
}

impl Default for SMTPConfig {
    fn default() -> Self {
        Self {
            starttls: true,
            implicit_tls: false,
            verify_tls: true,
            timeout_secs: 30,
        }
    }
}

/// Opens SMTP sessions with lettre's async client
#[derive(Debug, Default, Clone)]
pub struct SmtpTransport {
    config: SMTPConfig,
}

impl SmtpTransport {
    /// Create a new SMTP transport
    pub fn new(config: SMTPConfig) -> Self {
        Self { config }
    }

    fn tls_parameters(&self, host: &str) -> Result<TlsParameters, TransportError> {
        TlsParameters::builder(host.to_string())
            .dangerous_accept_invalid_certs(!self.config.verify_tls)
            .build()
            .map_err(|e| TransportError::Connection(e.into()))
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Session>, TransportError> {
        let hello_name = ClientId::default();
        let timeout = Some(Duration::from_secs(self.config.timeout_secs));

        let implicit_tls = if self.config.implicit_tls {
            Some(self.tls_parameters(host)?)
        } else {
            None
        };

        debug!(host, port, "connecting to SMTP server");

        let mut connection = AsyncSmtpConnection::connect_tokio1(
            (host, port),
            timeout,
            &hello_name,
            implicit_tls,
            None,
        )
        .await
        .map_err(|e| TransportError::Connection(e.into()))?;

        if self.config.starttls && !self.config.implicit_tls {
            if !connection.can_starttls() {
                return Err(TransportError::Connection(anyhow!(
                    "{host} does not support STARTTLS"
                )));
            }

            connection
                .starttls(self.tls_parameters(host)?, &hello_name)
                .await
                .map_err(|e| TransportError::Connection(e.into()))?;
        }

        Ok(Box::new(SmtpSession { connection }))
    }
}

/// An open SMTP connection
pub struct SmtpSession {
    connection: AsyncSmtpConnection,
}

impl fmt::Debug for SmtpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSession").finish_non_exhaustive()
    }
}

#[async_trait]
impl Session for SmtpSession {
    async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), TransportError> {
        let credentials = Credentials::new(username.to_string(), password.to_string());

        self.connection
            .auth(DEFAULT_MECHANISMS, &credentials)
            .await
            .map_err(|e| TransportError::Auth(e.into()))?;

        Ok(())
    }

    async fn transmit(&mut self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let email = build_message(message)?;

        self.connection
            .send(email.envelope(), &email.formatted())
            .await
            .map_err(|e| TransportError::Transmit(e.into()))?;

        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.connection
            .quit()
            .await
            .map_err(|e| TransportError::Close(e.into()))?;

        Ok(())
    }
}

fn build_message(message: &OutgoingMessage) -> Result<Message, TransportError> {
    let from: Mailbox = message
        .from
        .parse()
        .map_err(|e: AddressError| TransportError::Transmit(e.into()))?;
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|e: AddressError| TransportError::Transmit(e.into()))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            message.plain_body.clone(),
            message.html_body.clone(),
        ))
        .map_err(|e| TransportError::Transmit(e.into()))
}
