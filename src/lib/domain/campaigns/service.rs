//! Bulk delivery engine

use std::sync::Arc;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::communication::{
    mailer::{OutgoingMessage, Session, Transport, TransportError},
    plain_text::strip_tags,
};

use super::{
    errors::{ConfigError, DeliveryError},
    settings::Validated,
    template::{render, RenderedTemplate, Template, TemplateError},
    CampaignSettings, DeliveryLog, DeliveryOutcome, DeliveryResult, Recipient,
};

/// Sends templated emails to a list of recipients, one at a time.
#[derive(Debug, Clone)]
pub struct BulkMailer<T, L>
where
    T: Transport,
    L: DeliveryLog,
{
    transport: Arc<T>,
    log: Arc<L>,
    settings: Validated,
}

/// What processing one recipient produced
struct Processed {
    subject: String,
    outcome: DeliveryOutcome,
    contacted_transport: bool,
}

impl<T, L> BulkMailer<T, L>
where
    T: Transport,
    L: DeliveryLog,
{
    /// Creates a new bulk mailer.
    ///
    /// # Returns
    /// A [`ConfigError`] if the settings are missing credentials, a sender
    /// address, or have a zero rate limit or attempt ceiling.
    pub fn new(
        transport: Arc<T>,
        log: Arc<L>,
        settings: &CampaignSettings,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            transport,
            log,
            settings: settings.validate()?,
        })
    }

    /// Renders a template for one recipient without sending anything.
    pub fn preview(
        &self,
        recipient: &Recipient,
        template: &Template,
    ) -> Result<RenderedTemplate, TemplateError> {
        template.render(&recipient.template_fields())
    }

    /// Sends one message, retrying with a fixed backoff.
    ///
    /// Each attempt opens, authenticates and closes its own session. When
    /// `plain` is `None` the plain text body is derived from `html`.
    ///
    /// # Returns
    /// [`Ok`] once the message is accepted, [`DeliveryError::InvalidRecipient`]
    /// without any attempt if `to` is empty, or the last
    /// [`DeliveryError::Transport`] after `max_attempts` failures.
    pub async fn send_one(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        plain: Option<&str>,
        max_attempts: u32,
    ) -> Result<(), DeliveryError> {
        let to = to.trim();

        if to.is_empty() {
            return Err(DeliveryError::InvalidRecipient);
        }

        let message = OutgoingMessage {
            from: self.settings.sender.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            plain_body: plain.map_or_else(|| strip_tags(html), str::to_string),
            html_body: html.to_string(),
        };

        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(to, attempt, max_attempts, "sending email");

            match self.attempt(&message).await {
                Ok(()) => {
                    info!(to, attempt, "email sent");
                    return Ok(());
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(to, attempt, max_attempts, error = %e, "giving up on email");
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(to, attempt, max_attempts, error = %e, "email attempt failed");
                    sleep(self.settings.retry_backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Sends to every recipient in order, see [`Self::send_bulk_until_cancelled`].
    pub async fn send_bulk(
        &self,
        recipients: &[Recipient],
        template: &Template,
        dry_run: bool,
    ) -> Vec<DeliveryResult> {
        self.send_bulk_until_cancelled(recipients, template, dry_run, &CancellationToken::new())
            .await
    }

    /// Sends to every recipient in order until done or `cancel` fires.
    ///
    /// Every recipient gets exactly one [`DeliveryResult`], appended to the
    /// delivery log as soon as it is created. After each recipient that
    /// reached the transport, the mailer pauses long enough to respect the
    /// rate limit. Dry runs never contact the transport and never pause.
    ///
    /// Cancellation is checked before each recipient and during the pause;
    /// the results gathered so far are returned.
    pub async fn send_bulk_until_cancelled(
        &self,
        recipients: &[Recipient],
        template: &Template,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Vec<DeliveryResult> {
        let mut results = Vec::with_capacity(recipients.len());

        for (index, recipient) in recipients.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(
                    remaining = recipients.len() - index,
                    "bulk delivery cancelled"
                );
                break;
            }

            let processed = self.process(recipient, template, dry_run).await;
            let result = DeliveryResult::new(recipient, &processed.subject, processed.outcome);

            if let Err(e) = self.log.append(&result) {
                error!(email = %result.email, error = %e, "could not append to delivery log");
            }

            results.push(result);

            let is_last = index + 1 == recipients.len();

            if processed.contacted_transport && !is_last {
                tokio::select! {
                    _ = sleep(self.settings.rate_limit_delay) => {}
                    _ = cancel.cancelled() => {
                        info!(
                            remaining = recipients.len() - index - 1,
                            "bulk delivery cancelled"
                        );
                        break;
                    }
                }
            }
        }

        results
    }

    async fn process(
        &self,
        recipient: &Recipient,
        template: &Template,
        dry_run: bool,
    ) -> Processed {
        let fields = recipient.template_fields();

        if !recipient.has_address() {
            warn!(name = recipient.display_name(), "recipient has no email address");

            return Processed {
                subject: render(&template.subject, &fields)
                    .unwrap_or_else(|_| template.subject.clone()),
                outcome: failed(DeliveryError::InvalidRecipient),
                contacted_transport: false,
            };
        }

        let rendered = match template.render(&fields) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(email = %recipient.email, error = %e, "could not render template");

                return Processed {
                    subject: template.subject.clone(),
                    outcome: failed(e.into()),
                    contacted_transport: false,
                };
            }
        };

        if dry_run {
            info!(email = %recipient.email, subject = %rendered.subject, "[dry run] email not sent");

            return Processed {
                subject: rendered.subject,
                outcome: DeliveryOutcome::Skipped {
                    reason: "dry run".to_string(),
                },
                contacted_transport: false,
            };
        }

        let outcome = match self
            .send_one(
                &recipient.email,
                &rendered.subject,
                &rendered.body,
                rendered.plain_body.as_deref(),
                self.settings.max_attempts,
            )
            .await
        {
            Ok(()) => DeliveryOutcome::Sent,
            Err(e) => failed(e),
        };

        Processed {
            subject: rendered.subject,
            outcome,
            contacted_transport: true,
        }
    }

    /// One connect, authenticate, transmit, close cycle. The session is
    /// closed whenever it was opened, whatever happened in between.
    async fn attempt(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let mut session = self
            .transport
            .connect(&self.settings.host, self.settings.port)
            .await?;

        let result = self.deliver(session.as_mut(), message).await;

        if let Err(e) = session.close().await {
            warn!(to = %message.to, error = %e, "could not close mail session");
        }

        result
    }

    async fn deliver(
        &self,
        session: &mut dyn Session,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        session
            .authenticate(&self.settings.username, &self.settings.password)
            .await?;

        session.transmit(message).await
    }
}

fn failed(error: DeliveryError) -> DeliveryOutcome {
    DeliveryOutcome::Failed {
        detail: error.to_string(),
    }
}
