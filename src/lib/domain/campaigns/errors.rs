//! Campaign errors

use thiserror::Error;

use crate::domain::communication::mailer::TransportError;

use super::template::TemplateError;

/// Errors that prevent a [`BulkMailer`](super::BulkMailer) from being built
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No SMTP user or password configured
    #[error("SMTP_USER and SMTP_PASSWORD must be configured")]
    MissingCredentials,

    /// No sender address configured
    #[error("no sender address configured")]
    MissingSender,

    /// The rate limit is zero
    #[error("rate limit must be at least one email per minute")]
    InvalidRateLimit,

    /// The attempt ceiling is zero
    #[error("at least one delivery attempt is required")]
    InvalidMaxAttempts,
}

/// Why a single recipient could not be delivered to
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient has no email address
    #[error("invalid recipient: email address is empty")]
    InvalidRecipient,

    /// The templates could not be rendered for this recipient
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Every delivery attempt failed; holds the last error
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors that can occur when appending to a delivery log
#[derive(Debug, Error)]
pub enum DeliveryLogError {
    /// The log file could not be opened or written
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The record could not be encoded
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
