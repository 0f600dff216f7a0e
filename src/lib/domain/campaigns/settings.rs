//! Delivery settings

use std::{fmt, time::Duration};

use clap::Parser;

use super::errors::ConfigError;

/// Mail server and pacing configuration for bulk deliveries
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
pub struct CampaignSettings {
    /// The SMTP host
    #[clap(long, env = "SMTP_SERVER", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// The SMTP port
    #[clap(long, env = "SMTP_PORT", default_value = "587")]
    pub smtp_port: u16,

    /// The SMTP username
    #[clap(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// The SMTP password
    #[clap(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// The sender email address, defaults to the SMTP username
    #[clap(long, env = "SENDER_EMAIL")]
    pub sender: Option<String>,

    /// Maximum emails sent per minute
    #[clap(long, env = "RATE_LIMIT_PER_MINUTE", default_value = "30")]
    pub rate_limit_per_minute: u32,

    /// Delivery attempts per recipient
    #[clap(long, env = "MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: u32,

    /// Seconds to wait between attempts for the same recipient
    #[clap(long, env = "RETRY_BACKOFF_SECS", default_value = "2")]
    pub retry_backoff_secs: u64,
}

impl Default for CampaignSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_user: None,
            smtp_password: None,
            sender: None,
            rate_limit_per_minute: 30,
            max_attempts: 3,
            retry_backoff_secs: 2,
        }
    }
}

/// Settings that passed validation
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Validated {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub rate_limit_delay: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl fmt::Debug for Validated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validated")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("sender", &self.sender)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff", &self.retry_backoff)
            .finish_non_exhaustive()
    }
}

impl CampaignSettings {
    /// Pause between recipients needed to respect the rate limit
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_secs_f64(60.0 / f64::from(self.rate_limit_per_minute.max(1)))
    }

    pub(crate) fn validate(&self) -> Result<Validated, ConfigError> {
        let username = non_blank(&self.smtp_user).ok_or(ConfigError::MissingCredentials)?;
        let password = non_blank(&self.smtp_password).ok_or(ConfigError::MissingCredentials)?;

        let sender = non_blank(&self.sender)
            .or_else(|| Some(username.clone()))
            .filter(|sender| sender.contains('@'))
            .ok_or(ConfigError::MissingSender)?;

        if self.rate_limit_per_minute == 0 {
            return Err(ConfigError::InvalidRateLimit);
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }

        Ok(Validated {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username,
            password,
            sender,
            rate_limit_delay: self.rate_limit_delay(),
            max_attempts: self.max_attempts,
            retry_backoff: Duration::from_secs(self.retry_backoff_secs),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
