//! Delivery results

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Recipient;

/// Per-recipient outcome of a bulk delivery
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The message was accepted by the mail server
    Sent,

    /// The message could not be delivered
    Failed {
        /// Why delivery failed
        detail: String,
    },

    /// The message was rendered but deliberately not sent
    Skipped {
        /// Why the message was not sent
        reason: String,
    },
}

impl DeliveryOutcome {
    /// The status recorded for this outcome
    pub fn status(&self) -> DeliveryStatus {
        match self {
            Self::Sent => DeliveryStatus::Sent,
            Self::Failed { .. } => DeliveryStatus::Failed,
            Self::Skipped { .. } => DeliveryStatus::DryRun,
        }
    }
}

/// Status column of a delivery record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Delivered to the mail server
    Sent,

    /// Not delivered
    Failed,

    /// Rendered only
    DryRun,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Failed => write!(f, "failed"),
            Self::DryRun => write!(f, "dry_run"),
        }
    }
}

/// The record of delivering to one recipient.
///
/// Field names follow the delivery log's column header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// The recipient's display name
    #[serde(rename = "nome")]
    pub name: String,

    /// The recipient's email address
    pub email: String,

    /// The rendered subject
    #[serde(rename = "assunto")]
    pub subject: String,

    /// The delivery status
    pub status: DeliveryStatus,

    /// Error detail, only set for failed deliveries
    #[serde(rename = "erro")]
    pub error: Option<String>,

    /// When the record was created
    #[serde(rename = "data")]
    pub timestamp: DateTime<Utc>,
}

impl DeliveryResult {
    /// Creates the record for `recipient`, stamped with the current time.
    pub fn new(recipient: &Recipient, subject: &str, outcome: DeliveryOutcome) -> Self {
        let status = outcome.status();
        let error = match outcome {
            DeliveryOutcome::Failed { detail } => Some(detail),
            DeliveryOutcome::Sent | DeliveryOutcome::Skipped { .. } => None,
        };

        Self {
            name: recipient.display_name().to_string(),
            email: recipient.email.clone(),
            subject: subject.to_string(),
            status,
            error,
            timestamp: Utc::now(),
        }
    }
}

/// Totals for one bulk delivery
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CampaignSummary {
    /// Messages accepted by the mail server
    pub sent: usize,

    /// Messages rendered in dry-run mode
    pub dry_run: usize,

    /// Messages that could not be delivered
    pub failed: usize,
}

impl CampaignSummary {
    /// Counts the results of a run.
    pub fn from_results(results: &[DeliveryResult]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, result| {
                match result.status {
                    DeliveryStatus::Sent => summary.sent += 1,
                    DeliveryStatus::DryRun => summary.dry_run += 1,
                    DeliveryStatus::Failed => summary.failed += 1,
                }
                summary
            })
    }

    /// Messages that were sent, or would have been in dry-run mode
    pub fn delivered(&self) -> usize {
        self.sent + self.dry_run
    }

    /// Total number of results
    pub fn total(&self) -> usize {
        self.delivered() + self.failed
    }
}

impl fmt::Display for CampaignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} delivered ({} sent, {} dry run), {} failed",
            self.delivered(),
            self.sent,
            self.dry_run,
            self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_keeps_detail() {
        let recipient = Recipient::new("ana@x.com", "Ana");

        let result = DeliveryResult::new(
            &recipient,
            "Olá Ana",
            DeliveryOutcome::Failed {
                detail: "mailbox unavailable".to_string(),
            },
        );

        assert_eq!(result.status, DeliveryStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("mailbox unavailable"));
        assert_eq!(result.name, "Ana");
        assert_eq!(result.subject, "Olá Ana");
    }

    #[test]
    fn test_skipped_outcome_is_dry_run_without_error() {
        let recipient = Recipient::new("ana@x.com", "Ana");

        let result = DeliveryResult::new(
            &recipient,
            "Olá Ana",
            DeliveryOutcome::Skipped {
                reason: "dry run".to_string(),
            },
        );

        assert_eq!(result.status, DeliveryStatus::DryRun);
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(DeliveryStatus::Sent.to_string(), "sent");
        assert_eq!(DeliveryStatus::Failed.to_string(), "failed");
        assert_eq!(DeliveryStatus::DryRun.to_string(), "dry_run");
    }

    #[test]
    fn test_summary_counts() {
        let recipient = Recipient::new("ana@x.com", "Ana");
        let results = vec![
            DeliveryResult::new(&recipient, "", DeliveryOutcome::Sent),
            DeliveryResult::new(&recipient, "", DeliveryOutcome::Sent),
            DeliveryResult::new(
                &recipient,
                "",
                DeliveryOutcome::Failed {
                    detail: "x".to_string(),
                },
            ),
        ];

        let summary = CampaignSummary::from_results(&results);

        assert_eq!(summary.sent, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.delivered(), 2);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.to_string(), "2 delivered (2 sent, 0 dry run), 1 failed");
    }
}
