//! Bulk email campaigns

mod delivery;
mod errors;
mod log;
mod recipient;
mod service;
mod settings;
pub mod template;

pub use delivery::{CampaignSummary, DeliveryOutcome, DeliveryResult, DeliveryStatus};
pub use errors::{ConfigError, DeliveryError, DeliveryLogError};
pub use log::DeliveryLog;
pub use recipient::{Recipient, EMAIL_FIELD, NAME_FIELD};
pub use service::BulkMailer;
pub use settings::CampaignSettings;
pub use template::{render, RenderedTemplate, Template, TemplateError, TemplateFields};

#[cfg(test)]
pub mod tests {
    pub use super::log::MockDeliveryLog;
}
