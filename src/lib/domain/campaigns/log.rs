//! Delivery log port

#[cfg(test)]
use mockall::mock;

use super::{errors::DeliveryLogError, DeliveryResult};

/// Append-only store for delivery records
pub trait DeliveryLog: Send + Sync + 'static {
    /// Durably appends one record.
    ///
    /// # Returns
    /// A [`Result`] which is [`Ok`] once the record is written, or a
    /// [`DeliveryLogError`] if it could not be.
    fn append(&self, result: &DeliveryResult) -> Result<(), DeliveryLogError>;
}

#[cfg(test)]
mock! {
    pub DeliveryLog {}

    impl DeliveryLog for DeliveryLog {
        fn append(&self, result: &DeliveryResult) -> Result<(), DeliveryLogError>;
    }
}
