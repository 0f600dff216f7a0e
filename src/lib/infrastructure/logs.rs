//! Delivery log storage

mod csv_log;

pub use csv_log::CsvDeliveryLog;
