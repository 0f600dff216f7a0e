//! Communication module

pub mod mailer;
pub mod plain_text;
