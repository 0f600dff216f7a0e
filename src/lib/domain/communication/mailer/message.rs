//! Outgoing message

/// A fully rendered message, ready to hand over to a [`Session`](super::Session)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// The sender address
    pub from: String,

    /// The recipient address
    pub to: String,

    /// The subject of the email
    pub subject: String,

    /// The plain text body of the email
    pub plain_body: String,

    /// The HTML body of the email
    pub html_body: String,
}
