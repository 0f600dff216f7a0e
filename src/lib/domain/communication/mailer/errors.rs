//! Transport errors

use thiserror::Error;

/// Errors raised by a [`Transport`](super::Transport) or one of its sessions
#[derive(Debug, Error)]
pub enum TransportError {
    /// The mail server could not be reached, or the handshake failed
    #[error("could not connect to the mail server: {0}")]
    Connection(anyhow::Error),

    /// The mail server rejected the credentials
    #[error("authentication failed: {0}")]
    Auth(anyhow::Error),

    /// The mail server rejected the message
    #[error("message was rejected: {0}")]
    Transmit(anyhow::Error),

    /// The session could not be closed cleanly
    #[error("could not close the session: {0}")]
    Close(anyhow::Error),
}
