//! Mail transport ports

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

mod errors;
mod message;

pub use errors::TransportError;
pub use message::OutgoingMessage;

/// A connector able to open authenticated sessions against a mail server.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Opens a new session against the mail server.
    ///
    /// # Arguments
    /// * `host` - The mail server host name.
    /// * `port` - The mail server port.
    ///
    /// # Returns
    /// A [`Result`] containing the open [`Session`], or a
    /// [`TransportError::Connection`] if the server could not be reached.
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Session>, TransportError>;
}

/// A single connection to a mail server, used to transmit exactly one message.
#[async_trait]
pub trait Session: Send {
    /// Authenticates the session.
    async fn authenticate(&mut self, username: &str, password: &str)
        -> Result<(), TransportError>;

    /// Transmits a message.
    ///
    /// # Arguments
    /// * `message` - The [`OutgoingMessage`] to transmit.
    async fn transmit(&mut self, message: &OutgoingMessage) -> Result<(), TransportError>;

    /// Closes the session.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mock! {
    pub Transport {}

    #[async_trait]
    impl Transport for Transport {
        async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Session>, TransportError>;
    }
}

#[cfg(test)]
mock! {
    pub Session {}

    #[async_trait]
    impl Session for Session {
        async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), TransportError>;
        async fn transmit(&mut self, message: &OutgoingMessage) -> Result<(), TransportError>;
        async fn close(&mut self) -> Result<(), TransportError>;
    }
}
