//! Transport layer errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{0}")]
    SocketUnavailable(String),

    #[error("Operation would block")]
    WouldBlock,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("{0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transport not supported: {0}")]
    Unsupported(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),
}

impl TransportError {
    /// Map an I/O error from a receive call, keeping would-block distinct
    pub fn from_recv(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::WouldBlock {
            TransportError::WouldBlock
        } else {
            TransportError::ReceiveFailed(err.to_string())
        }
    }
}
