//! Router-level error replies

use thiserror::Error;
use xbgw_core::CommandError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// No handler answered; carries the command tag
    #[error("Command not handled")]
    Unknown(String),

    /// A promised deferred reply never arrived
    #[error("Timeout or unexpected exit waiting for response")]
    Timeout,
}

impl CommandError for RouterError {
    fn id(&self) -> &'static str {
        match self {
            RouterError::Unknown(_) => "command.unknown",
            RouterError::Timeout => "command.timeout",
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            RouterError::Unknown(tag) => Some(tag.clone()),
            RouterError::Timeout => None,
        }
    }
}
