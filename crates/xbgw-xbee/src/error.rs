//! Radio manager errors
//!
//! [`XBeeCommandError`] covers every error reply the `send_serial` and
//! `set_digital_output` commands can produce. [`ManagerError`] is returned
//! from the read path and only ever logged.

use thiserror::Error;
use xbgw_core::CommandError;

use crate::io_sample::IoSampleError;
use crate::transport::TransportError;

/// Error replies of the radio commands
///
/// `Display` is the catalog description; the payload, when present, is the
/// hint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XBeeCommandError {
    #[error("Invalid address")]
    Address(String),

    #[error("Unrecognized encoding")]
    Encoding(String),

    #[error("Unable to decode as base64")]
    Base64(String),

    #[error("Attribute value is incorrect")]
    InvalidAttr(String),

    #[error("Missing required command attribute")]
    MissingAttr(String),

    #[error("Too many attributes were given")]
    TooManyAttrs(String),

    #[error("Invalid digital output value")]
    BadOutput(String),

    #[error("Transmit operation failed")]
    TxFailed(String),

    #[error("Too many outstanding transmits")]
    TxFull,

    #[error("TX Status delivery failure")]
    TxStatus(String),

    #[error("DDO command error")]
    DdoError,

    #[error("Invalid DDO command name")]
    BadCmd(String),

    #[error("Invalid DDO command value")]
    BadParam,

    #[error("Unexpected/unclassified error")]
    Unexpected(String),
}

impl CommandError for XBeeCommandError {
    fn id(&self) -> &'static str {
        match self {
            XBeeCommandError::Address(_) => "address",
            XBeeCommandError::Encoding(_) => "encoding",
            XBeeCommandError::Base64(_) => "base64",
            XBeeCommandError::InvalidAttr(_) => "invalidattr",
            XBeeCommandError::MissingAttr(_) => "missingattr",
            XBeeCommandError::TooManyAttrs(_) => "toomanyattrs",
            XBeeCommandError::BadOutput(_) => "badoutput",
            XBeeCommandError::TxFailed(_) => "txfailed",
            XBeeCommandError::TxFull => "txfull",
            XBeeCommandError::TxStatus(_) => "txstatus",
            XBeeCommandError::DdoError => "ddo_error",
            XBeeCommandError::BadCmd(_) => "badcmd",
            XBeeCommandError::BadParam => "badparam",
            XBeeCommandError::Unexpected(_) => "unexpected",
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            XBeeCommandError::Address(h)
            | XBeeCommandError::Encoding(h)
            | XBeeCommandError::Base64(h)
            | XBeeCommandError::InvalidAttr(h)
            | XBeeCommandError::MissingAttr(h)
            | XBeeCommandError::TooManyAttrs(h)
            | XBeeCommandError::BadOutput(h)
            | XBeeCommandError::TxFailed(h)
            | XBeeCommandError::TxStatus(h)
            | XBeeCommandError::BadCmd(h)
            | XBeeCommandError::Unexpected(h) => Some(h.clone()),
            XBeeCommandError::TxFull | XBeeCommandError::DdoError | XBeeCommandError::BadParam => {
                None
            }
        }
    }
}

/// Errors raised while handling an inbound frame
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Malformed I/O sample from {address}: {source}")]
    IoSample {
        address: String,
        #[source]
        source: IoSampleError,
    },
}
