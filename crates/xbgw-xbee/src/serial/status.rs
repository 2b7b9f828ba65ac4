//! Transmit status frames
//!
//! ```text
//! [reserved u8][reserved u8][16-bit destination u16][retries u8][delivery u8][discovery u8]
//! ```

use xbgw_core::{CommandError, Element, Reply};

use crate::error::XBeeCommandError;

pub const TX_STATUS_LEN: usize = 7;

/// Delivery status reported by the radio for one transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxStatus {
    pub destination16: u16,
    pub retries: u8,
    pub delivery: u8,
    pub discovery: u8,
}

impl TxStatus {
    /// Decode a status payload; `None` when shorter than [`TX_STATUS_LEN`]
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < TX_STATUS_LEN {
            return None;
        }
        Some(Self {
            destination16: u16::from_be_bytes([data[2], data[3]]),
            retries: data[4],
            delivery: data[5],
            discovery: data[6],
        })
    }
}

/// Firmware text for a delivery status code
pub fn delivery_status_text(code: u8) -> Option<&'static str> {
    Some(match code {
        0x00 => "Success",
        0x01 => "MAC ACK Failure",
        0x02 => "CCA Failure",
        0x15 => "Invalid destination endpoint",
        0x21 => "Network ACK Failure",
        0x22 => "Not joined to network",
        0x23 => "Self addressed",
        0x24 => "Address not found",
        0x25 => "Route not found",
        0x26 => "Broadcast source failed to hear a neighbor relay the message",
        0x2B => "Invalid binding table index",
        0x2C => "Resource error; lack of free buffers, timers, etc",
        0x2D => "Attempted broadcast with APS transmission",
        0x2E => "Attempted unicast with APS transmission, but EE=0",
        0x32 => "Resource error; lack of free buffers, times, etc",
        0x74 => "Data payload too large",
        _ => return None,
    })
}

/// The deferred reply that finishes a `send_serial` command
pub fn completion_reply(status: &TxStatus) -> Reply {
    match status.delivery {
        0 => Reply::deferred(Element::new("response").with_text("")),
        code => {
            let error = match delivery_status_text(code) {
                Some(text) => XBeeCommandError::TxStatus(format!("{:#04x}: {}", code, text)),
                None => {
                    XBeeCommandError::Unexpected(format!("Unknown delivery status: {:#04x}", code))
                }
            };
            tracing::warn!(delivery = code, error = ?error, "Failed TX");
            Reply::deferred(error.to_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbgw_core::ReplyValue;

    fn status(delivery: u8) -> TxStatus {
        TxStatus {
            destination16: 0xFFFE,
            retries: 0,
            delivery,
            discovery: 0,
        }
    }

    fn hint_of(reply: Reply) -> (String, String) {
        let Reply::Deferred(ReplyValue::Node(el)) = reply else {
            panic!("expected deferred node");
        };
        let error = el.find("error").unwrap().clone();
        (
            error.attribute("id").unwrap().to_string(),
            error.find("hint").and_then(|h| h.text()).unwrap_or("").to_string(),
        )
    }

    #[test]
    fn parse_layout() {
        let parsed = TxStatus::parse(&[0, 0, 0x12, 0x34, 2, 0x21, 1]).unwrap();
        assert_eq!(
            parsed,
            TxStatus {
                destination16: 0x1234,
                retries: 2,
                delivery: 0x21,
                discovery: 1
            }
        );
        assert!(TxStatus::parse(&[0, 0, 0, 0, 0, 0]).is_none());
    }

    #[test]
    fn success_is_empty_response() {
        assert_eq!(
            completion_reply(&status(0)),
            Reply::Deferred(ReplyValue::Node(Element::new("response").with_text("")))
        );
    }

    #[test]
    fn known_failure_is_txstatus() {
        assert_eq!(
            hint_of(completion_reply(&status(0x21))),
            ("txstatus".to_string(), "0x21: Network ACK Failure".to_string())
        );
        assert_eq!(
            hint_of(completion_reply(&status(0x74))).1,
            "0x74: Data payload too large"
        );
    }

    #[test]
    fn unknown_failure_is_unexpected() {
        assert_eq!(
            hint_of(completion_reply(&status(0x99))),
            ("unexpected".to_string(), "Unknown delivery status: 0x99".to_string())
        );
    }
}
