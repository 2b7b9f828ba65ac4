//! Remote configuration (DDO) socket manager
//!
//! Serves `set_digital_output` by sending a remote AT setting to the node
//! and answers the command when the node's status frame comes back.

mod pins;

pub use pins::{parse_digital_value, pin_setting, resolve_pin, MAX_PIN, OUTPUT_HIGH, OUTPUT_LOW};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use xbgw_core::{
    command_topic, CommandBus, CommandError, CommandMessage, Element, Reply, ReplySender,
};

use crate::address::{DdoDescriptor, HardwareAddress};
use crate::config::DdoConfig;
use crate::error::{ManagerError, XBeeCommandError};
use crate::manager::{allocate_transmission, send_or_release};
use crate::reactor::EventSource;
use crate::transport::{Interest, SharedSocket, TransportError};
use crate::txid::TransmissionSlotTable;

pub const SET_DIGITAL_OUTPUT_COMMAND: &str = "set_digital_output";

/// Apply the setting immediately
pub const DDO_OPTION_APPLY: u8 = 0x02;

/// Status codes of remote configuration frames
pub const STATUS_OK: u8 = 0;
pub const STATUS_ERROR: u8 = 1;
pub const STATUS_BAD_COMMAND: u8 = 2;
pub const STATUS_BAD_PARAMETER: u8 = 3;
pub const STATUS_TX_FAILURE: u8 = 4;

const MAX_FRAME: usize = 255;

pub struct DdoManager {
    socket: SharedSocket<DdoDescriptor>,
    tx_slots: TransmissionSlotTable<ReplySender>,
}

impl DdoManager {
    pub fn new(socket: SharedSocket<DdoDescriptor>, config: &DdoConfig) -> Self {
        Self {
            socket,
            tx_slots: TransmissionSlotTable::new(config.max_transmission_id),
        }
    }

    /// Subscribe to `command.set_digital_output`
    pub fn register(self: &Arc<Self>, commands: &CommandBus) {
        let manager = Arc::clone(self);
        commands.subscribe(
            command_topic(SET_DIGITAL_OUTPUT_COMMAND),
            move |message: &CommandMessage| {
                manager.set_digital_output(&message.element, &message.reply)
            },
        );
    }

    /// Handle one `set_digital_output` command element
    pub fn set_digital_output(&self, element: &Element, reply: &ReplySender) {
        let outcome = match self.transmit_setting(element, reply) {
            Ok(()) => Reply::Pending,
            Err(e) => Reply::from(e.to_response()),
        };
        reply.put(outcome);
    }

    fn transmit_setting(&self, element: &Element, reply: &ReplySender) -> Result<(), XBeeCommandError> {
        let addr = element.attribute("addr").filter(|a| !a.is_empty()).ok_or_else(|| {
            XBeeCommandError::MissingAttr(
                "No destination XBee address (attribute 'addr') given.".to_string(),
            )
        })?;
        let address =
            HardwareAddress::parse(addr).map_err(|e| XBeeCommandError::Address(e.to_string()))?;

        let pin = resolve_pin(element.attribute("index"), element.attribute("name"))?;
        let setting = pin_setting(pin);

        let value = element.text().unwrap_or("").trim();
        let level = parse_digital_value(value)
            .ok_or_else(|| XBeeCommandError::BadOutput(value.to_string()))?;

        let txid = allocate_transmission(&self.tx_slots, reply)?;
        let destination = DdoDescriptor {
            address,
            command: setting,
            options: DDO_OPTION_APPLY,
            transmission_id: txid,
            status: 0,
        };

        debug!(
            setting = %destination.command_str(),
            level,
            %address,
            "Attempting digital output change"
        );
        send_or_release(&*self.socket, &self.tx_slots, txid, &level.to_be_bytes(), &destination)
            .map_err(|e| {
                info!(error = ?e, "Problem sending DDO command");
                e
            })
    }

    /// Number of settings awaiting a status frame
    pub fn outstanding(&self) -> usize {
        self.tx_slots.outstanding()
    }

    /// Read one status frame and finish its command
    pub fn handle_read(&self) -> Result<(), ManagerError> {
        let mut buf = [0u8; MAX_FRAME];
        let (len, addr) = match self.socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(TransportError::WouldBlock) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        debug!(from = %addr, len, "Received frame");

        let txid = addr.transmission_id;
        match self.tx_slots.take(txid) {
            Err(e) => error!(error = %e, "Problem handling TX status"),
            Ok(None) => info!(txid, "No command registered for transmission ID"),
            Ok(Some(reply)) => {
                if !reply.put(completion_reply(&addr, &buf[..len])) {
                    debug!(txid, "Command already answered, status discarded");
                }
            }
        }
        Ok(())
    }
}

/// The deferred reply that finishes a `set_digital_output` command
fn completion_reply(addr: &DdoDescriptor, data: &[u8]) -> Reply {
    let error = match addr.status {
        STATUS_OK => {
            info!(address = %addr.address, "DDO command succeeded");
            let text = match std::str::from_utf8(data) {
                Ok(text) => text.to_string(),
                Err(_) => hex::encode(data),
            };
            return Reply::deferred(Element::new("response").with_text(text));
        }
        STATUS_ERROR => XBeeCommandError::DdoError,
        STATUS_BAD_COMMAND => XBeeCommandError::BadCmd(addr.command_str()),
        STATUS_BAD_PARAMETER => XBeeCommandError::BadParam,
        STATUS_TX_FAILURE => XBeeCommandError::TxFailed(addr.address.to_string()),
        other => XBeeCommandError::Unexpected(format!("Unexpected status: {}", other)),
    };
    warn!(status = addr.status, error = ?error, "Failed DDO command");
    Reply::deferred(error.to_response())
}

impl EventSource for DdoManager {
    fn name(&self) -> &str {
        "xbee-ddo"
    }

    fn readable(&self) -> Result<bool, TransportError> {
        self.wait_readable(Duration::ZERO)
    }

    fn wait_readable(&self, timeout: Duration) -> Result<bool, TransportError> {
        Ok(self.socket.poll(Interest::Read, timeout)?.readable)
    }

    fn handle_read(&self) -> Result<(), ManagerError> {
        DdoManager::handle_read(self)
    }
}
