//! Serial data and telemetry socket manager
//!
//! Owns the data-frame socket. Outbound, it serves `send_serial` commands
//! and answers them once the radio reports delivery. Inbound, it publishes
//! serial data and I/O samples on the telemetry bus.

mod filter;
mod status;

pub use filter::DuplicateFilter;
pub use status::{delivery_status_text, TxStatus, TX_STATUS_LEN};

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, error, info};
use xbgw_core::telemetry::{TOPIC_ANALOG, TOPIC_DIGITAL_IN, TOPIC_SERIAL_IN};
use xbgw_core::{
    command_topic, CommandBus, CommandError, CommandMessage, Element, Reply, ReplySender,
    TelemetryBus, TelemetryEvent, TelemetryIdent, TelemetryValue,
};

use crate::address::{DestinationDescriptor, HardwareAddress};
use crate::config::XBeeConfig;
use crate::error::{ManagerError, XBeeCommandError};
use crate::io_sample::{parse_io_sample, SampleValue};
use crate::manager::{allocate_transmission, send_or_release};
use crate::reactor::EventSource;
use crate::transport::{Interest, SharedSocket, TransportError};
use crate::txid::TransmissionSlotTable;

pub const SEND_SERIAL_COMMAND: &str = "send_serial";

pub const DEFAULT_ENDPOINT: u8 = 0xE8;
pub const DIGI_PROFILE: u16 = 0xC105;
pub const SERIAL_CLUSTER: u16 = 0x11;
pub const IO_CLUSTER: u16 = 0x92;
pub const TX_STATUS_CLUSTER: u16 = 0x8B;

/// Largest datagram read from the socket
const MAX_FRAME: usize = 255;

pub struct XBeeSerialManager {
    socket: SharedSocket<DestinationDescriptor>,
    tx_slots: TransmissionSlotTable<ReplySender>,
    filter: DuplicateFilter,
    telemetry: Arc<TelemetryBus>,
}

impl XBeeSerialManager {
    pub fn new(
        socket: SharedSocket<DestinationDescriptor>,
        config: &XBeeConfig,
        telemetry: Arc<TelemetryBus>,
    ) -> Self {
        Self {
            socket,
            tx_slots: TransmissionSlotTable::new(config.max_transmission_id),
            filter: DuplicateFilter::new(config),
            telemetry,
        }
    }

    /// Subscribe to `command.send_serial`
    pub fn register(self: &Arc<Self>, commands: &CommandBus) {
        let manager = Arc::clone(self);
        commands.subscribe(
            command_topic(SEND_SERIAL_COMMAND),
            move |message: &CommandMessage| manager.send_serial(&message.element, &message.reply),
        );
    }

    /// Handle one `send_serial` command element
    pub fn send_serial(&self, element: &Element, reply: &ReplySender) {
        let outcome = self
            .transmit_serial(element, reply)
            .map(|()| Reply::Pending)
            .unwrap_or_else(|e| Reply::from(e.to_response()));
        reply.put(outcome);
    }

    fn transmit_serial(&self, element: &Element, reply: &ReplySender) -> Result<(), XBeeCommandError> {
        let addr = element.attribute("addr").filter(|a| !a.is_empty()).ok_or_else(|| {
            XBeeCommandError::MissingAttr(
                "No destination XBee address (attribute 'addr') given.".to_string(),
            )
        })?;

        let address = if addr == "broadcast" {
            HardwareAddress::BROADCAST
        } else {
            HardwareAddress::parse(addr).map_err(|e| XBeeCommandError::Address(e.to_string()))?
        };

        let encoding = element.attribute("encoding").unwrap_or("base64");
        let body = element.text().unwrap_or("");
        let payload = match encoding {
            "base64" => {
                let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
                STANDARD
                    .decode(compact)
                    .map_err(|e| XBeeCommandError::Base64(e.to_string()))?
            }
            "utf-8" => body.as_bytes().to_vec(),
            other => {
                error!(encoding = %other, "Unrecognized encoding");
                return Err(XBeeCommandError::Encoding(other.to_string()));
            }
        };

        let txid = allocate_transmission(&self.tx_slots, reply)?;
        let destination = DestinationDescriptor::new(address, DEFAULT_ENDPOINT, DIGI_PROFILE, SERIAL_CLUSTER)
            .with_transmission_id(txid);

        debug!(len = payload.len(), %destination, "Sending serial data");
        send_or_release(&*self.socket, &self.tx_slots, txid, &payload, &destination).map_err(|e| {
            info!(error = ?e, "Problem sending serial data");
            e
        })
    }

    /// Number of transmissions awaiting a status frame
    pub fn outstanding(&self) -> usize {
        self.tx_slots.outstanding()
    }

    /// Read and dispatch one inbound frame
    pub fn handle_read(&self) -> Result<(), ManagerError> {
        let mut buf = [0u8; MAX_FRAME];
        let (len, addr) = match self.socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(TransportError::WouldBlock) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let data = &buf[..len];
        debug!(from = %addr, len, "Received frame");

        if addr.profile != DIGI_PROFILE {
            info!("Received data for profile {:#x}, discarding", addr.profile);
            return Ok(());
        }

        match addr.cluster {
            SERIAL_CLUSTER => self.handle_serial(&addr, data),
            IO_CLUSTER => self.handle_io(&addr, data)?,
            TX_STATUS_CLUSTER => self.handle_tx_status(&addr, data),
            _ => {
                info!(from = %addr, "Unhandled XBee packet");
                debug!(payload = %hex::encode(data), "Unhandled packet payload");
            }
        }
        Ok(())
    }

    fn handle_serial(&self, addr: &DestinationDescriptor, data: &[u8]) {
        debug!(from = %addr, data = %hex::encode(data), "Received serial data");
        let event = TelemetryEvent::new(
            TelemetryIdent::node(addr.address.to_string()),
            TelemetryValue::Serial(data.to_vec()),
        );
        self.telemetry.publish(TOPIC_SERIAL_IN, &event);
    }

    fn handle_io(&self, addr: &DestinationDescriptor, data: &[u8]) -> Result<(), ManagerError> {
        let sample = parse_io_sample(data).map_err(|source| ManagerError::IoSample {
            address: addr.address.to_string(),
            source,
        })?;

        for (channel, value) in sample {
            debug!(%channel, %value, "Processing IO sample");
            if !self.filter.admit(addr.address, &channel, value) {
                debug!(address = %addr.address, %channel, "Dropping duplicate reading");
                continue;
            }

            let (topic, value) = match value {
                SampleValue::Analog(v) => (TOPIC_ANALOG, TelemetryValue::Analog(v)),
                SampleValue::Digital(v) => (TOPIC_DIGITAL_IN, TelemetryValue::Digital(v)),
            };
            let ident = TelemetryIdent::channel(addr.address.to_string(), channel);
            self.telemetry.publish(topic, &TelemetryEvent::new(ident, value));
        }
        Ok(())
    }

    fn handle_tx_status(&self, addr: &DestinationDescriptor, data: &[u8]) {
        let Some(status) = TxStatus::parse(data) else {
            error!(from = %addr, len = data.len(), "Short TX status frame, dropping");
            return;
        };
        debug!(
            destination16 = status.destination16,
            retries = status.retries,
            delivery = status.delivery,
            discovery = status.discovery,
            "TX status"
        );

        let txid = addr.transmission_id;
        match self.tx_slots.take(txid) {
            Err(e) => error!(error = %e, "Problem handling TX status"),
            Ok(None) => info!(txid, "No command registered for transmission ID"),
            Ok(Some(reply)) => {
                if !reply.put(status::completion_reply(&status)) {
                    debug!(txid, "Command already answered, status discarded");
                }
            }
        }
    }
}

impl EventSource for XBeeSerialManager {
    fn name(&self) -> &str {
        "xbee-serial"
    }

    fn readable(&self) -> Result<bool, TransportError> {
        self.wait_readable(std::time::Duration::ZERO)
    }

    fn wait_readable(&self, timeout: std::time::Duration) -> Result<bool, TransportError> {
        Ok(self.socket.poll(Interest::Read, timeout)?.readable)
    }

    fn handle_read(&self) -> Result<(), ManagerError> {
        XBeeSerialManager::handle_read(self)
    }
}
