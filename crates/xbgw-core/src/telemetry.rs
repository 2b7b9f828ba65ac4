//! Telemetry events published by the socket managers
//!
//! Consumers (uploaders, loggers) subscribe on the telemetry bus to one of
//! the topics below, or to the `xbee` parent topic for all of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bus::MessageBus;

/// Analog channel readings (`AD0`..`AD6`)
pub const TOPIC_ANALOG: &str = "xbee.analog";
/// Digital channel readings (`DIO0`..`DIO12`)
pub const TOPIC_DIGITAL_IN: &str = "xbee.digitalIn";
/// Serial pass-through data
pub const TOPIC_SERIAL_IN: &str = "xbee.serialIn";

/// Every topic the managers publish to
pub const DATA_TOPICS: [&str; 3] = [TOPIC_ANALOG, TOPIC_DIGITAL_IN, TOPIC_SERIAL_IN];

pub type TelemetryBus = MessageBus<TelemetryEvent>;

/// Identity of a telemetry value: source node and optional channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TelemetryIdent {
    /// Normalized hardware address, e.g. `[00:13:A2:00:40:0A:12:34]!`
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl TelemetryIdent {
    pub fn node(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            channel: None,
        }
    }

    pub fn channel(address: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            channel: Some(channel.into()),
        }
    }

    /// `address` or `address/channel`
    pub fn stream_name(&self) -> String {
        match &self.channel {
            Some(channel) => format!("{}/{}", self.address, channel),
            None => self.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TelemetryValue {
    Digital(bool),
    Analog(u16),
    Serial(#[serde(with = "hex_bytes")] Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub ident: TelemetryIdent,
    pub value: TelemetryValue,
    pub received_at: DateTime<Utc>,
}

impl TelemetryEvent {
    pub fn new(ident: TelemetryIdent, value: TelemetryValue) -> Self {
        Self {
            ident,
            value,
            received_at: Utc::now(),
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
