//! Radio manager configuration
//!
//! Loaded from the `[xbee]`, `[ddo]` and `[reactor]` tables of the daemon
//! configuration file. Every field has a default so an empty file works.

use serde::{Deserialize, Serialize};

use crate::txid::DEFAULT_MAX_TRANSMISSION_ID;

// =============================================================================
// Transport Configuration
// =============================================================================

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Framed datagrams to a radio bridge over UDP (unix only)
    Udp(UdpConfig),
    /// In-memory socket for testing and demo mode
    Mock(MockConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

/// UDP bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdpConfig {
    /// Local address to bind, e.g. "0.0.0.0:9750"
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Bridge address frames are sent to
    #[serde(default = "default_remote")]
    pub remote: String,
}

fn default_bind() -> String {
    "0.0.0.0:9750".to_string()
}

fn default_remote() -> String {
    "127.0.0.1:9751".to_string()
}

/// Mock transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Whether the socket reports write readiness
    #[serde(default = "default_true")]
    pub writable: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self { writable: true }
    }
}

// =============================================================================
// Manager Configuration
// =============================================================================

/// Serial/telemetry manager settings (`[xbee]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XBeeConfig {
    /// Drop analog readings that moved less than `minimum_analog_change`
    #[serde(default = "default_true")]
    pub filter_analog_duplicates: bool,
    #[serde(default = "default_minimum_analog_change")]
    pub minimum_analog_change: u16,
    /// Drop digital readings equal to the previous one
    #[serde(default = "default_true")]
    pub filter_digital_duplicates: bool,
    #[serde(default = "default_max_transmission_id")]
    pub max_transmission_id: u8,
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for XBeeConfig {
    fn default() -> Self {
        Self {
            filter_analog_duplicates: true,
            minimum_analog_change: default_minimum_analog_change(),
            filter_digital_duplicates: true,
            max_transmission_id: default_max_transmission_id(),
            transport: TransportConfig::default(),
        }
    }
}

/// Remote configuration manager settings (`[ddo]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdoConfig {
    #[serde(default = "default_max_transmission_id")]
    pub max_transmission_id: u8,
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for DdoConfig {
    fn default() -> Self {
        Self {
            max_transmission_id: default_max_transmission_id(),
            transport: TransportConfig::default(),
        }
    }
}

/// Reactor settings (`[reactor]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactorConfig {
    /// Sleep between passes that found nothing to read
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_minimum_analog_change() -> u16 {
    1
}

fn default_max_transmission_id() -> u8 {
    DEFAULT_MAX_TRANSMISSION_ID
}

fn default_poll_interval_ms() -> u64 {
    100
}
