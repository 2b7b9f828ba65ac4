//! Radio node addressing
//!
//! A node is identified by its 64-bit IEEE address. Frames sent over the
//! data socket carry a [`DestinationDescriptor`]; frames on the remote
//! configuration socket carry a [`DdoDescriptor`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from [`HardwareAddress::parse`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Address is too short ({0} chars)")]
    TooShort(usize),

    #[error("Address is too long ({0} chars)")]
    TooLong(usize),
}

/// Canonical 64-bit hardware address of a radio node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HardwareAddress(u64);

impl HardwareAddress {
    /// `[00:00:00:00:00:00:FF:FF]!`
    pub const BROADCAST: HardwareAddress = HardwareAddress(0xFFFF);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Parse a hexadecimal address. Every non-hex character is treated as a
    /// separator and skipped, so `0013a200400a1234`, `00:13:A2:00:40:0A:12:34`
    /// and `[00:13:a2:00:40:0a:12:34]!` all name the same node.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let digits: String = input.chars().filter(char::is_ascii_hexdigit).collect();
        match digits.len() {
            0 => Err(AddressError::TooShort(0)),
            n if n > 16 => Err(AddressError::TooLong(n)),
            // At most 16 hex digits always fits
            _ => u64::from_str_radix(&digits, 16)
                .map(Self)
                .map_err(|_| AddressError::TooLong(digits.len())),
        }
    }
}

impl From<u64> for HardwareAddress {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for HardwareAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        write!(f, "[")?;
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        write!(f, "]!")
    }
}

/// Address of a data frame on the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestinationDescriptor {
    pub address: HardwareAddress,
    pub endpoint: u8,
    pub profile: u16,
    pub cluster: u16,
    pub options: u8,
    /// 0 means no transmit status is requested
    pub transmission_id: u8,
}

impl DestinationDescriptor {
    pub fn new(address: HardwareAddress, endpoint: u8, profile: u16, cluster: u16) -> Self {
        Self {
            address,
            endpoint,
            profile,
            cluster,
            options: 0,
            transmission_id: 0,
        }
    }

    pub fn with_transmission_id(mut self, id: u8) -> Self {
        self.transmission_id = id;
        self
    }
}

impl fmt::Display for DestinationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {:#x}, {:#x}, {:#x}",
            self.address, self.endpoint, self.profile, self.cluster
        )?;
        if self.options != 0 || self.transmission_id != 0 {
            write!(f, ", {:#x}, {:#x}", self.options, self.transmission_id)?;
        }
        write!(f, ")")
    }
}

/// Address of a remote configuration (DDO) frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DdoDescriptor {
    pub address: HardwareAddress,
    /// Two-character AT command, e.g. `D5` or `P0`
    pub command: [u8; 2],
    pub options: u8,
    pub transmission_id: u8,
    /// Firmware status code; always 0 on outbound frames
    pub status: u8,
}

impl DdoDescriptor {
    pub fn command_str(&self) -> String {
        String::from_utf8_lossy(&self.command).into_owned()
    }
}

impl fmt::Display for DdoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {:#x}, {}, {})",
            self.address,
            self.command_str(),
            self.options,
            self.transmission_id,
            self.status
        )
    }
}
