//! xbgw-xbee - Radio side of the XBee gateway
//!
//! This crate owns the radio sockets. It turns command elements into
//! outbound frames, matches status frames back to the commands that caused
//! them, and publishes inbound telemetry.
//!
//! # Architecture
//!
//! ```text
//!        CommandBus                                   TelemetryBus
//!   command.send_serial   command.set_digital_output   xbee.serialIn
//!            │                       │                 xbee.analog
//!            ▼                       ▼                 xbee.digitalIn
//! ┌─────────────────────┐  ┌─────────────────────┐          ▲
//! │  XBeeSerialManager  │  │     DdoManager      │          │
//! │  TxSlotTable        │  │  TxSlotTable        │          │
//! │  DuplicateFilter ───┼──┼─────────────────────┼──────────┘
//! └─────────┬───────────┘  └─────────┬───────────┘
//!           │ send_to                │ send_to
//!           ▼                        ▼
//!   DatagramSocket<Destination>  DatagramSocket<Ddo>
//!   (UDP bridge / mock)          (UDP bridge / mock)
//!           ▲                        ▲
//!           └──── Reactor thread ────┘
//!                 (handle_read)
//! ```

pub mod address;
pub mod config;
pub mod ddo;
pub mod error;
pub mod io_sample;
pub mod manager;
pub mod reactor;
pub mod serial;
pub mod transport;
pub mod txid;

pub use address::{AddressError, DdoDescriptor, DestinationDescriptor, HardwareAddress};
pub use config::{DdoConfig, ReactorConfig, TransportConfig, XBeeConfig};
pub use ddo::DdoManager;
pub use error::{ManagerError, XBeeCommandError};
pub use io_sample::{parse_io_sample, IoSample, IoSampleError, SampleValue};
pub use reactor::{EventSource, Reactor, ReactorHandle};
pub use serial::XBeeSerialManager;
pub use transport::{create_socket, DatagramSocket, MockSocket, SharedSocket, TransportError};
pub use txid::{TransmissionSlotTable, TxIdError};
