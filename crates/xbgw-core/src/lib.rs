//! xbgw-core - Core types for the XBee gateway
//!
//! This crate provides the pieces shared by the socket managers and the
//! command router: the XML element tree, the two-phase reply protocol, the
//! synchronous in-process message bus and the telemetry event types.

pub mod bus;
pub mod command;
pub mod element;
pub mod error;
pub mod reply;
pub mod telemetry;

pub use bus::MessageBus;
pub use command::{command_topic, CommandBus, CommandMessage};
pub use element::{Element, ElementError};
pub use error::{error_response, CommandError};
pub use reply::{reply_channel, Reply, ReplySender, ReplyValue};
pub use telemetry::{TelemetryBus, TelemetryEvent, TelemetryIdent, TelemetryValue};
