//! Command messages carried on the command bus

use crate::bus::MessageBus;
use crate::element::Element;
use crate::reply::ReplySender;

/// Topic prefix for command dispatch
pub const COMMAND_TOPIC_PREFIX: &str = "command";

/// What a command handler receives: the command element (read-only) and
/// the put-only reply channel for this invocation.
#[derive(Debug, Clone)]
pub struct CommandMessage {
    pub element: Element,
    pub reply: ReplySender,
}

pub type CommandBus = MessageBus<CommandMessage>;

/// Topic a command element is published on: `command.<tag>`
///
/// ```
/// # use xbgw_core::command::command_topic;
/// assert_eq!(command_topic("send_serial"), "command.send_serial");
/// ```
pub fn command_topic(tag: &str) -> String {
    format!("{}.{}", COMMAND_TOPIC_PREFIX, tag)
}
