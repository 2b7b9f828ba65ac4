//! Command router
//!
//! Each command element is published on `command.<tag>` together with a
//! fresh reply channel. Handlers run synchronously during the publish and
//! either answer right away or promise a deferred answer with
//! [`Reply::Pending`]. The router then collects replies until every promise
//! is kept, or until one wait exceeds the response timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::timeout;
use tracing::{debug, error, warn};
use xbgw_core::{
    command_topic, reply_channel, CommandBus, CommandError, CommandMessage, Element, ElementError,
    Reply,
};

use crate::error::RouterError;

/// Default bound on a single wait for a deferred reply
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CommandRouter {
    bus: Arc<CommandBus>,
    response_timeout: Duration,
}

impl CommandRouter {
    pub fn new(bus: Arc<CommandBus>) -> Self {
        Self {
            bus,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn with_response_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    /// Run one command and return its `<responses command="tag">` element
    pub async fn process(&self, element: Element) -> Element {
        let tag = element.tag.clone();
        let topic = command_topic(&tag);
        let mut responses = Element::new("responses").with_attribute("command", tag.as_str());

        let (reply, mut rx) = reply_channel();
        let message = CommandMessage { element, reply };
        let handlers = self.bus.publish(&topic, &message);
        // Only handlers may hold senders from here on
        drop(message);
        debug!(%topic, handlers, "Command published");

        // A deferral may overtake its own Pending, so this can dip below zero
        let mut outstanding: isize = 0;
        let mut received_any = false;

        loop {
            let next = match rx.try_recv() {
                Ok(reply) => Some(reply),
                Err(_) if outstanding <= 0 => None,
                Err(TryRecvError::Disconnected) => {
                    error!(%tag, outstanding, "Unexpected exit while waiting for response");
                    break;
                }
                Err(TryRecvError::Empty) => match timeout(self.response_timeout, rx.recv()).await {
                    Ok(Some(reply)) => Some(reply),
                    Ok(None) => {
                        error!(%tag, outstanding, "Unexpected exit while waiting for response");
                        break;
                    }
                    Err(_) => {
                        error!(
                            %tag,
                            outstanding,
                            timeout_ms = self.response_timeout.as_millis() as u64,
                            "Timeout while waiting for response"
                        );
                        break;
                    }
                },
            };

            let Some(reply) = next else {
                break;
            };
            received_any = true;

            match reply {
                Reply::Pending => outstanding += 1,
                Reply::Deferred(value) => {
                    outstanding -= 1;
                    responses.push_child(value.into_response());
                }
                Reply::Immediate(value) => responses.push_child(value.into_response()),
            }
        }

        if !received_any {
            warn!(%tag, "Command not handled");
            responses.push_child(RouterError::Unknown(tag).to_response());
            return responses;
        }

        for _ in 0..outstanding.max(0) {
            responses.push_child(RouterError::Timeout.to_response());
        }
        responses
    }

    /// Run every top-level element of `body` in document order and
    /// concatenate the serialized results
    pub async fn process_batch(&self, body: &str) -> Result<String, ElementError> {
        let root = Element::parse(&format!("<root>{}</root>", body))?;

        let mut out = String::new();
        for command in root.children {
            let responses = self.process(command).await;
            out.push_str(&responses.to_xml());
        }
        Ok(out)
    }
}
