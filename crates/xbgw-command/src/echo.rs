//! `echo` debug command
//!
//! Replies with the command element itself. With a delay configured the
//! reply is deferred and delivered from a worker thread, which exercises
//! the pending/deferred path end to end.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use xbgw_core::{command_topic, CommandBus, CommandMessage, Reply};

pub const ECHO_COMMAND: &str = "echo";

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoCommand {
    delay: Option<Duration>,
}

impl EchoCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer the echo by `delay`; a zero delay answers immediately
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: (!delay.is_zero()).then_some(delay),
        }
    }

    pub fn register(self, bus: &CommandBus) {
        bus.subscribe(command_topic(ECHO_COMMAND), move |message: &CommandMessage| {
            self.handle(message)
        });
    }

    fn handle(&self, message: &CommandMessage) {
        let Some(delay) = self.delay else {
            message.reply.put(message.element.clone());
            return;
        };

        debug!(?delay, "Queueing echo");
        let element = message.element.clone();
        let reply = message.reply.clone();
        let spawned = thread::Builder::new()
            .name("xbgw-echo".to_string())
            .spawn(move || {
                thread::sleep(delay);
                reply.put(Reply::deferred(element));
            });

        match spawned {
            Ok(_) => {
                message.reply.put(Reply::Pending);
            }
            Err(e) => {
                warn!(error = %e, "Could not start echo worker, answering immediately");
                message.reply.put(message.element.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandRouter;
    use std::sync::Arc;
    use xbgw_core::Element;

    fn router(echo: EchoCommand) -> CommandRouter {
        let bus = Arc::new(CommandBus::new());
        echo.register(&bus);
        CommandRouter::new(bus).with_response_timeout(Duration::from_secs(2))
    }

    #[tokio::test]
    async fn echoes_element_as_response() {
        let out = router(EchoCommand::new())
            .process_batch(r#"<echo a="1">hello</echo>"#)
            .await
            .unwrap();
        assert_eq!(out, r#"<responses command="echo"><response a="1">hello</response></responses>"#);
    }

    #[tokio::test]
    async fn delayed_echo_goes_through_pending() {
        let out = router(EchoCommand::with_delay(Duration::from_millis(30)))
            .process(Element::new("echo").with_text("later"))
            .await;
        assert_eq!(out.children.len(), 1);
        assert_eq!(out.children[0].text(), Some("later"));
    }
}
