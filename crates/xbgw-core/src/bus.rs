//! In-process publish/subscribe message bus
//!
//! Publishing is synchronous: every matching handler has run by the time
//! [`MessageBus::publish`] returns. The command router relies on this to
//! tell "nobody answered" apart from "answers are still coming".
//!
//! Topics are dotted names. A message published on `xbee.analog` reaches
//! subscribers of `xbee.analog` first, then subscribers of `xbee`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

type Handler<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// Topic name to ordered handler list
pub struct MessageBus<M> {
    topics: RwLock<HashMap<String, Vec<Handler<M>>>>,
}

impl<M> Default for MessageBus<M> {
    fn default() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }
}

impl<M> MessageBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; handlers on one topic run in subscription order
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F)
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        let topic = topic.into();
        trace!(topic = %topic, "Subscribing handler");
        self.topics
            .write()
            .entry(topic)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Deliver a message to every handler of `topic` and of its parents.
    /// Returns the number of handlers that ran.
    pub fn publish(&self, topic: &str, message: &M) -> usize {
        // Snapshot under the lock, run outside it, so handlers may subscribe.
        let handlers: Vec<Handler<M>> = {
            let topics = self.topics.read();
            topic_chain(topic)
                .filter_map(|name| topics.get(name))
                .flat_map(|list| list.iter().cloned())
                .collect()
        };

        for handler in &handlers {
            handler(message);
        }
        handlers.len()
    }

    /// Topics with at least one direct subscriber, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// `a.b.c`, `a.b`, `a`
fn topic_chain(topic: &str) -> impl Iterator<Item = &str> {
    let mut next = Some(topic);
    std::iter::from_fn(move || {
        let current = next?;
        next = current.rfind('.').map(|idx| &current[..idx]);
        Some(current)
    })
}
