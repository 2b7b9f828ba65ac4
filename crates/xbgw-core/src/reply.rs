//! Two-phase reply protocol between command handlers and the router
//!
//! A handler answers a command by putting values on the [`ReplySender`] it
//! was handed. A plain value is an immediate answer. [`Reply::Pending`]
//! promises a later [`Reply::Deferred`] on the same channel, possibly from
//! another thread; the router waits (bounded) for every promise to be kept.

use tokio::sync::mpsc;

use crate::element::Element;

/// A value contributed by a command handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyValue {
    /// Structured reply node
    Node(Element),
    /// Anything else; the router wraps it in a `<response>` element
    Text(String),
}

impl ReplyValue {
    /// Convert into the `<response>` node the router emits
    pub fn into_response(self) -> Element {
        match self {
            ReplyValue::Node(mut element) => {
                element.tag = "response".to_string();
                element
            }
            ReplyValue::Text(text) => Element::new("response").with_text(text),
        }
    }
}

impl From<Element> for ReplyValue {
    fn from(element: Element) -> Self {
        ReplyValue::Node(element)
    }
}

impl From<String> for ReplyValue {
    fn from(text: String) -> Self {
        ReplyValue::Text(text)
    }
}

impl From<&str> for ReplyValue {
    fn from(text: &str) -> Self {
        ReplyValue::Text(text.to_string())
    }
}

/// Envelope put on a command's reply channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Immediate(ReplyValue),
    Pending,
    Deferred(ReplyValue),
}

impl Reply {
    pub fn deferred(value: impl Into<ReplyValue>) -> Self {
        Reply::Deferred(value.into())
    }
}

impl From<Element> for Reply {
    fn from(element: Element) -> Self {
        Reply::Immediate(element.into())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Immediate(text.into())
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Immediate(text.into())
    }
}

/// Put-only handle to a command's reply channel
///
/// Handlers and completions may clone it freely; only the router holds the
/// receiving end.
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: mpsc::UnboundedSender<Reply>,
}

impl ReplySender {
    /// Enqueue a reply. Returns `false` when the router has stopped
    /// listening (timed out or finished).
    pub fn put(&self, reply: impl Into<Reply>) -> bool {
        self.tx.send(reply.into()).is_ok()
    }

    /// Whether the receiving side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a fresh reply channel for one command invocation
pub fn reply_channel() -> (ReplySender, mpsc::UnboundedReceiver<Reply>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ReplySender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_value_is_wrapped() {
        let el = ReplyValue::from("done").into_response();
        assert_eq!(el.tag, "response");
        assert_eq!(el.text(), Some("done"));
    }

    #[test]
    fn node_value_is_renamed_keeping_attributes() {
        let node = Element::new("echoed").with_attribute("k", "v").with_text("x");
        let el = ReplyValue::from(node).into_response();
        assert_eq!(el.tag, "response");
        assert_eq!(el.attribute("k"), Some("v"));
        assert_eq!(el.text(), Some("x"));
    }

    #[test]
    fn sender_reports_closed_receiver() {
        let (tx, rx) = reply_channel();
        assert!(!tx.is_closed());
        assert!(tx.put(Reply::Pending));
        drop(rx);
        assert!(tx.is_closed());
        assert!(!tx.put("late"));
    }

    #[test]
    fn replies_arrive_in_order() {
        let (tx, mut rx) = reply_channel();
        tx.put(Reply::Pending);
        tx.put(Reply::deferred("ok"));
        assert_eq!(rx.try_recv().unwrap(), Reply::Pending);
        assert_eq!(rx.try_recv().unwrap(), Reply::Deferred(ReplyValue::Text("ok".into())));
    }
}
