//! Error replies for command handlers
//!
//! Every failure a command can hit becomes a reply value; nothing is
//! propagated across the bus. Handler error enums implement
//! [`CommandError`] so they all render to the same reply structure:
//!
//! ```text
//! <response>
//!   <error id="txfull">
//!     <desc>Too many outstanding transmits</desc>
//!     <hint>optional context</hint>
//!   </error>
//! </response>
//! ```

use crate::element::Element;

/// An error that is reported to the command issuer as a reply
///
/// `Display` supplies the fixed catalog description for the error id.
pub trait CommandError: std::error::Error {
    /// Stable error identifier, unique within one command's catalog
    fn id(&self) -> &'static str;

    /// Context from the point of failure, if any
    fn hint(&self) -> Option<String> {
        None
    }

    /// Render as a `<response>` error node
    fn to_response(&self) -> Element {
        error_response(self.id(), &self.to_string(), self.hint().as_deref())
    }
}

/// Build the standard error reply node
pub fn error_response(id: &str, description: &str, hint: Option<&str>) -> Element {
    let mut error = Element::new("error")
        .with_attribute("id", id)
        .with_child(Element::new("desc").with_text(description));

    if let Some(hint) = hint.filter(|h| !h.is_empty()) {
        error.push_child(Element::new("hint").with_text(hint));
    }

    Element::new("response").with_child(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum SampleError {
        #[error("Something broke")]
        Broke(String),
    }

    impl CommandError for SampleError {
        fn id(&self) -> &'static str {
            "broke"
        }

        fn hint(&self) -> Option<String> {
            match self {
                SampleError::Broke(hint) => Some(hint.clone()),
            }
        }
    }

    #[test]
    fn error_response_structure() {
        let el = SampleError::Broke("here".into()).to_response();
        assert_eq!(el.tag, "response");
        let error = el.find("error").unwrap();
        assert_eq!(error.attribute("id"), Some("broke"));
        assert_eq!(error.find("desc").and_then(|d| d.text()), Some("Something broke"));
        assert_eq!(error.find("hint").and_then(|h| h.text()), Some("here"));
    }

    #[test]
    fn empty_hint_is_omitted() {
        let el = error_response("x", "desc", Some(""));
        assert!(el.find("error").unwrap().find("hint").is_none());
    }
}
