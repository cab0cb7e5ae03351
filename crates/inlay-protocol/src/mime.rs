//! MIME classification of rendered output
//!
//! Every `render` response carries a MIME tag. Most payloads are inert
//! (plain text, HTML, images); the interactive-document type is the one
//! the host treats specially, establishing a sync bridge between the
//! in-page view and the runtime-side document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME tag attached to a rendered payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mime(String);

impl Mime {
    /// The interactive-document type: payloads of this type get a live
    /// view linked back to the runtime-side document.
    pub const INTERACTIVE: &'static str = "application/inlay-doc";

    /// Plain text.
    pub const TEXT: &'static str = "text/plain";

    /// Wrap a MIME string.
    pub fn new(mime: impl Into<String>) -> Self {
        Self(mime.into())
    }

    /// The interactive-document tag.
    pub fn interactive() -> Self {
        Self::new(Self::INTERACTIVE)
    }

    /// The plain-text tag.
    pub fn text() -> Self {
        Self::new(Self::TEXT)
    }

    /// Whether a payload of this type participates in document sync.
    pub fn is_interactive(&self) -> bool {
        self.0 == Self::INTERACTIVE
    }

    /// The raw string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Mime {
    fn from(mime: &str) -> Self {
        Self::new(mime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_interactive_type_links() {
        assert!(Mime::interactive().is_interactive());
        assert!(!Mime::text().is_interactive());
        assert!(!Mime::new("text/html").is_interactive());
    }
}
