//! Cell identifiers
//!
//! A cell id is minted by the page when a code cell is rendered and is
//! carried on every request and response that concerns that cell. It is
//! opaque to the protocol; the host also derives the name of the DOM
//! output region from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier correlating a request with its originating cell and
/// with every response message produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    /// Create a cell id from its page-side string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the DOM output region owned by this cell.
    ///
    /// The worker-side live-document cache is keyed by the same name, so
    /// both sides agree on where a cell's output lives.
    pub fn output_target(&self) -> String {
        format!("output-{}", self.0)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_target_matches_dom_convention() {
        let id = CellId::new("cell-3");
        assert_eq!(id.output_target(), "output-cell-3");
        assert_eq!(id.to_string(), "cell-3");
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = CellId::new("c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c1\"");
    }
}
