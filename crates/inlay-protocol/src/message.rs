//! Request and response message enums
//!
//! The wire shape is JSON with a `type` discriminant, matching what the
//! page and worker exchange over `postMessage`-style transports. Requests
//! flow host → worker; responses flow worker → host. Both enums are
//! closed: every handler matches exhaustively.

use crate::cell::CellId;
use crate::mime::Mime;
use crate::patch::DocumentPatch;
use serde::{Deserialize, Serialize};

/// One unit of work submitted to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerRequest {
    /// Execute a cell's source text.
    Execute {
        /// Originating cell.
        id: CellId,
        /// Source text to run.
        code: String,
    },
    /// The host has instantiated a live view for this cell's output; the
    /// worker should link the runtime-side document to it when the MIME
    /// type is interactive.
    Rendered {
        /// Originating cell.
        id: CellId,
        /// MIME classification of the rendered payload.
        mime: Mime,
    },
    /// Apply a host-produced patch to the runtime-side live document.
    Patch {
        /// Owning cell.
        id: CellId,
        /// The serialized patch and its buffers.
        #[serde(flatten)]
        patch: DocumentPatch,
    },
}

impl WorkerRequest {
    /// The cell this request concerns.
    pub fn id(&self) -> &CellId {
        match self {
            Self::Execute { id, .. } | Self::Rendered { id, .. } | Self::Patch { id, .. } => id,
        }
    }
}

/// One unit of output from worker to host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerResponse {
    /// Progress notice while the request waits or the runtime loads.
    Loading {
        /// Originating cell.
        id: CellId,
        /// Human-readable progress text.
        msg: String,
    },
    /// The runtime finished bootstrapping. Sent at most once per worker
    /// session, on the first request that triggered the bootstrap.
    Loaded {
        /// Cell whose request triggered the bootstrap.
        id: CellId,
    },
    /// A rendered payload for the cell's output region.
    Render {
        /// Originating cell.
        id: CellId,
        /// Serialized render payload.
        content: String,
        /// MIME classification of the payload.
        mime: Mime,
    },
    /// Standard-output text captured during execution.
    Stdout {
        /// Originating cell.
        id: CellId,
        /// Captured text.
        content: String,
    },
    /// Standard-error text captured during execution.
    Stderr {
        /// Originating cell.
        id: CellId,
        /// Captured text.
        content: String,
    },
    /// A runtime-produced patch for the cell's live view.
    Patch {
        /// Owning cell.
        id: CellId,
        /// The serialized patch and its buffers.
        #[serde(flatten)]
        patch: DocumentPatch,
    },
    /// The request settled successfully; the worker is ready for the next.
    Idle {
        /// Originating cell.
        id: CellId,
    },
    /// The request failed. Terminal for this request: no `idle` follows.
    Error {
        /// Originating cell.
        id: CellId,
        /// Short summary (last non-empty line of the trace).
        msg: String,
        /// Full formatted trace.
        traceback: String,
    },
}

impl WorkerResponse {
    /// The cell this response concerns.
    pub fn id(&self) -> &CellId {
        match self {
            Self::Loading { id, .. }
            | Self::Loaded { id }
            | Self::Render { id, .. }
            | Self::Stdout { id, .. }
            | Self::Stderr { id, .. }
            | Self::Patch { id, .. }
            | Self::Idle { id }
            | Self::Error { id, .. } => id,
        }
    }

    /// Whether this message terminates its request's message sequence.
    ///
    /// `idle` is the success terminal; `error` is the failure terminal and
    /// is never followed by `idle`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Idle { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn execute_request_wire_shape() {
        let req = WorkerRequest::Execute {
            id: CellId::new("c1"),
            code: "1+1".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "execute");
        assert_eq!(json["id"], "c1");
        assert_eq!(json["code"], "1+1");
    }

    #[test]
    fn patch_request_flattens_payload() {
        let req = WorkerRequest::Patch {
            id: CellId::new("c2"),
            patch: DocumentPatch::new("[{\"kind\":\"set\"}]").with_buffer("b0", vec![0xff]),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "patch");
        assert_eq!(json["patch"], "[{\"kind\":\"set\"}]");
        assert!(json["buffers"]["b0"].is_array());

        let back: WorkerRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn response_discriminants_match_the_wire_table() {
        let cases = [
            (
                WorkerResponse::Loading {
                    id: "c".into(),
                    msg: "Loading pkg".into(),
                },
                "loading",
            ),
            (WorkerResponse::Loaded { id: "c".into() }, "loaded"),
            (
                WorkerResponse::Render {
                    id: "c".into(),
                    content: "2".into(),
                    mime: Mime::text(),
                },
                "render",
            ),
            (
                WorkerResponse::Stdout {
                    id: "c".into(),
                    content: "hi".into(),
                },
                "stdout",
            ),
            (WorkerResponse::Idle { id: "c".into() }, "idle"),
        ];
        for (msg, tag) in cases {
            let json = serde_json::to_value(&msg).unwrap();
            assert_eq!(json["type"], tag);
        }
    }

    #[test]
    fn unknown_type_fails_to_decode() {
        let err = serde_json::from_str::<WorkerRequest>(r#"{"type":"reboot","id":"c1"}"#);
        assert_matches!(err, Err(_));
    }

    #[test]
    fn terminal_kinds() {
        assert!(WorkerResponse::Idle { id: "c".into() }.is_terminal());
        assert!(WorkerResponse::Error {
            id: "c".into(),
            msg: String::new(),
            traceback: String::new(),
        }
        .is_terminal());
        assert!(!WorkerResponse::Loaded { id: "c".into() }.is_terminal());
    }
}
