//! Document patches and origin tags
//!
//! A patch is a serialized description of one or more mutations to a live
//! document. Patches cross the host/worker boundary in both directions and
//! carry any binary buffers the serialized form refers to by id.
//!
//! Every patch application is tagged with a [`Setter`] naming the side
//! that produced the change. The side applying a patch passes the tag
//! through to the document so the document's own change listener can skip
//! re-emitting it — without the tag, every patch would echo back and forth
//! forever.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Binary buffers referenced by a serialized patch, keyed by reference id.
pub type BufferMap = BTreeMap<String, Vec<u8>>;

/// Which side of the host/worker boundary produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Setter {
    /// The page's live view (user interaction with a rendered output).
    Host,
    /// The runtime-side document (guest application logic).
    Runtime,
}

/// One or more serialized live-document mutations plus their buffers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPatch {
    /// Serialized patch content (JSON text produced by the render library).
    pub patch: String,
    /// Binary buffers referenced from the patch content.
    #[serde(default, skip_serializing_if = "BufferMap::is_empty")]
    pub buffers: BufferMap,
}

impl DocumentPatch {
    /// Wrap already-serialized patch content with no binary buffers.
    pub fn new(patch: impl Into<String>) -> Self {
        Self {
            patch: patch.into(),
            buffers: BufferMap::new(),
        }
    }

    /// Attach a binary buffer under its reference id.
    pub fn with_buffer(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.buffers.insert(reference.into(), bytes);
        self
    }
}
