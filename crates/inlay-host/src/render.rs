//! Visualization-library capability traits
//!
//! The render library is external: the host consumes it through these
//! traits. A [`RenderLibrary`] instantiates a [`LiveView`] from a
//! serialized payload; the view reports mutations as [`ChangeEvent`]s,
//! accepts external patches tagged with their origin, and can serialize
//! itself back to a transport-friendly payload.

use crate::error::HostError;
use async_trait::async_trait;
use inlay_protocol::{DocumentPatch, Setter};
use std::sync::Arc;

/// One observed mutation of a live view.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Which side produced the underlying change, when it was an external
    /// patch application. `None` means the view itself mutated (user
    /// interaction) — only those events are forwarded inward.
    pub setter: Option<Setter>,
    /// Library-specific event description.
    pub event: serde_json::Value,
}

impl ChangeEvent {
    /// An event produced by direct view mutation.
    pub fn local(event: serde_json::Value) -> Self {
        Self {
            setter: None,
            event,
        }
    }

    /// An event produced by applying an external patch.
    pub fn external(setter: Setter, event: serde_json::Value) -> Self {
        Self {
            setter: Some(setter),
            event,
        }
    }
}

/// Listener invoked on every change to a live view.
pub type ChangeListener = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// A live, in-page view over one rendered document.
pub trait LiveView: Send + Sync + 'static {
    /// Register a change listener. Listeners observe every mutation,
    /// including patch applications; the event's setter tag tells them
    /// which ones to ignore.
    fn on_change(&self, listener: ChangeListener);

    /// Serialize change events into a transportable patch.
    fn serialize_events(&self, events: &[ChangeEvent]) -> Result<DocumentPatch, HostError>;

    /// Apply an external patch, tagging the resulting change events with
    /// the patch's origin.
    fn apply_patch(&self, patch: &DocumentPatch, setter: Option<Setter>) -> Result<(), HostError>;

    /// Serialize the current document state.
    fn serialize(&self) -> Result<String, HostError>;
}

/// The visualization library itself.
#[async_trait]
pub trait RenderLibrary: Send + Sync + 'static {
    /// The live-view type this library produces.
    type View: LiveView;

    /// Instantiate a live view from a serialized payload, attached to the
    /// named DOM output region.
    async fn instantiate(&self, content: &str, target: &str) -> Result<Arc<Self::View>, HostError>;
}
