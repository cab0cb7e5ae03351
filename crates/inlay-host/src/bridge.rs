//! Document sync bridge
//!
//! One bridge per interactive output keeps the in-page live view and the
//! runtime-side document in step. View mutations are serialized and sent
//! inward as `patch` requests; runtime mutations arrive as `patch`
//! responses and are applied outward to the view.
//!
//! Echo suppression: every change event carries the origin of the change
//! when it came from an external patch. The DOM-side listener forwards
//! only events with no setter tag, so a patch applied to the view can
//! never bounce straight back to the worker, and vice versa.

use crate::error::HostError;
use crate::render::{ChangeEvent, LiveView};
use inlay_protocol::{CellId, DocumentPatch, Setter, WorkerRequest};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Lifecycle of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Created, no live view attached yet.
    Unlinked,
    /// Live view attached and listener registered; patches flow.
    Linked,
    /// The owning output region was discarded; the view is gone. The
    /// runtime-side document persists until the next execution.
    Released,
}

/// Bidirectional link between a live view and its runtime-side document.
pub struct SyncBridge<V: LiveView> {
    cell: CellId,
    view: Option<Arc<V>>,
    state: BridgeState,
}

impl<V: LiveView> SyncBridge<V> {
    /// A fresh, unlinked bridge for `cell`.
    pub fn new(cell: CellId) -> Self {
        Self {
            cell,
            view: None,
            state: BridgeState::Unlinked,
        }
    }

    /// Attach a live view and register the DOM-side change listener.
    ///
    /// The listener holds only a weak view reference, so the view's own
    /// listener list never keeps it alive after release.
    pub fn link(&mut self, view: Arc<V>, requests: &mpsc::UnboundedSender<WorkerRequest>) {
        let cell = self.cell.clone();
        let weak = Arc::downgrade(&view);
        let requests = requests.clone();

        view.on_change(Arc::new(move |event: ChangeEvent| {
            if event.setter.is_some() {
                // An external patch application; re-forwarding it would
                // start a patch ping-pong.
                return;
            }
            let Some(view) = weak.upgrade() else {
                return;
            };
            match view.serialize_events(std::slice::from_ref(&event)) {
                Ok(patch) => {
                    if requests
                        .send(WorkerRequest::Patch {
                            id: cell.clone(),
                            patch,
                        })
                        .is_err()
                    {
                        debug!(cell = %cell, "worker gone; dropping view patch");
                    }
                }
                Err(err) => {
                    warn!(cell = %cell, "failed to serialize change event: {err}");
                }
            }
        }));

        self.view = Some(view);
        self.state = BridgeState::Linked;
    }

    /// Apply a runtime-produced patch outward to the live view, tagged
    /// with its origin so the DOM-side listener skips it.
    pub fn apply(&self, patch: &DocumentPatch) -> Result<(), HostError> {
        match &self.view {
            Some(view) => view.apply_patch(patch, Some(Setter::Runtime)),
            None => Err(HostError::BridgeReleased {
                cell: self.cell.clone(),
            }),
        }
    }

    /// Drop the live view reference. Idempotent.
    pub fn release(&mut self) {
        if self.view.take().is_some() {
            debug!(cell = %self.cell, "sync bridge released");
        }
        self.state = BridgeState::Released;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// The cell this bridge belongs to.
    pub fn cell(&self) -> &CellId {
        &self.cell
    }

    /// The attached view, while linked.
    pub fn view(&self) -> Option<&Arc<V>> {
        self.view.as_ref()
    }
}
