//! Host controller
//!
//! One controller per page. It owns the request sender toward its single
//! worker, the bridge table for interactive outputs, and the typed UI
//! surface. Responses are handled synchronously in message order; each
//! kind maps to exactly one UI effect, with `render` of an interactive
//! payload additionally establishing the sync bridge.

use crate::bridge::SyncBridge;
use crate::error::HostError;
use crate::render::RenderLibrary;
use crate::ui::CellUi;
use inlay_protocol::{CellId, WorkerRequest, WorkerResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Per-page orchestration: one worker, one bridge table, one UI surface.
pub struct HostController<L: RenderLibrary, U: CellUi> {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    library: Arc<L>,
    ui: Arc<U>,
    bridges: HashMap<CellId, SyncBridge<L::View>>,
}

impl<L: RenderLibrary, U: CellUi> HostController<L, U> {
    /// Wire a controller to a worker's request channel.
    pub fn new(
        requests: mpsc::UnboundedSender<WorkerRequest>,
        library: Arc<L>,
        ui: Arc<U>,
    ) -> Self {
        Self {
            requests,
            library,
            ui,
            bridges: HashMap::new(),
        }
    }

    /// Enqueue execution of a cell's source text.
    pub fn run(&self, id: CellId, code: impl Into<String>) -> Result<(), HostError> {
        self.requests
            .send(WorkerRequest::Execute {
                id,
                code: code.into(),
            })
            .map_err(|_| HostError::WorkerGone)
    }

    /// Handle one worker response.
    pub async fn handle(&mut self, response: WorkerResponse) -> Result<(), HostError> {
        match response {
            WorkerResponse::Loading { id, msg } => self.ui.show_loading(&id, &msg),
            WorkerResponse::Loaded { id } => self.ui.show_executing(&id),
            WorkerResponse::Render { id, content, mime } => {
                self.ui.render_output(&id, &content, &mime);
                if mime.is_interactive() {
                    self.link(&id, &content).await?;
                    self.requests
                        .send(WorkerRequest::Rendered { id, mime })
                        .map_err(|_| HostError::WorkerGone)?;
                }
            }
            WorkerResponse::Stdout { id, content } => self.ui.write_stdout(&id, &content),
            WorkerResponse::Stderr { id, content } => self.ui.write_stderr(&id, &content),
            WorkerResponse::Patch { id, patch } => match self.bridges.get(&id) {
                Some(bridge) => bridge.apply(&patch)?,
                None => warn!(cell = %id, "patch for a cell with no linked view; dropped"),
            },
            WorkerResponse::Idle { id } => self.ui.show_idle(&id),
            WorkerResponse::Error { id, msg, traceback } => {
                self.ui.show_error(&id, &msg, &traceback)
            }
        }
        Ok(())
    }

    /// Instantiate a live view for an interactive payload and link its
    /// bridge. A re-run's fresh output replaces any previous link for the
    /// same cell.
    async fn link(&mut self, id: &CellId, content: &str) -> Result<(), HostError> {
        if let Some(previous) = self.bridges.get_mut(id) {
            debug!(cell = %id, "re-rendered cell; releasing previous bridge");
            previous.release();
        }

        let view = self.library.instantiate(content, &id.output_target()).await?;
        let mut bridge = SyncBridge::new(id.clone());
        bridge.link(view, &self.requests);
        self.bridges.insert(id.clone(), bridge);
        Ok(())
    }

    /// The bridge for a cell, if one exists.
    pub fn bridge(&self, id: &CellId) -> Option<&SyncBridge<L::View>> {
        self.bridges.get(id)
    }
}
