//! Inlay-Testkit: Test Doubles for the Orchestration Layer
//!
//! Deterministic stand-ins for Inlay's two external collaborators plus a
//! recording UI surface:
//!
//! - [`ScriptedRuntime`](runtime::ScriptedRuntime) — a table-driven
//!   [`GuestRuntime`](inlay_worker::GuestRuntime): scripted per-source
//!   outcomes, failing installs, init failures, execution delays, and a
//!   `mutate` hook that exercises the deliver-patch callback the way guest
//!   application logic would.
//! - [`MemoryRenderLibrary`](render::MemoryRenderLibrary) /
//!   [`MemoryView`](render::MemoryView) — a JSON-object document with real
//!   change-listener and setter-tag semantics.
//! - [`RecordingUi`](ui::RecordingUi) — records every typed UI effect.

#![forbid(unsafe_code)]

pub mod render;
pub mod runtime;
pub mod ui;

pub use render::{apply_patch_events, MemoryRenderLibrary, MemoryView};
pub use runtime::{document_ready_patch, ScriptedRuntime};
pub use ui::{RecordingUi, UiEffect};

use inlay_protocol::{CellId, WorkerResponse};
use tokio::sync::mpsc;

/// Initialize a compact tracing subscriber honoring `RUST_LOG`. Safe to
/// call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Drain responses until the terminal message (`idle` or `error`) for
/// `id`, returning everything received along the way, terminal included.
/// Responses for other cells are kept in order too.
pub async fn collect_until_terminal(
    responses: &mut mpsc::UnboundedReceiver<WorkerResponse>,
    id: &CellId,
) -> Vec<WorkerResponse> {
    let mut collected = Vec::new();
    while let Some(response) = responses.recv().await {
        let done = response.is_terminal() && response.id() == id;
        collected.push(response);
        if done {
            break;
        }
    }
    collected
}

/// The subset of `collected` that belongs to `id`, preserving order.
pub fn messages_for<'a>(
    collected: &'a [WorkerResponse],
    id: &CellId,
) -> Vec<&'a WorkerResponse> {
    collected.iter().filter(|m| m.id() == id).collect()
}
