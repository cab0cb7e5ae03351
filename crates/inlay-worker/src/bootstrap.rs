//! Idempotent runtime bootstrap
//!
//! The first admitted request pays the bootstrap cost: instantiate the
//! runtime, bind the host callbacks, run the optional setup source, then
//! install the base package list sequentially with a `loading` notice per
//! package. Later requests find the session ready and return immediately.
//!
//! Failure anywhere in this sequence is fatal for the session — there is
//! no retry; the session is poisoned and every subsequent request
//! surfaces the same error until a fresh worker is spawned.

use crate::runtime::{Evaluation, GuestRuntime, HostCallbacks, Instruction, RuntimeError};
use crate::session::{SessionState, WorkerSession};
use crate::worker::ResponseSink;
use inlay_protocol::CellId;
use tracing::{debug, info, warn};

/// Outcome of [`ensure_runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// The session was already bootstrapped.
    AlreadyReady,
    /// Bootstrap ran to completion on this call.
    Completed,
}

/// Make sure the session's runtime is usable, bootstrapping it on the
/// first call. Progress is reported against `cell` — the request that
/// happened to arrive first.
pub async fn ensure_runtime<R: GuestRuntime>(
    session: &mut WorkerSession<R>,
    sink: &ResponseSink,
    cell: &CellId,
) -> Result<Bootstrap, RuntimeError> {
    match session.state() {
        SessionState::Ready => return Ok(Bootstrap::AlreadyReady),
        SessionState::Poisoned(error) => return Err(error.clone()),
        SessionState::Cold => {}
    }

    match bootstrap(session, sink, cell).await {
        Ok(()) => {
            session.mark_ready();
            info!(session = %session.id(), "runtime bootstrapped");
            Ok(Bootstrap::Completed)
        }
        Err(error) => {
            warn!(session = %session.id(), "bootstrap failed, poisoning session: {error}");
            session.poison(error.clone());
            Err(error)
        }
    }
}

async fn bootstrap<R: GuestRuntime>(
    session: &mut WorkerSession<R>,
    sink: &ResponseSink,
    cell: &CellId,
) -> Result<(), RuntimeError> {
    let runtime = session.runtime();

    sink.loading(cell, "Loading runtime");
    runtime.initialize().await?;
    runtime.bind_callbacks(HostCallbacks::new(sink.clone()));

    if let Some(source) = session.config().setup_source.clone() {
        debug!("running session setup source");
        let evaluation = runtime.execute(Instruction::Setup { source }).await?;
        if !matches!(evaluation, Evaluation::Unit) {
            debug!("setup source produced output; ignored");
        }
    }

    for package in session.config().base_packages.clone() {
        sink.loading(cell, format!("Loading {package}"));
        runtime.install(&package).await?;
        session.record_installed(package);
    }

    Ok(())
}
