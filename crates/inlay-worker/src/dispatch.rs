//! Command dispatch
//!
//! Maps each admitted request to the runtime instruction that fulfills it
//! and classifies the result into typed responses. All runtime failures
//! are caught here and translated into a structured `error` response; an
//! `error` is terminal for its request — no trailing `idle`.

use crate::bootstrap::{ensure_runtime, Bootstrap};
use crate::runtime::{Evaluation, GuestRuntime, Instruction, RuntimeError};
use crate::session::WorkerSession;
use crate::worker::ResponseSink;
use inlay_protocol::{traceback_summary, CellId, DocumentPatch, Mime, Setter, WorkerRequest};
use tracing::{debug, error, warn};

/// Turns requests into runtime instructions and classified responses.
///
/// Owns the worker session; the worker loop guarantees `dispatch` runs
/// one request to completion before the next is admitted.
pub struct CommandDispatcher<R> {
    session: WorkerSession<R>,
    sink: ResponseSink,
}

impl<R: GuestRuntime> CommandDispatcher<R> {
    /// Wrap a session and an outbound sink.
    pub fn new(session: WorkerSession<R>, sink: ResponseSink) -> Self {
        Self { session, sink }
    }

    /// Handle one request end to end, emitting every response it implies.
    ///
    /// Always returns — failures become `error` responses — so the queue
    /// settles no matter how execution ended.
    pub async fn dispatch(&mut self, request: WorkerRequest) {
        let id = request.id().clone();

        match ensure_runtime(&mut self.session, &self.sink, &id).await {
            Ok(Bootstrap::Completed) => self.sink.loaded(&id),
            Ok(Bootstrap::AlreadyReady) => {}
            Err(err) => {
                self.fail(&id, err);
                return;
            }
        }

        let result = match request {
            WorkerRequest::Execute { id, code } => self.execute(&id, &code).await,
            WorkerRequest::Rendered { id, mime } => self.link_rendered(&id, &mime).await,
            WorkerRequest::Patch { id, patch } => self.apply_patch(&id, patch).await,
        };

        match result {
            Ok(()) => self.sink.idle(&id),
            Err(err) => self.fail(&id, err),
        }
    }

    /// Execute a cell: optional dependency detection and install, then the
    /// source itself, then classification of the captured output.
    async fn execute(&mut self, id: &CellId, code: &str) -> Result<(), RuntimeError> {
        if self.session.config().detect_dependencies {
            self.install_detected_dependencies(id, code).await;
        }

        let runtime = self.session.runtime();
        let evaluation = runtime
            .execute(Instruction::Run {
                cell: id.clone(),
                source: code.to_string(),
            })
            .await?;

        match evaluation {
            Evaluation::Output(output) => {
                if let Some(rendered) = output.rendered {
                    self.sink.render(id, rendered.content, rendered.mime);
                }
                if !output.stdout.is_empty() {
                    self.sink.stdout(id, output.stdout);
                }
                if !output.stderr.is_empty() {
                    self.sink.stderr(id, output.stderr);
                }
            }
            Evaluation::Unit => {}
            Evaluation::Dependencies(_) => {
                warn!(cell = %id, "run instruction returned a dependency list; ignored");
            }
        }
        Ok(())
    }

    /// Detect importable package names in `code` and install the missing
    /// ones additively. Neither a detection failure nor an individual
    /// install failure aborts the cell.
    async fn install_detected_dependencies(&mut self, id: &CellId, code: &str) {
        let runtime = self.session.runtime();

        let detected = match runtime
            .execute(Instruction::DetectDependencies {
                source: code.to_string(),
            })
            .await
        {
            Ok(Evaluation::Dependencies(packages)) => packages,
            Ok(_) => Vec::new(),
            Err(err) => {
                warn!(cell = %id, "dependency auto-detection failed: {err}");
                Vec::new()
            }
        };

        for package in detected {
            if self.session.is_installed(&package) {
                debug!(cell = %id, package, "dependency already installed");
                continue;
            }
            self.sink.loading(id, format!("Loading {package}"));
            match runtime.install(&package).await {
                Ok(()) => self.session.record_installed(package),
                Err(err) => {
                    warn!(cell = %id, package, "auto-detected dependency could not be installed: {err}");
                }
            }
        }
    }

    /// The host reports a live output view. Interactive documents get a
    /// runtime-side change listener; anything else is a no-op.
    async fn link_rendered(&mut self, id: &CellId, mime: &Mime) -> Result<(), RuntimeError> {
        if !mime.is_interactive() {
            debug!(cell = %id, %mime, "rendered output is not interactive; nothing to link");
            return Ok(());
        }
        let runtime = self.session.runtime();
        runtime
            .execute(Instruction::LinkDocument { cell: id.clone() })
            .await
            .map(|_| ())
    }

    /// Apply a host-produced patch to the cell's live document. The host
    /// setter tag keeps the document's listener from echoing it back.
    async fn apply_patch(&mut self, id: &CellId, patch: DocumentPatch) -> Result<(), RuntimeError> {
        let runtime = self.session.runtime();
        runtime
            .execute(Instruction::ApplyPatch {
                cell: id.clone(),
                patch,
                setter: Setter::Host,
            })
            .await
            .map(|_| ())
    }

    /// Translate a runtime failure into a terminal `error` response.
    fn fail(&self, id: &CellId, err: RuntimeError) {
        let traceback = err.traceback();
        let msg = traceback_summary(&traceback);
        error!(cell = %id, "request failed: {msg}");
        self.sink.error(id, msg, traceback);
    }
}
