//! Guest-runtime capability trait and instruction vocabulary
//!
//! The embedded runtime is a black box to the orchestration layer: it can
//! be initialized once, install packages, and execute instructions. The
//! dispatcher never hands it raw request messages — it builds one of the
//! closed [`Instruction`] variants and classifies the returned
//! [`Evaluation`].
//!
//! The runtime can also push output back to the host spontaneously (a
//! linked document mutating from guest application logic). Those pushes
//! go through [`HostCallbacks`], a fixed, typed set of three callbacks
//! bound once at bootstrap — the capability-interface replacement for the
//! ad hoc globals the runtime would otherwise reach for.

use crate::worker::ResponseSink;
use async_trait::async_trait;
use inlay_protocol::{CellId, DocumentPatch, Mime, Setter, WorkerResponse};
use thiserror::Error;

/// Errors raised by the embedded runtime.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// Runtime instantiation failed. Fatal for the worker session.
    #[error("runtime initialization failed: {reason}")]
    Initialization {
        /// What went wrong during instantiation.
        reason: String,
    },

    /// A package install failed.
    #[error("install of '{package}' failed: {reason}")]
    Install {
        /// The package that could not be installed.
        package: String,
        /// The runtime's failure description.
        reason: String,
    },

    /// Executing an instruction raised inside the guest language.
    #[error("guest execution failed")]
    Execution {
        /// Full formatted guest-language trace.
        traceback: String,
    },
}

impl RuntimeError {
    /// The full trace text carried to the host in an `error` response.
    pub fn traceback(&self) -> String {
        match self {
            Self::Initialization { reason } => reason.clone(),
            Self::Install { package, reason } => {
                format!("install of '{package}' failed: {reason}")
            }
            Self::Execution { traceback } => traceback.clone(),
        }
    }
}

/// One runtime-executable unit of work built by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Run a cell's source text, capturing rendered output and std streams.
    Run {
        /// The cell the source belongs to; the runtime caches any live
        /// document it produces under this cell's output target.
        cell: CellId,
        /// Guest-language source text.
        source: String,
    },
    /// Run session setup source during bootstrap. No classified output.
    Setup {
        /// Guest-language setup source.
        source: String,
    },
    /// Scan source text for importable package names.
    DetectDependencies {
        /// Guest-language source text to scan.
        source: String,
    },
    /// Install a change listener on the cell's live document that forwards
    /// future runtime-side mutations outward, and fire the document-ready
    /// lifecycle event.
    LinkDocument {
        /// The cell whose document should be linked.
        cell: CellId,
    },
    /// Apply an inbound patch to the cell's live document, tagged with the
    /// originating side so the document's listener does not re-emit it.
    ApplyPatch {
        /// The cell whose document receives the patch.
        cell: CellId,
        /// The patch and its binary buffers.
        patch: DocumentPatch,
        /// Origin of the patch. Always [`Setter::Host`] for patches that
        /// crossed the boundary inward.
        setter: Setter,
    },
}

/// What an instruction evaluated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// A cell ran to completion: rendered payload plus captured streams.
    Output(CellOutput),
    /// Package names detected in source text.
    Dependencies(Vec<String>),
    /// The instruction produced nothing to classify.
    Unit,
}

/// Captured output of one cell execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellOutput {
    /// Rendered payload, when the cell's value rendered to one.
    pub rendered: Option<RenderPayload>,
    /// Captured standard-output text.
    pub stdout: String,
    /// Captured standard-error text.
    pub stderr: String,
}

/// A rendered `content` + `mime` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPayload {
    /// Serialized render payload.
    pub content: String,
    /// MIME classification of the payload.
    pub mime: Mime,
}

impl RenderPayload {
    /// Convenience constructor.
    pub fn new(content: impl Into<String>, mime: Mime) -> Self {
        Self {
            content: content.into(),
            mime,
        }
    }
}

/// The three host callbacks bound into the runtime at bootstrap.
///
/// Guest-side code only ever calls these fixed entry points; each one
/// forwards a typed response onto the worker's outbound channel.
#[derive(Clone)]
pub struct HostCallbacks {
    sink: ResponseSink,
}

impl HostCallbacks {
    /// Bind callbacks over the worker's outbound sink.
    pub fn new(sink: ResponseSink) -> Self {
        Self { sink }
    }

    /// Push a runtime-produced document patch to the host.
    pub fn deliver_patch(&self, cell: &CellId, patch: DocumentPatch) {
        self.sink.send(WorkerResponse::Patch {
            id: cell.clone(),
            patch,
        });
    }

    /// Push captured standard-output text to the host.
    pub fn deliver_stdout(&self, cell: &CellId, content: impl Into<String>) {
        self.sink.send(WorkerResponse::Stdout {
            id: cell.clone(),
            content: content.into(),
        });
    }

    /// Push captured standard-error text to the host.
    pub fn deliver_stderr(&self, cell: &CellId, content: impl Into<String>) {
        self.sink.send(WorkerResponse::Stderr {
            id: cell.clone(),
            content: content.into(),
        });
    }
}

/// Capability trait the embedded runtime is consumed through.
///
/// Implementations wrap the actual in-browser runtime; the testkit ships
/// a scripted double. The worker guarantees `execute` is never called
/// concurrently — the runtime is single-threaded and not reentrant.
#[async_trait]
pub trait GuestRuntime: Send + Sync + 'static {
    /// Instantiate the runtime. Called exactly once per worker session.
    async fn initialize(&self) -> Result<(), RuntimeError>;

    /// Bind the three host callbacks. Called once, right after
    /// `initialize` succeeds.
    fn bind_callbacks(&self, callbacks: HostCallbacks);

    /// Install a package into the runtime environment.
    async fn install(&self, package: &str) -> Result<(), RuntimeError>;

    /// Execute one instruction to completion.
    async fn execute(&self, instruction: Instruction) -> Result<Evaluation, RuntimeError>;
}
