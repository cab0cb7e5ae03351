//! The worker task
//!
//! [`CellWorker::spawn`] wires a runtime, a session, a dispatcher, and an
//! execution queue into one tokio task joined to the host by two
//! unbounded channels — the in-process analog of a Web Worker's
//! `postMessage` boundary.
//!
//! The loop runs one dispatch to completion at a time while continuing to
//! drain arrivals into the queue, so a request that lands behind an
//! in-flight one gets its "awaiting" notice at arrival time, not when it
//! is finally admitted.

use crate::dispatch::CommandDispatcher;
use crate::queue::ExecutionQueue;
use crate::runtime::GuestRuntime;
use crate::session::{WorkerConfig, WorkerSession};
use inlay_protocol::{CellId, Mime, WorkerRequest, WorkerResponse};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Progress text sent to a request that arrived behind an in-flight one.
pub const AWAITING_PREVIOUS: &str = "Awaiting previous cells";

/// Errors raised on the host side of the worker boundary.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker task is gone; its inbound channel is closed.
    #[error("worker is no longer running")]
    Disconnected,

    /// An inbound message could not be decoded.
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Cloneable sender for worker → host responses.
#[derive(Clone)]
pub struct ResponseSink {
    tx: mpsc::UnboundedSender<WorkerResponse>,
}

impl ResponseSink {
    /// Wrap the outbound channel.
    pub fn new(tx: mpsc::UnboundedSender<WorkerResponse>) -> Self {
        Self { tx }
    }

    /// Send a response; if the host side is gone the response is dropped.
    pub fn send(&self, response: WorkerResponse) {
        if self.tx.send(response).is_err() {
            debug!("host side closed; dropping response");
        }
    }

    /// `loading` progress notice.
    pub fn loading(&self, id: &CellId, msg: impl Into<String>) {
        self.send(WorkerResponse::Loading {
            id: id.clone(),
            msg: msg.into(),
        });
    }

    /// `loaded` bootstrap-complete notice.
    pub fn loaded(&self, id: &CellId) {
        self.send(WorkerResponse::Loaded { id: id.clone() });
    }

    /// `render` payload.
    pub fn render(&self, id: &CellId, content: impl Into<String>, mime: Mime) {
        self.send(WorkerResponse::Render {
            id: id.clone(),
            content: content.into(),
            mime,
        });
    }

    /// Captured standard output.
    pub fn stdout(&self, id: &CellId, content: impl Into<String>) {
        self.send(WorkerResponse::Stdout {
            id: id.clone(),
            content: content.into(),
        });
    }

    /// Captured standard error.
    pub fn stderr(&self, id: &CellId, content: impl Into<String>) {
        self.send(WorkerResponse::Stderr {
            id: id.clone(),
            content: content.into(),
        });
    }

    /// Success terminal.
    pub fn idle(&self, id: &CellId) {
        self.send(WorkerResponse::Idle { id: id.clone() });
    }

    /// Failure terminal.
    pub fn error(&self, id: &CellId, msg: impl Into<String>, traceback: impl Into<String>) {
        self.send(WorkerResponse::Error {
            id: id.clone(),
            msg: msg.into(),
            traceback: traceback.into(),
        });
    }
}

/// Host-side handle to a spawned worker.
///
/// Dropping the handle closes the inbound channel; the worker finishes
/// whatever is queued and exits.
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<WorkerRequest>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Submit a typed request.
    pub fn submit(&self, request: WorkerRequest) -> Result<(), WorkerError> {
        self.tx.send(request).map_err(|_| WorkerError::Disconnected)
    }

    /// Decode and submit a JSON request. Malformed input is logged and
    /// skipped — the queue is unaffected.
    pub fn post_json(&self, json: &str) -> Result<(), WorkerError> {
        let request: WorkerRequest = match serde_json::from_str(json) {
            Ok(request) => request,
            Err(err) => {
                warn!("dropping malformed request: {err}");
                return Err(err.into());
            }
        };
        self.submit(request)
    }

    /// A clone of the request sender, for callers that manage their own
    /// channel plumbing.
    pub fn sender(&self) -> mpsc::UnboundedSender<WorkerRequest> {
        self.tx.clone()
    }

    /// Close the inbound channel and wait for the worker to drain.
    pub async fn shutdown(self) {
        drop(self.tx);
        if self.task.await.is_err() {
            warn!("worker task ended abnormally");
        }
    }
}

/// The worker task: one queue, one session, one runtime.
pub struct CellWorker<R: GuestRuntime> {
    inbound: mpsc::UnboundedReceiver<WorkerRequest>,
    sink: ResponseSink,
    dispatcher: CommandDispatcher<R>,
    queue: ExecutionQueue,
}

impl<R: GuestRuntime> CellWorker<R> {
    /// Spawn a worker around `runtime` and hand back the request handle
    /// plus the response stream.
    pub fn spawn(
        runtime: Arc<R>,
        config: WorkerConfig,
    ) -> (WorkerHandle, mpsc::UnboundedReceiver<WorkerResponse>) {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();

        let sink = ResponseSink::new(resp_tx);
        let session = WorkerSession::new(runtime, config);
        info!(session = %session.id(), "spawning cell worker");

        let worker = Self {
            inbound: req_rx,
            sink: sink.clone(),
            dispatcher: CommandDispatcher::new(session, sink),
            queue: ExecutionQueue::new(),
        };
        let task = tokio::spawn(worker.run());

        (WorkerHandle { tx: req_tx, task }, resp_rx)
    }

    async fn run(self) {
        let Self {
            mut inbound,
            sink,
            mut dispatcher,
            mut queue,
        } = self;
        let mut closed = false;

        loop {
            let request = match queue.admit() {
                Some(request) => request,
                None if closed => break,
                None => match inbound.recv().await {
                    Some(request) => {
                        queue.push(request);
                        continue;
                    }
                    None => break,
                },
            };

            debug!(cell = %request.id(), "request admitted");
            {
                let dispatch = dispatcher.dispatch(request);
                tokio::pin!(dispatch);
                loop {
                    tokio::select! {
                        biased;
                        () = &mut dispatch => break,
                        arrival = inbound.recv(), if !closed => match arrival {
                            Some(request) => {
                                // Notify at arrival time, then hold the
                                // request behind the in-flight one.
                                sink.loading(request.id(), AWAITING_PREVIOUS);
                                queue.push(request);
                            }
                            None => closed = true,
                        },
                    }
                }
            }
            queue.settle();
        }
        debug!("worker loop exited");
    }
}
