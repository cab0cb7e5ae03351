//! Inlay-Worker: Worker-Side Cell Orchestration
//!
//! This crate is the worker half of Inlay: it owns the embedded
//! guest-language runtime and turns inbound [`WorkerRequest`]s into
//! classified [`WorkerResponse`] streams. It talks to the page host
//! exclusively over channels — the in-process analog of a Web Worker's
//! `postMessage` boundary.
//!
//! # Components
//!
//! - [`runtime`] — the [`GuestRuntime`](runtime::GuestRuntime) capability
//!   trait the embedded runtime is consumed through, plus the closed
//!   [`Instruction`](runtime::Instruction) / [`Evaluation`](runtime::Evaluation)
//!   vocabulary.
//! - [`session`] — per-worker mutable state: the init-once runtime handle
//!   and the additive installed-package set.
//! - [`bootstrap`] — idempotent runtime bootstrap with per-package
//!   progress reporting; failure poisons the session permanently.
//! - [`queue`] — explicit FIFO admission with an observable in-flight
//!   slot; requests execute strictly in arrival order, one at a time.
//! - [`dispatch`] — maps each request kind to its runtime instruction and
//!   classifies the result into typed responses.
//! - [`worker`] — the spawned task tying the pieces together behind a
//!   [`WorkerHandle`](worker::WorkerHandle).
//!
//! [`WorkerRequest`]: inlay_protocol::WorkerRequest
//! [`WorkerResponse`]: inlay_protocol::WorkerResponse

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod dispatch;
pub mod queue;
pub mod runtime;
pub mod session;
pub mod worker;

pub use dispatch::CommandDispatcher;
pub use queue::ExecutionQueue;
pub use runtime::{
    CellOutput, Evaluation, GuestRuntime, HostCallbacks, Instruction, RenderPayload, RuntimeError,
};
pub use session::{SessionState, WorkerConfig, WorkerSession};
pub use worker::{CellWorker, ResponseSink, WorkerError, WorkerHandle, AWAITING_PREVIOUS};
