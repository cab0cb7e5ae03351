//! Inlay-Protocol: Host/Worker Message Vocabulary
//!
//! This crate defines the complete wire vocabulary spoken between a
//! documentation page (the host thread) and the background worker that
//! embeds the guest-language runtime. Both halves of Inlay depend on it;
//! nothing here performs I/O.
//!
//! # Message Model
//!
//! - [`WorkerRequest`] — the three inbound request kinds (execute a cell,
//!   report a rendered output view, forward a document patch).
//! - [`WorkerResponse`] — the seven outbound response kinds (lifecycle
//!   progress, rendered payloads, captured std streams, patches, idle,
//!   error).
//! - [`DocumentPatch`] / [`Setter`] — patch payloads for live-document
//!   synchronization, tagged with the side that produced them so neither
//!   side ever re-applies its own change.
//!
//! Both enums are closed tagged variants serialized with a `type` field,
//! so exhaustive matching replaces any runtime "unknown kind" fallback.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod message;
pub mod mime;
pub mod patch;
pub mod trace;

pub use cell::CellId;
pub use message::{WorkerRequest, WorkerResponse};
pub use mime::Mime;
pub use patch::{BufferMap, DocumentPatch, Setter};
pub use trace::traceback_summary;
