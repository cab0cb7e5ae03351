//! Inlay-Host: Page-Side Cell Orchestration
//!
//! The host half of Inlay runs on the DOM-owning side of the worker
//! boundary. It submits execute requests, turns every worker response
//! into exactly one typed UI effect, and keeps interactive outputs
//! synchronized with their runtime-side documents.
//!
//! # Components
//!
//! - [`render`] — capability traits for the visualization library: it can
//!   instantiate a live view from a serialized payload, report change
//!   events, apply external patches, and re-serialize itself.
//! - [`ui`] — the typed surface of DOM affordances (tooltips, icons,
//!   output regions, std panels).
//! - [`bridge`] — the per-cell document sync bridge with its
//!   unlinked → linked → released state machine and setter-tag echo
//!   suppression.
//! - [`controller`] — the per-page controller owning one worker handle
//!   and the bridge table.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod bridge;
pub mod controller;
pub mod error;
pub mod render;
pub mod ui;

pub use bridge::{BridgeState, SyncBridge};
pub use controller::HostController;
pub use error::HostError;
pub use render::{ChangeEvent, ChangeListener, LiveView, RenderLibrary};
pub use ui::CellUi;
