//! Typed UI effect surface
//!
//! The controller performs exactly one UI effect per response kind; this
//! trait is that surface. Implementations own the actual DOM plumbing
//! (tooltip text, icon swaps, output injection); the testkit records the
//! calls instead.

use inlay_protocol::{CellId, Mime};

/// DOM affordances for one page of cells.
pub trait CellUi: Send + Sync + 'static {
    /// Progress notice: update the cell's status tooltip and busy icon.
    fn show_loading(&self, id: &CellId, msg: &str);

    /// The runtime finished bootstrapping; the cell is now executing.
    fn show_executing(&self, id: &CellId);

    /// The request settled successfully.
    fn show_idle(&self, id: &CellId);

    /// The request failed: show the summary, keep the trace available on
    /// demand.
    fn show_error(&self, id: &CellId, summary: &str, traceback: &str);

    /// Inject a rendered payload into the cell's output region, clearing
    /// any previous output.
    fn render_output(&self, id: &CellId, content: &str, mime: &Mime);

    /// Append captured standard output to the cell's stdout panel.
    fn write_stdout(&self, id: &CellId, text: &str);

    /// Append captured standard error to the cell's stderr panel.
    fn write_stderr(&self, id: &CellId, text: &str);
}
