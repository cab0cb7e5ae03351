//! Recording UI surface

use inlay_host::CellUi;
use inlay_protocol::{CellId, Mime};
use parking_lot::Mutex;

/// One recorded UI effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Status tooltip updated with progress text.
    Loading {
        /// Cell concerned.
        id: CellId,
        /// Progress text shown.
        msg: String,
    },
    /// Bootstrap finished; cell shown as executing.
    Executing {
        /// Cell concerned.
        id: CellId,
    },
    /// Cell shown as successfully executed.
    Idle {
        /// Cell concerned.
        id: CellId,
    },
    /// Error summary shown.
    Error {
        /// Cell concerned.
        id: CellId,
        /// Short summary shown in the status affordance.
        summary: String,
    },
    /// Rendered payload injected into the output region.
    Render {
        /// Cell concerned.
        id: CellId,
        /// MIME classification of the payload.
        mime: Mime,
    },
    /// Stdout panel populated.
    Stdout {
        /// Cell concerned.
        id: CellId,
        /// Appended text.
        text: String,
    },
    /// Stderr panel populated.
    Stderr {
        /// Cell concerned.
        id: CellId,
        /// Appended text.
        text: String,
    },
}

impl UiEffect {
    /// The cell this effect concerns.
    pub fn id(&self) -> &CellId {
        match self {
            Self::Loading { id, .. }
            | Self::Executing { id }
            | Self::Idle { id }
            | Self::Error { id, .. }
            | Self::Render { id, .. }
            | Self::Stdout { id, .. }
            | Self::Stderr { id, .. } => id,
        }
    }
}

/// [`CellUi`] implementation that records every effect in order.
#[derive(Default)]
pub struct RecordingUi {
    effects: Mutex<Vec<UiEffect>>,
}

impl RecordingUi {
    /// A fresh recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded effect, in order.
    pub fn effects(&self) -> Vec<UiEffect> {
        self.effects.lock().clone()
    }

    /// Recorded effects for one cell, in order.
    pub fn effects_for(&self, id: &CellId) -> Vec<UiEffect> {
        self.effects
            .lock()
            .iter()
            .filter(|e| e.id() == id)
            .cloned()
            .collect()
    }

    fn record(&self, effect: UiEffect) {
        self.effects.lock().push(effect);
    }
}

impl CellUi for RecordingUi {
    fn show_loading(&self, id: &CellId, msg: &str) {
        self.record(UiEffect::Loading {
            id: id.clone(),
            msg: msg.to_string(),
        });
    }

    fn show_executing(&self, id: &CellId) {
        self.record(UiEffect::Executing { id: id.clone() });
    }

    fn show_idle(&self, id: &CellId) {
        self.record(UiEffect::Idle { id: id.clone() });
    }

    fn show_error(&self, id: &CellId, summary: &str, _traceback: &str) {
        self.record(UiEffect::Error {
            id: id.clone(),
            summary: summary.to_string(),
        });
    }

    fn render_output(&self, id: &CellId, _content: &str, mime: &Mime) {
        self.record(UiEffect::Render {
            id: id.clone(),
            mime: mime.clone(),
        });
    }

    fn write_stdout(&self, id: &CellId, text: &str) {
        self.record(UiEffect::Stdout {
            id: id.clone(),
            text: text.to_string(),
        });
    }

    fn write_stderr(&self, id: &CellId, text: &str) {
        self.record(UiEffect::Stderr {
            id: id.clone(),
            text: text.to_string(),
        });
    }
}
