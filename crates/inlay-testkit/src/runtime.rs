//! Scripted guest runtime
//!
//! A table-driven [`GuestRuntime`] double. Tests script per-source
//! outcomes (rendered payloads, failures with tracebacks, dependency
//! lists), mark packages as uninstallable, break initialization, or add
//! an execution delay to hold the queue open. `mutate` plays the role of
//! guest application logic touching a linked document: it updates the
//! runtime-side document state and pushes a patch through the bound
//! deliver-patch callback — but only for documents a `LinkDocument`
//! instruction actually linked, mirroring the listener the real runtime
//! would install.

use crate::render::apply_patch_events;
use async_trait::async_trait;
use inlay_protocol::{CellId, DocumentPatch, Setter};
use inlay_worker::{
    CellOutput, Evaluation, GuestRuntime, HostCallbacks, Instruction, RenderPayload, RuntimeError,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

/// The patch the runtime delivers when a document is first linked.
pub fn document_ready_patch() -> DocumentPatch {
    DocumentPatch::new(r#"[{"kind":"document_ready"}]"#)
}

enum ScriptedOutcome {
    Output(CellOutput),
    Failure { traceback: String },
}

#[derive(Default)]
struct Inner {
    callbacks: Option<HostCallbacks>,
    outcomes: HashMap<String, ScriptedOutcome>,
    dependencies: HashMap<String, Vec<String>>,
    failing_installs: HashSet<String>,
    init_failure: Option<String>,
    execution_delay: Option<Duration>,

    initialize_calls: usize,
    install_calls: Vec<String>,
    executed_sources: Vec<String>,
    linked: HashSet<CellId>,
    documents: HashMap<CellId, Map<String, Value>>,
    inbound_patches: HashMap<CellId, Vec<(Setter, DocumentPatch)>>,
}

/// Table-driven [`GuestRuntime`] implementation.
#[derive(Default)]
pub struct ScriptedRuntime {
    inner: Mutex<Inner>,
}

impl ScriptedRuntime {
    /// A runtime with an empty script: every source runs successfully and
    /// produces no output.
    pub fn new() -> Self {
        Self::default()
    }

    // --- scripting -------------------------------------------------------

    /// Script a full output for a source text.
    pub fn script_output(&self, source: impl Into<String>, output: CellOutput) {
        self.inner
            .lock()
            .outcomes
            .insert(source.into(), ScriptedOutcome::Output(output));
    }

    /// Script a rendered payload for a source text.
    pub fn script_render(
        &self,
        source: impl Into<String>,
        content: impl Into<String>,
        mime: inlay_protocol::Mime,
    ) {
        self.script_output(
            source,
            CellOutput {
                rendered: Some(RenderPayload::new(content, mime)),
                ..CellOutput::default()
            },
        );
    }

    /// Script a guest-language failure for a source text.
    pub fn script_failure(&self, source: impl Into<String>, traceback: impl Into<String>) {
        self.inner.lock().outcomes.insert(
            source.into(),
            ScriptedOutcome::Failure {
                traceback: traceback.into(),
            },
        );
    }

    /// Script the dependency list detected in a source text.
    pub fn script_dependencies(&self, source: impl Into<String>, packages: Vec<String>) {
        self.inner.lock().dependencies.insert(source.into(), packages);
    }

    /// Make installs of `package` fail.
    pub fn fail_install(&self, package: impl Into<String>) {
        self.inner.lock().failing_installs.insert(package.into());
    }

    /// Make initialization fail with `reason`.
    pub fn fail_initialization(&self, reason: impl Into<String>) {
        self.inner.lock().init_failure = Some(reason.into());
    }

    /// Delay every `Run` instruction, holding the queue open.
    pub fn set_execution_delay(&self, delay: Duration) {
        self.inner.lock().execution_delay = Some(delay);
    }

    // --- runtime-side application logic ----------------------------------

    /// Mutate a document from the guest side. Updates the runtime-side
    /// state and, when the document is linked, delivers a patch through
    /// the bound callback — the scripted analog of the change listener a
    /// `LinkDocument` instruction installs.
    pub fn mutate(&self, cell: &CellId, key: &str, value: Value) {
        let callbacks = {
            let mut inner = self.inner.lock();
            inner
                .documents
                .entry(cell.clone())
                .or_default()
                .insert(key.to_string(), value.clone());
            if inner.linked.contains(cell) {
                inner.callbacks.clone()
            } else {
                None
            }
        };
        let Some(callbacks) = callbacks else {
            debug!(cell = %cell, "document not linked; mutation stays runtime-side");
            return;
        };
        let patch = DocumentPatch::new(
            json!([{"kind": "set", "key": key, "value": value}]).to_string(),
        );
        callbacks.deliver_patch(cell, patch);
    }

    // --- inspection -------------------------------------------------------

    /// How many times `initialize` ran.
    pub fn initialize_calls(&self) -> usize {
        self.inner.lock().initialize_calls
    }

    /// Every `install` call, in order, including failed ones.
    pub fn install_calls(&self) -> Vec<String> {
        self.inner.lock().install_calls.clone()
    }

    /// Every executed source, in order (setup and run instructions).
    pub fn executed_sources(&self) -> Vec<String> {
        self.inner.lock().executed_sources.clone()
    }

    /// Whether a `LinkDocument` instruction linked this cell.
    pub fn is_linked(&self, cell: &CellId) -> bool {
        self.inner.lock().linked.contains(cell)
    }

    /// The runtime-side document state for a cell.
    pub fn document(&self, cell: &CellId) -> Option<Map<String, Value>> {
        self.inner.lock().documents.get(cell).cloned()
    }

    /// Patches applied inward to a cell's document, in order, each with
    /// the origin tag the application carried.
    pub fn inbound_patches(&self, cell: &CellId) -> Vec<(Setter, DocumentPatch)> {
        self.inner
            .lock()
            .inbound_patches
            .get(cell)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl GuestRuntime for ScriptedRuntime {
    async fn initialize(&self) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        inner.initialize_calls += 1;
        match &inner.init_failure {
            Some(reason) => Err(RuntimeError::Initialization {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn bind_callbacks(&self, callbacks: HostCallbacks) {
        self.inner.lock().callbacks = Some(callbacks);
    }

    async fn install(&self, package: &str) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        inner.install_calls.push(package.to_string());
        if inner.failing_installs.contains(package) {
            return Err(RuntimeError::Install {
                package: package.to_string(),
                reason: "no matching distribution".into(),
            });
        }
        Ok(())
    }

    async fn execute(&self, instruction: Instruction) -> Result<Evaluation, RuntimeError> {
        match instruction {
            Instruction::Run { cell, source } => {
                let delay = self.inner.lock().execution_delay;
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }

                let mut inner = self.inner.lock();
                inner.executed_sources.push(source.clone());
                match inner.outcomes.get(&source) {
                    Some(ScriptedOutcome::Failure { traceback }) => {
                        let traceback = traceback.clone();
                        Err(RuntimeError::Execution { traceback })
                    }
                    Some(ScriptedOutcome::Output(output)) => {
                        let output = output.clone();
                        // An interactive payload leaves a live document
                        // behind, cached under the cell. Re-running the
                        // cell overwrites it; any previous link is stale.
                        if let Some(rendered) = &output.rendered {
                            if rendered.mime.is_interactive() {
                                let state = serde_json::from_str::<Map<String, Value>>(
                                    &rendered.content,
                                )
                                .unwrap_or_else(|_| {
                                    let mut map = Map::new();
                                    map.insert(
                                        "value".to_string(),
                                        Value::String(rendered.content.clone()),
                                    );
                                    map
                                });
                                inner.documents.insert(cell.clone(), state);
                                inner.linked.remove(&cell);
                            }
                        }
                        Ok(Evaluation::Output(output))
                    }
                    None => Ok(Evaluation::Output(CellOutput::default())),
                }
            }
            Instruction::Setup { source } => {
                self.inner.lock().executed_sources.push(source);
                Ok(Evaluation::Unit)
            }
            Instruction::DetectDependencies { source } => {
                let packages = self
                    .inner
                    .lock()
                    .dependencies
                    .get(&source)
                    .cloned()
                    .unwrap_or_default();
                Ok(Evaluation::Dependencies(packages))
            }
            Instruction::LinkDocument { cell } => {
                let callbacks = {
                    let mut inner = self.inner.lock();
                    inner.linked.insert(cell.clone());
                    inner.callbacks.clone()
                };
                // The link instruction fires the document-ready lifecycle
                // event through the freshly installed listener.
                if let Some(callbacks) = callbacks {
                    callbacks.deliver_patch(&cell, document_ready_patch());
                }
                Ok(Evaluation::Unit)
            }
            Instruction::ApplyPatch {
                cell,
                patch,
                setter,
            } => {
                let mut inner = self.inner.lock();
                let state = inner.documents.entry(cell.clone()).or_default();
                apply_patch_events(state, &patch).map_err(|err| RuntimeError::Execution {
                    traceback: format!("invalid patch: {err}"),
                })?;
                inner
                    .inbound_patches
                    .entry(cell)
                    .or_default()
                    .push((setter, patch));
                Ok(Evaluation::Unit)
            }
        }
    }
}
