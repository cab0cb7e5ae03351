//! In-memory render library
//!
//! A [`MemoryView`] is a flat JSON-object document with real listener and
//! setter-tag semantics: every mutation — local `set` calls and external
//! patch applications alike — fires the registered change listeners, with
//! the event carrying the origin tag of the change. That is exactly the
//! surface the sync bridge's echo suppression depends on, so the bridge
//! is exercised honestly rather than short-circuited.
//!
//! Patch format: a JSON array of event objects;
//! `{"kind": "set", "key": K, "value": V}` events mutate the document,
//! anything else (e.g. `document_ready`) passes through to listeners
//! untouched.

use async_trait::async_trait;
use inlay_host::{ChangeEvent, ChangeListener, HostError, LiveView, RenderLibrary};
use inlay_protocol::{DocumentPatch, Setter};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Parse a patch and apply its `set` events to a document map, returning
/// every parsed event.
pub fn apply_patch_events(
    state: &mut Map<String, Value>,
    patch: &DocumentPatch,
) -> Result<Vec<Value>, serde_json::Error> {
    let events: Vec<Value> = serde_json::from_str(&patch.patch)?;
    for event in &events {
        if event.get("kind").and_then(Value::as_str) == Some("set") {
            if let (Some(key), Some(value)) = (
                event.get("key").and_then(Value::as_str),
                event.get("value"),
            ) {
                state.insert(key.to_string(), value.clone());
            }
        }
    }
    Ok(events)
}

/// A live, in-memory document view.
pub struct MemoryView {
    target: String,
    state: Mutex<Map<String, Value>>,
    listeners: Mutex<Vec<ChangeListener>>,
}

impl MemoryView {
    fn from_payload(content: &str, target: &str) -> Self {
        // Payloads that are JSON objects seed the document directly;
        // anything else lands under "value".
        let state = match serde_json::from_str::<Map<String, Value>>(content) {
            Ok(map) => map,
            Err(_) => {
                let mut map = Map::new();
                map.insert("value".to_string(), Value::String(content.to_string()));
                map
            }
        };
        Self {
            target: target.to_string(),
            state: Mutex::new(state),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// The DOM output region this view is attached to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Mutate the document the way user interaction would: no setter tag,
    /// so the change is forwarded inward by a linked bridge.
    pub fn set(&self, key: &str, value: Value) {
        self.state.lock().insert(key.to_string(), value.clone());
        self.fire(ChangeEvent::local(
            json!({"kind": "set", "key": key, "value": value}),
        ));
    }

    /// Current value under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().get(key).cloned()
    }

    fn fire(&self, event: ChangeEvent) {
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener(event.clone());
        }
    }
}

impl LiveView for MemoryView {
    fn on_change(&self, listener: ChangeListener) {
        self.listeners.lock().push(listener);
    }

    fn serialize_events(&self, events: &[ChangeEvent]) -> Result<DocumentPatch, HostError> {
        let raw: Vec<Value> = events.iter().map(|e| e.event.clone()).collect();
        Ok(DocumentPatch::new(serde_json::to_string(&raw)?))
    }

    fn apply_patch(&self, patch: &DocumentPatch, setter: Option<Setter>) -> Result<(), HostError> {
        let events = {
            let mut state = self.state.lock();
            apply_patch_events(&mut state, patch)?
        };
        for event in events {
            self.fire(match setter {
                Some(setter) => ChangeEvent::external(setter, event),
                None => ChangeEvent::local(event),
            });
        }
        Ok(())
    }

    fn serialize(&self) -> Result<String, HostError> {
        Ok(serde_json::to_string(&*self.state.lock())?)
    }
}

/// Render library producing [`MemoryView`]s and retaining each one for
/// test inspection.
#[derive(Default)]
pub struct MemoryRenderLibrary {
    views: Mutex<HashMap<String, Arc<MemoryView>>>,
}

impl MemoryRenderLibrary {
    /// A fresh library with no views.
    pub fn new() -> Self {
        Self::default()
    }

    /// The view attached to a DOM target, if one was instantiated.
    pub fn view(&self, target: &str) -> Option<Arc<MemoryView>> {
        self.views.lock().get(target).cloned()
    }
}

#[async_trait]
impl RenderLibrary for MemoryRenderLibrary {
    type View = MemoryView;

    async fn instantiate(&self, content: &str, target: &str) -> Result<Arc<MemoryView>, HostError> {
        let view = Arc::new(MemoryView::from_payload(content, target));
        self.views
            .lock()
            .insert(target.to_string(), Arc::clone(&view));
        Ok(view)
    }
}
