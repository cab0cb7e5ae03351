//! Controller and sync-bridge tests against synthetic worker responses
//!
//! These tests drive `HostController::handle` directly with hand-built
//! responses; no worker task is involved. The testkit render library and
//! recording UI observe the effects.

use async_trait::async_trait;
use inlay_host::{BridgeState, HostController, HostError, LiveView, RenderLibrary};
use inlay_protocol::{CellId, DocumentPatch, Mime, Setter, WorkerRequest, WorkerResponse};
use inlay_testkit::{MemoryRenderLibrary, MemoryView, RecordingUi, UiEffect};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

type Controller = HostController<MemoryRenderLibrary, RecordingUi>;

fn setup() -> (
    Controller,
    Arc<MemoryRenderLibrary>,
    Arc<RecordingUi>,
    mpsc::UnboundedReceiver<WorkerRequest>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let library = Arc::new(MemoryRenderLibrary::new());
    let ui = Arc::new(RecordingUi::new());
    let controller = HostController::new(tx, Arc::clone(&library), Arc::clone(&ui));
    (controller, library, ui, rx)
}

fn c1() -> CellId {
    "c1".into()
}

#[tokio::test]
async fn each_response_kind_maps_to_one_ui_effect() {
    let (mut controller, _library, ui, _rx) = setup();

    let responses = [
        WorkerResponse::Loading {
            id: c1(),
            msg: "Loading numpy".into(),
        },
        WorkerResponse::Loaded { id: c1() },
        WorkerResponse::Stdout {
            id: c1(),
            content: "out".into(),
        },
        WorkerResponse::Stderr {
            id: c1(),
            content: "err".into(),
        },
        WorkerResponse::Render {
            id: c1(),
            content: "2".into(),
            mime: Mime::text(),
        },
        WorkerResponse::Idle { id: c1() },
        WorkerResponse::Error {
            id: c1(),
            msg: "ValueError: x".into(),
            traceback: "...\nValueError: x".into(),
        },
    ];
    for response in responses {
        controller.handle(response).await.unwrap();
    }

    let expected = [
        UiEffect::Loading {
            id: c1(),
            msg: "Loading numpy".into(),
        },
        UiEffect::Executing { id: c1() },
        UiEffect::Stdout {
            id: c1(),
            text: "out".into(),
        },
        UiEffect::Stderr {
            id: c1(),
            text: "err".into(),
        },
        UiEffect::Render {
            id: c1(),
            mime: Mime::text(),
        },
        UiEffect::Idle { id: c1() },
        UiEffect::Error {
            id: c1(),
            summary: "ValueError: x".into(),
        },
    ];
    assert_eq!(ui.effects(), expected);
}

#[tokio::test]
async fn run_enqueues_an_execute_request() {
    let (controller, _library, _ui, mut rx) = setup();
    controller.run(c1(), "1+1").unwrap();
    assert_eq!(
        rx.recv().await.unwrap(),
        WorkerRequest::Execute {
            id: c1(),
            code: "1+1".into(),
        }
    );
}

#[tokio::test]
async fn interactive_render_links_a_bridge_and_notifies_the_worker() {
    let (mut controller, library, _ui, mut rx) = setup();

    controller
        .handle(WorkerResponse::Render {
            id: c1(),
            content: r#"{"hue":"blue"}"#.into(),
            mime: Mime::interactive(),
        })
        .await
        .unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        WorkerRequest::Rendered {
            id: c1(),
            mime: Mime::interactive(),
        }
    );
    let view = library.view("output-c1").expect("view instantiated");
    assert_eq!(view.get("hue"), Some(json!("blue")));
    assert_eq!(
        controller.bridge(&c1()).unwrap().state(),
        BridgeState::Linked
    );
}

#[tokio::test]
async fn inert_render_does_not_link() {
    let (mut controller, library, _ui, mut rx) = setup();

    controller
        .handle(WorkerResponse::Render {
            id: c1(),
            content: "2".into(),
            mime: Mime::text(),
        })
        .await
        .unwrap();

    assert!(library.view("output-c1").is_none());
    assert!(controller.bridge(&c1()).is_none());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn worker_patch_applies_to_the_view_without_echoing() {
    let (mut controller, library, _ui, mut rx) = setup();
    controller
        .handle(WorkerResponse::Render {
            id: c1(),
            content: r#"{"hue":"blue"}"#.into(),
            mime: Mime::interactive(),
        })
        .await
        .unwrap();
    let _rendered = rx.recv().await.unwrap();

    controller
        .handle(WorkerResponse::Patch {
            id: c1(),
            patch: DocumentPatch::new(r#"[{"kind":"set","key":"hue","value":"red"}]"#),
        })
        .await
        .unwrap();

    let view = library.view("output-c1").unwrap();
    assert_eq!(view.get("hue"), Some(json!("red")));
    // The change listener saw a runtime-tagged event and must not have
    // forwarded it back inward.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn local_view_mutation_is_forwarded_inward() {
    let (mut controller, library, _ui, mut rx) = setup();
    controller
        .handle(WorkerResponse::Render {
            id: c1(),
            content: r#"{"hue":"blue"}"#.into(),
            mime: Mime::interactive(),
        })
        .await
        .unwrap();
    let _rendered = rx.recv().await.unwrap();

    let view = library.view("output-c1").unwrap();
    view.set("width", json!(300));

    match rx.recv().await.unwrap() {
        WorkerRequest::Patch { id, patch } => {
            assert_eq!(id, c1());
            assert!(patch.patch.contains("width"));
        }
        other => panic!("expected patch request, got {other:?}"),
    }
}

#[tokio::test]
async fn externally_tagged_view_events_are_suppressed() {
    let (mut controller, library, _ui, mut rx) = setup();
    controller
        .handle(WorkerResponse::Render {
            id: c1(),
            content: "{}".into(),
            mime: Mime::interactive(),
        })
        .await
        .unwrap();
    let _rendered = rx.recv().await.unwrap();

    let view = library.view("output-c1").unwrap();
    view.apply_patch(
        &DocumentPatch::new(r#"[{"kind":"set","key":"hue","value":"red"}]"#),
        Some(Setter::Runtime),
    )
    .unwrap();

    assert_eq!(view.get("hue"), Some(json!("red")));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn re_render_replaces_the_previous_bridge() {
    let (mut controller, library, _ui, mut rx) = setup();

    for content in [r#"{"rev":1}"#, r#"{"rev":2}"#] {
        controller
            .handle(WorkerResponse::Render {
                id: c1(),
                content: content.into(),
                mime: Mime::interactive(),
            })
            .await
            .unwrap();
        let _rendered = rx.recv().await.unwrap();
    }

    let view = library.view("output-c1").unwrap();
    assert_eq!(view.get("rev"), Some(json!(2)));
    assert_eq!(
        controller.bridge(&c1()).unwrap().state(),
        BridgeState::Linked
    );
}

struct FailingLibrary;

#[async_trait]
impl RenderLibrary for FailingLibrary {
    type View = MemoryView;

    async fn instantiate(
        &self,
        _content: &str,
        _target: &str,
    ) -> Result<Arc<MemoryView>, HostError> {
        Err(HostError::library("renderer unavailable"))
    }
}

#[tokio::test]
async fn render_library_failure_surfaces_as_a_host_error() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let ui = Arc::new(RecordingUi::new());
    let mut controller = HostController::new(tx, Arc::new(FailingLibrary), Arc::clone(&ui));

    let err = controller
        .handle(WorkerResponse::Render {
            id: c1(),
            content: "{}".into(),
            mime: Mime::interactive(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, HostError::Library { .. }));
    assert!(controller.bridge(&c1()).is_none());
}

#[tokio::test]
async fn patch_for_unlinked_cell_is_dropped() {
    let (mut controller, _library, _ui, _rx) = setup();
    // No render happened for this cell; the patch is logged and dropped.
    controller
        .handle(WorkerResponse::Patch {
            id: c1(),
            patch: DocumentPatch::new("[]"),
        })
        .await
        .unwrap();
}
