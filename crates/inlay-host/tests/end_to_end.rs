//! Full-stack scenarios: real worker task, real controller, test doubles
//! only at the two collaborator seams (runtime and render library).

use inlay_host::HostController;
use inlay_protocol::{CellId, Mime, Setter, WorkerResponse};
use inlay_testkit::{init_tracing, MemoryRenderLibrary, RecordingUi, ScriptedRuntime, UiEffect};
use inlay_worker::{CellWorker, WorkerConfig};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

type Controller = HostController<MemoryRenderLibrary, RecordingUi>;

struct Page {
    runtime: Arc<ScriptedRuntime>,
    library: Arc<MemoryRenderLibrary>,
    ui: Arc<RecordingUi>,
    controller: Controller,
    responses: mpsc::UnboundedReceiver<WorkerResponse>,
}

fn page() -> Page {
    init_tracing();
    let runtime = Arc::new(ScriptedRuntime::new());
    let (handle, responses) = CellWorker::spawn(Arc::clone(&runtime), WorkerConfig::default());
    let library = Arc::new(MemoryRenderLibrary::new());
    let ui = Arc::new(RecordingUi::new());
    let controller = HostController::new(handle.sender(), Arc::clone(&library), Arc::clone(&ui));
    Page {
        runtime,
        library,
        ui,
        controller,
        responses,
    }
}

impl Page {
    /// Pump responses through the controller until `idles` terminal
    /// messages (idle or error) have been handled.
    async fn pump(&mut self, idles: usize) -> Vec<WorkerResponse> {
        let mut seen = Vec::new();
        let mut terminals = 0;
        while terminals < idles {
            let response = self.responses.recv().await.expect("worker stream open");
            let terminal = response.is_terminal();
            seen.push(response.clone());
            self.controller.handle(response).await.unwrap();
            if terminal {
                terminals += 1;
            }
        }
        seen
    }
}

#[tokio::test]
async fn plain_cell_runs_and_reports_through_the_ui() {
    let mut page = page();
    page.runtime.script_output(
        "1+1",
        inlay_worker::CellOutput {
            rendered: Some(inlay_worker::RenderPayload::new("2", Mime::text())),
            stdout: "computing\n".into(),
            ..inlay_worker::CellOutput::default()
        },
    );

    page.controller.run("c1".into(), "1+1").unwrap();
    page.pump(1).await;

    let expected = [
        UiEffect::Loading {
            id: "c1".into(),
            msg: "Loading runtime".into(),
        },
        UiEffect::Executing { id: "c1".into() },
        UiEffect::Render {
            id: "c1".into(),
            mime: Mime::text(),
        },
        UiEffect::Stdout {
            id: "c1".into(),
            text: "computing\n".into(),
        },
        UiEffect::Idle { id: "c1".into() },
    ];
    assert_eq!(page.ui.effects(), expected);
}

#[tokio::test]
async fn failed_cell_surfaces_summary_and_next_cell_recovers() {
    let mut page = page();
    page.runtime.script_failure(
        "raise ValueError('x')",
        "Traceback (most recent call last):\nValueError: x\n",
    );
    page.runtime.script_render("1+1", "2", Mime::text());

    page.controller
        .run("c2".into(), "raise ValueError('x')")
        .unwrap();
    page.controller.run("c3".into(), "1+1").unwrap();
    page.pump(2).await;

    let c2 = page.ui.effects_for(&"c2".into());
    assert_eq!(
        *c2.last().unwrap(),
        UiEffect::Error {
            id: "c2".into(),
            summary: "ValueError: x".into(),
        }
    );
    let c3 = page.ui.effects_for(&"c3".into());
    assert_eq!(*c3.last().unwrap(), UiEffect::Idle { id: "c3".into() });
}

#[tokio::test]
async fn interactive_cell_syncs_in_both_directions_without_echo() {
    let mut page = page();
    let cell: CellId = "c1".into();
    page.runtime
        .script_render("plot()", r#"{"hue":"blue"}"#, Mime::interactive());

    page.controller.run(cell.clone(), "plot()").unwrap();
    // First terminal settles the execute; the controller's `rendered`
    // notification then queues the link request, which idles again after
    // delivering the document-ready patch.
    page.pump(2).await;
    assert!(page.runtime.is_linked(&cell));

    let view = page.library.view("output-c1").expect("live view");
    assert_eq!(view.get("hue"), Some(json!("blue")));

    // Runtime-side mutation flows outward to the view.
    page.runtime.mutate(&cell, "hue", json!("red"));
    let response = page.responses.recv().await.unwrap();
    assert!(matches!(response, WorkerResponse::Patch { .. }));
    page.controller.handle(response).await.unwrap();
    assert_eq!(view.get("hue"), Some(json!("red")));

    // The outward application was runtime-tagged, so nothing bounced
    // back inward.
    assert!(page.runtime.inbound_patches(&cell).is_empty());

    // Host-side mutation flows inward to the runtime document.
    view.set("width", json!(300));
    page.pump(1).await;
    assert_eq!(
        page.runtime.document(&cell).unwrap().get("width"),
        Some(&json!(300))
    );
    // The inward application carries the host tag, so the runtime-side
    // listener never re-emits it back outward.
    let inbound = page.runtime.inbound_patches(&cell);
    assert_eq!(inbound.len(), 1);
    assert_eq!(inbound[0].0, Setter::Host);
}

#[tokio::test]
async fn patch_round_trip_matches_direct_application() {
    let mut page = page();
    let cell: CellId = "c1".into();
    let original = r#"{"a":1}"#;
    page.runtime
        .script_render("plot()", original, Mime::interactive());

    page.controller.run(cell.clone(), "plot()").unwrap();
    page.pump(2).await;

    // Apply the patch through the view and sync it to the runtime side.
    let view = page.library.view("output-c1").unwrap();
    view.set("b", json!(2));
    page.pump(1).await;

    // The same patch applied directly to the original serialized form.
    let mut direct: Map<String, Value> = serde_json::from_str(original).unwrap();
    direct.insert("b".to_string(), json!(2));

    assert_eq!(page.runtime.document(&cell).unwrap(), direct);
}
