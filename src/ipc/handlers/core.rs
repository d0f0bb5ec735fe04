use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{require_admin, required_str, viewer};
use crate::ipc::types::{AppState, Request};
use crate::loader;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snap = state.store.snapshot();
    reply(
        &req.id,
        Ok(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "today": state.clock.today(),
            "counts": {
                "students": snap.students.len(),
                "batches": snap.batches.len(),
                "attendance": snap.attendance.len(),
                "tests": snap.tests.len(),
                "testResults": snap.test_results.len(),
                "notifications": snap.notifications.len(),
            }
        })),
    )
}

fn data_load(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_admin(&v)?;
    let path = PathBuf::from(required_str(&req.params, "path")?);

    let ds = loader::load_dataset(&path).map_err(|e| {
        HandlerErr::new(e.code(), e.to_string())
            .with_details(json!({ "path": path.to_string_lossy() }))
    })?;
    let counts = json!({
        "students": ds.students.len(),
        "batches": ds.batches.len(),
        "attendance": ds.attendance.len(),
        "tests": ds.tests.len(),
        "testResults": ds.test_results.len(),
        "notifications": ds.notifications.len(),
    });
    state.store.replace_all(ds);
    tracing::info!(path = %path.to_string_lossy(), "dataset loaded");
    Ok(json!({ "counts": counts }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "data.load" => Some(reply(&req.id, data_load(state, req))),
        _ => None,
    }
}
