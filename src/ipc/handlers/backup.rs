use crate::backup;
use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{require_admin, require_staff, required_str, viewer};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn export_snapshot(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let out_path = required_str(&req.params, "outPath")?;

    let ds = state.store.snapshot().to_dataset();
    let out = PathBuf::from(&out_path);
    let export = backup::export_snapshot(&ds, &out).map_err(|e| {
        HandlerErr::new("io_failed", format!("{:#}", e)).with_details(json!({ "path": out_path }))
    })?;
    tracing::info!(path = %out_path, "snapshot exported");
    Ok(json!({
        "path": out_path,
        "format": export.format,
        "entryCount": export.entry_count,
        "sha256": export.sha256,
    }))
}

fn import_snapshot(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_admin(&v)?;
    let in_path = required_str(&req.params, "inPath")?;

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return Err(HandlerErr::not_found("bundle file not found")
            .with_details(json!({ "path": in_path })));
    }
    let import = backup::import_snapshot(&src).map_err(|e| {
        HandlerErr::new("import_failed", format!("{:#}", e))
            .with_details(json!({ "path": in_path }))
    })?;

    let students = import.dataset.students.len();
    state.store.replace_all(import.dataset);
    tracing::info!(path = %in_path, students, "snapshot imported");
    Ok(json!({
        "path": in_path,
        "formatDetected": import.format,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "backup.exportSnapshot" => export_snapshot(state, req),
        "backup.importSnapshot" => import_snapshot(state, req),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
