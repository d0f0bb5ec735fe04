use crate::calc;
use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{optional_str, require_staff, required_str, to_json, viewer};
use crate::ipc::types::{AppState, Request};
use crate::model::Batch;
use serde_json::json;
use uuid::Uuid;

fn batches_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let snap = state.store.snapshot();
    let batches: Vec<serde_json::Value> = snap
        .batches
        .iter()
        .map(|b| {
            json!({
                "id": b.id,
                "name": b.name,
                "teacherId": b.teacher_id,
                "teacherName": b.teacher_name,
                "schedule": b.schedule,
                "studentCount": calc::student_count(&snap, &b.id),
            })
        })
        .collect();
    Ok(json!({ "batches": batches }))
}

fn batches_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let p = &req.params;
    let name = required_str(p, "name")?;
    let teacher_name = required_str(p, "teacherName")?;
    let id = optional_str(p, "id").unwrap_or_else(|| Uuid::new_v4().to_string());

    let snap = state.store.snapshot();
    if snap.batch(&id).is_some() {
        return Err(HandlerErr::new("conflict", "batch id already exists")
            .with_details(json!({ "batchId": id })));
    }
    // Reuse a known teacher id when the name matches one on file.
    let teacher_id = optional_str(p, "teacherId")
        .or_else(|| {
            snap.teachers
                .iter()
                .find(|t| t.name == teacher_name)
                .map(|t| t.id.clone())
        })
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    state.store.add_batch(Batch {
        id: id.clone(),
        name: name.clone(),
        teacher_id: teacher_id.clone(),
        teacher_name,
        schedule: optional_str(p, "schedule").unwrap_or_default(),
        student_ids: Vec::new(),
    });
    tracing::info!(batch = %id, "batch created");
    Ok(json!({ "batchId": id, "name": name, "teacherId": teacher_id }))
}

fn batches_details(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let batch_id = required_str(&req.params, "batchId")?;
    let snap = state.store.snapshot();
    let details = calc::batch_details(&snap, &batch_id)
        .ok_or_else(|| HandlerErr::not_found("batch not found"))?;
    to_json(&details)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "batches.list" => batches_list(state, req),
        "batches.create" => batches_create(state, req),
        "batches.details" => batches_details(state, req),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
