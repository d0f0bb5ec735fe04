use crate::calc;
use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{date_or, optional_str, require_staff, required_str, required_u32, to_json, viewer};
use crate::ipc::types::{AppState, Request};
use crate::model::Test;
use serde_json::json;
use uuid::Uuid;

fn tests_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let batch_id = optional_str(&req.params, "batchId");
    let snap = state.store.snapshot();

    let tests: Vec<serde_json::Value> = snap
        .tests
        .iter()
        .filter(|t| batch_id.as_ref().map(|b| &t.batch_id == b).unwrap_or(true))
        .map(|t| {
            let stats = calc::test_stats(&snap, &t.id);
            json!({
                "id": t.id,
                "name": t.name,
                "batchId": t.batch_id,
                "batchName": snap.batch(&t.batch_id).map(|b| b.name.clone()),
                "date": t.date,
                "maxMarks": t.max_marks,
                "avgScorePercent": stats.avg_score_percent,
                "participationPercent": stats.participation_percent,
            })
        })
        .collect();
    Ok(json!({ "tests": tests }))
}

fn tests_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let p = &req.params;
    let name = required_str(p, "name")?;
    let batch_id = required_str(p, "batchId")?;
    let date = date_or(p, "date", state.clock.today())?;
    let max_marks = required_u32(p, "maxMarks")?;
    if max_marks == 0 {
        return Err(HandlerErr::bad_params("maxMarks must be greater than zero"));
    }
    let id = optional_str(p, "id").unwrap_or_else(|| Uuid::new_v4().to_string());

    let snap = state.store.snapshot();
    if snap.batch(&batch_id).is_none() {
        return Err(HandlerErr::not_found("batch not found")
            .with_details(json!({ "batchId": batch_id })));
    }
    if snap.test(&id).is_some() {
        return Err(HandlerErr::new("conflict", "test id already exists")
            .with_details(json!({ "testId": id })));
    }

    state.store.add_test(Test {
        id: id.clone(),
        name,
        batch_id: batch_id.clone(),
        date,
        max_marks,
    });
    tracing::info!(test = %id, batch = %batch_id, max_marks, "test created");
    Ok(json!({ "testId": id }))
}

fn tests_stats(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let test_id = required_str(&req.params, "testId")?;
    let snap = state.store.snapshot();
    if snap.test(&test_id).is_none() {
        return Err(HandlerErr::not_found("test not found"));
    }
    to_json(&calc::test_stats(&snap, &test_id))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "tests.list" => tests_list(state, req),
        "tests.create" => tests_create(state, req),
        "tests.stats" => tests_stats(state, req),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
