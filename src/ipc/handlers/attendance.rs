use crate::calc;
use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{date_or, optional_str, require_staff, required_str, to_json, viewer};
use crate::ipc::types::{AppState, Request};
use crate::store::Snapshot;
use crate::views;
use serde_json::json;
use std::collections::HashMap;

fn require_batch(snap: &Snapshot, batch_id: &str) -> Result<(), HandlerErr> {
    if snap.batch(batch_id).is_some() {
        Ok(())
    } else {
        Err(HandlerErr::not_found("batch not found")
            .with_details(json!({ "batchId": batch_id })))
    }
}

fn parse_marks(params: &serde_json::Value) -> Result<HashMap<String, bool>, HandlerErr> {
    let Some(raw) = params.get("marks") else {
        return Ok(HashMap::new());
    };
    if raw.is_null() {
        return Ok(HashMap::new());
    }
    let Some(obj) = raw.as_object() else {
        return Err(HandlerErr::bad_params(
            "marks must be an object of studentId -> boolean",
        ));
    };
    let mut out = HashMap::with_capacity(obj.len());
    for (student_id, v) in obj {
        let Some(present) = v.as_bool() else {
            return Err(HandlerErr::bad_params(format!(
                "marks.{} must be a boolean",
                student_id
            )));
        };
        out.insert(student_id.clone(), present);
    }
    Ok(out)
}

fn attendance_sheet(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let batch_id = required_str(&req.params, "batchId")?;
    let date = date_or(&req.params, "date", state.clock.today())?;
    let snap = state.store.snapshot();
    require_batch(&snap, &batch_id)?;

    let rows = calc::attendance_sheet(&snap, &batch_id, &date);
    let marked = rows.iter().filter(|r| r.present.is_some()).count();
    Ok(json!({
        "batchId": batch_id,
        "date": date,
        "markedCount": marked,
        "students": to_json(&rows)?,
    }))
}

fn attendance_submit(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let batch_id = required_str(&req.params, "batchId")?;
    let date = date_or(&req.params, "date", state.clock.today())?;
    let marks = parse_marks(&req.params)?;
    let snap = state.store.snapshot();
    require_batch(&snap, &batch_id)?;

    let records = calc::attendance_submission(&snap, &batch_id, &date, &marks);
    let total = records.len();
    let present = records.iter().filter(|r| r.present).count();
    state.store.update_attendance(records);
    tracing::info!(batch = %batch_id, date = %date, present, total, "attendance submitted");
    Ok(json!({
        "batchId": batch_id,
        "date": date,
        "presentCount": present,
        "totalCount": total,
    }))
}

fn attendance_percentage(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    let student_id = required_str(&req.params, "studentId")?;
    let batch_id = optional_str(&req.params, "batchId");
    let snap = state.store.snapshot();
    if !views::can_view_student(&snap, &v, &student_id) {
        return Err(HandlerErr::forbidden("not allowed to view this student"));
    }
    Ok(json!({
        "studentId": student_id,
        "batchId": batch_id,
        "percentage": calc::attendance_percentage(&snap, &student_id, batch_id.as_deref()),
    }))
}

fn attendance_today(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let today = state.clock.today();
    let snap = state.store.snapshot();
    let summary = calc::today_attendance_summary(&snap, &today);
    Ok(json!({ "date": today, "summary": to_json(&summary)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "attendance.sheet" => attendance_sheet(state, req),
        "attendance.submit" => attendance_submit(state, req),
        "attendance.percentage" => attendance_percentage(state, req),
        "attendance.today" => attendance_today(state, req),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
