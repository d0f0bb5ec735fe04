use crate::calc::{self, ProfileOptions};
use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{optional_str, require_staff, required_str, string_list, to_json, viewer};
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::views;
use serde_json::json;
use uuid::Uuid;

fn students_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let snap = state.store.snapshot();
    let batch_id = optional_str(&req.params, "batchId");

    let students: Vec<serde_json::Value> = snap
        .students
        .iter()
        .filter(|s| {
            batch_id
                .as_ref()
                .map(|b| s.batch_ids.contains(b))
                .unwrap_or(true)
        })
        .map(|s| {
            json!({
                "id": s.id,
                "name": s.name,
                "email": s.email,
                "contact": s.contact,
                "batchIds": s.batch_ids,
                "attendancePercent": calc::attendance_percentage(&snap, &s.id, batch_id.as_deref()),
            })
        })
        .collect();
    Ok(json!({ "students": students }))
}

fn students_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let p = &req.params;
    let name = required_str(p, "name")?;
    let batch_ids = string_list(p, "batchIds")?;
    let id = optional_str(p, "id").unwrap_or_else(|| Uuid::new_v4().to_string());

    let snap = state.store.snapshot();
    if snap.student(&id).is_some() {
        return Err(HandlerErr::new("conflict", "student id already exists")
            .with_details(json!({ "studentId": id })));
    }
    if let Some(missing) = batch_ids.iter().find(|b| snap.batch(b).is_none()) {
        return Err(HandlerErr::not_found("batch not found")
            .with_details(json!({ "batchId": missing })));
    }

    let student = Student {
        id: id.clone(),
        name,
        contact: optional_str(p, "contact").unwrap_or_default(),
        email: optional_str(p, "email").unwrap_or_default(),
        batch_ids,
        parent_id: optional_str(p, "parentId"),
    };
    state.store.add_student(student);
    tracing::info!(student = %id, "student created");
    Ok(json!({ "studentId": id }))
}

fn students_profile(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    let student_id = required_str(&req.params, "studentId")?;
    let snap = state.store.snapshot();
    if !views::can_view_student(&snap, &v, &student_id) {
        return Err(HandlerErr::forbidden("not allowed to view this student"));
    }

    let opts = ProfileOptions {
        calendar_days: state.config.profile.calendar_days,
        chart_points: state.config.profile.chart_points,
    };
    let today = state.clock.today();
    let profile = calc::student_profile(&snap, &student_id, &today, opts)
        .ok_or_else(|| HandlerErr::not_found("student not found"))?;
    to_json(&profile)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "students.list" => students_list(state, req),
        "students.create" => students_create(state, req),
        "students.profile" => students_profile(state, req),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
