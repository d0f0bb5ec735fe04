use crate::calc;
use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{require_staff, required_str, to_json, viewer};
use crate::ipc::types::{AppState, Request};
use crate::ranking;
use crate::views;
use serde_json::json;

fn analytics_overview(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let today = state.clock.today();
    let snap = state.store.snapshot();
    Ok(json!({
        "date": today,
        "totalStudents": snap.students.len(),
        "totalBatches": snap.batches.len(),
        "today": to_json(&calc::today_attendance_summary(&snap, &today))?,
        "batchPerformance": to_json(&calc::batch_performance(&snap))?,
        "progress": to_json(&calc::test_progress(&snap, state.config.analytics.progress_tests))?,
    }))
}

fn scores_latest(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    let student_id = required_str(&req.params, "studentId")?;
    let batch_id = required_str(&req.params, "batchId")?;
    let snap = state.store.snapshot();
    if !views::can_view_student(&snap, &v, &student_id) {
        return Err(HandlerErr::forbidden("not allowed to view this student"));
    }
    let latest = calc::latest_score(&snap, &student_id, &batch_id);
    Ok(json!({
        "studentId": student_id,
        "batchId": batch_id,
        "display": calc::display_latest(latest.as_ref()),
        "latest": to_json(&latest)?,
    }))
}

fn scores_batch_average(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let batch_id = required_str(&req.params, "batchId")?;
    let snap = state.store.snapshot();
    let avg = calc::batch_average_score(&snap, &batch_id);
    Ok(json!({
        "batchId": batch_id,
        "averageScore": avg,
        "rounded": calc::round_percent(avg),
    }))
}

fn leaderboard_get(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    viewer(&req.params)?;
    let snap = state.store.snapshot();
    let board = ranking::leaderboard(&snap);
    let split = ranking::split_podium(board, state.config.leaderboard.podium_size);
    to_json(&split)
}

fn dashboard_get(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    let today = state.clock.today();
    let snap = state.store.snapshot();
    to_json(&views::dashboard(&snap, &v, &today))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "analytics.overview" => analytics_overview(state, req),
        "scores.latest" => scores_latest(state, req),
        "scores.batchAverage" => scores_batch_average(state, req),
        "leaderboard.get" => leaderboard_get(state, req),
        "dashboard.get" => dashboard_get(state, req),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
