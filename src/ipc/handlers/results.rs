use crate::ipc::error::{reply, HandlerErr};
use crate::ipc::helpers::{optional_str, require_staff, required_str, required_u32, viewer};
use crate::ipc::types::{AppState, Request};
use crate::model::{Test, TestResult};
use crate::ranking;
use crate::store::Snapshot;
use serde_json::json;
use std::collections::{HashMap, HashSet};

fn entries<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a Vec<serde_json::Value>, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_array())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a non-empty array", key)))
}

/// Shared checks for a batch of results on one test.
fn check_marks(
    snap: &Snapshot,
    test: &Test,
    student_id: &str,
    marks: u32,
    seen: &mut HashSet<String>,
) -> Result<(), HandlerErr> {
    if snap.student(student_id).is_none() {
        return Err(HandlerErr::not_found("student not found")
            .with_details(json!({ "studentId": student_id })));
    }
    if marks > test.max_marks {
        return Err(HandlerErr::bad_params(format!(
            "marks {} exceed maxMarks {}",
            marks, test.max_marks
        ))
        .with_details(json!({ "studentId": student_id })));
    }
    let already = snap
        .test_results
        .iter()
        .any(|r| r.test_id == test.id && r.student_id == student_id);
    if already || !seen.insert(student_id.to_string()) {
        return Err(HandlerErr::new("conflict", "student already has a result for this test")
            .with_details(json!({ "studentId": student_id, "testId": test.id })));
    }
    Ok(())
}

fn lookup_test(snap: &Snapshot, test_id: &str) -> Result<Test, HandlerErr> {
    snap.test(test_id)
        .cloned()
        .ok_or_else(|| HandlerErr::not_found("test not found").with_details(json!({ "testId": test_id })))
}

/// Ranks raw marks for a test and stores them.
fn results_record(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let test_id = required_str(&req.params, "testId")?;
    let snap = state.store.snapshot();
    let test = lookup_test(&snap, &test_id)?;
    // A test is ranked once, as a whole.
    if snap.test_results.iter().any(|r| r.test_id == test.id) {
        return Err(HandlerErr::new("conflict", "test already has ranked results")
            .with_details(json!({ "testId": test_id })));
    }

    let mut seen = HashSet::new();
    let mut raw: Vec<(String, u32)> = Vec::new();
    for e in entries(&req.params, "marks")? {
        let student_id = required_str(e, "studentId")?;
        let marks = required_u32(e, "marks")?;
        check_marks(&snap, &test, &student_id, marks, &mut seen)?;
        raw.push((student_id, marks));
    }

    let ranked = ranking::rank_test_results(&test, &raw);
    let out: Vec<serde_json::Value> = ranked
        .iter()
        .map(|r| json!({ "studentId": r.student_id, "marks": r.marks, "rank": r.batch_rank }))
        .collect();
    let count = ranked.len();
    state.store.add_test_results(ranked);
    tracing::info!(test = %test_id, count, "results recorded");
    Ok(json!({ "testId": test_id, "results": out }))
}

/// Stores results whose ranks were computed elsewhere.
fn results_add(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let v = viewer(&req.params)?;
    require_staff(&v)?;
    let snap = state.store.snapshot();

    let mut seen_per_test: HashMap<String, HashSet<String>> = HashMap::new();
    let mut results = Vec::new();
    for e in entries(&req.params, "results")? {
        let test_id = required_str(e, "testId")?;
        let student_id = required_str(e, "studentId")?;
        let marks = required_u32(e, "marks")?;
        let batch_rank = required_u32(e, "batchRank")?;
        let overall_rank = required_u32(e, "overallRank")?;
        if batch_rank == 0 || overall_rank == 0 {
            return Err(HandlerErr::bad_params("ranks are 1-based"));
        }
        let test = lookup_test(&snap, &test_id)?;
        let seen = seen_per_test.entry(test_id.clone()).or_default();
        check_marks(&snap, &test, &student_id, marks, seen)?;
        results.push(TestResult {
            id: optional_str(e, "id").unwrap_or_else(|| ranking::result_id(&test_id, &student_id)),
            test_id,
            student_id,
            marks,
            batch_rank,
            overall_rank,
        });
    }

    let count = results.len();
    state.store.add_test_results(results);
    tracing::info!(count, "results added");
    Ok(json!({ "added": count }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "results.record" => results_record(state, req),
        "results.add" => results_add(state, req),
        _ => return None,
    };
    Some(reply(&req.id, res))
}
