mod test_support;

use serde_json::json;
use test_support::{admin, request_ok, spawn_sidecar};

#[test]
fn attendance_derivations_follow_seed_records() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let today = request_ok(&mut stdin, &mut reader, "1", "attendance.today", json!({ "viewer": admin() }));
    assert_eq!(today["date"], "2025-11-20");
    assert_eq!(today["summary"], json!({ "present": 2, "total": 3, "percentage": 67 }));

    let overall = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.percentage",
        json!({ "viewer": admin(), "studentId": "s2" }),
    );
    assert_eq!(overall["percentage"], 67);

    let scoped = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.percentage",
        json!({ "viewer": admin(), "studentId": "s2", "batchId": "b1" }),
    );
    assert_eq!(scoped["percentage"], 50);

    let none = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.percentage",
        json!({ "viewer": admin(), "studentId": "s4", "batchId": "b1" }),
    );
    assert_eq!(none["percentage"], 0);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn latest_score_picks_most_recent_batch_test() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let s1 = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "scores.latest",
        json!({ "viewer": admin(), "studentId": "s1", "batchId": "b1" }),
    );
    assert_eq!(s1["display"], "40/50");
    assert_eq!(s1["latest"]["testId"], "test2");

    let s3 = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "scores.latest",
        json!({ "viewer": admin(), "studentId": "s3", "batchId": "b1" }),
    );
    assert_eq!(s3["display"], "60/100");

    let s4 = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "scores.latest",
        json!({ "viewer": admin(), "studentId": "s4", "batchId": "b1" }),
    );
    assert_eq!(s4["display"], "N/A");
    assert!(s4["latest"].is_null());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn batch_average_and_test_stats() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let b1 = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "scores.batchAverage",
        json!({ "viewer": admin(), "batchId": "b1" }),
    );
    assert_eq!(b1["rounded"], 80);
    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "scores.batchAverage",
        json!({ "viewer": admin(), "batchId": "nope" }),
    );
    assert_eq!(empty["rounded"], 0);

    let t1 = request_ok(&mut stdin, &mut reader, "3", "tests.stats", json!({ "viewer": admin(), "testId": "test1" }));
    assert_eq!(t1["avgScorePercent"], 77);
    assert_eq!(t1["participationPercent"], 100);
    let t2 = request_ok(&mut stdin, &mut reader, "4", "tests.stats", json!({ "viewer": admin(), "testId": "test2" }));
    assert_eq!(t2["avgScorePercent"], 85);
    assert_eq!(t2["participationPercent"], 67);

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "tests.list",
        json!({ "viewer": admin(), "batchId": "b2" }),
    );
    let tests = listed["tests"].as_array().expect("tests array");
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0]["batchName"], "Physics Foundation - Grade 11");
    assert_eq!(tests[0]["avgScorePercent"], 60);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn analytics_overview_combines_summaries() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let overview = request_ok(&mut stdin, &mut reader, "1", "analytics.overview", json!({ "viewer": admin() }));
    assert_eq!(overview["totalStudents"], 4);
    assert_eq!(overview["totalBatches"], 2);
    assert_eq!(overview["today"]["percentage"], 67);
    let perf = overview["batchPerformance"].as_array().expect("performance");
    assert_eq!(perf[0]["avgScore"], 80);
    assert_eq!(perf[1]["avgScore"], 60);
    let progress: Vec<&str> = overview["progress"]
        .as_array()
        .expect("progress")
        .iter()
        .filter_map(|p| p["testId"].as_str())
        .collect();
    assert_eq!(progress, vec!["test3", "test2", "test1"]);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn batch_details_rows_carry_latest_scores() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let details = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "batches.details",
        json!({ "viewer": admin(), "batchId": "b1" }),
    );
    assert_eq!(details["studentCount"], 3);
    assert_eq!(details["averageScore"], 80);
    let rows = details["students"].as_array().expect("rows");
    assert_eq!(rows[0]["studentId"], "s1");
    assert_eq!(rows[0]["latestScoreDisplay"], "40/50");
    assert_eq!(rows[1]["attendancePercent"], 50);

    drop(stdin);
    let _ = child.wait();
}
