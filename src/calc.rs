use crate::model::{AttendanceRecord, Batch, Student, Test, TestResult};
use crate::store::Snapshot;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

pub const LATEST_SCORE_NOT_AVAILABLE: &str = "N/A";

/// Round-half-up to a whole percentage: `Int(x + 0.5)`.
pub fn round_percent(x: f64) -> u32 {
    if !x.is_finite() || x <= 0.0 {
        return 0;
    }
    (x + 0.5).floor() as u32
}

/// `round(100 * num / den)`, or 0 for an empty denominator.
pub fn ratio_percent(num: usize, den: usize) -> u32 {
    if den == 0 {
        return 0;
    }
    round_percent(100.0 * num as f64 / den as f64)
}

pub fn score_percent(marks: u32, max_marks: u32) -> f64 {
    if max_marks == 0 {
        return 0.0;
    }
    100.0 * f64::from(marks) / f64::from(max_marks)
}

fn test_index(snap: &Snapshot) -> HashMap<&str, &Test> {
    snap.tests.iter().map(|t| (t.id.as_str(), t)).collect()
}

fn present_ratio<'a, I>(records: I) -> u32
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut total = 0usize;
    let mut present = 0usize;
    for r in records {
        total += 1;
        if r.present {
            present += 1;
        }
    }
    ratio_percent(present, total)
}

pub fn attendance_percentage(snap: &Snapshot, student_id: &str, batch_id: Option<&str>) -> u32 {
    present_ratio(snap.attendance.iter().filter(|r| {
        r.student_id == student_id && batch_id.map(|b| r.batch_id == b).unwrap_or(true)
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestScore {
    pub test_id: String,
    pub marks: u32,
    pub max_marks: u32,
}

impl LatestScore {
    pub fn display(&self) -> String {
        format!("{}/{}", self.marks, self.max_marks)
    }
}

pub fn display_latest(score: Option<&LatestScore>) -> String {
    score
        .map(|s| s.display())
        .unwrap_or_else(|| LATEST_SCORE_NOT_AVAILABLE.to_string())
}

/// Result on the batch test with the greatest date. Equal dates keep the
/// first matching result in store order.
pub fn latest_score(snap: &Snapshot, student_id: &str, batch_id: &str) -> Option<LatestScore> {
    let tests = test_index(snap);
    let mut best: Option<(&TestResult, &Test)> = None;
    for r in snap.test_results.iter().filter(|r| r.student_id == student_id) {
        let Some(test) = tests.get(r.test_id.as_str()).copied() else {
            continue;
        };
        if test.batch_id != batch_id {
            continue;
        }
        let newer = best.map(|(_, b)| test.date > b.date).unwrap_or(true);
        if newer {
            best = Some((r, test));
        }
    }
    best.map(|(r, t)| LatestScore {
        test_id: t.id.clone(),
        marks: r.marks,
        max_marks: t.max_marks,
    })
}

/// Mean score percentage across every result on the batch's tests.
pub fn batch_average_score(snap: &Snapshot, batch_id: &str) -> f64 {
    let tests = test_index(snap);
    let mut sum = 0.0;
    let mut count = 0usize;
    for r in snap.test_results.iter() {
        let Some(test) = tests.get(r.test_id.as_str()) else {
            continue;
        };
        if test.batch_id != batch_id {
            continue;
        }
        sum += score_percent(r.marks, test.max_marks);
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStats {
    pub avg_score_percent: u32,
    pub participation_percent: u32,
    pub result_count: usize,
    pub roster_size: usize,
}

pub fn test_stats(snap: &Snapshot, test_id: &str) -> TestStats {
    let results: Vec<&TestResult> = snap
        .test_results
        .iter()
        .filter(|r| r.test_id == test_id)
        .collect();
    let test = snap.test(test_id);
    let roster_size = test.map(|t| student_count(snap, &t.batch_id)).unwrap_or(0);

    let avg_score_percent = match test {
        Some(t) if !results.is_empty() && t.max_marks > 0 => {
            let total: u64 = results.iter().map(|r| u64::from(r.marks)).sum();
            round_percent(100.0 * total as f64 / (results.len() as f64 * f64::from(t.max_marks)))
        }
        _ => 0,
    };

    TestStats {
        avg_score_percent,
        participation_percent: ratio_percent(results.len(), roster_size),
        result_count: results.len(),
        roster_size,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub present: usize,
    pub total: usize,
    pub percentage: u32,
}

/// Attendance marked for `today` across all batches.
pub fn today_attendance_summary(snap: &Snapshot, today: &str) -> DaySummary {
    let mut present = 0usize;
    let mut total = 0usize;
    for r in snap.attendance.iter().filter(|r| r.date == today) {
        total += 1;
        if r.present {
            present += 1;
        }
    }
    DaySummary {
        present,
        total,
        percentage: ratio_percent(present, total),
    }
}

pub fn batch_students<'a>(snap: &'a Snapshot, batch_id: &str) -> Vec<&'a Student> {
    snap.students
        .iter()
        .filter(|s| s.batch_ids.iter().any(|b| b == batch_id))
        .collect()
}

pub fn student_count(snap: &Snapshot, batch_id: &str) -> usize {
    batch_students(snap, batch_id).len()
}

pub fn average_rank<F>(results: &[&TestResult], rank: F) -> u32
where
    F: Fn(&TestResult) -> u32,
{
    if results.is_empty() {
        return 0;
    }
    let total: u64 = results.iter().map(|r| u64::from(rank(*r))).sum();
    round_percent(total as f64 / results.len() as f64)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRosterRow {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub attendance_percent: u32,
    pub latest_score: Option<LatestScore>,
    pub latest_score_display: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDetails {
    pub batch: Batch,
    pub student_count: usize,
    pub average_score: u32,
    pub students: Vec<BatchRosterRow>,
}

pub fn batch_details(snap: &Snapshot, batch_id: &str) -> Option<BatchDetails> {
    let batch = snap.batch(batch_id)?;
    let students: Vec<BatchRosterRow> = batch_students(snap, batch_id)
        .into_iter()
        .map(|s| {
            let latest = latest_score(snap, &s.id, batch_id);
            BatchRosterRow {
                student_id: s.id.clone(),
                name: s.name.clone(),
                email: s.email.clone(),
                contact: s.contact.clone(),
                attendance_percent: attendance_percentage(snap, &s.id, Some(batch_id)),
                latest_score_display: display_latest(latest.as_ref()),
                latest_score: latest,
            }
        })
        .collect();
    Some(BatchDetails {
        batch: batch.clone(),
        student_count: students.len(),
        average_score: round_percent(batch_average_score(snap, batch_id)),
        students,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub student_id: String,
    pub name: String,
    pub present: Option<bool>,
}

/// Roster for marking attendance, pre-filled with what is already recorded.
pub fn attendance_sheet(snap: &Snapshot, batch_id: &str, date: &str) -> Vec<SheetRow> {
    batch_students(snap, batch_id)
        .into_iter()
        .map(|s| SheetRow {
            student_id: s.id.clone(),
            name: s.name.clone(),
            present: snap
                .attendance
                .iter()
                .find(|r| r.student_id == s.id && r.batch_id == batch_id && r.date == date)
                .map(|r| r.present),
        })
        .collect()
}

pub fn attendance_record_id(student_id: &str, batch_id: &str, date: &str) -> String {
    format!("att-{}-{}-{}", student_id, batch_id, date)
}

/// One record per roster student; anyone absent from `marks` counts as present.
pub fn attendance_submission(
    snap: &Snapshot,
    batch_id: &str,
    date: &str,
    marks: &HashMap<String, bool>,
) -> Vec<AttendanceRecord> {
    batch_students(snap, batch_id)
        .into_iter()
        .map(|s| AttendanceRecord {
            id: attendance_record_id(&s.id, batch_id, date),
            student_id: s.id.clone(),
            batch_id: batch_id.to_string(),
            date: date.to_string(),
            present: marks.get(&s.id).copied().unwrap_or(true),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Present,
    Absent,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: String,
    pub status: DayStatus,
}

/// `days` consecutive dates ending on `today`, oldest first.
pub fn attendance_calendar(
    snap: &Snapshot,
    student_id: &str,
    today: &str,
    days: u32,
) -> Vec<CalendarDay> {
    let Ok(end) = NaiveDate::parse_from_str(today, "%Y-%m-%d") else {
        return Vec::new();
    };
    (0..days)
        .rev()
        .map(|back| {
            let date = (end - Duration::days(i64::from(back)))
                .format("%Y-%m-%d")
                .to_string();
            let status = match snap
                .attendance
                .iter()
                .find(|r| r.student_id == student_id && r.date == date)
            {
                Some(r) if r.present => DayStatus::Present,
                Some(_) => DayStatus::Absent,
                None => DayStatus::None,
            };
            CalendarDay { date, status }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultLine {
    pub result_id: String,
    pub test_id: String,
    pub test_name: String,
    pub test_date: String,
    pub batch_id: String,
    pub batch_name: Option<String>,
    pub marks: u32,
    pub max_marks: u32,
    pub score_percent: u32,
    pub batch_rank: u32,
    pub overall_rank: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub test_name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub student: Student,
    pub batches: Vec<Batch>,
    pub attendance_percent: u32,
    pub results: Vec<ResultLine>,
    pub chart: Vec<ChartPoint>,
    pub average_overall_rank: u32,
    pub average_batch_rank: u32,
    pub calendar: Vec<CalendarDay>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileOptions {
    pub calendar_days: u32,
    pub chart_points: usize,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            calendar_days: 30,
            chart_points: 5,
        }
    }
}

pub fn student_profile(
    snap: &Snapshot,
    student_id: &str,
    today: &str,
    opts: ProfileOptions,
) -> Option<StudentProfile> {
    let student = snap.student(student_id)?;
    let tests = test_index(snap);

    let batches: Vec<Batch> = snap
        .batches
        .iter()
        .filter(|b| student.batch_ids.contains(&b.id))
        .cloned()
        .collect();

    let own: Vec<&TestResult> = snap
        .test_results
        .iter()
        .filter(|r| r.student_id == student_id)
        .collect();

    let mut results: Vec<ResultLine> = own
        .iter()
        .filter_map(|r| {
            let test = tests.get(r.test_id.as_str())?;
            Some(ResultLine {
                result_id: r.id.clone(),
                test_id: test.id.clone(),
                test_name: test.name.clone(),
                test_date: test.date.clone(),
                batch_id: test.batch_id.clone(),
                batch_name: snap.batch(&test.batch_id).map(|b| b.name.clone()),
                marks: r.marks,
                max_marks: test.max_marks,
                score_percent: round_percent(score_percent(r.marks, test.max_marks)),
                batch_rank: r.batch_rank,
                overall_rank: r.overall_rank,
            })
        })
        .collect();
    // Stable: results on the same date keep store order.
    results.sort_by(|a, b| b.test_date.cmp(&a.test_date));

    let chart = results
        .iter()
        .take(opts.chart_points)
        .rev()
        .map(|r| ChartPoint {
            test_name: r.test_name.clone(),
            score: r.score_percent,
        })
        .collect();

    Some(StudentProfile {
        student: student.clone(),
        batches,
        attendance_percent: attendance_percentage(snap, student_id, None),
        average_overall_rank: average_rank(&own, |r| r.overall_rank),
        average_batch_rank: average_rank(&own, |r| r.batch_rank),
        calendar: attendance_calendar(snap, student_id, today, opts.calendar_days),
        results,
        chart,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPerformance {
    pub batch_id: String,
    pub name: String,
    pub avg_score: u32,
}

pub fn batch_performance(snap: &Snapshot) -> Vec<BatchPerformance> {
    snap.batches
        .iter()
        .map(|b| BatchPerformance {
            batch_id: b.id.clone(),
            name: b.name.clone(),
            avg_score: round_percent(batch_average_score(snap, &b.id)),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestProgress {
    pub test_id: String,
    pub name: String,
    pub avg_score: u32,
}

/// The first `limit` tests in store order, reversed for plotting.
pub fn test_progress(snap: &Snapshot, limit: usize) -> Vec<TestProgress> {
    snap.tests
        .iter()
        .take(limit)
        .rev()
        .map(|t| TestProgress {
            test_id: t.id.clone(),
            name: t.name.clone(),
            avg_score: test_stats(snap, &t.id).avg_score_percent,
        })
        .collect()
}
