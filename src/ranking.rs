use crate::calc::{round_percent, score_percent};
use crate::model::{Test, TestResult};
use crate::store::Snapshot;
use serde::Serialize;
use std::collections::HashMap;

pub fn result_id(test_id: &str, student_id: &str) -> String {
    format!("result-{}-{}", test_id, student_id)
}

/// Ranks one test's marks. Higher marks rank first; equal marks keep input
/// order and still get distinct positions (1, 2, 3, ...). The batch and
/// overall ranks are both scoped to the test's batch.
pub fn rank_test_results(test: &Test, entries: &[(String, u32)]) -> Vec<TestResult> {
    let mut sorted: Vec<&(String, u32)> = entries.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, (student_id, marks))| {
            let rank = (idx + 1) as u32;
            TestResult {
                id: result_id(&test.id, student_id),
                test_id: test.id.clone(),
                student_id: student_id.clone(),
                marks: *marks,
                batch_rank: rank,
                overall_rank: rank,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub student_id: String,
    pub name: String,
    pub average_score: u32,
    pub average_rank: u32,
    pub tests_count: usize,
}

/// One entry per student, best average score first. Students without
/// results score 0 and sink to the bottom; ties keep roster order.
pub fn leaderboard(snap: &Snapshot) -> Vec<LeaderboardEntry> {
    let max_marks: HashMap<&str, u32> = snap
        .tests
        .iter()
        .map(|t| (t.id.as_str(), t.max_marks))
        .collect();

    let mut by_student: HashMap<&str, Vec<&TestResult>> = HashMap::new();
    for r in snap.test_results.iter() {
        by_student.entry(r.student_id.as_str()).or_default().push(r);
    }

    let mut entries: Vec<LeaderboardEntry> = snap
        .students
        .iter()
        .map(|s| {
            let results = by_student
                .get(s.id.as_str())
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
            if results.is_empty() {
                return LeaderboardEntry {
                    student_id: s.id.clone(),
                    name: s.name.clone(),
                    average_score: 0,
                    average_rank: 0,
                    tests_count: 0,
                };
            }
            let n = results.len() as f64;
            let pct_sum: f64 = results
                .iter()
                .filter_map(|r| {
                    max_marks
                        .get(r.test_id.as_str())
                        .map(|max| score_percent(r.marks, *max))
                })
                .sum();
            let rank_sum: u64 = results.iter().map(|r| u64::from(r.overall_rank)).sum();
            LeaderboardEntry {
                student_id: s.id.clone(),
                name: s.name.clone(),
                average_score: round_percent(pct_sum / n),
                average_rank: round_percent(rank_sum as f64 / n),
                tests_count: results.len(),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.average_score
            .cmp(&a.average_score)
            .then_with(|| (a.tests_count == 0).cmp(&(b.tests_count == 0)))
    });
    entries
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Podium {
    pub podium: Vec<LeaderboardEntry>,
    pub rest: Vec<LeaderboardEntry>,
}

pub fn split_podium(mut entries: Vec<LeaderboardEntry>, size: usize) -> Podium {
    let rest = entries.split_off(size.min(entries.len()));
    Podium {
        podium: entries,
        rest,
    }
}
