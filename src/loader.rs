use crate::clock::is_iso_date;
use crate::model::Dataset;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{kind} {id} references unknown {target} {target_id}")]
    DanglingReference {
        kind: &'static str,
        id: String,
        target: &'static str,
        target_id: String,
    },

    #[error("{kind} {id}: {message}")]
    Invalid {
        kind: &'static str,
        id: String,
        message: String,
    },
}

impl LoadError {
    /// Stable code for the IPC error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::Io { .. } => "io_failed",
            LoadError::Json(_) => "bad_json",
            _ => "invalid_dataset",
        }
    }
}

pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(&text)
}

pub fn parse_dataset(text: &str) -> Result<Dataset, LoadError> {
    let ds: Dataset = serde_json::from_str(text)?;
    validate(&ds)?;
    Ok(ds)
}

fn unique_ids<'a, I>(kind: &'static str, ids: I) -> Result<HashSet<&'a str>, LoadError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(LoadError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(seen)
}

fn require_date(kind: &'static str, id: &str, date: &str) -> Result<(), LoadError> {
    if is_iso_date(date) {
        Ok(())
    } else {
        Err(LoadError::Invalid {
            kind,
            id: id.to_string(),
            message: format!("date must be YYYY-MM-DD, got {:?}", date),
        })
    }
}

/// Which side of the Student/Batch link carries an unmatched entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSide {
    /// Listed in `Batch.studentIds` only.
    Batch,
    /// Listed in `Student.batchIds` only.
    Student,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMismatch {
    pub batch_id: String,
    pub student_id: String,
    pub side: RosterSide,
}

pub fn roster_mismatches(ds: &Dataset) -> Vec<RosterMismatch> {
    let mut out = Vec::new();
    for b in ds.batches.iter() {
        for sid in b.student_ids.iter() {
            let listed = ds
                .students
                .iter()
                .find(|s| &s.id == sid)
                .map(|s| s.batch_ids.contains(&b.id))
                .unwrap_or(false);
            if !listed {
                out.push(RosterMismatch {
                    batch_id: b.id.clone(),
                    student_id: sid.clone(),
                    side: RosterSide::Batch,
                });
            }
        }
    }
    for s in ds.students.iter() {
        for bid in s.batch_ids.iter() {
            let listed = ds
                .batches
                .iter()
                .find(|b| &b.id == bid)
                .map(|b| b.student_ids.contains(&s.id))
                .unwrap_or(false);
            if !listed {
                out.push(RosterMismatch {
                    batch_id: bid.clone(),
                    student_id: s.id.clone(),
                    side: RosterSide::Student,
                });
            }
        }
    }
    out
}

/// Checks the reference and range invariants the derivations rely on.
/// Roster mismatches between `Student.batchIds` and `Batch.studentIds` are
/// reported as warnings only; derivations always read enrolment from the
/// student side.
pub fn validate(ds: &Dataset) -> Result<(), LoadError> {
    let student_ids = unique_ids("student", ds.students.iter().map(|s| s.id.as_str()))?;
    let batch_ids = unique_ids("batch", ds.batches.iter().map(|b| b.id.as_str()))?;
    unique_ids("attendance", ds.attendance.iter().map(|a| a.id.as_str()))?;
    unique_ids("result", ds.test_results.iter().map(|r| r.id.as_str()))?;
    unique_ids("notification", ds.notifications.iter().map(|n| n.id.as_str()))?;
    unique_ids("teacher", ds.teachers.iter().map(|t| t.id.as_str()))?;
    unique_ids("parent", ds.parents.iter().map(|p| p.id.as_str()))?;

    for s in ds.students.iter() {
        for b in s.batch_ids.iter() {
            if !batch_ids.contains(b.as_str()) {
                return Err(LoadError::DanglingReference {
                    kind: "student",
                    id: s.id.clone(),
                    target: "batch",
                    target_id: b.clone(),
                });
            }
        }
    }

    for m in roster_mismatches(ds) {
        match m.side {
            RosterSide::Batch => {
                tracing::warn!(batch = %m.batch_id, student = %m.student_id, "batch roster entry not mirrored on student")
            }
            RosterSide::Student => {
                tracing::warn!(batch = %m.batch_id, student = %m.student_id, "student enrolment not mirrored on batch roster")
            }
        }
    }

    let mut slots = HashSet::new();
    for a in ds.attendance.iter() {
        require_date("attendance", &a.id, &a.date)?;
        if !student_ids.contains(a.student_id.as_str()) {
            return Err(LoadError::DanglingReference {
                kind: "attendance",
                id: a.id.clone(),
                target: "student",
                target_id: a.student_id.clone(),
            });
        }
        if !batch_ids.contains(a.batch_id.as_str()) {
            return Err(LoadError::DanglingReference {
                kind: "attendance",
                id: a.id.clone(),
                target: "batch",
                target_id: a.batch_id.clone(),
            });
        }
        if !slots.insert((a.student_id.as_str(), a.batch_id.as_str(), a.date.as_str())) {
            return Err(LoadError::Invalid {
                kind: "attendance",
                id: a.id.clone(),
                message: "more than one record for the same student, batch and date".to_string(),
            });
        }
    }

    let mut max_marks: HashMap<&str, u32> = HashMap::new();
    for t in ds.tests.iter() {
        if max_marks.insert(t.id.as_str(), t.max_marks).is_some() {
            return Err(LoadError::DuplicateId {
                kind: "test",
                id: t.id.clone(),
            });
        }
        require_date("test", &t.id, &t.date)?;
        if t.max_marks == 0 {
            return Err(LoadError::Invalid {
                kind: "test",
                id: t.id.clone(),
                message: "maxMarks must be positive".to_string(),
            });
        }
        if !batch_ids.contains(t.batch_id.as_str()) {
            return Err(LoadError::DanglingReference {
                kind: "test",
                id: t.id.clone(),
                target: "batch",
                target_id: t.batch_id.clone(),
            });
        }
    }

    for r in ds.test_results.iter() {
        let Some(max) = max_marks.get(r.test_id.as_str()) else {
            return Err(LoadError::DanglingReference {
                kind: "result",
                id: r.id.clone(),
                target: "test",
                target_id: r.test_id.clone(),
            });
        };
        if !student_ids.contains(r.student_id.as_str()) {
            return Err(LoadError::DanglingReference {
                kind: "result",
                id: r.id.clone(),
                target: "student",
                target_id: r.student_id.clone(),
            });
        }
        if r.marks > *max {
            return Err(LoadError::Invalid {
                kind: "result",
                id: r.id.clone(),
                message: format!("marks {} exceed maxMarks {}", r.marks, max),
            });
        }
        if r.batch_rank == 0 || r.overall_rank == 0 {
            return Err(LoadError::Invalid {
                kind: "result",
                id: r.id.clone(),
                message: "ranks are 1-based".to_string(),
            });
        }
    }

    for n in ds.notifications.iter() {
        require_date("notification", &n.id, &n.date)?;
    }

    Ok(())
}
