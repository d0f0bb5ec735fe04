//! Role-scoped reads. Every function takes the caller's [`Viewer`] token
//! explicitly.

use crate::calc::{self, DaySummary};
use crate::model::{Batch, Notification, Role, Student, TestResult, Viewer, RECIPIENT_ALL};
use crate::store::Snapshot;
use serde::Serialize;
use std::collections::HashSet;

/// Batch ids a viewer is linked to through teaching, enrolment or children.
pub fn linked_batch_ids(snap: &Snapshot, viewer: &Viewer) -> HashSet<String> {
    let Some(uid) = viewer.user_id() else {
        return HashSet::new();
    };
    match viewer.role {
        Role::Admin => HashSet::new(),
        Role::Teacher => snap
            .batches
            .iter()
            .filter(|b| b.teacher_id == uid)
            .map(|b| b.id.clone())
            .collect(),
        Role::Student => snap
            .student(uid)
            .map(|s| s.batch_ids.iter().cloned().collect())
            .unwrap_or_default(),
        Role::Parent => children(snap, uid)
            .into_iter()
            .flat_map(|s| s.batch_ids.iter().cloned())
            .collect(),
    }
}

/// Children listed on the parent record, falling back to students that name
/// this parent.
pub fn children<'a>(snap: &'a Snapshot, parent_id: &str) -> Vec<&'a Student> {
    match snap.parent(parent_id) {
        Some(p) => snap
            .students
            .iter()
            .filter(|s| p.child_ids.contains(&s.id))
            .collect(),
        None => snap
            .students
            .iter()
            .filter(|s| s.parent_id.as_deref() == Some(parent_id))
            .collect(),
    }
}

pub fn can_view_student(snap: &Snapshot, viewer: &Viewer, student_id: &str) -> bool {
    match viewer.role {
        Role::Admin | Role::Teacher => true,
        Role::Student => viewer.user_id() == Some(student_id),
        Role::Parent => viewer
            .user_id()
            .map(|pid| children(snap, pid).iter().any(|s| s.id == student_id))
            .unwrap_or(false),
    }
}

pub fn notifications_for<'a>(snap: &'a Snapshot, viewer: &Viewer) -> Vec<&'a Notification> {
    let linked = linked_batch_ids(snap, viewer);
    let role = viewer.role.as_str();
    snap.notifications
        .iter()
        .filter(|n| {
            n.recipients.iter().any(|r| {
                r == RECIPIENT_ALL
                    || r == role
                    || linked.contains(r)
                    || (viewer.role == Role::Admin && snap.batch(r).is_some())
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildSummary {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub attendance_percent: u32,
    pub average_rank: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    #[serde(rename_all = "camelCase")]
    Admin {
        total_students: usize,
        total_batches: usize,
        today: DaySummary,
    },
    #[serde(rename_all = "camelCase")]
    Teacher {
        teacher_name: Option<String>,
        batches: Vec<Batch>,
        total_students: usize,
        today: DaySummary,
    },
    #[serde(rename_all = "camelCase")]
    Student {
        name: Option<String>,
        batches: Vec<Batch>,
        attendance_percent: u32,
        average_rank: u32,
    },
    #[serde(rename_all = "camelCase")]
    Parent {
        name: Option<String>,
        children: Vec<ChildSummary>,
    },
}

fn own_results<'a>(snap: &'a Snapshot, student_id: &str) -> Vec<&'a TestResult> {
    snap.test_results
        .iter()
        .filter(|r| r.student_id == student_id)
        .collect()
}

pub fn dashboard(snap: &Snapshot, viewer: &Viewer, today: &str) -> Dashboard {
    let uid = viewer.user_id().unwrap_or("");
    match viewer.role {
        Role::Admin => Dashboard::Admin {
            total_students: snap.students.len(),
            total_batches: snap.batches.len(),
            today: calc::today_attendance_summary(snap, today),
        },
        Role::Teacher => Dashboard::Teacher {
            teacher_name: snap
                .teacher(uid)
                .map(|t| t.name.clone())
                .or_else(|| {
                    snap.batches
                        .iter()
                        .find(|b| b.teacher_id == uid)
                        .map(|b| b.teacher_name.clone())
                }),
            batches: snap
                .batches
                .iter()
                .filter(|b| b.teacher_id == uid)
                .cloned()
                .collect(),
            total_students: snap.students.len(),
            today: calc::today_attendance_summary(snap, today),
        },
        Role::Student => {
            let student = snap.student(uid);
            Dashboard::Student {
                name: student.map(|s| s.name.clone()),
                batches: snap
                    .batches
                    .iter()
                    .filter(|b| student.map(|s| s.batch_ids.contains(&b.id)).unwrap_or(false))
                    .cloned()
                    .collect(),
                attendance_percent: calc::attendance_percentage(snap, uid, None),
                average_rank: calc::average_rank(&own_results(snap, uid), |r| r.overall_rank),
            }
        }
        Role::Parent => Dashboard::Parent {
            name: snap.parent(uid).map(|p| p.name.clone()),
            children: children(snap, uid)
                .into_iter()
                .map(|s| ChildSummary {
                    student_id: s.id.clone(),
                    name: s.name.clone(),
                    email: s.email.clone(),
                    attendance_percent: calc::attendance_percentage(snap, &s.id, None),
                    average_rank: calc::average_rank(&own_results(snap, &s.id), |r| {
                        r.overall_rank
                    }),
                })
                .collect(),
        },
    }
}
