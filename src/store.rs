use crate::model::{
    AttendanceRecord, Batch, Dataset, Notification, Parent, Student, Teacher, Test, TestResult,
};
use std::sync::Arc;

/// Immutable view of every collection at one instant. Cloning is cheap and a
/// held snapshot never observes later mutations.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub students: Arc<Vec<Student>>,
    pub batches: Arc<Vec<Batch>>,
    pub attendance: Arc<Vec<AttendanceRecord>>,
    pub tests: Arc<Vec<Test>>,
    pub test_results: Arc<Vec<TestResult>>,
    pub notifications: Arc<Vec<Notification>>,
    pub teachers: Arc<Vec<Teacher>>,
    pub parents: Arc<Vec<Parent>>,
}

impl Snapshot {
    pub fn from_dataset(ds: Dataset) -> Self {
        Self {
            students: Arc::new(ds.students),
            batches: Arc::new(ds.batches),
            attendance: Arc::new(ds.attendance),
            tests: Arc::new(ds.tests),
            test_results: Arc::new(ds.test_results),
            notifications: Arc::new(ds.notifications),
            teachers: Arc::new(ds.teachers),
            parents: Arc::new(ds.parents),
        }
    }

    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            students: self.students.to_vec(),
            batches: self.batches.to_vec(),
            attendance: self.attendance.to_vec(),
            tests: self.tests.to_vec(),
            test_results: self.test_results.to_vec(),
            notifications: self.notifications.to_vec(),
            teachers: self.teachers.to_vec(),
            parents: self.parents.to_vec(),
        }
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn batch(&self, id: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id == id)
    }

    pub fn test(&self, id: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.id == id)
    }

    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    pub fn parent(&self, id: &str) -> Option<&Parent> {
        self.parents.iter().find(|p| p.id == id)
    }
}

/// Sole owner of the entity collections. Every mutation builds a new
/// collection value and swaps it in; nothing is edited behind a reader.
#[derive(Debug, Default)]
pub struct EntityStore {
    current: Snapshot,
}

impl EntityStore {
    pub fn new(ds: Dataset) -> Self {
        Self {
            current: Snapshot::from_dataset(ds),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.current.clone()
    }

    pub fn replace_all(&mut self, ds: Dataset) {
        self.current = Snapshot::from_dataset(ds);
    }

    pub fn add_batch(&mut self, batch: Batch) {
        let mut next = self.current.batches.to_vec();
        next.push(batch);
        self.current.batches = Arc::new(next);
    }

    /// Appends the student and lists it on every named batch roster that
    /// does not already carry it.
    pub fn add_student(&mut self, student: Student) {
        let roster_changed = self.current.batches.iter().any(|b| {
            student.batch_ids.contains(&b.id) && !b.student_ids.contains(&student.id)
        });
        if roster_changed {
            let batches = self
                .current
                .batches
                .iter()
                .map(|b| {
                    let mut b = b.clone();
                    if student.batch_ids.contains(&b.id) && !b.student_ids.contains(&student.id) {
                        b.student_ids.push(student.id.clone());
                    }
                    b
                })
                .collect();
            self.current.batches = Arc::new(batches);
        }

        let mut next = self.current.students.to_vec();
        next.push(student);
        self.current.students = Arc::new(next);
    }

    pub fn add_test(&mut self, test: Test) {
        let mut next = self.current.tests.to_vec();
        next.push(test);
        self.current.tests = Arc::new(next);
    }

    pub fn add_test_results(&mut self, results: Vec<TestResult>) {
        let mut next = self.current.test_results.to_vec();
        next.extend(results);
        self.current.test_results = Arc::new(next);
    }

    /// Upserts by (student, batch, date). Replaced records keep their position;
    /// inputs apply in order so a later duplicate wins.
    pub fn update_attendance(&mut self, records: Vec<AttendanceRecord>) {
        let mut next = self.current.attendance.to_vec();
        for record in records {
            match next.iter().position(|r| r.same_slot(&record)) {
                Some(idx) => next[idx] = record,
                None => next.push(record),
            }
        }
        self.current.attendance = Arc::new(next);
    }

    /// Returns whether a notification matched. Unknown ids are a no-op.
    pub fn mark_notification_read(&mut self, id: &str) -> bool {
        if !self.current.notifications.iter().any(|n| n.id == id) {
            return false;
        }
        let next = self
            .current
            .notifications
            .iter()
            .map(|n| {
                if n.id == id {
                    Notification {
                        read: true,
                        ..n.clone()
                    }
                } else {
                    n.clone()
                }
            })
            .collect();
        self.current.notifications = Arc::new(next);
        true
    }

    /// Newest first: the notification goes to index 0.
    pub fn add_notification(&mut self, notification: Notification) {
        let mut next = Vec::with_capacity(self.current.notifications.len() + 1);
        next.push(notification);
        next.extend(self.current.notifications.iter().cloned());
        self.current.notifications = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(student: &str, batch: &str, date: &str, present: bool) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("att-{}-{}-{}", student, batch, date),
            student_id: student.to_string(),
            batch_id: batch.to_string(),
            date: date.to_string(),
            present,
        }
    }

    fn notice(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            title: format!("title {}", id),
            message: String::new(),
            date: "2025-11-20".to_string(),
            read: false,
            recipients: vec!["all".to_string()],
        }
    }

    #[test]
    fn update_attendance_replaces_matching_slot() {
        let mut store = EntityStore::default();
        store.update_attendance(vec![record("s1", "b1", "2025-11-01", true)]);
        store.update_attendance(vec![record("s1", "b1", "2025-11-01", false)]);

        let snap = store.snapshot();
        assert_eq!(snap.attendance.len(), 1);
        assert!(!snap.attendance[0].present);
    }

    #[test]
    fn update_attendance_keeps_position_and_later_duplicate_wins() {
        let mut store = EntityStore::default();
        store.update_attendance(vec![
            record("s1", "b1", "2025-11-01", true),
            record("s2", "b1", "2025-11-01", true),
            record("s3", "b1", "2025-11-01", true),
        ]);
        store.update_attendance(vec![
            record("s2", "b1", "2025-11-01", false),
            record("s4", "b1", "2025-11-01", true),
            record("s2", "b1", "2025-11-01", true),
            record("s4", "b1", "2025-11-01", false),
        ]);

        let snap = store.snapshot();
        let order: Vec<(&str, bool)> = snap
            .attendance
            .iter()
            .map(|r| (r.student_id.as_str(), r.present))
            .collect();
        assert_eq!(
            order,
            vec![("s1", true), ("s2", true), ("s3", true), ("s4", false)]
        );
    }

    #[test]
    fn snapshots_are_not_affected_by_later_mutations() {
        let mut store = EntityStore::default();
        store.update_attendance(vec![record("s1", "b1", "2025-11-01", true)]);
        let before = store.snapshot();
        store.update_attendance(vec![record("s1", "b1", "2025-11-01", false)]);
        store.add_notification(notice("n1"));

        assert!(before.attendance[0].present);
        assert!(before.notifications.is_empty());
        assert!(!store.snapshot().attendance[0].present);
    }

    #[test]
    fn add_notification_prepends() {
        let mut store = EntityStore::default();
        store.add_notification(notice("n1"));
        store.add_notification(notice("n2"));
        store.add_notification(notice("n3"));
        let ids: Vec<String> = store
            .snapshot()
            .notifications
            .iter()
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(ids, vec!["n3", "n2", "n1"]);
    }

    #[test]
    fn mark_notification_read_only_touches_match() {
        let mut store = EntityStore::default();
        store.add_notification(notice("n1"));
        store.add_notification(notice("n2"));

        assert!(store.mark_notification_read("n1"));
        assert!(!store.mark_notification_read("missing"));

        let snap = store.snapshot();
        assert!(snap.notifications.iter().find(|n| n.id == "n1").unwrap().read);
        assert!(!snap.notifications.iter().find(|n| n.id == "n2").unwrap().read);
    }

    #[test]
    fn add_student_joins_named_batch_rosters() {
        let mut store = EntityStore::new(Dataset {
            batches: vec![Batch {
                id: "b1".to_string(),
                name: "Maths".to_string(),
                teacher_id: "t1".to_string(),
                teacher_name: "Dr. Sarah Johnson".to_string(),
                schedule: String::new(),
                student_ids: vec!["s1".to_string()],
            }],
            ..Dataset::default()
        });
        store.add_student(Student {
            id: "s2".to_string(),
            name: "Diya Reddy".to_string(),
            contact: String::new(),
            email: String::new(),
            batch_ids: vec!["b1".to_string(), "b9".to_string()],
            parent_id: None,
        });

        let snap = store.snapshot();
        assert_eq!(snap.students.len(), 1);
        assert_eq!(snap.batch("b1").unwrap().student_ids, vec!["s1", "s2"]);
    }

    #[test]
    fn append_operations_extend_in_order() {
        let mut store = EntityStore::default();
        store.add_test(Test {
            id: "test1".to_string(),
            name: "Unit 1".to_string(),
            batch_id: "b1".to_string(),
            date: "2025-11-01".to_string(),
            max_marks: 50,
        });
        store.add_test_results(vec![
            TestResult {
                id: "r1".to_string(),
                test_id: "test1".to_string(),
                student_id: "s1".to_string(),
                marks: 40,
                batch_rank: 1,
                overall_rank: 1,
            },
            TestResult {
                id: "r2".to_string(),
                test_id: "test1".to_string(),
                student_id: "s2".to_string(),
                marks: 30,
                batch_rank: 2,
                overall_rank: 2,
            },
        ]);
        let snap = store.snapshot();
        assert_eq!(snap.tests.len(), 1);
        assert_eq!(snap.test_results[1].id, "r2");
    }
}
