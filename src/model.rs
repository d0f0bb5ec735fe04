use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub batch_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub student_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub batch_id: String,
    /// ISO calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub present: bool,
}

impl AttendanceRecord {
    /// Upsert identity: at most one record exists per (student, batch, date).
    pub fn same_slot(&self, other: &AttendanceRecord) -> bool {
        self.student_id == other.student_id
            && self.batch_id == other.batch_id
            && self.date == other.date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub id: String,
    pub name: String,
    pub batch_id: String,
    pub date: String,
    pub max_marks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,
    pub test_id: String,
    pub student_id: String,
    pub marks: u32,
    pub batch_rank: u32,
    pub overall_rank: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub date: String,
    #[serde(default)]
    pub read: bool,
    /// Role names, batch ids, or `all`.
    #[serde(default)]
    pub recipients: Vec<String>,
}

pub const RECIPIENT_ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub child_ids: Vec<String>,
}

/// Everything the store owns, in the shape it is seeded and backed up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub batches: Vec<Batch>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub parents: Vec<Parent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }

    /// Staff roles may create batches, tests, results, attendance and notices.
    pub fn can_manage(self) -> bool {
        matches!(self, Role::Admin | Role::Teacher)
    }
}

/// Capability token carried by every request. There is no ambient session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub role: Role,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Viewer {
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}
