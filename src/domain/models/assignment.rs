#[cfg(test)]
#[path = "assignment_test.rs"]
mod tests;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::Course;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum AssignmentState {
    Submitted,
    NotSubmitted,
    Unknown,
}

/// Submission status the API client derives from an attachment's submission
/// records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Solved,
    Unsolved,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub title: String,
    pub course_id: Option<String>,
    pub course: Option<Course>,
}

/// Assignment as the remote API describes it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub max_submissions: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubmissionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassRecord>,
}

impl AssignmentRecord {
    pub fn state(&self) -> AssignmentState {
        match self.status {
            Some(SubmissionStatus::Solved) => return AssignmentState::Submitted,
            Some(SubmissionStatus::Unsolved) => return AssignmentState::NotSubmitted,
            None => return AssignmentState::Unknown,
        }
    }

    pub fn course_id(&self) -> Option<&str> {
        return self
            .class
            .as_ref()
            .and_then(|class| return class.course_id.as_deref());
    }
}

/// Cached assignment, denormalized with its owning course for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub id: String,
    pub name: String,
    pub state: AssignmentState,
    pub course_id: String,
    pub course_name: Option<String>,
    pub details: Option<String>,
    pub max_submissions: Option<i64>,
}

impl Assignment {
    pub fn from_record(record: AssignmentRecord, course_id: &str, course_name: Option<&str>) -> Assignment {
        let state = record.state();
        return Assignment {
            id: record.id,
            name: record.title,
            state,
            course_id: course_id.to_string(),
            course_name: course_name.map(|name| return name.to_string()),
            details: record.details,
            max_submissions: record.max_submissions,
        };
    }

    /// Stand-in for an assignment known only by its identifier, used when the
    /// remote record can no longer be found.
    pub fn detached(id: &str) -> Assignment {
        return Assignment {
            id: id.to_string(),
            name: id.to_string(),
            state: AssignmentState::Unknown,
            course_id: "".to_string(),
            course_name: None,
            details: None,
            max_submissions: None,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentFile {
    pub path: String,
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetails {
    #[serde(default)]
    pub assignment: Option<AssignmentRecord>,
    #[serde(default, rename = "mentorDetails")]
    pub mentor_info: Value,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}
