#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AssignmentDetails;
use crate::domain::models::AssignmentFile;
use crate::domain::models::AssignmentRecord;
use crate::domain::models::Course;
use crate::domain::models::SessionStoreBox;
use crate::domain::models::SubmissionResult;
use crate::domain::models::SubmissionStatus;
use crate::domain::models::TutlyError;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EnrolledCoursesResponse {
    #[serde(default)]
    data: Option<Vec<Course>>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Attachment {
    #[serde(flatten)]
    assignment: AssignmentRecord,
    #[serde(default)]
    submissions: Option<Vec<Value>>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ClassAttachments {
    #[serde(default)]
    attachments: Vec<Attachment>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CourseAssignmentsResponse {
    #[serde(default)]
    classes: Vec<ClassAttachments>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionClass {
    course_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionAssignment {
    id: String,
    max_submissions: Option<i64>,
    class: SubmissionClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionRequest<'a> {
    assignment_details: SubmissionAssignment,
    files: &'a [AssignmentFile],
    mentor_details: &'a Value,
}

/// Unwraps `result.data.json`, falling back to `result.data` and then to the
/// raw body.
fn unwrap_envelope(body: Value) -> Value {
    for pointer in ["/result/data/json", "/result/data"] {
        if let Some(val) = body.pointer(pointer) {
            if !val.is_null() {
                return val.clone();
            }
        }
    }

    return body;
}

/// Client for the remote procedures served under `/trpc`.
pub struct ApiClient {
    url: String,
    user_agent: String,
    timeout: Duration,
    store: SessionStoreBox,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(url: &str, user_agent: &str, timeout: Duration, store: SessionStoreBox) -> ApiClient {
        return ApiClient {
            url: url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            timeout,
            store,
            client: reqwest::Client::new(),
        };
    }

    pub fn from_config(store: SessionStoreBox) -> ApiClient {
        return ApiClient::new(
            &Config::get(ConfigKey::ApiURL),
            &Config::get(ConfigKey::UserAgent),
            Config::request_timeout(),
            store,
        );
    }

    /// Calls a remote procedure. Queries (`GET`) carry the `{ json: input }`
    /// envelope in the `input` query parameter, mutations (`POST`) as the body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        procedure: &str,
        input: Option<Value>,
        method: Method,
    ) -> Result<T> {
        let envelope = json!({ "json": input.unwrap_or(Value::Null) });
        let url = format!("{url}/trpc/{procedure}", url = self.url);

        let mut req = self
            .client
            .request(method.clone(), url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json")
            .header("User-Agent", &self.user_agent);

        if method == Method::POST {
            req = req.body(serde_json::to_string(&envelope)?);
        } else {
            req = req.query(&[("input", serde_json::to_string(&envelope)?)]);
        }

        if let Some(session) = self.store.get_tokens().await? {
            req = req.header(
                "Authorization",
                format!("Bearer {token}", token = session.access_token),
            );
        }

        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .unwrap_or_else(|_| return "Unknown error".to_string());
            tracing::error!(procedure, status = status.as_u16(), body = %body, "Remote procedure failed");
            return Err(TutlyError::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body = res.json::<Value>().await?;
        tracing::debug!(procedure, "Remote procedure succeeded");

        return Ok(serde_json::from_value(unwrap_envelope(body))?);
    }

    pub async fn get_enrolled_courses(&self) -> Result<Vec<Course>> {
        let res: EnrolledCoursesResponse = self
            .request("courses.getEnrolledCourses", None, Method::GET)
            .await?;

        return Ok(res.data.unwrap_or_default());
    }

    /// Flattens every attachment of every class into one list, marking each
    /// solved when it carries at least one submission record.
    pub async fn get_course_assignments(&self, course_id: &str) -> Result<Vec<AssignmentRecord>> {
        let res: Vec<CourseAssignmentsResponse> = self
            .request(
                "assignments.getAllAssignmentsByCourseId",
                Some(json!({ "id": course_id })),
                Method::GET,
            )
            .await?;

        let assignments = res
            .into_iter()
            .flat_map(|course| return course.classes)
            .flat_map(|class| return class.attachments)
            .map(|attachment| {
                let solved = attachment
                    .submissions
                    .as_ref()
                    .map(|submissions| return !submissions.is_empty())
                    .unwrap_or(false);

                let mut assignment = attachment.assignment;
                assignment.status = if solved {
                    Some(SubmissionStatus::Solved)
                } else {
                    Some(SubmissionStatus::Unsolved)
                };

                return assignment;
            })
            .collect::<Vec<AssignmentRecord>>();

        return Ok(assignments);
    }

    pub async fn get_assignment_details(&self, assignment_id: &str) -> Result<AssignmentDetails> {
        return self
            .request(
                "assignments.getAssignmentDetailsForSubmission",
                Some(json!({ "id": assignment_id })),
                Method::GET,
            )
            .await;
    }

    /// Submits files with only the identity fields of the assignment the
    /// server needs to route the submission.
    pub async fn create_submission(
        &self,
        files: &[AssignmentFile],
        assignment: &AssignmentRecord,
        mentor_info: &Value,
    ) -> Result<SubmissionResult> {
        let req = SubmissionRequest {
            assignment_details: SubmissionAssignment {
                id: assignment.id.to_string(),
                max_submissions: assignment.max_submissions,
                class: SubmissionClass {
                    course_id: assignment.course_id().map(|id| return id.to_string()),
                },
            },
            files,
            mentor_details: mentor_info,
        };

        return self
            .request(
                "submissions.createSubmission",
                Some(serde_json::to_value(&req)?),
                Method::POST,
            )
            .await;
    }
}
