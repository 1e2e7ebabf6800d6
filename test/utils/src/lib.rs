use serde_json::json;
use serde_json::Value;

/// tRPC response for `courses.getEnrolledCourses` with a single course.
pub fn enrolled_courses_fixture() -> Value {
    return json!({
        "result": {
            "data": {
                "json": {
                    "success": true,
                    "data": [
                        { "id": "CS101", "title": "Intro to Programming" }
                    ]
                }
            }
        }
    });
}

/// tRPC response for `assignments.getAllAssignmentsByCourseId`. The first
/// attachment carries a submission record, the second does not.
pub fn course_assignments_fixture() -> Value {
    return json!({
        "result": {
            "data": {
                "json": [
                    {
                        "id": "CS101",
                        "classes": [
                            {
                                "attachments": [
                                    {
                                        "id": "a-1",
                                        "title": "Hello World",
                                        "details": "Print hello world.",
                                        "maxSubmissions": 3,
                                        "submissions": [
                                            { "id": "s-1", "points": [] }
                                        ]
                                    }
                                ]
                            },
                            {
                                "attachments": [
                                    {
                                        "id": "a-2",
                                        "title": "Fizz Buzz",
                                        "details": null,
                                        "maxSubmissions": 1,
                                        "submissions": []
                                    }
                                ]
                            }
                        ]
                    }
                ]
            }
        }
    });
}

/// `/auth/get-session` body for the user `jdoe`.
pub fn session_fixture(token: &str, expires_at: &str) -> Value {
    return json!({
        "user": {
            "id": "u-1",
            "email": "jdoe@example.com",
            "name": "Jane Doe",
            "username": "jdoe",
            "role": "STUDENT",
            "organizationId": "org-1",
            "organization": { "id": "org-1", "orgCode": "TUT", "name": "Tutly" }
        },
        "session": {
            "id": "sess-1",
            "token": token,
            "expiresAt": expires_at,
            "userId": "u-1"
        }
    });
}
