#[cfg(test)]
#[path = "descriptions_test.rs"]
mod tests;

use crate::domain::models::AssignmentRecord;

/// Markdown description shown by `preview`.
pub fn describe(assignment: &AssignmentRecord) -> String {
    let mut description = format!("# {}\n\n", assignment.title);

    if let Some(details) = assignment.details.as_deref().filter(|e| return !e.is_empty()) {
        description.push_str(&format!("## Description\n\n{details}\n\n"));
    }

    if let Some(max_submissions) = assignment.max_submissions.filter(|e| return *e > 0) {
        description.push_str(&format!("**Max Submissions:** {max_submissions}\n\n"));
    }

    if let Some(class) = &assignment.class {
        description.push_str(&format!("**Class:** {}\n\n", class.title));
        if let Some(course) = &class.course {
            description.push_str(&format!("**Course:** {}\n\n", course.title));
        }
    }

    return description;
}
