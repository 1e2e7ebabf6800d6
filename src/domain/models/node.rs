#[cfg(test)]
#[path = "node_test.rs"]
mod tests;

use super::Assignment;
use super::AssignmentState;
use super::Course;

const COURSE_NODE_PREFIX: &str = "course.";

/// Explorer tree entry. Built on demand from cached data and never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeNode {
    Course(Course),
    Assignment(Assignment),
}

impl TreeNode {
    /// Course nodes use the synthetic `course.<courseId>` identifier,
    /// assignment nodes their raw identifier.
    pub fn id(&self) -> String {
        match self {
            TreeNode::Course(course) => return course_node_id(&course.id),
            TreeNode::Assignment(assignment) => return assignment.id.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::Course(course) => return &course.title,
            TreeNode::Assignment(assignment) => return &assignment.name,
        }
    }

    pub fn is_assignment(&self) -> bool {
        return matches!(self, TreeNode::Assignment(_));
    }

    pub fn state(&self) -> AssignmentState {
        match self {
            TreeNode::Course(_) => return AssignmentState::Unknown,
            TreeNode::Assignment(assignment) => return assignment.state,
        }
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            TreeNode::Course(_) => return None,
            TreeNode::Assignment(assignment) => return Some(assignment),
        }
    }
}

pub fn course_node_id(course_id: &str) -> String {
    return format!("{COURSE_NODE_PREFIX}{course_id}");
}

/// Extracts the course identifier from a `course.<courseId>` node identifier.
pub fn parse_course_node_id(id: &str) -> Option<&str> {
    return id
        .strip_prefix(COURSE_NODE_PREFIX)
        .filter(|course_id| return !course_id.is_empty());
}
