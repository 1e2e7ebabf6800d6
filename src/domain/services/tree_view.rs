#[cfg(test)]
#[path = "tree_view_test.rs"]
mod tests;

use anyhow::Result;

use super::CourseSummary;
use super::ExplorerCache;
use crate::domain::models::parse_course_node_id;
use crate::domain::models::AssignmentState;
use crate::domain::models::TreeNode;

pub struct CourseBranch {
    pub course: TreeNode,
    pub summary: CourseSummary,
    /// `None` until the course's assignments have been loaded.
    pub children: Option<Vec<TreeNode>>,
}

pub fn state_icon(state: AssignmentState) -> &'static str {
    match state {
        AssignmentState::Submitted => return "●",
        AssignmentState::NotSubmitted | AssignmentState::Unknown => return "○",
    }
}

/// Snapshot of the explorer tree. With `expand_all` every course is loaded
/// first, otherwise only courses already in the cache show children.
pub async fn build_tree(explorer: &ExplorerCache, expand_all: bool) -> Result<Vec<CourseBranch>> {
    if expand_all {
        explorer.load_all_courses().await?;
    }

    let mut branches = vec![];
    for course in explorer.get_root_nodes().await {
        let course_id = parse_course_node_id(&course.id()).unwrap_or_default().to_string();
        let children = if explorer.has_loaded_assignments(&course_id).await {
            Some(explorer.get_children_nodes_by_id(&course.id()).await)
        } else {
            None
        };

        branches.push(CourseBranch {
            summary: explorer.course_summary(&course_id).await,
            course,
            children,
        });
    }

    return Ok(branches);
}

pub fn render_tree(branches: &[CourseBranch]) -> String {
    if branches.is_empty() {
        return "No courses found.".to_string();
    }

    let mut lines = vec![];
    for branch in branches {
        lines.push(format!("{} ({})", branch.course.name(), branch.course.id()));

        let children = match &branch.children {
            Some(children) => children,
            None => {
                lines.push("  (assignments not loaded, use --all)".to_string());
                continue;
            }
        };

        lines.push(format!(
            "  Submitted: {} | Not Submitted: {} | Total: {}",
            branch.summary.submitted, branch.summary.not_submitted, branch.summary.total
        ));

        for (idx, child) in children.iter().enumerate() {
            let connector = if idx + 1 == children.len() { "└──" } else { "├──" };
            lines.push(format!(
                "  {connector} {} {} ({})",
                state_icon(child.state()),
                child.name(),
                child.id()
            ));
        }
    }

    return lines.join("\n");
}
