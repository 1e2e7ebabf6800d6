#[cfg(test)]
#[path = "explorer_test.rs"]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::domain::models::parse_course_node_id;
use crate::domain::models::Assignment;
use crate::domain::models::AssignmentState;
use crate::domain::models::Course;
use crate::domain::models::TreeNode;
use crate::domain::models::TutlyError;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::AuthClient;

/// Outcome of a cache refresh. Refresh never fails, callers decide whether
/// to surface anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshStatus {
    Loaded(usize),
    SignedOut,
    Failed(String),
    /// The cache was cleared while courses were being fetched.
    Cancelled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CourseSummary {
    pub submitted: usize,
    pub not_submitted: usize,
    pub total: usize,
}

#[derive(Default)]
struct ExplorerState {
    courses: HashMap<String, Course>,
    course_order: Vec<String>,
    assignments: HashMap<String, Assignment>,
    assignment_order: Vec<String>,
    // Presence of a key marks the course as loaded.
    assignments_by_course: HashMap<String, Vec<String>>,
    generation: u64,
}

impl ExplorerState {
    fn reset(&mut self) {
        self.courses.clear();
        self.course_order.clear();
        self.assignments.clear();
        self.assignment_order.clear();
        self.assignments_by_course.clear();
        self.generation += 1;
    }

    fn course_assignments(&self, course_id: &str) -> Vec<Assignment> {
        return self
            .assignments_by_course
            .get(course_id)
            .map(|ids| {
                return ids
                    .iter()
                    .filter_map(|id| return self.assignments.get(id).cloned())
                    .collect::<Vec<Assignment>>();
            })
            .unwrap_or_default();
    }

    fn remove_assignment(&mut self, id: &str) {
        if let Some(previous) = self.assignments.remove(id) {
            if let Some(ids) = self.assignments_by_course.get_mut(&previous.course_id) {
                ids.retain(|existing| return existing != id);
            }
        }
        self.assignment_order.retain(|existing| return existing != id);
    }

    fn insert_course_assignments(&mut self, course_id: &str, assignments: &[Assignment]) {
        let mut ids = vec![];
        for assignment in assignments {
            // Identifiers are unique across courses, the newest owner wins.
            self.remove_assignment(&assignment.id);
            self.assignments
                .insert(assignment.id.to_string(), assignment.clone());
            self.assignment_order.push(assignment.id.to_string());
            ids.push(assignment.id.to_string());
        }

        self.assignments_by_course.insert(course_id.to_string(), ids);
    }

    fn assignment_nodes<F: Fn(&Assignment) -> bool>(&self, predicate: F) -> Vec<TreeNode> {
        return self
            .assignment_order
            .iter()
            .filter_map(|id| return self.assignments.get(id))
            .filter(|assignment| return predicate(assignment))
            .map(|assignment| return TreeNode::Assignment(assignment.clone()))
            .collect();
    }
}

/// In-memory tree of courses and their lazily fetched assignments.
///
/// Courses are loaded on `refresh`. A course's assignments are fetched the
/// first time they are asked for and then kept until the course is
/// invalidated or the whole cache is cleared.
pub struct ExplorerCache {
    api: Arc<ApiClient>,
    auth: Arc<AuthClient>,
    state: RwLock<ExplorerState>,
    course_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ExplorerCache {
    pub fn new(api: Arc<ApiClient>, auth: Arc<AuthClient>) -> ExplorerCache {
        return ExplorerCache {
            api,
            auth,
            state: RwLock::new(ExplorerState::default()),
            course_locks: DashMap::new(),
        };
    }

    pub async fn refresh(&self) -> RefreshStatus {
        let generation = {
            let mut state = self.state.write().await;
            state.reset();
            state.generation
        };

        if !self.auth.is_authenticated().await {
            tracing::debug!("Skipping explorer refresh, no signed in user");
            return RefreshStatus::SignedOut;
        }

        let courses = match self.api.get_enrolled_courses().await {
            Ok(courses) => courses,
            Err(err) => {
                tracing::error!(error = ?err, "Failed to refresh courses");
                return RefreshStatus::Failed(err.to_string());
            }
        };

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!("Cache was cleared during refresh, discarding courses");
            return RefreshStatus::Cancelled;
        }

        for course in courses {
            if !state.courses.contains_key(&course.id) {
                state.course_order.push(course.id.to_string());
            }
            state.courses.insert(course.id.to_string(), course);
        }

        tracing::info!(courses = state.course_order.len(), "Explorer refreshed");
        return RefreshStatus::Loaded(state.course_order.len());
    }

    pub async fn clear(&self) {
        self.state.write().await.reset();
    }

    /// Drops the cached assignments of one course so the next load fetches
    /// them again.
    pub async fn invalidate(&self, course_id: &str) {
        let mut state = self.state.write().await;
        if let Some(ids) = state.assignments_by_course.remove(course_id) {
            for id in ids {
                state.assignments.remove(&id);
                state.assignment_order.retain(|existing| return existing != &id);
            }
        }
    }

    /// Returns the course's assignments, fetching them at most once. Concurrent
    /// callers for the same course share a single fetch.
    pub async fn load_course_assignments(&self, course_id: &str) -> Result<Vec<Assignment>> {
        let lock = self
            .course_locks
            .entry(course_id.to_string())
            .or_default()
            .value()
            .clone();
        let _guard = lock.lock().await;

        let (generation, course_name) = {
            let state = self.state.read().await;
            if state.assignments_by_course.contains_key(course_id) {
                return Ok(state.course_assignments(course_id));
            }

            (
                state.generation,
                state
                    .courses
                    .get(course_id)
                    .map(|course| return course.title.to_string()),
            )
        };

        let records = self.api.get_course_assignments(course_id).await?;
        let assignments = records
            .into_iter()
            .map(|record| {
                return Assignment::from_record(record, course_id, course_name.as_deref());
            })
            .collect::<Vec<Assignment>>();

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(course_id, "Cache was cleared during load, discarding");
            return Ok(assignments);
        }

        state.insert_course_assignments(course_id, &assignments);
        tracing::debug!(course_id, assignments = assignments.len(), "Loaded course assignments");

        return Ok(assignments);
    }

    pub async fn load_all_courses(&self) -> Result<()> {
        let course_ids = self.state.read().await.course_order.clone();
        for course_id in course_ids {
            self.load_course_assignments(&course_id).await?;
        }

        return Ok(());
    }

    /// Looks an assignment up in the cache, loading courses one at a time
    /// until it turns up.
    pub async fn find_assignment(&self, id: &str) -> Result<Assignment> {
        if let Some(assignment) = self.get_assignment(id).await {
            return Ok(assignment);
        }

        let course_ids = self.state.read().await.course_order.clone();
        for course_id in course_ids {
            if self.has_loaded_assignments(&course_id).await {
                continue;
            }

            let assignments = self.load_course_assignments(&course_id).await?;
            if let Some(assignment) = assignments.into_iter().find(|e| return e.id == id) {
                return Ok(assignment);
            }
        }

        return Err(TutlyError::NotFound(format!("Assignment {id} was not found in any course")).into());
    }

    pub async fn get_root_nodes(&self) -> Vec<TreeNode> {
        let state = self.state.read().await;
        return state
            .course_order
            .iter()
            .filter_map(|id| return state.courses.get(id))
            .map(|course| return TreeNode::Course(course.clone()))
            .collect();
    }

    /// Children of a `course.<courseId>` node. Any other identifier has none.
    pub async fn get_children_nodes_by_id(&self, id: &str) -> Vec<TreeNode> {
        let course_id = match parse_course_node_id(id) {
            Some(course_id) => course_id,
            None => return vec![],
        };

        return self
            .state
            .read()
            .await
            .course_assignments(course_id)
            .into_iter()
            .map(TreeNode::Assignment)
            .collect();
    }

    pub async fn get_node_by_id(&self, id: &str) -> Option<TreeNode> {
        let state = self.state.read().await;
        if let Some(course_id) = parse_course_node_id(id) {
            return state.courses.get(course_id).cloned().map(TreeNode::Course);
        }

        return state.assignments.get(id).cloned().map(TreeNode::Assignment);
    }

    pub async fn get_assignment(&self, id: &str) -> Option<Assignment> {
        return self.state.read().await.assignments.get(id).cloned();
    }

    pub async fn get_all_nodes(&self) -> Vec<TreeNode> {
        return self.state.read().await.assignment_nodes(|_| return true);
    }

    pub async fn get_unsolved_nodes(&self) -> Vec<TreeNode> {
        return self
            .state
            .read()
            .await
            .assignment_nodes(|e| return e.state != AssignmentState::Submitted);
    }

    pub async fn get_solved_nodes(&self) -> Vec<TreeNode> {
        return self
            .state
            .read()
            .await
            .assignment_nodes(|e| return e.state == AssignmentState::Submitted);
    }

    pub async fn has_loaded_assignments(&self, course_id: &str) -> bool {
        return self
            .state
            .read()
            .await
            .assignments_by_course
            .contains_key(course_id);
    }

    pub async fn has_courses(&self) -> bool {
        return !self.state.read().await.courses.is_empty();
    }

    /// Submission counts across the cached assignments of a course.
    pub async fn course_summary(&self, course_id: &str) -> CourseSummary {
        let assignments = self.state.read().await.course_assignments(course_id);

        let mut summary = CourseSummary {
            total: assignments.len(),
            ..CourseSummary::default()
        };
        for assignment in assignments {
            match assignment.state {
                AssignmentState::Submitted => summary.submitted += 1,
                AssignmentState::NotSubmitted => summary.not_submitted += 1,
                AssignmentState::Unknown => {}
            }
        }

        return summary;
    }
}
