#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;

use super::build_tree;
use super::describe;
use super::render_tree;
use super::state_icon;
use super::AssignmentWorkflow;
use super::DeleteOutcome;
use super::EventsService;
use super::ExplorerCache;
use super::SessionManager;
use crate::domain::models::Action;
use crate::domain::models::Assignment;
use crate::domain::models::DialogBox;
use crate::domain::models::SearchFilter;
use crate::domain::models::TreeNode;
use crate::domain::models::TutlyError;
use crate::domain::models::UserStatus;
use crate::infrastructure::api::ApiClient;

const SIGN_IN_HINT: &str = "You are not signed in. Run `tutly signin` first.";

fn action_target(action: &Action) -> Option<&str> {
    match action {
        Action::Preview(id) | Action::Open(id) | Action::Submit(id) => return Some(id),
        Action::Delete { id, .. } => return Some(id),
        _ => return None,
    }
}

fn search_label(node: &TreeNode) -> String {
    let course = node
        .assignment()
        .and_then(|assignment| return assignment.course_name.as_deref())
        .unwrap_or_default();

    if course.is_empty() {
        return format!("{} {}", state_icon(node.state()), node.name());
    }
    return format!("{} {} - {}", state_icon(node.state()), node.name(), course);
}

/// Runs front-end actions against the session, explorer and assignment
/// workflow, reporting failures through the dialog and the debug log.
pub struct ActionsService {
    session: SessionManager,
    explorer: Arc<ExplorerCache>,
    workflow: AssignmentWorkflow,
    api: Arc<ApiClient>,
    dialog: DialogBox,
    events: EventsService,
    password: Option<String>,
}

impl ActionsService {
    pub fn new(
        session: SessionManager,
        explorer: Arc<ExplorerCache>,
        workflow: AssignmentWorkflow,
        api: Arc<ApiClient>,
        dialog: DialogBox,
        events: EventsService,
    ) -> ActionsService {
        return ActionsService {
            session,
            explorer,
            workflow,
            api,
            dialog,
            events,
            password: None,
        };
    }

    /// Password used instead of prompting, e.g. from `TUTLY_PASSWORD`.
    pub fn with_password(mut self, password: Option<String>) -> ActionsService {
        self.password = password.filter(|e| return !e.is_empty());
        return self;
    }

    /// Runs a single action. Returns false when it failed, after the failure
    /// has been reported.
    pub async fn run(&mut self, action: Action) -> bool {
        tracing::debug!(action = ?action, "Running action");
        let res = self.dispatch(&action).await;
        self.events.process_pending().await;

        let err = match res {
            Ok(()) => return true,
            Err(err) => err,
        };

        tracing::error!(action = ?action, error = ?err, "Action failed");
        self.dialog.error(&err.to_string());

        if TutlyError::is_not_found(&err) {
            if let Some(id) = action_target(&action) {
                if let Err(recover_err) = self.offer_discard(id).await {
                    tracing::error!(id, error = ?recover_err, "Unable to discard local folder");
                    self.dialog.error(&recover_err.to_string());
                }
            }
        }

        return false;
    }

    /// Drains whatever the last action queued, leaving the explorer in sync.
    pub async fn shutdown(mut self) {
        drop(self.session);
        drop(self.workflow);
        self.events.start().await;
    }

    async fn dispatch(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::SignIn(username) => return self.sign_in(username.as_deref()).await,
            Action::SignOut() => return self.sign_out().await,
            Action::Status() => return self.status().await,
            Action::Explorer { expand_all } => return self.explorer(*expand_all).await,
            Action::Preview(id) => return self.preview(id).await,
            Action::Open(id) => return self.open(id).await,
            Action::Delete { id, confirmed } => return self.delete(id, *confirmed).await,
            Action::Search(filter) => return self.search(*filter).await,
            Action::Submit(id) => return self.submit(id).await,
        }
    }

    async fn ensure_signed_in(&mut self) -> bool {
        let status = self.session.get_login_status().await;
        self.events.process_pending().await;
        return status == UserStatus::SignedIn;
    }

    async fn require_signed_in(&mut self) -> Result<()> {
        if !self.ensure_signed_in().await {
            return Err(TutlyError::Auth(SIGN_IN_HINT.to_string()).into());
        }

        return Ok(());
    }

    async fn prompt_credentials(&self, username: Option<&str>) -> Result<Option<(String, String)>> {
        let username = match username {
            Some(username) => Some(username.to_string()),
            None => self.dialog.input("Username", false).await?,
        };
        let username = match username {
            Some(username) => username.trim().to_string(),
            None => return Ok(None),
        };
        if username.is_empty() {
            return Err(TutlyError::Auth("Username cannot be empty".to_string()).into());
        }

        let password = match &self.password {
            Some(password) => Some(password.to_string()),
            None => self.dialog.input("Password", true).await?,
        };
        let password = match password {
            Some(password) => password,
            None => return Ok(None),
        };
        if password.is_empty() {
            return Err(TutlyError::Auth("Password cannot be empty".to_string()).into());
        }

        return Ok(Some((username, password)));
    }

    /// Prompts, logs in and waits for the explorer to catch up. A rejected
    /// login can be retried as long as the user keeps confirming.
    async fn sign_in(&mut self, username: Option<&str>) -> Result<()> {
        loop {
            let (name, password) = match self.prompt_credentials(username).await? {
                Some(credentials) => credentials,
                None => {
                    self.dialog.info("Sign in cancelled");
                    return Ok(());
                }
            };

            match self.session.sign_in(&name, &password).await {
                Ok(user) => {
                    self.events.process_pending().await;
                    self.dialog
                        .info(&format!("Successfully signed in as {}", user.username));
                    return Ok(());
                }
                Err(err) => {
                    let is_auth = matches!(
                        err.downcast_ref::<TutlyError>(),
                        Some(TutlyError::Auth(_))
                    );
                    if !is_auth || self.password.is_some() {
                        return Err(err);
                    }

                    tracing::warn!(username = %name, error = ?err, "Sign in rejected");
                    self.dialog.error(&err.to_string());
                    if !self.dialog.confirm("Try again?").await? {
                        bail!("Sign in failed");
                    }
                }
            }
        }
    }

    async fn sign_out(&mut self) -> Result<()> {
        self.session.sign_out().await?;
        self.events.process_pending().await;
        self.dialog.info("Signed out");
        return Ok(());
    }

    async fn status(&mut self) -> Result<()> {
        self.ensure_signed_in().await;
        match self.session.user().await {
            Some(user) => self.dialog.show(&format!("Tutly: {}", user.username)),
            None => self.dialog.show("Signed out"),
        }

        return Ok(());
    }

    async fn explorer(&mut self, expand_all: bool) -> Result<()> {
        self.require_signed_in().await?;

        let branches = build_tree(&self.explorer, expand_all).await?;
        self.dialog.show(&render_tree(&branches));
        return Ok(());
    }

    async fn preview(&mut self, id: &str) -> Result<()> {
        self.require_signed_in().await?;

        let details = self.api.get_assignment_details(id).await?;
        let record = match (details.assignment, details.error) {
            (Some(record), None) => record,
            (_, Some(error)) => return Err(TutlyError::NotFound(error).into()),
            (None, None) => {
                return Err(TutlyError::NotFound(format!("Assignment {id} no longer exists")).into())
            }
        };

        self.dialog.show(&describe(&record));
        return Ok(());
    }

    async fn open(&mut self, id: &str) -> Result<()> {
        self.require_signed_in().await?;

        let assignment = self.explorer.find_assignment(id).await?;
        self.open_assignment(&assignment).await?;
        return Ok(());
    }

    async fn open_assignment(&mut self, assignment: &Assignment) -> Result<()> {
        let folder = self.workflow.resolve(assignment).await?;
        tracing::info!(id = %assignment.id, folder = %folder.display(), "Assignment opened");
        return Ok(());
    }

    async fn delete(&mut self, id: &str, confirmed: bool) -> Result<()> {
        // Local folders can outlive their remote assignment.
        let assignment = if self.ensure_signed_in().await {
            match self.explorer.find_assignment(id).await {
                Ok(assignment) => assignment,
                Err(err) if TutlyError::is_not_found(&err) => Assignment::detached(id),
                Err(err) => return Err(err),
            }
        } else {
            Assignment::detached(id)
        };

        match self.workflow.delete(&assignment, confirmed).await? {
            DeleteOutcome::Deleted => {
                self.dialog
                    .info(&format!("Deleted assignment folder: {}", assignment.name));
            }
            DeleteOutcome::Cancelled => self.dialog.info("Delete cancelled"),
            DeleteOutcome::Missing => {}
        }

        return Ok(());
    }

    async fn search(&mut self, filter: SearchFilter) -> Result<()> {
        if !self.ensure_signed_in().await {
            if !self
                .dialog
                .confirm("You need to sign in to search assignments. Sign in now?")
                .await?
            {
                return Ok(());
            }

            self.sign_in(None).await?;
            if self.session.status().await != UserStatus::SignedIn {
                return Ok(());
            }
        }

        self.explorer.load_all_courses().await?;
        let nodes = match filter {
            SearchFilter::All => self.explorer.get_all_nodes().await,
            SearchFilter::Solved => self.explorer.get_solved_nodes().await,
            SearchFilter::Unsolved => self.explorer.get_unsolved_nodes().await,
        };

        if nodes.is_empty() {
            self.dialog.info("No assignments found.");
            return Ok(());
        }

        let items = nodes.iter().map(search_label).collect::<Vec<String>>();
        let idx = match self.dialog.pick("Select an assignment", &items).await? {
            Some(idx) => idx,
            None => return Ok(()),
        };

        match nodes.get(idx).and_then(|node| return node.assignment()) {
            Some(assignment) => {
                let assignment = assignment.clone();
                return self.open_assignment(&assignment).await;
            }
            None => bail!(format!("Invalid selection {idx}")),
        }
    }

    async fn submit(&mut self, id: &str) -> Result<()> {
        self.require_signed_in().await?;

        let assignment = self.explorer.find_assignment(id).await?;
        self.workflow.submit(&assignment).await?;

        self.dialog
            .info(&format!("Submitted assignment: {}", assignment.name));
        return Ok(());
    }

    async fn offer_discard(&self, id: &str) -> Result<()> {
        match self.workflow.folder_for(id) {
            Ok(folder) if folder.exists() => {}
            _ => return Ok(()),
        }

        let confirmed = self
            .dialog
            .confirm(&format!(
                "Assignment {id} no longer exists. Discard its local folder?"
            ))
            .await?;
        if confirmed && self.workflow.discard(id).await? {
            self.dialog.info(&format!("Discarded local folder for {id}"));
        }

        return Ok(());
    }
}
