#[cfg(test)]
#[path = "assignments_test.rs"]
mod tests;

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;
use tokio::sync::mpsc;
use walkdir::DirEntry;
use walkdir::WalkDir;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Assignment;
use crate::domain::models::AssignmentFile;
use crate::domain::models::DialogBox;
use crate::domain::models::DownloaderBox;
use crate::domain::models::Event;
use crate::domain::models::SubmissionResult;
use crate::domain::models::TutlyError;
use crate::domain::models::WorkspaceBox;
use crate::infrastructure::api::ApiClient;

const SKIPPED_DIRS: [&str; 2] = [".git", "node_modules"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
    Missing,
}

/// Keeps only characters that are safe in a folder name on every platform.
pub fn sanitize_folder_name(id: &str) -> String {
    return id
        .chars()
        .filter(|c| return c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
}

fn is_skipped(entry: &DirEntry) -> bool {
    return entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| return SKIPPED_DIRS.contains(&name))
            .unwrap_or(false);
}

/// Reads every UTF-8 file under `folder`, with paths relative to it.
pub fn collect_files(folder: &Path) -> Result<Vec<AssignmentFile>> {
    let mut files = vec![];
    let walker = WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| return !is_skipped(entry));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(folder)?;
        let path = relative
            .components()
            .map(|part| return part.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<String>>()
            .join("/");

        match std::fs::read_to_string(entry.path()) {
            Ok(content) => files.push(AssignmentFile { path, content }),
            Err(err) => {
                tracing::warn!(path = %path, error = ?err, "Skipping unreadable file");
            }
        }
    }

    return Ok(files);
}

/// Removes version control metadata, whether `.git` is a directory or a
/// `gitdir:` pointer file.
async fn remove_git_metadata(folder: &Path) -> Result<()> {
    let git_path = folder.join(".git");
    let metadata = match fs::symlink_metadata(&git_path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(&git_path).await?;
    } else {
        fs::remove_file(&git_path).await?;
    }

    return Ok(());
}

async fn remove_partial(path: &Path) {
    if !path.exists() {
        return;
    }

    if let Err(err) = fs::remove_dir_all(path).await {
        tracing::error!(error = ?err, path = %path.display(), "Unable to remove partial download");
    }
}

/// Download-or-open flow for local assignment folders, one folder per
/// assignment identifier under the base directory.
pub struct AssignmentWorkflow {
    base_dir: PathBuf,
    repo_url: String,
    downloader: DownloaderBox,
    workspace: WorkspaceBox,
    dialog: DialogBox,
    api: Arc<ApiClient>,
    tx: mpsc::UnboundedSender<Event>,
}

impl AssignmentWorkflow {
    pub fn new(
        base_dir: PathBuf,
        repo_url: &str,
        downloader: DownloaderBox,
        workspace: WorkspaceBox,
        dialog: DialogBox,
        api: Arc<ApiClient>,
        tx: mpsc::UnboundedSender<Event>,
    ) -> AssignmentWorkflow {
        return AssignmentWorkflow {
            base_dir,
            repo_url: repo_url.to_string(),
            downloader,
            workspace,
            dialog,
            api,
            tx,
        };
    }

    pub fn from_config(
        downloader: DownloaderBox,
        workspace: WorkspaceBox,
        dialog: DialogBox,
        api: Arc<ApiClient>,
        tx: mpsc::UnboundedSender<Event>,
    ) -> AssignmentWorkflow {
        return AssignmentWorkflow::new(
            PathBuf::from(Config::get(ConfigKey::AssignmentsDir)),
            &Config::get(ConfigKey::ScaffoldRepoURL),
            downloader,
            workspace,
            dialog,
            api,
            tx,
        );
    }

    /// Folder of an assignment. Identifiers that are not already safe folder
    /// names are rejected so that no two assignments share a folder.
    pub fn folder_for(&self, assignment_id: &str) -> Result<PathBuf> {
        let name = sanitize_folder_name(assignment_id);
        if name.is_empty() || name != assignment_id {
            bail!(format!("Invalid assignment id '{assignment_id}'"));
        }

        return Ok(self.base_dir.join(name));
    }

    fn staging_folder_for(&self, assignment_id: &str) -> PathBuf {
        return self
            .base_dir
            .join(format!(".{assignment_id}.{}.download", std::process::id()));
    }

    fn emit_changed(&self, assignment_id: &str) {
        if let Err(err) = self
            .tx
            .send(Event::ExplorerChanged(Some(assignment_id.to_string())))
        {
            tracing::warn!(error = ?err, "No listener for explorer change");
        }
    }

    async fn stage(&self, staging: &Path) -> Result<()> {
        self.downloader.download(&self.repo_url, staging).await?;
        remove_git_metadata(staging).await?;
        return Ok(());
    }

    /// Opens the assignment folder, cloning the scaffold first when it does
    /// not exist yet. An existing folder is opened as is.
    ///
    /// The clone is prepared in a staging folder next to the target and only
    /// moved into place once complete. A failure never leaves a partial
    /// folder and never touches a folder created by someone else.
    pub async fn resolve(&self, assignment: &Assignment) -> Result<PathBuf> {
        let folder = self.folder_for(&assignment.id)?;
        if folder.exists() {
            tracing::debug!(id = %assignment.id, folder = %folder.display(), "Opening existing folder");
            self.workspace.open_folder(&folder).await?;
            return Ok(folder);
        }

        fs::create_dir_all(&self.base_dir).await?;
        self.dialog
            .info(&format!("Downloading assignment: {}", assignment.name));

        let staging = self.staging_folder_for(&assignment.id);
        remove_partial(&staging).await;

        if let Err(err) = self.stage(&staging).await {
            remove_partial(&staging).await;

            tracing::error!(id = %assignment.id, error = ?err, "Download failed");
            if err.downcast_ref::<TutlyError>().is_some() {
                return Err(err);
            }
            return Err(TutlyError::Download(format!("Failed to download assignment: {err}")).into());
        }

        if folder.exists() {
            remove_partial(&staging).await;
            return Err(TutlyError::Download(format!(
                "Folder already exists: {}",
                folder.display()
            ))
            .into());
        }

        if let Err(err) = fs::rename(&staging, &folder).await {
            remove_partial(&staging).await;
            tracing::error!(id = %assignment.id, error = ?err, "Unable to move download into place");
            return Err(TutlyError::Download(format!("Failed to download assignment: {err}")).into());
        }

        self.workspace.open_folder(&folder).await?;
        self.emit_changed(&assignment.id);
        tracing::info!(id = %assignment.id, folder = %folder.display(), "Assignment downloaded");

        return Ok(folder);
    }

    /// Removes the local folder after confirmation. `confirmed` skips the
    /// prompt.
    pub async fn delete(&self, assignment: &Assignment, confirmed: bool) -> Result<DeleteOutcome> {
        let folder = self.folder_for(&assignment.id)?;
        if !folder.exists() {
            self.dialog
                .info(&format!("Assignment '{}' has not been downloaded", assignment.name));
            return Ok(DeleteOutcome::Missing);
        }

        let confirmed = confirmed
            || self
                .dialog
                .confirm(&format!(
                    "Delete the local folder for '{}'? This cannot be undone.",
                    assignment.name
                ))
                .await?;
        if !confirmed {
            return Ok(DeleteOutcome::Cancelled);
        }

        fs::remove_dir_all(&folder).await?;
        self.emit_changed(&assignment.id);
        tracing::info!(id = %assignment.id, folder = %folder.display(), "Assignment folder deleted");

        return Ok(DeleteOutcome::Deleted);
    }

    /// Removes the local folder without asking. Returns whether anything was
    /// removed.
    pub async fn discard(&self, assignment_id: &str) -> Result<bool> {
        let folder = self.folder_for(assignment_id)?;
        if !folder.exists() {
            return Ok(false);
        }

        fs::remove_dir_all(&folder).await?;
        self.emit_changed(assignment_id);
        return Ok(true);
    }

    pub async fn submit(&self, assignment: &Assignment) -> Result<SubmissionResult> {
        let folder = self.folder_for(&assignment.id)?;
        if !folder.exists() {
            bail!(format!(
                "Assignment '{}' has not been downloaded. Run `tutly open {}` first.",
                assignment.name, assignment.id
            ));
        }

        let files = collect_files(&folder)?;
        if files.is_empty() {
            bail!(format!("No files to submit in {}", folder.display()));
        }

        let details = self.api.get_assignment_details(&assignment.id).await?;
        let record = match (details.assignment, details.error) {
            (Some(record), None) => record,
            (_, Some(error)) => return Err(TutlyError::NotFound(error).into()),
            (None, None) => {
                return Err(TutlyError::NotFound(format!(
                    "Assignment {} no longer exists",
                    assignment.id
                ))
                .into())
            }
        };

        tracing::info!(id = %assignment.id, files = files.len(), "Submitting assignment");
        let res = self
            .api
            .create_submission(&files, &record, &details.mentor_info)
            .await?;

        if let Some(error) = &res.error {
            bail!(format!("Submission rejected: {error}"));
        }

        return Ok(res);
    }
}
