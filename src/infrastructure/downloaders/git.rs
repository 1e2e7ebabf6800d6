#[cfg(test)]
#[path = "git_test.rs"]
mod tests;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::models::RepositoryDownloader;
use crate::domain::models::TutlyError;

/// Clones scaffold repositories with the `git` executable.
pub struct GitDownloader {
    git_bin: String,
}

impl Default for GitDownloader {
    fn default() -> GitDownloader {
        return GitDownloader::new("git");
    }
}

impl GitDownloader {
    pub fn new(git_bin: &str) -> GitDownloader {
        return GitDownloader {
            git_bin: git_bin.to_string(),
        };
    }

    async fn check_installed(&self) -> Result<()> {
        let output = Command::new(&self.git_bin).arg("--version").output().await;
        match output {
            Ok(output) if output.status.success() => return Ok(()),
            _ => {
                return Err(TutlyError::Download(
                    "Git is not installed or not available in PATH".to_string(),
                )
                .into())
            }
        }
    }
}

#[async_trait]
impl RepositoryDownloader for GitDownloader {
    #[allow(clippy::implicit_return)]
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.check_installed().await?;

        if dest.exists() {
            return Err(TutlyError::Download(format!(
                "Target folder already exists: {dest}",
                dest = dest.display()
            ))
            .into());
        }

        tracing::info!(url, dest = %dest.display(), "Cloning repository");
        let output = Command::new(&self.git_bin)
            .arg("clone")
            .arg(url)
            .arg(dest)
            .output()
            .await;

        let failure = match output {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => String::from_utf8_lossy(&output.stderr).trim().to_string(),
            Err(err) => err.to_string(),
        };

        if dest.exists() {
            if let Err(err) = tokio::fs::remove_dir_all(dest).await {
                tracing::warn!(error = ?err, dest = %dest.display(), "Unable to remove partial clone");
            }
        }

        tracing::error!(url, failure = %failure, "Clone failed");
        return Err(TutlyError::Download(format!("Failed to clone repository: {failure}")).into());
    }
}
