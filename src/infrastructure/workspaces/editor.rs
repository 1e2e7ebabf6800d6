use std::env;
use std::path::Path;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::models::Workspace;
use crate::domain::models::WorkspaceName;

fn editor_command() -> Option<String> {
    return env::var("VISUAL")
        .ok()
        .or_else(|| return env::var("EDITOR").ok())
        .filter(|cmd| return !cmd.trim().is_empty());
}

/// Hands the folder to `$VISUAL` or `$EDITOR` and waits for it to exit.
#[derive(Default)]
pub struct EditorWorkspace {}

#[async_trait]
impl Workspace for EditorWorkspace {
    fn name(&self) -> WorkspaceName {
        return WorkspaceName::Editor;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if editor_command().is_none() {
            bail!("Neither VISUAL nor EDITOR is set");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn open_folder(&self, path: &Path) -> Result<()> {
        let cmd = match editor_command() {
            Some(cmd) => cmd,
            None => bail!("Neither VISUAL nor EDITOR is set"),
        };

        // Editors are often configured with flags, e.g. `code --wait`.
        let mut parts = cmd.split_whitespace();
        let bin = parts.next().unwrap_or_default().to_string();
        let status = Command::new(&bin)
            .args(parts)
            .arg(path)
            .status()
            .await?;

        if !status.success() {
            bail!(format!("{bin} exited with {status}"));
        }

        return Ok(());
    }
}
