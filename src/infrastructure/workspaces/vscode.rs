use std::path::Path;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::models::Workspace;
use crate::domain::models::WorkspaceName;

/// Opens folders in Visual Studio Code, reusing the current window.
pub struct VscodeWorkspace {
    bin: String,
}

impl Default for VscodeWorkspace {
    fn default() -> VscodeWorkspace {
        return VscodeWorkspace {
            bin: "code".to_string(),
        };
    }
}

#[async_trait]
impl Workspace for VscodeWorkspace {
    fn name(&self) -> WorkspaceName {
        return WorkspaceName::Vscode;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = Command::new(&self.bin).arg("--version").output().await;
        match res {
            Ok(output) if output.status.success() => return Ok(()),
            _ => bail!("Visual Studio Code CLI `code` is not available in PATH"),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn open_folder(&self, path: &Path) -> Result<()> {
        let status = Command::new(&self.bin)
            .arg("-r")
            .arg(path)
            .status()
            .await?;

        if !status.success() {
            bail!(format!(
                "Failed to open {path} in Visual Studio Code",
                path = path.display()
            ));
        }

        tracing::info!(path = %path.display(), "Opened folder in vscode");
        return Ok(());
    }
}
