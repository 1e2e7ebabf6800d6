#[cfg(test)]
#[path = "noop_test.rs"]
mod tests;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use yansi::Paint;

use crate::domain::models::Workspace;
use crate::domain::models::WorkspaceName;

/// Prints the folder path for the user to open themselves.
#[derive(Default)]
pub struct NoopWorkspace {}

#[async_trait]
impl Workspace for NoopWorkspace {
    fn name(&self) -> WorkspaceName {
        return WorkspaceName::None;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn open_folder(&self, path: &Path) -> Result<()> {
        println!("{} {}", Paint::cyan("Assignment folder:"), path.display());
        return Ok(());
    }
}
