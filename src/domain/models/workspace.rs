use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum WorkspaceName {
    Vscode,
    Editor,
    None,
}

impl WorkspaceName {
    pub fn parse(text: String) -> Option<WorkspaceName> {
        return WorkspaceName::iter().find(|e| return e.to_string() == text);
    }
}

#[async_trait]
pub trait Workspace {
    /// Returns the name of the workspace integration.
    fn name(&self) -> WorkspaceName;

    /// Used before opening folders to verify the integration can run.
    async fn health_check(&self) -> Result<()>;

    /// Makes `path` the active workspace, replacing whatever folder was open.
    async fn open_folder(&self, path: &Path) -> Result<()>;
}

pub type WorkspaceBox = Box<dyn Workspace + Send + Sync>;
