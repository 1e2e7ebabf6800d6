pub mod editor;
pub mod noop;
pub mod vscode;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::WorkspaceBox;
use crate::domain::models::WorkspaceName;

pub struct WorkspaceManager {}

impl WorkspaceManager {
    pub fn get(name: WorkspaceName) -> Result<WorkspaceBox> {
        if name == WorkspaceName::Vscode {
            return Ok(Box::<vscode::VscodeWorkspace>::default());
        }

        if name == WorkspaceName::Editor {
            return Ok(Box::<editor::EditorWorkspace>::default());
        }

        if name == WorkspaceName::None {
            return Ok(Box::<noop::NoopWorkspace>::default());
        }

        bail!(format!("No workspace implemented for {name}"))
    }
}
