#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Session;
use crate::domain::models::SessionStore;

/// Persists the session as JSON in the state file so it survives restarts.
pub struct FileSessionStore {
    pub file_path: PathBuf,
    lock: Mutex<()>,
}

impl Default for FileSessionStore {
    fn default() -> FileSessionStore {
        return FileSessionStore::new(PathBuf::from(Config::get(ConfigKey::StateFile)));
    }
}

impl FileSessionStore {
    pub fn new(file_path: PathBuf) -> FileSessionStore {
        return FileSessionStore {
            file_path,
            lock: Mutex::new(()),
        };
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    #[allow(clippy::implicit_return)]
    async fn set_tokens(&self, session: &Session) -> Result<()> {
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let payload = serde_json::to_string(session)?;
        let mut file = fs::File::create(&self.file_path).await?;
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(path = ?self.file_path, expires_at = session.expires_at, "Stored session");
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_tokens(&self) -> Result<Option<Session>> {
        let _guard = self.lock.lock().await;

        if !self.file_path.exists() {
            return Ok(None);
        }

        let payload = fs::read_to_string(&self.file_path).await?;
        match serde_json::from_str::<Session>(&payload) {
            Ok(session) => return Ok(Some(session)),
            Err(err) => {
                tracing::warn!(path = ?self.file_path, error = ?err, "Ignoring unreadable session file");
                return Ok(None);
            }
        }
    }

    #[allow(clippy::implicit_return)]
    async fn clear_tokens(&self) -> Result<()> {
        let _guard = self.lock.lock().await;

        if !self.file_path.exists() {
            return Ok(());
        }

        fs::remove_file(&self.file_path).await?;
        tracing::debug!(path = ?self.file_path, "Cleared session");
        return Ok(());
    }
}
