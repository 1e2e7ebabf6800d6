use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::Session;

#[async_trait]
pub trait SessionStore {
    /// Persists the session, overwriting whatever was stored before.
    async fn set_tokens(&self, session: &Session) -> Result<()>;

    /// Returns the persisted session without checking its validity.
    async fn get_tokens(&self) -> Result<Option<Session>>;

    /// Removes the persisted session. Safe to call when nothing is stored.
    async fn clear_tokens(&self) -> Result<()>;
}

pub type SessionStoreBox = Arc<dyn SessionStore + Send + Sync>;
