use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::models::Session;
use crate::domain::models::SessionStore;

/// Session store that lives only as long as the process.
#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn with_session(session: Session) -> MemorySessionStore {
        return MemorySessionStore {
            session: RwLock::new(Some(session)),
        };
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    #[allow(clippy::implicit_return)]
    async fn set_tokens(&self, session: &Session) -> Result<()> {
        *self.session.write().await = Some(session.clone());
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_tokens(&self) -> Result<Option<Session>> {
        return Ok(self.session.read().await.clone());
    }

    #[allow(clippy::implicit_return)]
    async fn clear_tokens(&self) -> Result<()> {
        *self.session.write().await = None;
        return Ok(());
    }
}
