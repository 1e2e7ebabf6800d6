#[cfg(test)]
#[path = "session_manager_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::RwLock;

use crate::domain::models::Event;
use crate::domain::models::SessionStoreBox;
use crate::domain::models::TutlyError;
use crate::domain::models::UserIdentity;
use crate::domain::models::UserStatus;
use crate::infrastructure::api::AuthClient;

struct SessionState {
    status: UserStatus,
    user: Option<UserIdentity>,
}

/// Signed in / signed out state machine. Every transition is broadcast as an
/// `Event::StatusChanged`.
pub struct SessionManager {
    auth: Arc<AuthClient>,
    store: SessionStoreBox,
    tx: mpsc::UnboundedSender<Event>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(
        auth: Arc<AuthClient>,
        store: SessionStoreBox,
        tx: mpsc::UnboundedSender<Event>,
    ) -> SessionManager {
        return SessionManager {
            auth,
            store,
            tx,
            state: RwLock::new(SessionState {
                status: UserStatus::SignedOut,
                user: None,
            }),
        };
    }

    fn emit(&self, status: UserStatus, username: Option<String>) {
        if let Err(err) = self.tx.send(Event::StatusChanged(status, username)) {
            tracing::warn!(error = ?err, "No listener for status change");
        }
    }

    async fn transition(&self, status: UserStatus, user: Option<UserIdentity>) {
        let username = user.as_ref().map(|user| return user.username.to_string());
        {
            let mut state = self.state.write().await;
            state.status = status;
            state.user = user;
        }

        tracing::info!(%status, username = ?username, "Session status changed");
        self.emit(status, username);
    }

    pub async fn status(&self) -> UserStatus {
        return self.state.read().await.status;
    }

    pub async fn user(&self) -> Option<UserIdentity> {
        return self.state.read().await.user.clone();
    }

    /// Checks the stored session. Anything short of a confirmed user, whether
    /// expired, rejected, or unreachable, clears the local session and
    /// resolves to signed out.
    pub async fn get_login_status(&self) -> UserStatus {
        let user = self.auth.get_current_user().await;
        if user.is_none() {
            if let Err(err) = self.store.clear_tokens().await {
                tracing::warn!(error = ?err, "Unable to clear session after failed check");
            }
        }

        let status = if user.is_some() {
            UserStatus::SignedIn
        } else {
            UserStatus::SignedOut
        };

        self.transition(status, user).await;
        return status;
    }

    /// Logs in and confirms the identity. Local session state is only kept
    /// when both steps succeed.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<UserIdentity> {
        self.auth.login(username, password).await?;

        let user = match self.auth.get_current_user().await {
            Some(user) => user,
            None => {
                self.store.clear_tokens().await?;
                return Err(TutlyError::Auth(
                    "Signed in, but the session could not be verified".to_string(),
                )
                .into());
            }
        };

        self.transition(UserStatus::SignedIn, Some(user.clone())).await;
        return Ok(user);
    }

    /// Always signs out locally, whatever the server says. A session store
    /// that cannot be cleared is reported after the transition.
    pub async fn sign_out(&self) -> Result<()> {
        let mut res = Ok(());
        if let Err(err) = self.auth.logout().await {
            tracing::warn!(error = ?err, "Sign out did not complete cleanly");
            res = self.store.clear_tokens().await;
        }

        self.transition(UserStatus::SignedOut, None).await;
        return res;
    }
}
