#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Session;
use crate::domain::models::SessionStoreBox;
use crate::domain::models::TutlyError;
use crate::domain::models::UserIdentity;

const DEFAULT_SESSION_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SignInRequest {
    username: String,
    password: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SignInResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Organization {
    #[serde(default)]
    org_code: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionUser {
    id: String,
    email: String,
    name: String,
    username: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    organization_id: Option<String>,
    #[serde(default)]
    organization: Option<Organization>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    id: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expires_at: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SessionResponse {
    user: SessionUser,
    session: SessionInfo,
}

impl From<SessionResponse> for UserIdentity {
    fn from(val: SessionResponse) -> Self {
        return UserIdentity {
            id: val.user.id,
            email: val.user.email,
            name: val.user.name,
            username: val.user.username,
            role: val.user.role,
            organization_id: val.user.organization_id,
            org_code: val.user.organization.and_then(|org| return org.org_code),
            session_id: Some(val.session.id),
        };
    }
}

fn now_millis() -> i64 {
    return Utc::now().timestamp_millis();
}

fn parse_expiry(text: &str) -> Option<i64> {
    return DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|date| return date.timestamp_millis());
}

/// Sign in, sign out, and session probing against the `/auth` endpoints.
pub struct AuthClient {
    url: String,
    user_agent: String,
    timeout: Duration,
    store: SessionStoreBox,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(url: &str, user_agent: &str, timeout: Duration, store: SessionStoreBox) -> AuthClient {
        return AuthClient {
            url: url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            timeout,
            store,
            client: reqwest::Client::new(),
        };
    }

    pub fn from_config(store: SessionStoreBox) -> AuthClient {
        return AuthClient::new(
            &Config::get(ConfigKey::ApiURL),
            &Config::get(ConfigKey::UserAgent),
            Config::request_timeout(),
            store,
        );
    }

    async fn fetch_session(&self, token: &str) -> Result<SessionResponse> {
        let res = self
            .client
            .get(format!("{url}/auth/get-session", url = self.url))
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {token}"))
            .header("User-Agent", &self.user_agent)
            .send()
            .await?
            .error_for_status()?;

        return Ok(res.json::<SessionResponse>().await?);
    }

    /// Exchanges credentials for a session and persists it. The token comes
    /// from the `set-auth-token` header when present, otherwise from the body.
    /// The expiry is taken from the session endpoint, defaulting to seven days.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let req = SignInRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let res = self
            .client
            .post(format!("{url}/auth/sign-in/username", url = self.url))
            .timeout(self.timeout)
            .header("Content-Type", "application/json")
            .header("User-Agent", &self.user_agent)
            .json(&req)
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Sign in request failed");
                return Err(TutlyError::Auth(format!(
                    "Cannot connect to {url}. Is the server running?",
                    url = self.url
                ))
                .into());
            }
        };

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let message = res
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|err| return err.message)
                .filter(|message| return !message.is_empty())
                .unwrap_or_else(|| return "Authentication failed".to_string());

            tracing::error!(status, message = %message, "Sign in rejected");
            return Err(TutlyError::Auth(message).into());
        }

        let header_token = res
            .headers()
            .get("set-auth-token")
            .and_then(|val| return val.to_str().ok())
            .filter(|val| return !val.is_empty())
            .map(|val| return val.to_string());

        let body = res.json::<SignInResponse>().await.unwrap_or_default();
        let token = match header_token.or(body.token).filter(|token| return !token.is_empty()) {
            Some(token) => token,
            None => {
                return Err(TutlyError::Auth(
                    "No authentication token received from server".to_string(),
                )
                .into())
            }
        };

        let mut expires_at = now_millis() + DEFAULT_SESSION_MILLIS;
        match self.fetch_session(&token).await {
            Ok(session) => {
                if let Some(server_expiry) = session
                    .session
                    .expires_at
                    .as_deref()
                    .and_then(parse_expiry)
                {
                    expires_at = server_expiry;
                }
            }
            Err(err) => {
                tracing::warn!(error = ?err, "Using default session expiry");
            }
        }

        let session = Session::new(&token, expires_at);
        self.store.set_tokens(&session).await?;
        tracing::info!(username, expires_at, "Signed in");

        return Ok(session);
    }

    /// Best effort remote sign out, always followed by clearing the local
    /// session.
    pub async fn logout(&self) -> Result<()> {
        let session = match self.store.get_tokens().await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = ?err, "Unable to read session before sign out");
                None
            }
        };

        if let Some(session) = session {
            let res = self
                .client
                .post(format!("{url}/auth/sign-out", url = self.url))
                .timeout(self.timeout)
                .header(
                    "Authorization",
                    format!("Bearer {token}", token = session.access_token),
                )
                .header("User-Agent", &self.user_agent)
                .send()
                .await;

            if let Err(err) = res {
                tracing::warn!(error = ?err, "Remote sign out failed");
            }
        }

        self.store.clear_tokens().await?;
        return Ok(());
    }

    /// Resolves the signed in user. Returns `None` without a network call when
    /// there is no session or it has expired, and `None` on any request or
    /// parse failure. Re-persists the session when the server rotated the
    /// token or expiry.
    pub async fn get_current_user(&self) -> Option<UserIdentity> {
        let stored = match self.store.get_tokens().await {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = ?err, "Unable to read session");
                return None;
            }
        };

        if !stored.is_valid_at(now_millis()) {
            tracing::debug!(expires_at = stored.expires_at, "Session expired");
            return None;
        }

        let res = match self.fetch_session(&stored.access_token).await {
            Ok(res) => res,
            Err(err) => {
                tracing::warn!(error = ?err, "Session check failed");
                return None;
            }
        };

        let server_expiry = res.session.expires_at.as_deref().and_then(parse_expiry);
        let server_token = res
            .session
            .token
            .as_deref()
            .filter(|token| return !token.is_empty());

        let mut updated = stored.clone();
        if let Some(token) = server_token {
            updated.access_token = token.to_string();
        }
        if let Some(expiry) = server_expiry {
            updated.expires_at = expiry;
        }

        if updated != stored {
            tracing::info!(
                token_rotated = updated.access_token != stored.access_token,
                expires_at = updated.expires_at,
                "Session updated by server"
            );
            if let Err(err) = self.store.set_tokens(&updated).await {
                tracing::warn!(error = ?err, "Unable to persist rotated session");
            }
        }

        return Some(res.into());
    }

    pub async fn is_authenticated(&self) -> bool {
        return self.get_current_user().await.is_some();
    }
}
