use serde::Deserialize;
use serde::Serialize;

/// Access token and its absolute expiry in epoch milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub expires_at: i64,
}

impl Session {
    pub fn new(access_token: &str, expires_at: i64) -> Session {
        return Session {
            access_token: access_token.to_string(),
            expires_at,
        };
    }

    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        return now_millis < self.expires_at;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub username: String,
    pub role: Option<String>,
    pub organization_id: Option<String>,
    pub org_code: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum UserStatus {
    SignedIn,
    SignedOut,
}
