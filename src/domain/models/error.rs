use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TutlyError {
    /// Rejected credentials, an unreachable auth endpoint, or a sign in
    /// response without a token.
    #[error("{0}")]
    Auth(String),

    /// Non-success status from a remote procedure call.
    #[error("API request failed: {status} - {body}")]
    Api { status: u16, body: String },

    /// Missing clone tool, failed clone, or a pre-existing target folder.
    #[error("{0}")]
    Download(String),

    /// The assignment no longer exists remotely.
    #[error("{0}")]
    NotFound(String),
}

impl TutlyError {
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        return matches!(
            err.downcast_ref::<TutlyError>(),
            Some(TutlyError::NotFound(_))
        );
    }
}
