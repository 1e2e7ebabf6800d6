use super::UserStatus;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Sign in state changed, carrying the username when signed in.
    StatusChanged(UserStatus, Option<String>),
    /// Something on disk or in the cache changed for the given node id, or for
    /// the whole tree when `None`.
    ExplorerChanged(Option<String>),
}
