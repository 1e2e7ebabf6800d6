pub mod api;
pub mod dialogs;
pub mod downloaders;
pub mod storage;
pub mod workspaces;
