mod action;
mod assignment;
mod course;
mod dialog;
mod downloader;
mod error;
mod event;
mod node;
mod session;
mod session_store;
mod workspace;

pub use action::*;
pub use assignment::*;
pub use course::*;
pub use dialog::*;
pub use downloader::*;
pub use error::*;
pub use event::*;
pub use node::*;
pub use session::*;
pub use session_store::*;
pub use workspace::*;
