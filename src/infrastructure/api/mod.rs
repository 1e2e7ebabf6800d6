mod auth;
mod client;

pub use auth::*;
pub use client::*;
