mod actions;
mod assignments;
mod descriptions;
mod events;
mod explorer;
mod session_manager;
#[cfg(test)]
pub mod test_support;
mod tree_view;

pub use actions::*;
pub use assignments::*;
pub use descriptions::*;
pub use events::*;
pub use explorer::*;
pub use session_manager::*;
pub use tree_view::*;
