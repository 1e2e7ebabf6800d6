use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// User-facing surface: prompts, pickers, and notifications.
#[async_trait]
pub trait Dialog {
    /// Asks for a line of text. `None` means the user dismissed the prompt.
    async fn input(&self, prompt: &str, secret: bool) -> Result<Option<String>>;

    /// Asks a yes/no question, defaulting to no.
    async fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Offers a filterable list of items, returning the chosen index.
    async fn pick(&self, prompt: &str, items: &[String]) -> Result<Option<usize>>;

    /// Renders a block of content such as the explorer tree or an assignment
    /// description.
    fn show(&self, content: &str);

    fn info(&self, message: &str);

    fn error(&self, message: &str);
}

pub type DialogBox = Arc<dyn Dialog + Send + Sync>;
