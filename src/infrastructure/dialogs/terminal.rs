use anyhow::Result;
use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use dialoguer::FuzzySelect;
use dialoguer::Input;
use dialoguer::Password;
use yansi::Paint;

use crate::domain::models::Dialog;

/// Prompts on the controlling terminal, notifications on stdout and stderr.
#[derive(Default)]
pub struct TerminalDialog {}

#[async_trait]
impl Dialog for TerminalDialog {
    #[allow(clippy::implicit_return)]
    async fn input(&self, prompt: &str, secret: bool) -> Result<Option<String>> {
        let theme = ColorfulTheme::default();
        let res = if secret {
            Password::with_theme(&theme)
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()?
        } else {
            Input::<String>::with_theme(&theme)
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()?
        };

        return Ok(Some(res));
    }

    #[allow(clippy::implicit_return)]
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        let res = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact_opt()?;

        return Ok(res.unwrap_or(false));
    }

    #[allow(clippy::implicit_return)]
    async fn pick(&self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        if items.is_empty() {
            return Ok(None);
        }

        let res = FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(0)
            .items(items)
            .interact_opt()?;

        return Ok(res);
    }

    fn show(&self, content: &str) {
        println!("{content}");
    }

    fn info(&self, message: &str) {
        println!("{}", Paint::green(message));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", Paint::red(message));
    }
}
