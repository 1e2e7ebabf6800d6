#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::anyhow;
use anyhow::Error;
use anyhow::Result;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::application::cli;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::DialogBox;
use crate::domain::models::Event;
use crate::domain::models::SessionStoreBox;
use crate::domain::models::WorkspaceBox;
use crate::domain::models::WorkspaceName;
use crate::domain::services::ActionsService;
use crate::domain::services::AssignmentWorkflow;
use crate::domain::services::EventsService;
use crate::domain::services::ExplorerCache;
use crate::domain::services::SessionManager;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::AuthClient;
use crate::infrastructure::dialogs::terminal::TerminalDialog;
use crate::infrastructure::downloaders::git::GitDownloader;
use crate::infrastructure::storage::file::FileSessionStore;
use crate::infrastructure::workspaces::noop::NoopWorkspace;
use crate::infrastructure::workspaces::WorkspaceManager;

fn handle_error(err: Error) {
    eprintln!(
            "{}",
            Paint::red(format!(
                "Oh no! Tutly has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
                env!("CARGO_PKG_VERSION"),
                env!("VERGEN_GIT_DESCRIBE"),
                err
            ))
        );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!(
            "\nRunning with RUST_LOG=tutly writes a debug log to {}",
            cli::debug_log_path().display()
        );
        eprintln!("\nOtherwise, running the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn load_workspace() -> Result<WorkspaceBox> {
    let name = Config::get(ConfigKey::Workspace);
    let workspace_name = WorkspaceName::parse(name.to_string())
        .ok_or_else(|| return anyhow!(format!("Unknown workspace {name}")))?;
    let workspace = WorkspaceManager::get(workspace_name)?;

    if let Err(err) = workspace.health_check().await {
        tracing::warn!(workspace = %workspace.name(), error = ?err, "Workspace is unavailable, printing folders instead");
        eprintln!(
            "{}",
            Paint::yellow(format!("{err}. Assignment folders will be printed instead."))
        );
        return Ok(Box::<NoopWorkspace>::default());
    }

    return Ok(workspace);
}

async fn run(action: Action) -> Result<bool> {
    let store: SessionStoreBox = Arc::new(FileSessionStore::default());
    let api = Arc::new(ApiClient::from_config(store.clone()));
    let auth = Arc::new(AuthClient::from_config(store.clone()));
    let dialog: DialogBox = Arc::new(TerminalDialog::default());
    let explorer = Arc::new(ExplorerCache::new(api.clone(), auth.clone()));

    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let session = SessionManager::new(auth, store, event_tx.clone());
    let workflow = AssignmentWorkflow::from_config(
        Box::<GitDownloader>::default(),
        load_workspace().await?,
        dialog.clone(),
        api.clone(),
        event_tx,
    );
    let events = EventsService::new(explorer.clone(), event_rx);

    let mut actions = ActionsService::new(session, explorer, workflow, api, dialog, events)
        .with_password(env::var("TUTLY_PASSWORD").ok());

    let ok = actions.run(action).await;
    actions.shutdown().await;

    return Ok(ok);
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let debug_log_path = cli::debug_log_path();
    let debug_log_dir = debug_log_path
        .parent()
        .map(|dir| return dir.to_path_buf())
        .unwrap_or_default();

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("tutly")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let action = match cli::parse().await {
        Ok(Some(action)) => action,
        Ok(None) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    let ok = match run(action).await {
        Ok(ok) => ok,
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    // Flush the debug log before exiting.
    drop(guard);
    process::exit(if ok { 0 } else { 1 });
}
