use std::collections::VecDeque;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use mockito::Matcher;
use mockito::Mock;
use mockito::ServerGuard;
use serde_json::Value;
use test_utils::course_assignments_fixture;
use test_utils::enrolled_courses_fixture;
use test_utils::session_fixture;

use crate::domain::models::Dialog;
use crate::domain::models::RepositoryDownloader;
use crate::domain::models::Session;
use crate::domain::models::SessionStoreBox;
use crate::domain::models::Workspace;
use crate::domain::models::WorkspaceName;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::AuthClient;
use crate::infrastructure::storage::memory::MemorySessionStore;

pub const SESSION_EXPIRY: &str = "2100-01-01T00:00:00.000Z";

pub struct Clients {
    pub store: SessionStoreBox,
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthClient>,
}

pub fn clients(url: &str, session: Option<Session>) -> Clients {
    let store: SessionStoreBox = match session {
        Some(session) => Arc::new(MemorySessionStore::with_session(session)),
        None => Arc::new(MemorySessionStore::default()),
    };
    let timeout = Duration::from_secs(5);

    return Clients {
        api: Arc::new(ApiClient::new(url, "tutly-cli/test", timeout, store.clone())),
        auth: Arc::new(AuthClient::new(url, "tutly-cli/test", timeout, store.clone())),
        store,
    };
}

pub fn signed_in_clients(url: &str) -> Clients {
    return clients(url, Some(Session::new("tok-1", i64::MAX)));
}

pub fn session_mock(server: &mut ServerGuard) -> Mock {
    return server
        .mock("GET", "/auth/get-session")
        .with_status(200)
        .with_body(session_fixture("tok-1", SESSION_EXPIRY).to_string());
}

pub fn courses_mock(server: &mut ServerGuard, body: Value) -> Mock {
    return server
        .mock("GET", "/trpc/courses.getEnrolledCourses")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body.to_string());
}

pub fn enrolled_courses_mock(server: &mut ServerGuard) -> Mock {
    return courses_mock(server, enrolled_courses_fixture());
}

pub fn course_assignments_mock(server: &mut ServerGuard, course_id: &str, body: Value) -> Mock {
    return server
        .mock("GET", "/trpc/assignments.getAllAssignmentsByCourseId")
        .match_query(Matcher::UrlEncoded(
            "input".to_string(),
            format!(r#"{{"json":{{"id":"{course_id}"}}}}"#),
        ))
        .with_status(200)
        .with_body(body.to_string());
}

pub fn cs101_assignments_mock(server: &mut ServerGuard) -> Mock {
    return course_assignments_mock(server, "CS101", course_assignments_fixture());
}

/// Dialog that answers prompts from a script and records everything shown.
#[derive(Default)]
pub struct ScriptedDialog {
    pub inputs: Mutex<VecDeque<Option<String>>>,
    pub confirms: Mutex<VecDeque<bool>>,
    pub picks: Mutex<VecDeque<Option<usize>>>,
    pub shown: Mutex<Vec<String>>,
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl ScriptedDialog {
    pub fn with_inputs(inputs: Vec<Option<&str>>) -> ScriptedDialog {
        let dialog = ScriptedDialog::default();
        *dialog.inputs.lock().unwrap() = inputs
            .into_iter()
            .map(|e| return e.map(|val| return val.to_string()))
            .collect();
        return dialog;
    }

    pub fn with_confirms(confirms: Vec<bool>) -> ScriptedDialog {
        let dialog = ScriptedDialog::default();
        *dialog.confirms.lock().unwrap() = confirms.into_iter().collect();
        return dialog;
    }

    pub fn with_picks(picks: Vec<Option<usize>>) -> ScriptedDialog {
        let dialog = ScriptedDialog::default();
        *dialog.picks.lock().unwrap() = picks.into_iter().collect();
        return dialog;
    }

    pub fn shown(&self) -> Vec<String> {
        return self.shown.lock().unwrap().clone();
    }

    pub fn infos(&self) -> Vec<String> {
        return self.infos.lock().unwrap().clone();
    }

    pub fn errors(&self) -> Vec<String> {
        return self.errors.lock().unwrap().clone();
    }
}

#[async_trait]
impl Dialog for ScriptedDialog {
    #[allow(clippy::implicit_return)]
    async fn input(&self, _prompt: &str, _secret: bool) -> Result<Option<String>> {
        return Ok(self.inputs.lock().unwrap().pop_front().flatten());
    }

    #[allow(clippy::implicit_return)]
    async fn confirm(&self, _prompt: &str) -> Result<bool> {
        return Ok(self.confirms.lock().unwrap().pop_front().unwrap_or(false));
    }

    #[allow(clippy::implicit_return)]
    async fn pick(&self, _prompt: &str, items: &[String]) -> Result<Option<usize>> {
        self.shown.lock().unwrap().push(items.join("\n"));
        return Ok(self.picks.lock().unwrap().pop_front().flatten());
    }

    fn show(&self, content: &str) {
        self.shown.lock().unwrap().push(content.to_string());
    }

    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Downloader that writes a fake clone, or fails after a partial write.
/// `git_file` writes `.git` as a `gitdir:` pointer file, and `occupy`
/// creates a folder with user work while the clone runs.
#[derive(Default)]
pub struct FakeDownloader {
    pub fail: bool,
    pub git_file: bool,
    pub occupy: Option<PathBuf>,
    pub calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

#[async_trait]
impl RepositoryDownloader for FakeDownloader {
    #[allow(clippy::implicit_return)]
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), dest.to_path_buf()));

        std::fs::create_dir_all(dest)?;
        if self.git_file {
            std::fs::write(dest.join(".git"), "gitdir: ../.git/modules/scaffold")?;
        } else {
            std::fs::create_dir_all(dest.join(".git"))?;
            std::fs::write(dest.join(".git/HEAD"), "ref: refs/heads/main")?;
        }
        std::fs::write(dest.join("README.md"), "# Scaffold")?;

        if let Some(occupied) = &self.occupy {
            std::fs::create_dir_all(occupied)?;
            std::fs::write(occupied.join("main.py"), "print('mine')")?;
        }

        if self.fail {
            bail!("fatal: early EOF");
        }

        return Ok(());
    }
}

#[derive(Default)]
pub struct RecordingWorkspace {
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
}

#[async_trait]
impl Workspace for RecordingWorkspace {
    fn name(&self) -> WorkspaceName {
        return WorkspaceName::None;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn open_folder(&self, path: &Path) -> Result<()> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        return Ok(());
    }
}
