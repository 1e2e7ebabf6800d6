use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;
use mockito::Matcher;
use serde_json::json;
use tempdir::TempDir;
use tokio::sync::mpsc;

use super::ActionsService;
use super::SIGN_IN_HINT;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::SearchFilter;
use crate::domain::services::test_support::clients;
use crate::domain::services::test_support::cs101_assignments_mock;
use crate::domain::services::test_support::enrolled_courses_mock;
use crate::domain::services::test_support::session_mock;
use crate::domain::services::test_support::signed_in_clients;
use crate::domain::services::test_support::Clients;
use crate::domain::services::test_support::FakeDownloader;
use crate::domain::services::test_support::RecordingWorkspace;
use crate::domain::services::test_support::ScriptedDialog;
use crate::domain::services::AssignmentWorkflow;
use crate::domain::services::EventsService;
use crate::domain::services::ExplorerCache;
use crate::domain::services::SessionManager;

struct Harness {
    service: ActionsService,
    dialog: Arc<ScriptedDialog>,
    explorer: Arc<ExplorerCache>,
    downloads: Arc<Mutex<Vec<(String, PathBuf)>>>,
    opened: Arc<Mutex<Vec<PathBuf>>>,
    base_dir: PathBuf,
    _tmp_dir: TempDir,
}

fn to_harness(clients: Clients, dialog: ScriptedDialog) -> Result<Harness> {
    let tmp_dir = TempDir::new("tutly-actions")?;
    let base_dir = tmp_dir.path().join("assignments");
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let dialog = Arc::new(dialog);
    let downloader = FakeDownloader::default();
    let workspace = RecordingWorkspace::default();
    let downloads = downloader.calls.clone();
    let opened = workspace.opened.clone();

    let explorer = Arc::new(ExplorerCache::new(clients.api.clone(), clients.auth.clone()));
    let session = SessionManager::new(clients.auth.clone(), clients.store.clone(), tx.clone());
    let workflow = AssignmentWorkflow::new(
        base_dir.clone(),
        "https://git.example.com/scaffold",
        Box::new(downloader),
        Box::new(workspace),
        dialog.clone(),
        clients.api.clone(),
        tx,
    );
    let events = EventsService::new(explorer.clone(), rx);

    let service = ActionsService::new(
        session,
        explorer.clone(),
        workflow,
        clients.api,
        dialog.clone(),
        events,
    );

    return Ok(Harness {
        service,
        dialog,
        explorer,
        downloads,
        opened,
        base_dir,
        _tmp_dir: tmp_dir,
    });
}

#[tokio::test]
async fn it_shows_signed_out_status() -> Result<()> {
    let mut harness = to_harness(clients("http://127.0.0.1:1", None), ScriptedDialog::default())?;

    assert!(harness.service.run(Action::Status()).await);
    assert_eq!(harness.dialog.shown(), vec!["Signed out".to_string()]);
    return Ok(());
}

#[tokio::test]
async fn it_shows_the_signed_in_username() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _session = session_mock(&mut server).create_async().await;
    let _courses = enrolled_courses_mock(&mut server).create_async().await;

    let mut harness = to_harness(signed_in_clients(&server.url()), ScriptedDialog::default())?;

    assert!(harness.service.run(Action::Status()).await);
    assert_eq!(harness.dialog.shown(), vec!["Tutly: jdoe".to_string()]);
    return Ok(());
}

#[tokio::test]
async fn it_signs_in_and_loads_the_explorer() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let sign_in = server
        .mock("POST", "/auth/sign-in/username")
        .match_body(Matcher::PartialJson(json!({ "username": "jdoe", "password": "pw" })))
        .with_status(200)
        .with_header("set-auth-token", "tok-1")
        .with_body("{}")
        .create_async()
        .await;
    let _session = session_mock(&mut server).create_async().await;
    let courses = enrolled_courses_mock(&mut server).expect(1).create_async().await;

    let dialog = ScriptedDialog::with_inputs(vec![Some("jdoe"), Some("pw")]);
    let mut harness = to_harness(clients(&server.url(), None), dialog)?;

    assert!(harness.service.run(Action::SignIn(None)).await);
    sign_in.assert_async().await;
    courses.assert_async().await;

    assert!(harness.explorer.has_courses().await);
    assert_eq!(
        harness.dialog.infos(),
        vec!["Successfully signed in as jdoe".to_string()]
    );
    return Ok(());
}

#[tokio::test]
async fn it_uses_the_configured_password() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _sign_in = server
        .mock("POST", "/auth/sign-in/username")
        .match_body(Matcher::PartialJson(json!({ "username": "jdoe", "password": "from-env" })))
        .with_status(200)
        .with_header("set-auth-token", "tok-1")
        .with_body("{}")
        .create_async()
        .await;
    let _session = session_mock(&mut server).create_async().await;
    let _courses = enrolled_courses_mock(&mut server).create_async().await;

    let mut harness = to_harness(clients(&server.url(), None), ScriptedDialog::default())?;
    harness.service = harness.service.with_password(Some("from-env".to_string()));

    assert!(harness.service.run(Action::SignIn(Some("jdoe".to_string()))).await);
    assert!(harness.dialog.errors().is_empty());
    return Ok(());
}

#[tokio::test]
async fn it_rejects_an_empty_username() -> Result<()> {
    let dialog = ScriptedDialog::with_inputs(vec![Some("   ")]);
    let mut harness = to_harness(clients("http://127.0.0.1:1", None), dialog)?;

    assert!(!harness.service.run(Action::SignIn(None)).await);
    assert_eq!(
        harness.dialog.errors(),
        vec!["Username cannot be empty".to_string()]
    );
    return Ok(());
}

#[tokio::test]
async fn it_cancels_sign_in_when_the_prompt_is_dismissed() -> Result<()> {
    let dialog = ScriptedDialog::with_inputs(vec![Some("jdoe"), None]);
    let mut harness = to_harness(clients("http://127.0.0.1:1", None), dialog)?;

    assert!(harness.service.run(Action::SignIn(None)).await);
    assert_eq!(harness.dialog.infos(), vec!["Sign in cancelled".to_string()]);
    return Ok(());
}

#[tokio::test]
async fn it_reports_a_rejected_sign_in() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let sign_in = server
        .mock("POST", "/auth/sign-in/username")
        .with_status(401)
        .with_body(json!({ "message": "Invalid username or password" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let dialog = ScriptedDialog::with_inputs(vec![Some("jdoe"), Some("nope")]);
    let mut harness = to_harness(clients(&server.url(), None), dialog)?;

    assert!(!harness.service.run(Action::SignIn(None)).await);
    sign_in.assert_async().await;
    assert_eq!(
        harness.dialog.errors(),
        vec![
            "Invalid username or password".to_string(),
            "Sign in failed".to_string()
        ]
    );
    return Ok(());
}

#[tokio::test]
async fn it_signs_out() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let sign_out = server
        .mock("POST", "/auth/sign-out")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let mut harness = to_harness(signed_in_clients(&server.url()), ScriptedDialog::default())?;

    assert!(harness.service.run(Action::SignOut()).await);
    sign_out.assert_async().await;
    assert_eq!(harness.dialog.infos(), vec!["Signed out".to_string()]);
    return Ok(());
}

#[tokio::test]
async fn it_requires_sign_in_for_the_explorer() -> Result<()> {
    let mut harness = to_harness(clients("http://127.0.0.1:1", None), ScriptedDialog::default())?;

    assert!(!harness.service.run(Action::Explorer { expand_all: false }).await);
    assert_eq!(harness.dialog.errors(), vec![SIGN_IN_HINT.to_string()]);
    assert!(harness.dialog.shown().is_empty());
    return Ok(());
}

#[tokio::test]
async fn it_renders_the_expanded_explorer() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _session = session_mock(&mut server).create_async().await;
    let _courses = enrolled_courses_mock(&mut server).create_async().await;
    let _cs101 = cs101_assignments_mock(&mut server).create_async().await;

    let mut harness = to_harness(signed_in_clients(&server.url()), ScriptedDialog::default())?;

    assert!(harness.service.run(Action::Explorer { expand_all: true }).await);
    assert_eq!(
        harness.dialog.shown(),
        vec![[
            "Intro to Programming (course.CS101)",
            "  Submitted: 1 | Not Submitted: 1 | Total: 2",
            "  ├── ● Hello World (a-1)",
            "  └── ○ Fizz Buzz (a-2)",
        ]
        .join("\n")]
    );
    return Ok(());
}

#[tokio::test]
async fn it_previews_an_assignment() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _session = session_mock(&mut server).create_async().await;
    let _courses = enrolled_courses_mock(&mut server).create_async().await;
    let _details = server
        .mock("GET", "/trpc/assignments.getAssignmentDetailsForSubmission")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({ "result": { "data": { "json": {
                "assignment": { "id": "a-2", "title": "Fizz Buzz", "maxSubmissions": 1 }
            } } } })
            .to_string(),
        )
        .create_async()
        .await;

    let mut harness = to_harness(signed_in_clients(&server.url()), ScriptedDialog::default())?;

    assert!(harness.service.run(Action::Preview("a-2".to_string())).await);
    assert_eq!(
        harness.dialog.shown(),
        vec!["# Fizz Buzz\n\n**Max Submissions:** 1\n\n".to_string()]
    );
    return Ok(());
}

#[tokio::test]
async fn it_opens_an_assignment_by_id() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _session = session_mock(&mut server).create_async().await;
    let _courses = enrolled_courses_mock(&mut server).create_async().await;
    let _cs101 = cs101_assignments_mock(&mut server).create_async().await;

    let mut harness = to_harness(signed_in_clients(&server.url()), ScriptedDialog::default())?;

    assert!(harness.service.run(Action::Open("a-2".to_string())).await);
    assert_eq!(harness.downloads.lock().unwrap().len(), 1);
    assert_eq!(
        *harness.opened.lock().unwrap(),
        vec![harness.base_dir.join("a-2")]
    );
    assert_eq!(
        harness.dialog.infos(),
        vec!["Downloading assignment: Fizz Buzz".to_string()]
    );
    return Ok(());
}

#[tokio::test]
async fn it_offers_to_discard_a_folder_whose_assignment_is_gone() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _session = session_mock(&mut server).create_async().await;
    let _courses = enrolled_courses_mock(&mut server).create_async().await;
    let _cs101 = cs101_assignments_mock(&mut server).create_async().await;

    let dialog = ScriptedDialog::with_confirms(vec![true]);
    let mut harness = to_harness(signed_in_clients(&server.url()), dialog)?;
    std::fs::create_dir_all(harness.base_dir.join("gone-1"))?;

    assert!(!harness.service.run(Action::Open("gone-1".to_string())).await);
    assert!(!harness.base_dir.join("gone-1").exists());
    assert!(harness.downloads.lock().unwrap().is_empty());
    assert_eq!(
        harness.dialog.errors(),
        vec!["Assignment gone-1 was not found in any course".to_string()]
    );
    assert_eq!(
        harness.dialog.infos(),
        vec!["Discarded local folder for gone-1".to_string()]
    );
    return Ok(());
}

#[tokio::test]
async fn it_searches_and_opens_the_pick() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _session = session_mock(&mut server).create_async().await;
    let _courses = enrolled_courses_mock(&mut server).create_async().await;
    let _cs101 = cs101_assignments_mock(&mut server).create_async().await;

    let dialog = ScriptedDialog::with_picks(vec![Some(0)]);
    let mut harness = to_harness(signed_in_clients(&server.url()), dialog)?;

    assert!(harness.service.run(Action::Search(SearchFilter::Unsolved)).await);
    assert_eq!(
        harness.dialog.shown(),
        vec!["○ Fizz Buzz - Intro to Programming".to_string()]
    );
    assert_eq!(
        *harness.opened.lock().unwrap(),
        vec![harness.base_dir.join("a-2")]
    );
    return Ok(());
}

#[tokio::test]
async fn it_skips_search_when_sign_in_is_declined() -> Result<()> {
    let mut harness = to_harness(clients("http://127.0.0.1:1", None), ScriptedDialog::default())?;

    assert!(harness.service.run(Action::Search(SearchFilter::All)).await);
    assert!(harness.dialog.shown().is_empty());
    assert!(harness.dialog.errors().is_empty());
    return Ok(());
}

#[tokio::test]
async fn it_deletes_a_local_folder_while_signed_out() -> Result<()> {
    let mut harness = to_harness(clients("http://127.0.0.1:1", None), ScriptedDialog::default())?;
    std::fs::create_dir_all(harness.base_dir.join("a-1"))?;

    let action = Action::Delete {
        id: "a-1".to_string(),
        confirmed: true,
    };
    assert!(harness.service.run(action).await);
    assert!(!harness.base_dir.join("a-1").exists());
    assert_eq!(
        harness.dialog.infos(),
        vec!["Deleted assignment folder: a-1".to_string()]
    );
    return Ok(());
}

#[tokio::test]
async fn it_submits_a_downloaded_assignment() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _session = session_mock(&mut server).create_async().await;
    let _courses = enrolled_courses_mock(&mut server).create_async().await;
    let _cs101 = cs101_assignments_mock(&mut server).create_async().await;
    let _details = server
        .mock("GET", "/trpc/assignments.getAssignmentDetailsForSubmission")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({ "result": { "data": { "json": {
                "assignment": {
                    "id": "a-1",
                    "title": "Hello World",
                    "maxSubmissions": 3,
                    "class": { "id": "class-1", "title": "Week 1", "courseId": "CS101" }
                },
                "mentorDetails": { "mentor": "m-1" }
            } } } })
            .to_string(),
        )
        .create_async()
        .await;
    let submission = server
        .mock("POST", "/trpc/submissions.createSubmission")
        .with_status(200)
        .with_body(json!({ "result": { "data": { "json": { "success": true } } } }).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut harness = to_harness(signed_in_clients(&server.url()), ScriptedDialog::default())?;
    std::fs::create_dir_all(harness.base_dir.join("a-1"))?;
    std::fs::write(harness.base_dir.join("a-1/main.py"), "print('hello world')")?;

    assert!(harness.service.run(Action::Submit("a-1".to_string())).await);
    submission.assert_async().await;
    assert_eq!(
        harness.dialog.infos(),
        vec!["Submitted assignment: Hello World".to_string()]
    );
    return Ok(());
}

#[tokio::test]
async fn it_drains_events_on_shutdown() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _session = session_mock(&mut server).create_async().await;
    let _courses = enrolled_courses_mock(&mut server).create_async().await;

    let mut harness = to_harness(signed_in_clients(&server.url()), ScriptedDialog::default())?;
    assert!(harness.service.run(Action::Status()).await);

    harness.service.shutdown().await;
    assert!(harness.explorer.has_courses().await);
    return Ok(());
}
