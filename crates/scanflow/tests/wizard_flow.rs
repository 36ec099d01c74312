//! End-to-end walk through the wizard state machine.
//!
//! Drives the reducer with the exact message sequence a real session
//! produces, substituting task-completion messages for the subprocess
//! results. No terminal and no external programs are involved.

use crossterm::event::{KeyCode, KeyEvent};

use scanflow::config::Settings;
use scanflow::scan::{PageCapture, Scanner};
use scanflow::tui::app::{update, AppState, Effect, Msg, Pending, WorkflowState};

fn press(app: AppState, code: KeyCode) -> (AppState, Vec<Effect>) {
    update(app, Msg::Key(KeyEvent::from(code)))
}

fn type_text(mut app: AppState, text: &str) -> AppState {
    for c in text.chars() {
        (app, _) = press(app, KeyCode::Char(c));
    }
    app
}

fn brother() -> Scanner {
    Scanner {
        device: "brother5:bus1;dev4".into(),
        title: "Brother DS-740D USB scanner".into(),
    }
}

#[test]
fn full_two_page_session_reaches_assembly_and_completes() {
    let save_root = tempfile::tempdir().unwrap();

    // Startup: discovery task issued.
    let (app, effects) = AppState::init(&Settings::default(), false);
    assert!(matches!(effects.as_slice(), [Effect::ListDevices]));

    // Discovery completes with one device; user confirms it.
    let (app, _) = update(app, Msg::DevicesListed(Ok(vec![brother()])));
    assert_eq!(app.state, WorkflowState::SelectingDevice);
    let (mut app, _) = press(app, KeyCode::Enter);
    assert_eq!(app.state, WorkflowState::EnteringFolder);

    // Replace the pre-filled folder with a tempdir path.
    app.folder_input.clear();
    app = type_text(app, &save_root.path().join("scans").to_string_lossy());
    let (app, effects) = press(app, KeyCode::Enter);
    assert_eq!(app.state, WorkflowState::EnteringPageCount);
    assert!(matches!(effects.as_slice(), [Effect::SaveSettings(_)]));

    // Two pages, no duplex.
    let mut app = app;
    app.page_count_input.clear();
    app = type_text(app, "2");
    let (app, _) = press(app, KeyCode::Enter);
    assert_eq!(app.state, WorkflowState::SelectingDuplex);
    let (app, _) = press(app, KeyCode::Enter);
    assert_eq!(app.state, WorkflowState::AwaitingPage);
    let output_dir = app.job.output_dir.clone().unwrap();
    assert!(output_dir.is_dir());

    // Page 1: confirm, capture task issued, completes.
    let (app, effects) = press(app, KeyCode::Enter);
    assert_eq!(app.pending, Pending::Awaiting(scanflow::tui::app::TaskKind::Capture));
    let req = match effects.as_slice() {
        [Effect::CapturePage(req)] => req.clone(),
        other => panic!("expected capture effect, got {other:?}"),
    };
    assert_eq!(req.page, 1);
    let (app, effects) = update(
        app,
        Msg::PageCaptured(Ok(PageCapture {
            page: 1,
            files: vec![output_dir.join("page_001.png")],
        })),
    );
    assert!(effects.is_empty());
    assert_eq!(app.state, WorkflowState::AwaitingPage);
    assert_eq!(app.job.current_page, 2);

    // Page 2: last page hands off to assembly.
    let (app, _) = press(app, KeyCode::Enter);
    let (app, effects) = update(
        app,
        Msg::PageCaptured(Ok(PageCapture {
            page: 2,
            files: vec![output_dir.join("page_002.png")],
        })),
    );
    assert_eq!(app.state, WorkflowState::Assembling);
    assert!(
        matches!(effects.as_slice(), [Effect::Assemble { dir }] if *dir == output_dir),
        "assembly gets the job output directory"
    );

    // Assembly completes; summary confirm quits.
    let pdf = save_root.path().join("scans").join("scan.pdf");
    let (app, _) = update(app, Msg::Assembled(Ok(pdf.clone())));
    assert_eq!(app.state, WorkflowState::Completed);
    assert_eq!(app.job.assembled_document, Some(pdf));
    assert_eq!(app.job.captured_files.len(), 2);
    assert_eq!(app.exit_code, 0);

    let (_, effects) = press(app, KeyCode::Enter);
    assert!(matches!(effects.as_slice(), [Effect::Quit]));
}

#[test]
fn capture_failure_skips_assembly_and_reports_on_summary() {
    let save_root = tempfile::tempdir().unwrap();

    let (app, _) = AppState::init(&Settings::default(), false);
    let (app, _) = update(app, Msg::DevicesListed(Ok(vec![brother()])));
    let (mut app, _) = press(app, KeyCode::Enter);

    app.folder_input = save_root.path().to_string_lossy().into_owned();
    let (mut app, _) = press(app, KeyCode::Enter);
    app.page_count_input = "3".into();
    let (app, _) = press(app, KeyCode::Enter);
    let (app, _) = press(app, KeyCode::Enter); // duplex: default no

    // Page 1 succeeds.
    let (app, _) = press(app, KeyCode::Enter);
    let out = app.job.output_dir.clone().unwrap();
    let (app, _) = update(
        app,
        Msg::PageCaptured(Ok(PageCapture {
            page: 1,
            files: vec![out.join("page_001.png")],
        })),
    );

    // Page 2 fails; the job ends with no assembly task.
    let (app, _) = press(app, KeyCode::Enter);
    let (app, effects) = update(
        app,
        Msg::PageCaptured(Err("scanning page 2 failed: feeder jam".into())),
    );
    assert_eq!(app.state, WorkflowState::Completed);
    assert!(effects.is_empty());
    assert_eq!(app.job.captured_files.len(), 1);
    assert!(app.job.error.as_deref().unwrap().contains("feeder jam"));
    assert_eq!(app.exit_code, 0);
}
