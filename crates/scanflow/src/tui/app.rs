//! Workflow state for the scan wizard.
//!
//! The controller is an Elm-style reducer: [`update`] consumes a message,
//! returns the next state plus the effects the runner should execute. The
//! reducer touches the local filesystem (folder creation) but never the
//! terminal and never a subprocess; discovery, capture and assembly run as
//! background tasks that post a single completion message back.
//!
//! Exactly one background task may be outstanding at a time (a physical
//! scanner serializes all work). That invariant is carried explicitly in
//! [`Pending`] rather than implied by the state-machine shape.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::config::Settings;
use crate::scan::{CaptureRequest, PageCapture, Scanner};

const FOLDER_INPUT_LIMIT: usize = 256;
const PAGE_COUNT_INPUT_LIMIT: usize = 3;

/// Kind of background task the controller can have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Discovery,
    Capture,
    Assembly,
}

/// Explicit single-outstanding-task tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pending {
    #[default]
    Idle,
    Awaiting(TaskKind),
}

/// Wizard screen / state machine node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    ListingDevices,
    SelectingDevice,
    EnteringFolder,
    EnteringPageCount,
    SelectingDuplex,
    AwaitingPage,
    CapturingPage,
    Assembling,
    Completed,
}

/// Mutable session state for one capture run.
#[derive(Debug, Clone, Default)]
pub struct CaptureJob {
    pub device: String,
    pub title: String,
    pub save_folder: PathBuf,
    pub page_count: u32,
    pub duplex: bool,
    /// Timestamped subdirectory of `save_folder`, created once before the
    /// first capture.
    pub output_dir: Option<PathBuf>,
    /// 1-based, monotone, never exceeds `page_count` while capturing.
    pub current_page: u32,
    /// Append-only, in capture order.
    pub captured_files: Vec<PathBuf>,
    /// Set at most once; terminal once set.
    pub error: Option<String>,
    pub assembled_document: Option<PathBuf>,
}

/// Input messages consumed by the reducer.
#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Tick,
    DevicesListed(Result<Vec<Scanner>, String>),
    PageCaptured(Result<PageCapture, String>),
    Assembled(Result<PathBuf, String>),
}

/// Effects the runner executes on behalf of the reducer.
#[derive(Debug, Clone)]
pub enum Effect {
    ListDevices,
    CapturePage(CaptureRequest),
    Assemble { dir: PathBuf },
    SaveSettings(Settings),
    Quit,
}

/// Complete controller state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub state: WorkflowState,
    pub pending: Pending,
    pub scanners: Vec<Scanner>,
    /// Cursor into `scanners` while selecting.
    pub selected: usize,
    pub folder_input: String,
    pub page_count_input: String,
    pub job: CaptureJob,
    /// Advances on tick while a task is outstanding; drives the spinner.
    pub spinner_frame: usize,
    /// Process exit code reported after the summary screen.
    pub exit_code: u8,
}

impl AppState {
    /// Build the initial state and its entry effects.
    ///
    /// With a valid saved configuration (and no forced selection) the wizard
    /// skips discovery and folder entry and resumes at the page-count
    /// prompt, pre-seeded from the settings.
    pub fn init(settings: &Settings, force_select: bool) -> (Self, Vec<Effect>) {
        let mut app = Self {
            page_count_input: "1".to_string(),
            ..Self::default()
        };

        app.folder_input = if settings.folder.is_empty() {
            dirs::home_dir()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            settings.folder.clone()
        };

        if !force_select && settings.is_valid() {
            app.job.device = settings.device.clone();
            app.job.title = settings.title.clone();
            app.job.save_folder = PathBuf::from(&settings.folder);
            app.state = WorkflowState::EnteringPageCount;
            return (app, Vec::new());
        }

        app.state = WorkflowState::ListingDevices;
        app.pending = Pending::Awaiting(TaskKind::Discovery);
        (app, vec![Effect::ListDevices])
    }

    fn fail(&mut self, error: String, exit_code: u8) {
        // First error wins; it is terminal for the job.
        if self.job.error.is_none() {
            self.job.error = Some(error);
        }
        self.exit_code = exit_code;
        self.state = WorkflowState::Completed;
    }
}

/// Advance the state machine by one message.
pub fn update(mut app: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let mut effects = Vec::new();

    match msg {
        Msg::Tick => {
            if matches!(app.pending, Pending::Awaiting(_)) {
                app.spinner_frame = app.spinner_frame.wrapping_add(1);
            }
        }

        Msg::DevicesListed(result) => {
            app.pending = Pending::Idle;
            if app.state != WorkflowState::ListingDevices {
                warn!("discovery result arrived outside ListingDevices, ignoring");
                return (app, effects);
            }
            match result {
                Ok(scanners) if !scanners.is_empty() => {
                    app.scanners = scanners;
                    app.selected = 0;
                    app.state = WorkflowState::SelectingDevice;
                }
                Ok(_) => {
                    app.fail(
                        "No scanners found. Please connect a scanner and try again.".into(),
                        1,
                    );
                }
                Err(err) => {
                    app.fail(format!("Failed to list scanners: {}", err), 1);
                }
            }
        }

        Msg::PageCaptured(result) => {
            app.pending = Pending::Idle;
            if app.state != WorkflowState::CapturingPage {
                warn!("capture result arrived outside CapturingPage, ignoring");
                return (app, effects);
            }
            match result {
                Ok(capture) => {
                    app.job.captured_files.extend(capture.files);
                    if app.job.current_page >= app.job.page_count {
                        // Last page done: hand the output directory to the
                        // assembler.
                        if let Some(dir) = app.job.output_dir.clone() {
                            app.pending = Pending::Awaiting(TaskKind::Assembly);
                            app.state = WorkflowState::Assembling;
                            effects.push(Effect::Assemble { dir });
                        } else {
                            app.fail("internal: capture finished without an output directory".into(), 1);
                        }
                    } else {
                        app.job.current_page += 1;
                        app.state = WorkflowState::AwaitingPage;
                    }
                }
                Err(err) => {
                    // No retry; remaining pages are abandoned, captured
                    // pages stay on disk.
                    app.fail(err, 0);
                }
            }
        }

        Msg::Assembled(result) => {
            app.pending = Pending::Idle;
            if app.state != WorkflowState::Assembling {
                warn!("assembly result arrived outside Assembling, ignoring");
                return (app, effects);
            }
            match result {
                Ok(path) => {
                    app.job.assembled_document = Some(path);
                }
                Err(err) => {
                    // Raw page images remain in the output directory.
                    app.job.error = Some(err);
                }
            }
            app.state = WorkflowState::Completed;
        }

        Msg::Key(key) => return handle_key(app, key),
    }

    (app, effects)
}

fn is_cancel(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn handle_key(mut app: AppState, key: KeyEvent) -> (AppState, Vec<Effect>) {
    // Cancel is honored in every state, with no further side effects.
    if is_cancel(&key) {
        return (app, vec![Effect::Quit]);
    }

    let mut effects = Vec::new();
    match app.state {
        WorkflowState::ListingDevices => {
            // Only the spinner runs here; keys other than cancel are ignored.
        }

        WorkflowState::SelectingDevice => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                app.selected = app.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if app.selected + 1 < app.scanners.len() {
                    app.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(scanner) = app.scanners.get(app.selected) {
                    app.job.device = scanner.device.clone();
                    app.job.title = scanner.title.clone();
                    app.state = WorkflowState::EnteringFolder;
                }
            }
            _ => {}
        },

        WorkflowState::EnteringFolder => match key.code {
            KeyCode::Enter => {
                let folder = app.folder_input.trim().to_string();
                if folder.is_empty() {
                    return (app, effects);
                }
                if let Err(err) = fs::create_dir_all(&folder) {
                    app.fail(format!("Error creating directory {}: {}", folder, err), 1);
                    return (app, effects);
                }
                app.job.save_folder = PathBuf::from(&folder);
                // Persist the selection; failure to save is logged by the
                // runner but never blocks the wizard.
                effects.push(Effect::SaveSettings(Settings {
                    device: app.job.device.clone(),
                    title: app.job.title.clone(),
                    folder,
                }));
                app.page_count_input = "1".to_string();
                app.state = WorkflowState::EnteringPageCount;
            }
            KeyCode::Backspace => {
                app.folder_input.pop();
            }
            KeyCode::Char(c) => {
                if app.folder_input.len() < FOLDER_INPUT_LIMIT {
                    app.folder_input.push(c);
                }
            }
            _ => {}
        },

        WorkflowState::EnteringPageCount => match key.code {
            KeyCode::Enter => {
                // Fallback to a single page on unparsable or non-positive input.
                app.job.page_count = app
                    .page_count_input
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n >= 1)
                    .unwrap_or(1);
                app.state = WorkflowState::SelectingDuplex;
            }
            KeyCode::Up | KeyCode::Left | KeyCode::Char('k') | KeyCode::Char('p') => {
                let current = app.page_count_input.trim().parse::<u32>().unwrap_or(0);
                app.page_count_input = (current + 1).to_string();
            }
            KeyCode::Down | KeyCode::Right | KeyCode::Char('j') | KeyCode::Char('n') => {
                let current = app.page_count_input.trim().parse::<u32>().unwrap_or(2).max(2);
                app.page_count_input = (current - 1).to_string();
            }
            KeyCode::Backspace => {
                app.page_count_input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if app.page_count_input.len() < PAGE_COUNT_INPUT_LIMIT {
                    app.page_count_input.push(c);
                }
            }
            _ => {}
        },

        WorkflowState::SelectingDuplex => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.job.duplex = true;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                app.job.duplex = false;
            }
            KeyCode::Enter => {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S");
                let output_dir = app.job.save_folder.join(format!("scan_{}", timestamp));
                if let Err(err) = fs::create_dir_all(&output_dir) {
                    app.fail(
                        format!("Error creating directory {}: {}", output_dir.display(), err),
                        1,
                    );
                    return (app, effects);
                }
                app.job.output_dir = Some(output_dir);
                app.job.current_page = 1;
                app.job.captured_files.clear();
                app.state = WorkflowState::AwaitingPage;
            }
            _ => {}
        },

        WorkflowState::AwaitingPage => {
            if key.code == KeyCode::Enter {
                if app.pending != Pending::Idle {
                    warn!("capture requested while a task is outstanding, ignoring");
                    return (app, effects);
                }
                let Some(output_dir) = app.job.output_dir.clone() else {
                    app.fail("internal: awaiting page without an output directory".into(), 1);
                    return (app, effects);
                };
                app.pending = Pending::Awaiting(TaskKind::Capture);
                app.state = WorkflowState::CapturingPage;
                effects.push(Effect::CapturePage(CaptureRequest {
                    device: app.job.device.clone(),
                    output_dir,
                    duplex: app.job.duplex,
                    page: app.job.current_page,
                }));
            }
        }

        WorkflowState::CapturingPage | WorkflowState::Assembling => {
            // Progress screens; only cancel is meaningful.
        }

        WorkflowState::Completed => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('q')) {
                effects.push(Effect::Quit);
            }
        }
    }

    (app, effects)
}
