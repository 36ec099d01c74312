//! Terminal wizard for scanflow
//!
//! Owns the terminal, the event loop and the effect runner. All workflow
//! decisions live in the pure reducer in [`app`]; this module only draws,
//! forwards events, and executes the effects the reducer asks for.
//! Background work (discovery, page capture, assembly) runs on plain
//! threads and posts exactly one completion message back over a channel.

pub mod app;
pub mod event;
pub mod ui;

use std::sync::mpsc::{self, SyncSender};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, prelude::*, Terminal};
use std::io::stdout;
use tracing::warn;

use crate::config::{Settings, SettingsStore};
use crate::scan;

use app::{AppState, Effect, Msg};
use event::{Event, EventHandler};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Run the wizard. Returns the process exit code to report.
pub async fn run(store: Box<dyn SettingsStore>, force_select: bool) -> Result<u8> {
    let settings = store.load().unwrap_or_else(|err| {
        warn!(error = %err, "could not load settings, starting fresh");
        Settings::default()
    });

    // Setup terminal
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, store.as_ref(), &settings, force_select).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Run the application loop
async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    store: &dyn SettingsStore,
    settings: &Settings,
    force_select: bool,
) -> Result<u8> {
    let events = EventHandler::new(TICK_RATE);
    let (task_tx, task_rx) = mpsc::sync_channel::<Msg>(8);

    let (mut app, effects) = AppState::init(settings, force_select);
    let mut running = true;
    run_effects(effects, &task_tx, store, &mut running);

    while running {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Finished background work first, then the next terminal event.
        while let Ok(msg) = task_rx.try_recv() {
            app = dispatch(app, msg, &task_tx, store, &mut running);
        }

        match events.next().await {
            Event::Key(key) => {
                app = dispatch(app, Msg::Key(key), &task_tx, store, &mut running);
            }
            Event::Tick => {
                app = dispatch(app, Msg::Tick, &task_tx, store, &mut running);
            }
            Event::Resize(_, _) => {} // Ratatui handles resize
        }
    }

    Ok(app.exit_code)
}

fn dispatch(
    app: AppState,
    msg: Msg,
    tx: &SyncSender<Msg>,
    store: &dyn SettingsStore,
    running: &mut bool,
) -> AppState {
    let (next, effects) = app::update(app, msg);
    run_effects(effects, tx, store, running);
    next
}

/// Execute reducer effects. Task effects spawn a worker thread that posts a
/// single completion message; settings saves run inline and never block the
/// wizard on failure.
fn run_effects(
    effects: Vec<Effect>,
    tx: &SyncSender<Msg>,
    store: &dyn SettingsStore,
    running: &mut bool,
) {
    for effect in effects {
        match effect {
            Effect::ListDevices => {
                let tx = tx.clone();
                thread::spawn(move || {
                    let result = scan::list_devices().map_err(|e| e.to_string());
                    let _ = tx.send(Msg::DevicesListed(result));
                });
            }
            Effect::CapturePage(req) => {
                let tx = tx.clone();
                thread::spawn(move || {
                    let result = scan::capture_page(&req).map_err(|e| e.to_string());
                    let _ = tx.send(Msg::PageCaptured(result));
                });
            }
            Effect::Assemble { dir } => {
                let tx = tx.clone();
                thread::spawn(move || {
                    let result = scan::assemble(&dir).map_err(|e| e.to_string());
                    let _ = tx.send(Msg::Assembled(result));
                });
            }
            Effect::SaveSettings(settings) => {
                if let Err(err) = store.save(&settings) {
                    warn!(error = %err, "could not save settings");
                }
            }
            Effect::Quit => *running = false,
        }
    }
}
