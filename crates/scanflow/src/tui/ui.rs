//! UI rendering for the wizard

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::app::{AppState, WorkflowState};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const ACCENT: Color = Color::Magenta;

fn spinner(app: &AppState) -> &'static str {
    SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()]
}

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &AppState) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    draw_title(frame, chunks[0]);

    match app.state {
        WorkflowState::ListingDevices => draw_listing(frame, app, chunks[1]),
        WorkflowState::SelectingDevice => draw_device_list(frame, app, chunks[1]),
        WorkflowState::EnteringFolder => draw_folder_input(frame, app, chunks[1]),
        WorkflowState::EnteringPageCount => draw_page_count_input(frame, app, chunks[1]),
        WorkflowState::SelectingDuplex => draw_duplex_choice(frame, app, chunks[1]),
        WorkflowState::AwaitingPage => draw_awaiting_page(frame, app, chunks[1]),
        WorkflowState::CapturingPage => draw_capturing(frame, app, chunks[1]),
        WorkflowState::Assembling => draw_assembling(frame, app, chunks[1]),
        WorkflowState::Completed => draw_summary(frame, app, chunks[1]),
    }

    draw_hints(frame, app, chunks[2]);
}

fn draw_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled("scanflow", Style::default().fg(ACCENT).bold()),
        Span::raw(" — document scan wizard"),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(title, area);
}

fn draw_hints(frame: &mut Frame, app: &AppState, area: Rect) {
    let hints = match app.state {
        WorkflowState::SelectingDevice => "Up/Down select · Enter confirm · Esc quit",
        WorkflowState::EnteringFolder => "Enter confirm · Esc quit",
        WorkflowState::EnteringPageCount => "Up/Down adjust · Enter confirm · Esc quit",
        WorkflowState::SelectingDuplex => "y/n choose · Enter confirm · Esc quit",
        WorkflowState::AwaitingPage => "Enter scan page · Esc quit",
        WorkflowState::Completed => "Enter exit",
        _ => "Esc quit",
    };
    let line = Paragraph::new(hints).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(line, area);
}

fn draw_listing(frame: &mut Frame, app: &AppState, area: Rect) {
    let text = format!("{} Looking for scanners...", spinner(app));
    frame.render_widget(Paragraph::new(text), area);
}

fn draw_device_list(frame: &mut Frame, app: &AppState, area: Rect) {
    let items: Vec<ListItem> = app
        .scanners
        .iter()
        .enumerate()
        .map(|(i, s)| ListItem::new(format!("{}. {}", i + 1, s.title)))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Select a Scanner"))
        .highlight_style(Style::default().fg(ACCENT).bold())
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_folder_input(frame: &mut Frame, app: &AppState, area: Rect) {
    let lines = vec![
        Line::from(vec![
            Span::raw("Selected scanner: "),
            Span::styled(&app.job.title, Style::default().fg(ACCENT)),
        ]),
        Line::raw(""),
        Line::raw("Save scans to:"),
        Line::from(vec![
            Span::raw(&app.folder_input),
            Span::styled("█", Style::default().fg(ACCENT)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_page_count_input(frame: &mut Frame, app: &AppState, area: Rect) {
    let lines = vec![
        Line::raw("How many pages to scan?"),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Pages: "),
            Span::styled(&app.page_count_input, Style::default().fg(ACCENT).bold()),
            Span::styled("█", Style::default().fg(ACCENT)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_duplex_choice(frame: &mut Frame, app: &AppState, area: Rect) {
    let choice = if app.job.duplex { "Yes" } else { "No" };
    let lines = vec![
        Line::raw("Scan both sides of each page (duplex)?"),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Duplex: "),
            Span::styled(choice, Style::default().fg(ACCENT).bold()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_awaiting_page(frame: &mut Frame, app: &AppState, area: Rect) {
    let text = format!(
        "Insert page {} of {} into the feeder, then press Enter.",
        app.job.current_page, app.job.page_count
    );
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), area);
}

fn draw_capturing(frame: &mut Frame, app: &AppState, area: Rect) {
    let text = format!(
        "{} Scanning page {} of {}...",
        spinner(app),
        app.job.current_page,
        app.job.page_count
    );
    frame.render_widget(Paragraph::new(text), area);
}

fn draw_assembling(frame: &mut Frame, app: &AppState, area: Rect) {
    let text = format!("{} Assembling PDF...", spinner(app));
    frame.render_widget(Paragraph::new(text), area);
}

fn draw_summary(frame: &mut Frame, app: &AppState, area: Rect) {
    let mut lines = Vec::new();

    match (&app.job.error, &app.job.assembled_document) {
        (Some(err), _) => {
            lines.push(Line::styled(
                "Scan failed",
                Style::default().fg(Color::Red).bold(),
            ));
            lines.push(Line::raw(""));
            for l in err.lines() {
                lines.push(Line::raw(l.to_string()));
            }
            if !app.job.captured_files.is_empty() {
                lines.push(Line::raw(""));
                lines.push(Line::raw(format!(
                    "{} page image(s) were captured before the failure.",
                    app.job.captured_files.len()
                )));
            }
            if let Some(dir) = &app.job.output_dir {
                if dir.exists() {
                    lines.push(Line::raw(format!(
                        "Partial output kept in {}",
                        dir.display()
                    )));
                }
            }
        }
        (None, Some(pdf)) => {
            lines.push(Line::styled(
                "Scan complete",
                Style::default().fg(Color::Green).bold(),
            ));
            lines.push(Line::raw(""));
            lines.push(Line::raw(format!(
                "Captured {} page image(s).",
                app.job.captured_files.len()
            )));
            lines.push(Line::raw(format!("Document: {}", pdf.display())));
        }
        (None, None) => {
            lines.push(Line::raw("Nothing to do."));
        }
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Press Enter to exit.",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Scanner;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(app: &AppState) -> ratatui::buffer::Buffer {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.cell((x, y)).unwrap().symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn every_state_renders_without_panic() {
        for state in [
            WorkflowState::ListingDevices,
            WorkflowState::SelectingDevice,
            WorkflowState::EnteringFolder,
            WorkflowState::EnteringPageCount,
            WorkflowState::SelectingDuplex,
            WorkflowState::AwaitingPage,
            WorkflowState::CapturingPage,
            WorkflowState::Assembling,
            WorkflowState::Completed,
        ] {
            let mut app = AppState {
                state,
                ..AppState::default()
            };
            app.scanners.push(Scanner {
                device: "dev".into(),
                title: "Test Scanner".into(),
            });
            render(&app);
        }
    }

    #[test]
    fn device_list_shows_titles() {
        let mut app = AppState {
            state: WorkflowState::SelectingDevice,
            ..AppState::default()
        };
        app.scanners.push(Scanner {
            device: "brother5:bus1;dev4".into(),
            title: "Brother DS-740D USB scanner".into(),
        });
        let text = buffer_text(&render(&app));
        assert!(text.contains("Brother DS-740D USB scanner"));
        assert!(text.contains("Select a Scanner"));
    }

    #[test]
    fn awaiting_page_names_the_page_numbers() {
        let mut app = AppState {
            state: WorkflowState::AwaitingPage,
            ..AppState::default()
        };
        app.job.current_page = 2;
        app.job.page_count = 5;
        let text = buffer_text(&render(&app));
        assert!(text.contains("Insert page 2 of 5"));
    }

    #[test]
    fn summary_shows_error_and_partial_output_hint() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = AppState {
            state: WorkflowState::Completed,
            ..AppState::default()
        };
        app.job.error = Some("scanning page 2 failed: device busy".into());
        app.job.captured_files = vec![dir.path().join("page_001.png")];
        app.job.output_dir = Some(dir.path().to_path_buf());
        let text = buffer_text(&render(&app));
        assert!(text.contains("Scan failed"));
        assert!(text.contains("device busy"));
        assert!(text.contains("1 page image(s)"));
    }

    #[test]
    fn summary_shows_document_path_on_success() {
        let mut app = AppState {
            state: WorkflowState::Completed,
            ..AppState::default()
        };
        app.job.assembled_document = Some("/tmp/scans/scan_x.pdf".into());
        let text = buffer_text(&render(&app));
        assert!(text.contains("Scan complete"));
        assert!(text.contains("scan_x.pdf"));
    }
}
