// src/main.rs

use color_eyre::eyre::{Result, WrapErr};
use crossterm::{
    ExecutableCommand,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use vulnscan_rs::config::Settings;
use vulnscan_rs::core::error::ScanError;
use vulnscan_rs::core::models::ScanReport;
use vulnscan_rs::core::scanner::Scanner;
use vulnscan_rs::logging;

mod app;
mod ui;

use app::{App, AppState};

type ScanOutcome = Result<ScanReport, ScanError>;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging().wrap_err("failed to initialize logging")?;

    let settings = Settings::load().wrap_err("failed to load configuration")?;
    let scanner = Arc::new(Scanner::from_settings(&settings).wrap_err("failed to build HTTP client")?);
    info!(version = env!("CARGO_PKG_VERSION"), "vulnscan-rs started.");

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let result = run(&mut terminal, scanner).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;

    if let Err(e) = &result {
        error!(error = %e, "Application exited with an error.");
    }
    result
}

async fn run<B: Backend>(terminal: &mut Terminal<B>, scanner: Arc<Scanner>) -> Result<()> {
    let mut app = App::new();
    let (tx, mut rx) = mpsc::channel::<ScanOutcome>(1);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(&mut app, &tx, &scanner)?;
        }

        if let Ok(outcome) = rx.try_recv() {
            app.finish_scan(outcome);
        }
        app.on_tick();
    }
    Ok(())
}

fn handle_events(app: &mut App, tx: &mpsc::Sender<ScanOutcome>, scanner: &Arc<Scanner>) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
            match app.state {
                AppState::Idle => handle_idle_input(app, key.code, tx, scanner),
                AppState::Finished | AppState::Failed(_) => handle_finished_input(app, key.code),
                AppState::Scanning => {
                    if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
                        app.quit();
                    }
                }
            }
        }
    }
    Ok(())
}

/// URL characters go to the input, so quitting from here uses Esc.
fn handle_idle_input(app: &mut App, key_code: KeyCode, tx: &mpsc::Sender<ScanOutcome>, scanner: &Arc<Scanner>) {
    match key_code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => {
            if app.input.trim().is_empty() {
                return;
            }
            app.start_scan();
            let tx = tx.clone();
            let scanner = Arc::clone(scanner);
            let raw_input = app.input.clone();

            tokio::spawn(async move {
                let outcome = scanner.run_scan(&raw_input).await;
                let _ = tx.send(outcome).await;
            });
        }
        _ => {}
    }
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('n') | KeyCode::Char('N') => app.reset(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        _ => {}
    }
}
