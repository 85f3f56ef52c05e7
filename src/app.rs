// src/app.rs

use vulnscan_rs::core::error::ScanError;
use vulnscan_rs::core::models::{ScanReport, SeveritySignal};
use ratatui::widgets::ListState;

pub const SPINNER_CHARS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Scanning,
    Finished,
    /// The target was rejected before any provider was called.
    Failed(String),
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub input: String,
    pub scan_report: Option<ScanReport>,
    pub analysis_list_state: ListState,
    pub spinner_frame: usize,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            state: AppState::Idle,
            input: String::new(),
            scan_report: None,
            analysis_list_state: ListState::default(),
            spinner_frame: 0,
        }
    }

    /// The scored signals of the current report, in scorer order.
    pub fn signals(&self) -> &[SeveritySignal] {
        self.scan_report
            .as_ref()
            .map(|r| r.severity.signals.as_slice())
            .unwrap_or_default()
    }

    pub fn start_scan(&mut self) {
        self.state = AppState::Scanning;
        self.spinner_frame = 0;
    }

    pub fn finish_scan(&mut self, result: Result<ScanReport, ScanError>) {
        match result {
            Ok(report) => {
                let has_signals = !report.severity.signals.is_empty();
                self.scan_report = Some(report);
                self.analysis_list_state.select(has_signals.then_some(0));
                self.state = AppState::Finished;
            }
            Err(e) => {
                self.scan_report = None;
                self.state = AppState::Failed(e.message);
            }
        }
    }

    pub fn scroll_up(&mut self) {
        let len = self.signals().len();
        if len == 0 {
            return;
        }
        let i = match self.analysis_list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.analysis_list_state.select(Some(i));
    }

    pub fn scroll_down(&mut self) {
        let len = self.signals().len();
        if len == 0 {
            return;
        }
        let i = match self.analysis_list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.analysis_list_state.select(Some(i));
    }

    pub fn on_tick(&mut self) {
        if self.state == AppState::Scanning {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.scan_report = None;
        self.analysis_list_state = ListState::default();
        self.spinner_frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_target_moves_to_failed() {
        let mut app = App::new();
        app.start_scan();
        app.finish_scan(Err(ScanError::invalid_input("URL has no host name")));
        assert_eq!(app.state, AppState::Failed("URL has no host name".to_string()));
        assert!(app.signals().is_empty());
    }

    #[test]
    fn navigation_without_report_is_a_no_op() {
        let mut app = App::new();
        app.scroll_down();
        app.scroll_up();
        assert_eq!(app.analysis_list_state.selected(), None);
    }

    #[test]
    fn spinner_only_turns_while_scanning() {
        let mut app = App::new();
        app.on_tick();
        assert_eq!(app.spinner_frame, 0);
        app.start_scan();
        app.on_tick();
        assert_eq!(app.spinner_frame, 1);
    }
}
