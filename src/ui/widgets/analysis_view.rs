// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use vulnscan_rs::core::knowledge_base::{self, FindingCategory};
use vulnscan_rs::core::models::{AiSummary, SeverityLevel, SeveritySignal};

pub fn level_style(level: SeverityLevel) -> Style {
    match level {
        SeverityLevel::High => Style::default().fg(Color::Red),
        SeverityLevel::Medium => Style::default().fg(Color::Yellow),
        SeverityLevel::Low => Style::default().fg(Color::Cyan),
        SeverityLevel::Secure => Style::default().fg(Color::Green),
    }
}

fn category_prefix(category: FindingCategory) -> &'static str {
    match category {
        FindingCategory::Transport => "[TRANSPORT] ",
        FindingCategory::Reputation => "[REPUTATION] ",
        FindingCategory::Tls => "[TLS] ",
        FindingCategory::Headers => "[HEADERS] ",
        FindingCategory::Parameters => "[PARAMS] ",
        FindingCategory::Domain => "[DOMAIN] ",
        FindingCategory::General => "",
    }
}

pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Analysis Report (Navigate with ↑ ↓)");

    let content = match &app.state {
        AppState::Idle => Some(Paragraph::new("Scan results will appear here...").alignment(Alignment::Center)),
        AppState::Scanning => {
            let spinner_char = SPINNER_CHARS[app.spinner_frame];
            Some(
                Paragraph::new(Line::from(vec![
                    Span::styled(format!("{} ", spinner_char), Style::default().fg(Color::Cyan)),
                    Span::raw("Scanning... Remote graders can take a few minutes."),
                ]))
                .alignment(Alignment::Center),
            )
        }
        AppState::Failed(message) => Some(
            Paragraph::new(vec![
                Line::from("✗ SCAN NOT STARTED".bold().fg(Color::Red)),
                Line::from(""),
                Line::from(message.clone()),
            ])
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center),
        ),
        AppState::Finished => None,
    };
    if let Some(content) = content {
        frame.render_widget(content.block(main_block), area);
        return;
    }

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(30), Constraint::Min(0)])
        .split(inner_area);

    // Borrow only the report so the list state can be borrowed mutably below.
    let signals: &[SeveritySignal] = app
        .scan_report
        .as_ref()
        .map(|r| r.severity.signals.as_slice())
        .unwrap_or_default();

    let items: Vec<ListItem> = signals
        .iter()
        .map(|signal| {
            let (prefix, title) = match knowledge_base::get_finding_detail(&signal.code) {
                Some(detail) => (category_prefix(detail.category), detail.title),
                None => ("", signal.code.as_str()),
            };
            ListItem::new(Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(title, level_style(signal.level)),
                Span::styled(format!("  ({})", signal.level), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let findings_list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(findings_list, chunks[0], &mut app.analysis_list_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let selected = app.analysis_list_state.selected().and_then(|i| signals.get(i));
    let detail_text = match selected {
        Some(signal) => {
            let mut lines = vec![Line::from(Span::styled(
                signal.detail.as_str(),
                Style::default().add_modifier(Modifier::ITALIC),
            ))];
            if let Some(detail) = knowledge_base::get_finding_detail(&signal.code) {
                lines.extend([
                    Line::from(vec![
                        Span::styled(detail.category.to_string(), Style::default().fg(Color::DarkGray)),
                        Span::raw("  usually "),
                        Span::styled(detail.level.to_string(), level_style(detail.level)),
                    ]),
                    Line::from(""),
                    Line::from("WHAT IT IS:".yellow().bold()),
                    Line::from(detail.description),
                    Line::from(""),
                    Line::from("HOW TO FIX:".yellow().bold()),
                    Line::from(detail.remediation),
                ]);
            }
            Text::from(lines)
        }
        None => Text::from("Select an item above to see details."),
    };
    frame.render_widget(
        Paragraph::new(detail_text).wrap(Wrap { trim: true }).block(detail_block),
        chunks[1],
    );

    if let Some(report) = &app.scan_report {
        render_ai_summary(frame, &report.summary, chunks[2]);
    }
}

fn render_ai_summary(frame: &mut Frame, summary: &AiSummary, area: Rect) {
    let title = if summary.fallback { "AI Summary (unavailable)" } else { "AI Summary" };
    let block = Block::default().borders(Borders::TOP).title(title);

    let mut lines = vec![Line::from(summary.overview.as_str())];
    for vuln in &summary.vulnerabilities {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(format!("[{}] ", vuln.severity), Style::default().fg(Color::Yellow)),
            Span::styled(vuln.title.as_str(), Style::default().bold()),
        ]));
        lines.push(Line::from(vuln.description.as_str()));
        if !vuln.remediation.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Fix: ", Style::default().fg(Color::Green)),
                Span::raw(vuln.remediation.as_str()),
            ]));
        }
    }

    let style = if summary.fallback { Style::default().fg(Color::DarkGray) } else { Style::default() };
    frame.render_widget(
        Paragraph::new(lines).style(style).wrap(Wrap { trim: true }).block(block),
        area,
    );
}
