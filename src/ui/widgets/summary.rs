// src/ui/widgets/summary.rs

use super::analysis_view::level_style;
use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use vulnscan_rs::core::error::{ScanError, ScanErrorKind};
use vulnscan_rs::core::models::{ProviderResult, ScanReport};

/// Renders the summary widget: the severity tally, the status of every
/// provider and the parameter screen totals. Content appears once a scan has
/// finished.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Target
            Constraint::Length(6), // Severity tally
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Providers
        ])
        .split(area);

    let Some(report) = app.scan_report.as_ref().filter(|_| app.state == AppState::Finished) else {
        return;
    };

    let target = Line::from(vec![
        Span::raw("Target: "),
        Span::styled(report.target.as_str(), Style::default().fg(Color::Cyan)),
    ]);
    frame.render_widget(Paragraph::new(target).wrap(Wrap { trim: true }), summary_chunks[0]);

    // --- Severity Tally ---
    let tally_block = Block::default().title("SEVERITY".bold());
    let tally_lines: Vec<Line> = report
        .severity
        .buckets
        .iter()
        .map(|bucket| {
            Line::from(vec![
                Span::styled(format!("{:<8}", bucket.level.to_string()), level_style(bucket.level)),
                Span::raw(format!("{:>3} signals  weight {:>3}", bucket.count, bucket.weight)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(tally_lines).block(tally_block), summary_chunks[1]);

    // --- Providers ---
    let providers_block = Block::default().title("PROVIDERS".bold());
    frame.render_widget(
        Paragraph::new(provider_lines(report))
            .block(providers_block)
            .wrap(Wrap { trim: true }),
        summary_chunks[3],
    );
}

fn provider_lines(report: &ScanReport) -> Vec<Line<'static>> {
    let mut lines = vec![
        status_line(
            "Reputation",
            &report.reputation,
            |r| format!("{} malicious, {} suspicious", r.malicious, r.suspicious),
        ),
        status_line("Threat lists", &report.threat_list, |t| match t.matches.len() {
            0 => "not listed".to_string(),
            n => format!("{n} matches"),
        }),
        status_line("TLS", &report.tls, |t| format!("grade {}", t.grade)),
        status_line("Headers", &report.headers, |h| format!("grade {} ({}/100)", h.grade, h.score)),
        status_line("Domain", &report.domain, |d| match d.age_days {
            Some(age) => format!("registered {age} days ago"),
            None => "age unknown".to_string(),
        }),
    ];
    for lookup in &report.cve {
        lines.push(status_line(&format!("CVE '{}'", lookup.keyword), &lookup.result, |r| {
            format!("{} results", r.total_results)
        }));
    }

    let flagged = report.parameters.flagged().count();
    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Parameters: {} screened, {} flagged",
        report.parameters.findings.len(),
        flagged
    )));
    lines
}

fn status_line<T>(name: &str, result: &ProviderResult<T>, describe: impl Fn(&T) -> String) -> Line<'static> {
    let (icon, style, text) = match result {
        Ok(value) => ("✓", Style::default().fg(Color::Green), describe(value)),
        Err(ScanError {
            kind: ScanErrorKind::Skipped,
            message,
            ..
        }) => ("–", Style::default().fg(Color::DarkGray), format!("skipped: {message}")),
        Err(e) => ("✗", Style::default().fg(Color::Red), e.unavailable_reason()),
    };
    Line::from(vec![
        Span::styled(format!("{icon} "), style),
        Span::styled(format!("{name}: "), Style::default().bold()),
        Span::raw(text),
    ])
}
