// src/core/scoring.rs

//! Deterministic severity scoring.
//!
//! Every signal below has a fixed level and weight. Provider slots holding an
//! error (including skipped providers) contribute nothing. When no signal
//! fires, a single `NO_ISSUES_FOUND` signal is emitted at `Secure` so the tally
//! is never empty.
//!
//! | code                          | level           | weight             |
//! |-------------------------------|-----------------|--------------------|
//! | `HTTPS_MISSING`               | High            | 2                  |
//! | `REPUTATION_MALICIOUS`        | High            | 3 per engine       |
//! | `REPUTATION_SUSPICIOUS`       | Medium          | 2 per engine       |
//! | `THREAT_LIST_MATCH`           | High            | 3 per match        |
//! | `TLS_GRADE_WEAK` / `_FAILING` | Medium / High   | 1                  |
//! | `HEADERS_GRADE_WEAK` / `_FAILING` | Medium / High | 1                |
//! | `PARAMETER_THREAT`            | Medium (Low if heuristic only) | matched rules |
//! | `DOMAIN_RECENTLY_REGISTERED`  | Low             | 1                  |
//! | `NO_ISSUES_FOUND`             | Secure          | 1                  |

use crate::core::models::{ScanReport, SeverityBucket, SeverityLevel, SeveritySignal, SeverityTally};
use strum::IntoEnumIterator;
use tracing::debug;

pub const HTTPS_MISSING_WEIGHT: u32 = 2;
pub const MALICIOUS_ENGINE_WEIGHT: u32 = 3;
pub const SUSPICIOUS_ENGINE_WEIGHT: u32 = 2;
pub const THREAT_MATCH_WEIGHT: u32 = 3;
pub const GRADE_WEIGHT: u32 = 1;
pub const YOUNG_DOMAIN_WEIGHT: u32 = 1;
/// Domains younger than this many days are flagged.
pub const YOUNG_DOMAIN_DAYS: i64 = 30;

/// Penalty class of a letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    Good,
    Weak,
    Failing,
    Unknown,
}

/// Maps a letter grade to its band. `+`/`-` modifiers are ignored. SSL Labs'
/// `T` (untrusted certificate) and `M` (name mismatch) count as failing.
pub fn grade_band(grade: &str) -> GradeBand {
    match grade.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('A') => GradeBand::Good,
        Some('B') | Some('C') => GradeBand::Weak,
        Some('D') | Some('E') | Some('F') | Some('T') | Some('M') => GradeBand::Failing,
        _ => GradeBand::Unknown,
    }
}

/// Scores a report. Pure: the same report always yields the same tally, and
/// the report's own `severity` field is ignored.
pub fn score_severity(report: &ScanReport) -> SeverityTally {
    let mut signals = Vec::new();

    if !report.target.is_https() {
        signals.push(signal(
            "HTTPS_MISSING",
            SeverityLevel::High,
            HTTPS_MISSING_WEIGHT,
            "The target is served over plain HTTP.".to_string(),
        ));
    }

    if let Ok(reputation) = &report.reputation {
        if reputation.malicious > 0 {
            signals.push(signal(
                "REPUTATION_MALICIOUS",
                SeverityLevel::High,
                MALICIOUS_ENGINE_WEIGHT * reputation.malicious,
                format!("{} engines flagged this URL as malicious.", reputation.malicious),
            ));
        }
        if reputation.suspicious > 0 {
            signals.push(signal(
                "REPUTATION_SUSPICIOUS",
                SeverityLevel::Medium,
                SUSPICIOUS_ENGINE_WEIGHT * reputation.suspicious,
                format!("{} engines flagged this URL as suspicious.", reputation.suspicious),
            ));
        }
    }

    if let Ok(threats) = &report.threat_list {
        if !threats.matches.is_empty() {
            let kinds: Vec<&str> = threats.matches.iter().map(|m| m.threat_type.as_str()).collect();
            signals.push(signal(
                "THREAT_LIST_MATCH",
                SeverityLevel::High,
                THREAT_MATCH_WEIGHT * threats.matches.len() as u32,
                format!("Listed on Safe Browsing as {}.", kinds.join(", ")),
            ));
        }
    }

    if let Ok(tls) = &report.tls {
        signals.extend(grade_signal("TLS", "TLS configuration", &tls.grade));
    }

    if let Ok(headers) = &report.headers {
        signals.extend(grade_signal("HEADERS", "HTTP security headers", &headers.grade));
    }

    for finding in report.parameters.flagged() {
        let level = if finding.heuristic_only {
            SeverityLevel::Low
        } else {
            SeverityLevel::Medium
        };
        signals.push(signal(
            "PARAMETER_THREAT",
            level,
            finding.matched_rule_labels.len() as u32,
            format!(
                "Parameter '{}' matched: {}.",
                finding.key,
                finding.matched_rule_labels.join(", ")
            ),
        ));
    }

    if let Ok(domain) = &report.domain {
        if let Some(age) = domain.age_days.filter(|age| (0..YOUNG_DOMAIN_DAYS).contains(age)) {
            signals.push(signal(
                "DOMAIN_RECENTLY_REGISTERED",
                SeverityLevel::Low,
                YOUNG_DOMAIN_WEIGHT,
                format!("{} was registered {} days ago.", domain.domain, age),
            ));
        }
    }

    if signals.is_empty() {
        signals.push(signal(
            "NO_ISSUES_FOUND",
            SeverityLevel::Secure,
            1,
            "No provider reported an issue.".to_string(),
        ));
    }

    let buckets = SeverityLevel::iter()
        .map(|level| {
            let at_level = signals.iter().filter(|s| s.level == level);
            SeverityBucket {
                level,
                count: at_level.clone().count() as u32,
                weight: at_level.map(|s| s.weight).sum(),
            }
        })
        .collect();

    debug!(signals = signals.len(), "Severity scored.");
    SeverityTally { buckets, signals }
}

fn grade_signal(prefix: &str, subject: &str, grade: &str) -> Option<SeveritySignal> {
    let (suffix, level) = match grade_band(grade) {
        GradeBand::Weak => ("WEAK", SeverityLevel::Medium),
        GradeBand::Failing => ("FAILING", SeverityLevel::High),
        GradeBand::Good | GradeBand::Unknown => return None,
    };
    Some(signal(
        &format!("{prefix}_GRADE_{suffix}"),
        level,
        GRADE_WEIGHT,
        format!("{subject} graded {grade}."),
    ))
}

fn signal(code: &str, level: SeverityLevel, weight: u32, detail: String) -> SeveritySignal {
    SeveritySignal {
        code: code.to_string(),
        level,
        weight,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ScanError;
    use crate::core::models::{
        AiSummary, DomainReport, HeaderGradeReport, ReputationReport, ThreatListReport, ThreatMatch,
        TlsReport,
    };
    use crate::core::param_screen::screen_url;
    use crate::core::target::ScanTarget;
    use chrono::Utc;

    fn report_for(url: &str) -> ScanReport {
        let target = ScanTarget::parse(url).unwrap();
        let parameters = screen_url(target.url());
        ScanReport {
            target,
            scanned_at: Utc::now(),
            reputation: Err(ScanError::not_configured("VirusTotal", "no key")),
            threat_list: Err(ScanError::not_configured("Safe Browsing", "no key")),
            tls: Err(ScanError::network("SSL Labs", "down")),
            headers: Err(ScanError::timeout("Mozilla Observatory", "slow")),
            domain: Err(ScanError::unauthorized("API Ninjas", "bad key")),
            cve: Vec::new(),
            parameters,
            severity: SeverityTally::default(),
            summary: AiSummary::fallback(&ScanError::not_configured("Gemini", "no key")),
        }
    }

    #[test]
    fn all_errors_on_https_scores_secure() {
        let tally = score_severity(&report_for("https://example.com/"));
        assert!(tally.is_clean());
        assert_eq!(tally.count(SeverityLevel::Secure), 1);
        assert_eq!(tally.total_count(), 1);
        assert_eq!(tally.signals.len(), 1);
        assert_eq!(tally.signals[0].code, "NO_ISSUES_FOUND");
    }

    #[test]
    fn plain_http_is_penalised_even_when_tls_skipped() {
        let mut report = report_for("http://example.com/");
        report.tls = Err(ScanError::skipped("SSL Labs", "plain HTTP"));
        let tally = score_severity(&report);
        assert_eq!(tally.count(SeverityLevel::High), 1);
        assert_eq!(tally.weight(SeverityLevel::High), HTTPS_MISSING_WEIGHT);
        assert!(!tally.is_clean());
    }

    #[test]
    fn reputation_counts_are_weighted() {
        let mut report = report_for("https://example.com/");
        report.reputation = Ok(ReputationReport {
            malicious: 2,
            suspicious: 3,
            harmless: 60,
            ..Default::default()
        });
        let tally = score_severity(&report);
        assert_eq!(tally.weight(SeverityLevel::High), 6);
        assert_eq!(tally.weight(SeverityLevel::Medium), 6);
        assert_eq!(tally.total_count(), 2);
    }

    #[test]
    fn grades_map_to_fixed_bands() {
        assert_eq!(grade_band("A+"), GradeBand::Good);
        assert_eq!(grade_band("A-"), GradeBand::Good);
        assert_eq!(grade_band("B"), GradeBand::Weak);
        assert_eq!(grade_band("C+"), GradeBand::Weak);
        assert_eq!(grade_band("D"), GradeBand::Failing);
        assert_eq!(grade_band("F"), GradeBand::Failing);
        assert_eq!(grade_band("T"), GradeBand::Failing);
        assert_eq!(grade_band(""), GradeBand::Unknown);

        let mut report = report_for("https://example.com/");
        report.tls = Ok(TlsReport { grade: "B".into(), protocols: vec!["TLS 1.2".into()] });
        report.headers = Ok(HeaderGradeReport { grade: "F".into(), score: 0 });
        let tally = score_severity(&report);
        let codes: Vec<&str> = tally.signals.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["TLS_GRADE_WEAK", "HEADERS_GRADE_FAILING"]);
    }

    #[test]
    fn parameter_findings_weigh_by_match_count() {
        let report = report_for("https://example.com/?q=<script>x</script>&password=1&id=5");
        let tally = score_severity(&report);
        let params: Vec<_> = tally.signals.iter().filter(|s| s.code == "PARAMETER_THREAT").collect();
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|s| s.level == SeverityLevel::Medium));
        assert_eq!(params[1].weight, 1);
    }

    #[test]
    fn heuristic_only_parameters_score_low() {
        let report = report_for("https://example.com/?s=dGhpc2lzYXZlcnlsb25nb3BhcXVldmFsdWU");
        let tally = score_severity(&report);
        assert_eq!(tally.count(SeverityLevel::Low), 1);
        assert_eq!(tally.count(SeverityLevel::Medium), 0);
    }

    #[test]
    fn young_domains_and_threat_matches_contribute() {
        let mut report = report_for("https://example.com/");
        report.domain = Ok(DomainReport {
            domain: "example.com".into(),
            age_days: Some(3),
            ..Default::default()
        });
        report.threat_list = Ok(ThreatListReport {
            matches: vec![ThreatMatch {
                threat_type: "MALWARE".into(),
                platform_type: "ANY_PLATFORM".into(),
                url: "https://example.com/".into(),
            }],
        });
        let tally = score_severity(&report);
        assert_eq!(tally.count(SeverityLevel::Low), 1);
        assert_eq!(tally.weight(SeverityLevel::High), THREAT_MATCH_WEIGHT);
    }

    #[test]
    fn scoring_is_deterministic_and_ignores_stored_tally() {
        let mut report = report_for("http://example.com/?token=abc&debug=1");
        let first = score_severity(&report);
        report.severity = first.clone();
        let second = score_severity(&report);
        assert_eq!(first, second);
    }

    #[test]
    fn bucket_counts_match_signal_count() {
        let mut report = report_for("http://example.com/?token=abc123&q=' OR 1=1");
        report.headers = Ok(HeaderGradeReport { grade: "C".into(), score: 40 });
        let tally = score_severity(&report);
        assert_eq!(tally.total_count() as usize, tally.signals.len());
        let levels: Vec<SeverityLevel> = tally.buckets.iter().map(|b| b.level).collect();
        assert_eq!(
            levels,
            vec![SeverityLevel::High, SeverityLevel::Medium, SeverityLevel::Low, SeverityLevel::Secure]
        );
    }
}
