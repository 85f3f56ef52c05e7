// src/core/models.rs

use crate::core::error::ScanError;
use crate::core::target::ScanTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

// --- Reusable Result Types ---

// Every adapter returns this shape: a value, or a structured error stored in
// the report in place of the value.
pub type ProviderResult<T> = Result<T, ScanError>;

// --- Reputation Models ---

// Engine verdict counts from the URL reputation scanner (VirusTotal).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReputationReport {
    pub analysis_id: String,
    pub malicious: u32,
    pub suspicious: u32,
    pub harmless: u32,
    pub undetected: u32,
    // Per-engine verdicts, kept verbatim for the summarizer.
    pub raw: serde_json::Value,
}

// A single Safe Browsing threat-list hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatMatch {
    pub threat_type: String,
    pub platform_type: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatListReport {
    pub matches: Vec<ThreatMatch>,
}

// --- TLS and Header Grading Models ---

// Result of the remote TLS configuration grader (SSL Labs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsReport {
    pub grade: String,
    // Protocol versions the endpoint negotiates, e.g. "TLS 1.3".
    pub protocols: Vec<String>,
}

// Result of the remote HTTP header grader (Mozilla Observatory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderGradeReport {
    pub grade: String,
    // Clamped to 0..=100.
    pub score: u8,
}

// --- Domain Models ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainReport {
    pub domain: String,
    pub registrar: Option<String>,
    pub country: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
    // Whole days between `created` and the moment the lookup ran.
    pub age_days: Option<i64>,
}

// --- CVE Models ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CveItem {
    pub id: String,
    pub description: String,
    pub score: Option<f64>,
    pub severity: Option<String>,
    pub published: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CveSearchResult {
    pub keyword: String,
    pub total_results: u64,
    pub items: Vec<CveItem>,
}

// One CVE keyword search and its outcome. The keyword is kept outside the
// result so failed searches still say what was searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CveLookup {
    pub keyword: String,
    pub result: ProviderResult<CveSearchResult>,
}

// --- Parameter Screen Models ---

// One query pair and the labels of every rule it matched (possibly none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterFinding {
    pub key: String,
    pub value: String,
    pub matched_rule_labels: Vec<String>,
    // True when every matched rule is a low-confidence heuristic.
    pub heuristic_only: bool,
}

impl ParameterFinding {
    pub fn is_clean(&self) -> bool {
        self.matched_rule_labels.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterScreen {
    pub has_parameters: bool,
    pub findings: Vec<ParameterFinding>,
}

impl ParameterScreen {
    pub fn flagged(&self) -> impl Iterator<Item = &ParameterFinding> {
        self.findings.iter().filter(|f| !f.is_clean())
    }
}

// --- Severity Models ---

// Severity levels in display order. `Secure` is only ever used for the single
// entry emitted when nothing else contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum SeverityLevel {
    High,
    Medium,
    Low,
    Secure,
}

// One scored observation, identified by a knowledge base code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySignal {
    pub code: String,
    pub level: SeverityLevel,
    pub weight: u32,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBucket {
    pub level: SeverityLevel,
    // Number of signals at this level.
    pub count: u32,
    // Sum of those signals' weights, used for charting.
    pub weight: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityTally {
    pub buckets: Vec<SeverityBucket>,
    pub signals: Vec<SeveritySignal>,
}

impl SeverityTally {
    pub fn bucket(&self, level: SeverityLevel) -> Option<&SeverityBucket> {
        self.buckets.iter().find(|b| b.level == level)
    }

    pub fn count(&self, level: SeverityLevel) -> u32 {
        self.bucket(level).map(|b| b.count).unwrap_or(0)
    }

    pub fn weight(&self, level: SeverityLevel) -> u32 {
        self.bucket(level).map(|b| b.weight).unwrap_or(0)
    }

    pub fn total_count(&self) -> u32 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.count(SeverityLevel::Secure) > 0
    }
}

// --- Summary Models ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedVulnerability {
    pub title: String,
    pub severity: String,
    pub description: String,
    #[serde(default)]
    pub remediation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSummary {
    pub overview: String,
    pub vulnerabilities: Vec<SummarizedVulnerability>,
    // Set when the summarizer was unavailable and this text is generic.
    pub fallback: bool,
}

impl AiSummary {
    pub fn fallback(error: &ScanError) -> Self {
        Self {
            overview: format!(
                "An automated summary could not be generated for this scan ({}). \
                 Review the individual provider sections and the severity breakdown for details.",
                error
            ),
            vulnerabilities: Vec::new(),
            fallback: true,
        }
    }
}

// --- Main Report ---

// The unified result of one scan. Every provider slot holds either a value or
// the error that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: ScanTarget,
    pub scanned_at: DateTime<Utc>,
    pub reputation: ProviderResult<ReputationReport>,
    pub threat_list: ProviderResult<ThreatListReport>,
    pub tls: ProviderResult<TlsReport>,
    pub headers: ProviderResult<HeaderGradeReport>,
    pub domain: ProviderResult<DomainReport>,
    pub cve: Vec<CveLookup>,
    pub parameters: ParameterScreen,
    pub severity: SeverityTally,
    pub summary: AiSummary,
}

impl ScanReport {
    // Errors of every provider slot, in display order.
    pub fn provider_errors(&self) -> Vec<&ScanError> {
        let mut errors: Vec<&ScanError> = [
            self.reputation.as_ref().err(),
            self.threat_list.as_ref().err(),
            self.tls.as_ref().err(),
            self.headers.as_ref().err(),
            self.domain.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect();
        errors.extend(self.cve.iter().filter_map(|c| c.result.as_ref().err()));
        errors
    }

    pub fn has_transient_failures(&self) -> bool {
        self.provider_errors().iter().any(|e| e.is_transient())
    }
}
