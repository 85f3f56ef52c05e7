// src/core/knowledge_base.rs

//! Static, read-only explanations for every signal the scorer can emit.
//! The UI looks up a signal's code here to show a title, a plain-language
//! description and remediation steps next to the scored observation.

use crate::core::models::SeverityLevel;
use strum::Display;

/// Defines the high-level categories for findings.
/// This is used to group related signals together in the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum FindingCategory {
    /// Findings about how the page is transported (HTTP vs HTTPS).
    #[strum(serialize = "Transport Security")]
    Transport,
    /// Verdicts from URL reputation engines and threat lists.
    #[strum(serialize = "URL Reputation")]
    Reputation,
    /// Findings from the remote TLS configuration grader.
    #[strum(serialize = "SSL/TLS Configuration")]
    Tls,
    /// Findings from the remote HTTP header grader.
    #[strum(serialize = "HTTP Security Headers")]
    Headers,
    /// Findings from the local query-parameter screen.
    #[strum(serialize = "Query Parameters")]
    Parameters,
    /// Findings from domain registration data.
    #[strum(serialize = "Domain Registration")]
    Domain,
    General,
}

/// All the human-readable information about a specific signal.
pub struct FindingDetail {
    /// The machine-readable code emitted by the scorer (e.g. "HTTPS_MISSING").
    pub code: &'static str,
    pub title: &'static str,
    pub category: FindingCategory,
    /// The level the scorer assigns by default. Parameter findings may be
    /// downgraded to `Low` when only heuristic rules matched.
    pub level: SeverityLevel,
    pub description: &'static str,
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- Transport ---
    FindingDetail {
        code: "HTTPS_MISSING",
        title: "Page Served Over Plain HTTP",
        category: FindingCategory::Transport,
        level: SeverityLevel::High,
        description: "The page is loaded without TLS. Anyone on the network path can read or modify the traffic, including credentials, cookies and the page content itself.",
        remediation: "Serve the site over HTTPS with a valid certificate and redirect every HTTP request to its HTTPS equivalent. Add an HSTS header once HTTPS works everywhere."
    },
    // --- Reputation ---
    FindingDetail {
        code: "REPUTATION_MALICIOUS",
        title: "Flagged as Malicious by Security Vendors",
        category: FindingCategory::Reputation,
        level: SeverityLevel::High,
        description: "One or more URL reputation engines classify this address as malicious. It may host malware, phishing pages or other harmful content, or the site may have been compromised.",
        remediation: "If you own the site, scan it for injected content and compromised accounts, clean it, then request a review from the flagging vendors. Otherwise avoid visiting the URL."
    },
    FindingDetail {
        code: "REPUTATION_SUSPICIOUS",
        title: "Flagged as Suspicious by Security Vendors",
        category: FindingCategory::Reputation,
        level: SeverityLevel::Medium,
        description: "Some reputation engines consider this URL suspicious without a definitive malicious verdict. This often happens with newly seen pages, aggressive redirects or unusual scripts.",
        remediation: "Review the page for unexpected redirects, third-party scripts and download links. If the verdict is a false positive, submit the URL to the vendors for reanalysis."
    },
    FindingDetail {
        code: "THREAT_LIST_MATCH",
        title: "Listed on a Safe Browsing Threat List",
        category: FindingCategory::Reputation,
        level: SeverityLevel::High,
        description: "The URL appears on Google Safe Browsing lists for malware, social engineering or unwanted software. Major browsers show a full-page warning to visitors.",
        remediation: "Remove the harmful content, secure the hosting environment and request a review through Google Search Console once the site is clean."
    },
    // --- TLS ---
    FindingDetail {
        code: "TLS_GRADE_WEAK",
        title: "Weak TLS Configuration",
        category: FindingCategory::Tls,
        level: SeverityLevel::Medium,
        description: "The TLS grader awarded a B or C. The server likely still accepts legacy protocol versions, weak cipher suites or lacks forward secrecy.",
        remediation: "Disable TLS 1.0 and 1.1, prefer AEAD cipher suites with ECDHE key exchange and make sure the full certificate chain is served."
    },
    FindingDetail {
        code: "TLS_GRADE_FAILING",
        title: "Failing TLS Configuration",
        category: FindingCategory::Tls,
        level: SeverityLevel::High,
        description: "The TLS grader awarded a failing grade. This usually means a serious flaw such as an untrusted or mismatched certificate, SSL 3.0 support or a known protocol vulnerability.",
        remediation: "Install a certificate from a trusted authority that matches the hostname, disable obsolete protocols and apply the server vendor's TLS hardening guidance."
    },
    // --- Headers ---
    FindingDetail {
        code: "HEADERS_GRADE_WEAK",
        title: "Incomplete HTTP Security Headers",
        category: FindingCategory::Headers,
        level: SeverityLevel::Medium,
        description: "The header grader awarded a B or C. Some protective headers such as Content-Security-Policy, Strict-Transport-Security or X-Content-Type-Options are missing or too permissive.",
        remediation: "Add the missing headers at the web server or CDN. Start with HSTS, 'X-Content-Type-Options: nosniff' and a restrictive Content-Security-Policy."
    },
    FindingDetail {
        code: "HEADERS_GRADE_FAILING",
        title: "Missing HTTP Security Headers",
        category: FindingCategory::Headers,
        level: SeverityLevel::High,
        description: "The header grader awarded a failing grade. Browsers get almost no instructions for defending visitors against cross-site scripting, clickjacking or protocol downgrades.",
        remediation: "Configure Strict-Transport-Security, Content-Security-Policy, X-Frame-Options (or frame-ancestors), X-Content-Type-Options and Referrer-Policy, then grade the site again."
    },
    // --- Parameters ---
    FindingDetail {
        code: "PARAMETER_THREAT",
        title: "Suspicious Query Parameter",
        category: FindingCategory::Parameters,
        level: SeverityLevel::Medium,
        description: "A query parameter matched one or more known attack signatures such as script injection, SQL injection or path traversal. This is a lexical match on the URL only, not a confirmed vulnerability.",
        remediation: "Validate and encode every parameter on the server, use parameterized queries and avoid putting secrets like tokens or passwords in URLs."
    },
    // --- Domain ---
    FindingDetail {
        code: "DOMAIN_RECENTLY_REGISTERED",
        title: "Recently Registered Domain",
        category: FindingCategory::Domain,
        level: SeverityLevel::Low,
        description: "The domain was registered less than 30 days ago. Phishing and malware campaigns frequently use freshly registered domains.",
        remediation: "Treat the site with extra caution and verify its ownership through an independent channel before entering credentials or payment details."
    },
    // --- General ---
    FindingDetail {
        code: "NO_ISSUES_FOUND",
        title: "No Issues Found",
        category: FindingCategory::General,
        level: SeverityLevel::Secure,
        description: "None of the providers that answered reported a problem. Providers that were unavailable are listed in the summary panel.",
        remediation: "No action is required. Keep monitoring the site regularly."
    },
];

/// Retrieves the full detail for a signal code, or `None` if the code is unknown.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scorer_code_is_documented() {
        let codes = [
            "HTTPS_MISSING",
            "REPUTATION_MALICIOUS",
            "REPUTATION_SUSPICIOUS",
            "THREAT_LIST_MATCH",
            "TLS_GRADE_WEAK",
            "TLS_GRADE_FAILING",
            "HEADERS_GRADE_WEAK",
            "HEADERS_GRADE_FAILING",
            "PARAMETER_THREAT",
            "DOMAIN_RECENTLY_REGISTERED",
            "NO_ISSUES_FOUND",
        ];
        for code in codes {
            assert!(get_finding_detail(code).is_some(), "missing entry for {code}");
        }
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<&str> = FINDINGS.iter().map(|f| f.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), FINDINGS.len());
    }

    #[test]
    fn levels_match_the_scorer() {
        use crate::core::error::ScanError;
        use crate::core::models::{AiSummary, ReputationReport, ScanReport, SeverityTally};
        use crate::core::param_screen::screen_parameters;
        use crate::core::scoring::score_severity;
        use crate::core::target::ScanTarget;
        use chrono::Utc;

        let unavailable = || ScanError::not_configured("test", "no key");
        let report = ScanReport {
            target: ScanTarget::parse("http://example.com/?q=<script>alert(1)</script>").unwrap(),
            scanned_at: Utc::now(),
            reputation: Ok(ReputationReport {
                malicious: 1,
                suspicious: 1,
                ..Default::default()
            }),
            threat_list: Err(unavailable()),
            tls: Err(unavailable()),
            headers: Err(unavailable()),
            domain: Err(unavailable()),
            cve: Vec::new(),
            parameters: screen_parameters("http://example.com/?q=<script>alert(1)</script>"),
            severity: SeverityTally::default(),
            summary: AiSummary::default(),
        };
        for signal in score_severity(&report).signals {
            let detail = get_finding_detail(&signal.code).unwrap();
            assert_eq!(detail.level, signal.level, "level of {}", signal.code);
        }
    }

    #[test]
    fn categories_have_readable_names() {
        assert_eq!(FindingCategory::Tls.to_string(), "SSL/TLS Configuration");
        assert_eq!(FindingCategory::General.to_string(), "General");
    }

    #[test]
    fn unknown_code_is_none() {
        assert!(get_finding_detail("DNS_DMARC_MISSING").is_none());
    }
}
