// src/core/param_screen.rs

//! Lexical screen of URL query parameters against known attack signatures.
//!
//! This is a heuristic, low-confidence signal. It only looks at the text of each
//! key and value and will flag harmless input (long tokens look like base64,
//! `#` looks like a SQL comment). Findings are informational evidence for the
//! report, not confirmed vulnerabilities.

use crate::core::models::{ParameterFinding, ParameterScreen};
use once_cell::sync::Lazy;
use regex::Regex;
use strum::Display;
use tracing::{debug, info};
use url::Url;

/// Broad families of attack signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RuleCategory {
    #[strum(serialize = "Script/markup injection")]
    ScriptInjection,
    #[strum(serialize = "SQL injection")]
    SqlInjection,
    #[strum(serialize = "Command injection")]
    CommandInjection,
    #[strum(serialize = "Path traversal")]
    PathTraversal,
    #[strum(serialize = "Local file inclusion")]
    FileInclusion,
    #[strum(serialize = "LDAP injection")]
    LdapInjection,
    #[strum(serialize = "Shell metacharacter abuse")]
    ShellMetacharacter,
    #[strum(serialize = "Suspicious parameter name")]
    SuspiciousName,
    #[strum(serialize = "Percent-encoded payload")]
    EncodedPayload,
    #[strum(serialize = "Obfuscated payload")]
    Obfuscation,
}

/// A named signature. A query pair matches when its key or its value does.
pub struct ThreatRule {
    pub label: &'static str,
    pub category: RuleCategory,
    /// Low-confidence rules with a high false positive rate.
    pub heuristic: bool,
    pattern: &'static Lazy<Regex>,
}

impl ThreatRule {
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

static RE_XSS_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<script\b[^>]*>(.*?)</script>").unwrap());
static RE_XSS_JS_URI: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)javascript:[^"'\s]*"#).unwrap());
static RE_XSS_EVENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)on(?:error|load|mouseover|focus|click|submit|blur)\s*=").unwrap());
static RE_XSS_IFRAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<iframe\b[^>]*>(.*?)</iframe>").unwrap());
static RE_XSS_IMG: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)<img\b[^>]*onerror\s*=\s*["'][^"']*["']"#).unwrap());
static RE_XSS_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(object|embed|applet)[^>]*>").unwrap());
static RE_XSS_SVG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<svg\b[^>]*on\w+\s*=").unwrap());
static RE_SQL_UNION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)union\s+select").unwrap());
static RE_SQL_OR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)['"`]?\s*\bor\s+1\s*=\s*1"#).unwrap());
static RE_SQL_AND: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)['"`]?\s*\band\s+1\s*=\s*1"#).unwrap());
static RE_SQL_TAUTOLOGY: Lazy<Regex> = Lazy::new(|| Regex::new(r#"'\s*=\s*'|"\s*=\s*"|`\s*=\s*`"#).unwrap());
static RE_SQL_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"--|#").unwrap());
static RE_SQL_DROP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)drop\s+table").unwrap());
static RE_SQL_INSERT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)insert\s+into").unwrap());
static RE_SQL_SELECT_ALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)select\s+\*\s+from").unwrap());
static RE_SQL_UPDATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)update\s+\w+\s+set").unwrap());
static RE_SQL_XP_CMDSHELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)xp_cmdshell").unwrap());
static RE_CMD_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i);[\s\S]*\b(sh|bash|cmd|powershell)\b").unwrap());
static RE_CMD_PIPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\|\s*(ls|cat|whoami|nc|curl|wget|rm|touch)").unwrap());
static RE_CMD_BACKTICK: Lazy<Regex> = Lazy::new(|| Regex::new(r"`.*`").unwrap());
static RE_CMD_SUBSHELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\((.*?)\)").unwrap());
static RE_PATH_DOTDOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\.\./)+").unwrap());
static RE_PATH_WINDOWS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\.\.\\)+").unwrap());
static RE_PATH_DOUBLE_ENCODED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%252e%252e%252f").unwrap());
static RE_LFI_PASSWD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)/etc/passwd").unwrap());
static RE_LFI_BOOT_INI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)boot\.ini").unwrap());
static RE_LFI_WIN_INI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)win\.ini").unwrap());
static RE_LDAP_TRUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\|\)").unwrap());
static RE_LDAP_WILDCARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\)|\)\s*\(|\(\s*[|&!]\s*\(").unwrap());
static RE_SHELLSHOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\)\s*\{\s*:\s*;\s*\};").unwrap());
static RE_BASE64: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9+/]{20,}={0,2}").unwrap());
static RE_SUSPICIOUS_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(token|auth|password|passwd|secret)\b").unwrap());
static RE_ENCODED_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%3Cscript").unwrap());
static RE_ENCODED_DOTDOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%2e%2e").unwrap());

/// Every rule, in evaluation order. Finding labels keep this order.
static RULES: &[ThreatRule] = &[
    ThreatRule { label: "XSS: <script> tag", category: RuleCategory::ScriptInjection, heuristic: false, pattern: &RE_XSS_SCRIPT },
    ThreatRule { label: "XSS: javascript: URI", category: RuleCategory::ScriptInjection, heuristic: false, pattern: &RE_XSS_JS_URI },
    ThreatRule { label: "XSS: inline event handler", category: RuleCategory::ScriptInjection, heuristic: false, pattern: &RE_XSS_EVENT },
    ThreatRule { label: "XSS: iframe injection", category: RuleCategory::ScriptInjection, heuristic: false, pattern: &RE_XSS_IFRAME },
    ThreatRule { label: "XSS: img with onerror", category: RuleCategory::ScriptInjection, heuristic: false, pattern: &RE_XSS_IMG },
    ThreatRule { label: "XSS: object/embed injection", category: RuleCategory::ScriptInjection, heuristic: false, pattern: &RE_XSS_OBJECT },
    ThreatRule { label: "XSS: SVG injection", category: RuleCategory::ScriptInjection, heuristic: false, pattern: &RE_XSS_SVG },
    ThreatRule { label: "SQLi: UNION SELECT", category: RuleCategory::SqlInjection, heuristic: false, pattern: &RE_SQL_UNION },
    ThreatRule { label: "SQLi: OR 1=1", category: RuleCategory::SqlInjection, heuristic: false, pattern: &RE_SQL_OR },
    ThreatRule { label: "SQLi: AND 1=1", category: RuleCategory::SqlInjection, heuristic: false, pattern: &RE_SQL_AND },
    ThreatRule { label: "SQLi: quote tautology", category: RuleCategory::SqlInjection, heuristic: false, pattern: &RE_SQL_TAUTOLOGY },
    ThreatRule { label: "SQLi: comment sequence (-- or #)", category: RuleCategory::SqlInjection, heuristic: true, pattern: &RE_SQL_COMMENT },
    ThreatRule { label: "SQLi: DROP TABLE", category: RuleCategory::SqlInjection, heuristic: false, pattern: &RE_SQL_DROP },
    ThreatRule { label: "SQLi: INSERT INTO", category: RuleCategory::SqlInjection, heuristic: false, pattern: &RE_SQL_INSERT },
    ThreatRule { label: "SQLi: SELECT * FROM", category: RuleCategory::SqlInjection, heuristic: false, pattern: &RE_SQL_SELECT_ALL },
    ThreatRule { label: "SQLi: UPDATE ... SET", category: RuleCategory::SqlInjection, heuristic: false, pattern: &RE_SQL_UPDATE },
    ThreatRule { label: "SQLi: xp_cmdshell", category: RuleCategory::SqlInjection, heuristic: false, pattern: &RE_SQL_XP_CMDSHELL },
    ThreatRule { label: "CMDi: chained shell invocation", category: RuleCategory::CommandInjection, heuristic: false, pattern: &RE_CMD_SEMICOLON },
    ThreatRule { label: "CMDi: pipe into command", category: RuleCategory::CommandInjection, heuristic: false, pattern: &RE_CMD_PIPE },
    ThreatRule { label: "CMDi: backtick execution", category: RuleCategory::CommandInjection, heuristic: false, pattern: &RE_CMD_BACKTICK },
    ThreatRule { label: "CMDi: $(...) subshell", category: RuleCategory::CommandInjection, heuristic: false, pattern: &RE_CMD_SUBSHELL },
    ThreatRule { label: "Path traversal: ../", category: RuleCategory::PathTraversal, heuristic: false, pattern: &RE_PATH_DOTDOT },
    ThreatRule { label: "Path traversal: ..\\", category: RuleCategory::PathTraversal, heuristic: false, pattern: &RE_PATH_WINDOWS },
    ThreatRule { label: "Path traversal: double encoded", category: RuleCategory::PathTraversal, heuristic: false, pattern: &RE_PATH_DOUBLE_ENCODED },
    ThreatRule { label: "LFI: /etc/passwd", category: RuleCategory::FileInclusion, heuristic: false, pattern: &RE_LFI_PASSWD },
    ThreatRule { label: "LFI: boot.ini", category: RuleCategory::FileInclusion, heuristic: false, pattern: &RE_LFI_BOOT_INI },
    ThreatRule { label: "LFI: win.ini", category: RuleCategory::FileInclusion, heuristic: false, pattern: &RE_LFI_WIN_INI },
    ThreatRule { label: "LDAPi: always-true filter", category: RuleCategory::LdapInjection, heuristic: false, pattern: &RE_LDAP_TRUE },
    ThreatRule { label: "LDAPi: filter breakout", category: RuleCategory::LdapInjection, heuristic: true, pattern: &RE_LDAP_WILDCARD },
    ThreatRule { label: "Shellshock: bash function definition", category: RuleCategory::ShellMetacharacter, heuristic: false, pattern: &RE_SHELLSHOCK },
    ThreatRule { label: "Base64-like payload", category: RuleCategory::Obfuscation, heuristic: true, pattern: &RE_BASE64 },
    ThreatRule { label: "Suspicious parameter name (token, auth, password, secret)", category: RuleCategory::SuspiciousName, heuristic: false, pattern: &RE_SUSPICIOUS_NAME },
    ThreatRule { label: "Encoded <script> tag (%3Cscript)", category: RuleCategory::EncodedPayload, heuristic: false, pattern: &RE_ENCODED_SCRIPT },
    ThreatRule { label: "Encoded ../ (%2e%2e)", category: RuleCategory::EncodedPayload, heuristic: false, pattern: &RE_ENCODED_DOTDOT },
];

pub fn rules() -> &'static [ThreatRule] {
    RULES
}

/// Screens the query string of a raw URL.
///
/// A URL that does not parse fails soft: it is reported as having no
/// parameters and no findings.
pub fn screen_parameters(input: &str) -> ParameterScreen {
    match Url::parse(input) {
        Ok(url) => screen_url(&url),
        Err(e) => {
            debug!(error = %e, "URL did not parse, skipping parameter screen.");
            ParameterScreen::default()
        }
    }
}

/// Screens every decoded query pair of `url`, keeping order and duplicates.
pub fn screen_url(url: &Url) -> ParameterScreen {
    let findings: Vec<ParameterFinding> = url
        .query_pairs()
        .map(|(key, value)| evaluate_pair(&key, &value))
        .collect();

    if findings.is_empty() {
        return ParameterScreen::default();
    }

    let flagged = findings.iter().filter(|f| !f.is_clean()).count();
    info!(parameters = findings.len(), flagged, "Parameter screen finished.");
    ParameterScreen {
        has_parameters: true,
        findings,
    }
}

/// Runs every rule against one key/value pair.
pub fn evaluate_pair(key: &str, value: &str) -> ParameterFinding {
    let matched: Vec<&ThreatRule> = RULES
        .iter()
        .filter(|rule| rule.matches(value) || rule.matches(key))
        .collect();

    if !matched.is_empty() {
        debug!(key, matches = matched.len(), "Parameter matched threat rules.");
    }

    ParameterFinding {
        key: key.to_string(),
        value: value.to_string(),
        heuristic_only: !matched.is_empty() && matched.iter().all(|r| r.heuristic),
        matched_rule_labels: matched.iter().map(|r| r.label.to_string()).collect(),
    }
}
