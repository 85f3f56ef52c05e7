// src/core/scanner/summarizer.rs

use crate::config::SummarizerSettings;
use crate::core::error::ScanError;
use crate::core::models::{AiSummary, ProviderResult, ScanReport, SummarizedVulnerability};
use crate::core::scanner::http::{require_key, send_json};
use crate::core::scanner::provider::Summarizer;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROVIDER: &str = "Gemini";

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").unwrap());

const INSTRUCTIONS: &str = "You are a web security analyst. Below is the JSON result of an automated \
scan of a single URL: reputation verdicts, threat list matches, TLS and HTTP header grades, domain \
registration data, related CVEs, suspicious query parameters and a severity tally. Providers marked \
\"unavailable\" did not answer; do not speculate about them. Reply with JSON only, shaped as \
{\"summary\": string, \"vulnerabilities\": [{\"title\": string, \"severity\": \"High\"|\"Medium\"|\"Low\", \
\"description\": string, \"remediation\": string}]}. The summary is two or three sentences for a \
non-expert. List only issues supported by the data.";

/// The JSON document the model is asked to produce.
#[derive(Debug, Deserialize)]
struct ModelReply {
    summary: String,
    #[serde(default)]
    vulnerabilities: Vec<SummarizedVulnerability>,
}

#[derive(Debug, Serialize)]
struct Context<'a> {
    target: &'a str,
    https: bool,
    reputation: Value,
    threat_list: Value,
    tls: Value,
    headers: Value,
    domain: Value,
    cves: Vec<Value>,
    suspicious_parameters: Vec<Value>,
    severity: Vec<Value>,
}

fn slot<T: Serialize>(result: &ProviderResult<T>) -> Value {
    match result {
        Ok(value) => serde_json::to_value(value).unwrap_or(Value::Null),
        Err(e) => json!(e.unavailable_reason()),
    }
}

/// Engines whose verdict was malicious or suspicious, with their own label.
/// Clean verdicts are left out to keep the prompt small.
fn flagged_engines(raw: &Value) -> Vec<Value> {
    let Some(engines) = raw.as_object() else {
        return Vec::new();
    };
    engines
        .iter()
        .filter_map(|(engine, verdict)| {
            let category = verdict.get("category").and_then(Value::as_str)?;
            matches!(category, "malicious" | "suspicious").then(|| {
                json!({
                    "engine": engine,
                    "category": category,
                    "result": verdict.get("result").cloned().unwrap_or(Value::Null),
                })
            })
        })
        .collect()
}

/// Builds the prompt sent to the model.
pub fn build_prompt(report: &ScanReport) -> String {
    let context = Context {
        target: report.target.as_str(),
        https: report.target.is_https(),
        reputation: match &report.reputation {
            Ok(r) => json!({
                "malicious": r.malicious,
                "suspicious": r.suspicious,
                "harmless": r.harmless,
                "undetected": r.undetected,
                "flagged_by": flagged_engines(&r.raw),
            }),
            Err(e) => json!(e.unavailable_reason()),
        },
        threat_list: slot(&report.threat_list),
        tls: slot(&report.tls),
        headers: slot(&report.headers),
        domain: slot(&report.domain),
        cves: report
            .cve
            .iter()
            .map(|lookup| json!({ "keyword": lookup.keyword, "result": slot(&lookup.result) }))
            .collect(),
        suspicious_parameters: report
            .parameters
            .flagged()
            .map(|f| json!({ "key": f.key, "matched": f.matched_rule_labels }))
            .collect(),
        severity: report
            .severity
            .signals
            .iter()
            .map(|s| json!({ "code": s.code, "level": s.level.to_string(), "detail": s.detail }))
            .collect(),
    };
    let data = serde_json::to_string_pretty(&context).unwrap_or_default();
    format!("{INSTRUCTIONS}\n\nScan result:\n{data}")
}

/// Parses the model's reply. Models sometimes wrap JSON in a ```json fence
/// despite being asked not to.
pub fn parse_reply(text: &str) -> ProviderResult<AiSummary> {
    let json_text = JSON_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text.trim(), |m| m.as_str());
    let reply: ModelReply = serde_json::from_str(json_text)
        .map_err(|e| ScanError::malformed(PROVIDER, format!("summary is not the expected JSON: {e}")))?;
    Ok(AiSummary {
        overview: reply.summary,
        vulnerabilities: reply.vulnerabilities,
        fallback: false,
    })
}

/// Report summaries from Gemini `generateContent`.
pub struct GeminiSummarizer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiSummarizer {
    pub fn new(client: Client, settings: &SummarizerSettings) -> Self {
        Self {
            client,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn summarize(&self, report: &ScanReport) -> ProviderResult<AiSummary> {
        let api_key = require_key(PROVIDER, self.api_key.as_deref(), "GEMINI_API_KEY")?;
        info!(model = %self.model, "Requesting report summary.");

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": build_prompt(report) }] }],
            "generationConfig": { "responseMimeType": "application/json", "temperature": 0.2 },
        });
        let request = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", api_key)
            .json(&body);
        let response: Value = send_json(PROVIDER, request).await?;

        let text = response
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| ScanError::malformed(PROVIDER, "response carried no candidate text"))?;
        debug!(chars = text.len(), "Summary received.");

        let summary = parse_reply(text)?;
        info!(vulnerabilities = summary.vulnerabilities.len(), "Summary parsed.");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_fenced_json() {
        let plain = r#"{"summary": "Looks fine.", "vulnerabilities": []}"#;
        assert_eq!(parse_reply(plain).unwrap().overview, "Looks fine.");

        let fenced = "```json\n{\"summary\": \"Weak TLS.\", \"vulnerabilities\": [{\"title\": \"TLS 1.0\", \
                      \"severity\": \"Medium\", \"description\": \"Legacy protocol enabled.\"}]}\n```";
        let summary = parse_reply(fenced).unwrap();
        assert_eq!(summary.vulnerabilities.len(), 1);
        assert_eq!(summary.vulnerabilities[0].remediation, "");
        assert!(!summary.fallback);
    }

    #[test]
    fn prompt_carries_engines_errors_and_parameters() {
        use crate::core::models::{ParameterScreen, ReputationReport, SeverityTally};
        use crate::core::param_screen::screen_parameters;
        use crate::core::target::ScanTarget;

        let report = ScanReport {
            target: ScanTarget::parse("http://example.com/?token=abc123").unwrap(),
            scanned_at: chrono::Utc::now(),
            reputation: Ok(ReputationReport {
                malicious: 1,
                harmless: 1,
                raw: json!({
                    "Fortinet": { "category": "malicious", "result": "phishing" },
                    "Sophos": { "category": "harmless", "result": "clean" }
                }),
                ..Default::default()
            }),
            threat_list: Err(ScanError::not_configured("Safe Browsing", "SAFE_BROWSING_API_KEY is not set")),
            tls: Err(ScanError::skipped("SSL Labs", "target is served over plain HTTP")),
            headers: Err(ScanError::timeout("Mozilla Observatory", "scan deadline exceeded")),
            domain: Err(ScanError::not_configured("API Ninjas", "API_NINJAS_KEY is not set")),
            cve: Vec::new(),
            parameters: screen_parameters("http://example.com/?token=abc123"),
            severity: SeverityTally::default(),
            summary: AiSummary::default(),
        };
        assert_ne!(report.parameters, ParameterScreen::default());

        let prompt = build_prompt(&report);
        assert!(prompt.contains("\"Fortinet\""));
        assert!(prompt.contains("phishing"));
        assert!(!prompt.contains("Sophos"));
        assert!(prompt.contains("unavailable: SAFE_BROWSING_API_KEY is not set (not configured)"));
        assert!(prompt.contains("unavailable: scan deadline exceeded (timed out)"));
        assert!(prompt.contains("\"key\": \"token\""));
    }

    #[test]
    fn prose_is_rejected() {
        let err = parse_reply("The site looks secure overall.").unwrap_err();
        assert_eq!(err.kind, crate::core::error::ScanErrorKind::MalformedResponse);
    }
}
