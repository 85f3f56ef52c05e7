// src/core/scanner/headers_scanner.rs

use crate::config::ProviderSettings;
use crate::core::error::ScanError;
use crate::core::models::{HeaderGradeReport, ProviderResult};
use crate::core::poll::{JobStatus, PollConfig, Sleeper, Submission, TokioSleeper, resolve_submission};
use crate::core::scanner::http::{classify_status, parse_json, send, send_json};
use crate::core::scanner::provider::ScanAdapter;
use crate::core::target::ScanTarget;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://observatory-api.mdn.mozilla.net/api/v2";
const PROVIDER: &str = "Mozilla Observatory";

/// The scan object returned by both `/scan` and `/getScanResults`.
#[derive(Debug, Default, Deserialize)]
struct ObservatoryScan {
    #[serde(default, alias = "id")]
    scan_id: Option<u64>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    grade: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ObservatoryScan {
    /// The API reports errors as `{"error": "<code>", "message": "..."}`,
    /// sometimes with a 2xx status.
    fn error_message(&self) -> Option<&str> {
        let has_error = self.error.as_ref().is_some_and(|e| !e.is_null());
        if has_error { self.message.as_deref() } else { None }
    }

    fn into_report(self) -> Option<HeaderGradeReport> {
        let grade = self.grade?;
        let score = self.score.unwrap_or(0.0).clamp(0.0, 100.0).round() as u8;
        Some(HeaderGradeReport { grade, score })
    }
}

/// HTTP security header grading via Mozilla Observatory. A scan request may
/// answer with a finished (cached) grade straight away or with a scan id to
/// poll.
pub struct HeadersScanner {
    client: Client,
    base_url: String,
    poll: PollConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl HeadersScanner {
    pub fn new(client: Client, settings: &ProviderSettings, poll: PollConfig) -> Self {
        Self {
            client,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            poll,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    async fn initiate(&self, host: &str) -> ProviderResult<Submission<HeaderGradeReport>> {
        let request = self
            .client
            .post(format!("{}/scan", self.base_url))
            .query(&[("host", host), ("hidden", "true")]);
        let response = send(PROVIDER, request).await?;

        // The body is inspected before the status: error payloads and cached
        // reports both arrive with a variety of status codes.
        let scan: ObservatoryScan = match parse_json(PROVIDER, &response.body) {
            Ok(scan) => scan,
            Err(_) if !response.status.is_success() => {
                return Err(classify_status(PROVIDER, response.status, &response.body));
            }
            Err(e) => return Err(e),
        };

        if let Some(message) = scan.error_message() {
            warn!(host, reason = message, "Observatory rejected the scan.");
            return Err(ScanError::provider_failed(PROVIDER, message));
        }
        if !response.status.is_success() {
            return Err(classify_status(PROVIDER, response.status, &response.body));
        }

        if scan.grade.is_some() || scan.state.as_deref() == Some("FINISHED") {
            return scan
                .into_report()
                .map(Submission::Immediate)
                .ok_or_else(|| ScanError::malformed(PROVIDER, "finished scan carried no grade"));
        }

        match scan.scan_id {
            Some(id) => Ok(Submission::Job(id.to_string())),
            None => Err(ScanError::malformed(
                PROVIDER,
                "no scan_id returned and the scan was not finished",
            )),
        }
    }

    async fn check_results(&self, scan_id: &str) -> ProviderResult<JobStatus<HeaderGradeReport>> {
        let request = self
            .client
            .get(format!("{}/getScanResults", self.base_url))
            .query(&[("scan", scan_id)]);
        let scan: ObservatoryScan = send_json(PROVIDER, request).await?;

        Ok(match scan.state.as_deref() {
            Some("FINISHED") => match scan.into_report() {
                Some(report) => JobStatus::Finished(report),
                None => JobStatus::Failed("scan finished without a grade".to_string()),
            },
            Some("FAILED") => JobStatus::Failed("scan failed to complete".to_string()),
            Some(other) => JobStatus::Pending(other.to_string()),
            None => JobStatus::Pending("unknown".to_string()),
        })
    }
}

#[async_trait]
impl ScanAdapter for HeadersScanner {
    type Output = HeaderGradeReport;

    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, target: &ScanTarget) -> ProviderResult<HeaderGradeReport> {
        let host = target.hostname();
        info!(host, "Starting headers scan.");

        let submission = self.initiate(host).await?;
        let scan_id = match &submission {
            Submission::Job(id) => id.clone(),
            Submission::Immediate(_) => String::new(),
        };
        debug!(host, scan_id = %scan_id, "Observatory scan submitted.");

        let report = resolve_submission(PROVIDER, &self.poll, self.sleeper.as_ref(), submission, || {
            self.check_results(&scan_id)
        })
        .await?;

        info!(grade = %report.grade, score = report.score, "Headers scan finished.");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scan(value: serde_json::Value) -> ObservatoryScan {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn score_is_clamped() {
        let report = scan(json!({ "grade": "A+", "score": 135 })).into_report().unwrap();
        assert_eq!(report.score, 100);
        let report = scan(json!({ "grade": "F", "score": -25 })).into_report().unwrap();
        assert_eq!(report.score, 0);
    }

    #[test]
    fn null_error_is_not_an_error() {
        assert!(scan(json!({ "error": null, "message": "ok", "grade": "B" })).error_message().is_none());
        assert_eq!(
            scan(json!({ "error": "invalid-hostname", "message": "Cannot resolve host" })).error_message(),
            Some("Cannot resolve host")
        );
    }
}
