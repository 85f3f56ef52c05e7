// src/core/scanner/tls_scanner.rs

use crate::config::ProviderSettings;
use crate::core::error::ScanError;
use crate::core::models::{ProviderResult, TlsReport};
use crate::core::poll::{JobStatus, PollConfig, Sleeper, Submission, TokioSleeper, resolve_submission};
use crate::core::scanner::http::send_json;
use crate::core::scanner::provider::ScanAdapter;
use crate::core::target::ScanTarget;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://api.ssllabs.com/api/v3";
const PROVIDER: &str = "SSL Labs";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Analysis {
    status: String,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    #[serde(default)]
    grade: Option<String>,
    #[serde(default)]
    details: Option<EndpointDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct EndpointDetails {
    #[serde(default)]
    protocols: Vec<Protocol>,
}

#[derive(Debug, Deserialize)]
struct Protocol {
    name: String,
    version: String,
}

/// Remote TLS configuration grading via the SSL Labs assessment API.
/// Assessments take minutes, so the first request starts one (or reuses a
/// recent cached one) and later requests poll it.
pub struct TlsScanner {
    client: Client,
    base_url: String,
    poll: PollConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl TlsScanner {
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

    async fn analyze(&self, host: &str, first: bool) -> ProviderResult<JobStatus<TlsReport>> {
        let mut query = vec![("host", host), ("all", "done")];
        if first {
            query.extend([("fromCache", "on"), ("maxAge", "24")]);
        }
        let request = self.client.get(format!("{}/analyze", self.base_url)).query(&query);
        let analysis: Analysis = send_json(PROVIDER, request).await?;
        Ok(interpret(analysis))
    }
}

fn interpret(analysis: Analysis) -> JobStatus<TlsReport> {
    match analysis.status.as_str() {
        "READY" => match graded_endpoint(analysis.endpoints) {
            Some(report) => JobStatus::Finished(report),
            None => JobStatus::Failed("assessment finished without a graded endpoint".to_string()),
        },
        "ERROR" => JobStatus::Failed(
            analysis
                .status_message
                .unwrap_or_else(|| "assessment failed to complete".to_string()),
        ),
        _ => JobStatus::Pending(analysis.status),
    }
}

fn graded_endpoint(endpoints: Vec<Endpoint>) -> Option<TlsReport> {
    let endpoint = endpoints.into_iter().find(|e| e.grade.is_some())?;
    let protocols = endpoint
        .details
        .unwrap_or_default()
        .protocols
        .into_iter()
        .map(|p| format!("{} {}", p.name, p.version))
        .collect();
    Some(TlsReport {
        grade: endpoint.grade?,
        protocols,
    })
}

#[async_trait]
impl ScanAdapter for TlsScanner {
    type Output = TlsReport;

    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, target: &ScanTarget) -> ProviderResult<TlsReport> {
        let host = target.hostname();
        info!(host, "Starting TLS assessment.");

        let submission = match self.analyze(host, true).await? {
            JobStatus::Finished(report) => Submission::Immediate(report),
            JobStatus::Failed(reason) => {
                error!(host, reason = %reason, "TLS assessment rejected.");
                return Err(ScanError::provider_failed(PROVIDER, reason));
            }
            JobStatus::Pending(status) => {
                debug!(host, status = %status, "TLS assessment in progress.");
                Submission::Job(host.to_string())
            }
        };

        let report = resolve_submission(PROVIDER, &self.poll, self.sleeper.as_ref(), submission, || {
            self.analyze(host, false)
        })
        .await?;

        info!(grade = %report.grade, "TLS assessment finished.");
        Ok(report)
    }
}
