// src/core/scanner/reputation_scanner.rs

use crate::config::ProviderSettings;
use crate::core::error::ScanError;
use crate::core::models::{ProviderResult, ReputationReport};
use crate::core::poll::{JobStatus, PollConfig, Sleeper, Submission, TokioSleeper, resolve_submission};
use crate::core::scanner::http::{require_key, send_json};
use crate::core::scanner::provider::ScanAdapter;
use crate::core::target::ScanTarget;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://www.virustotal.com/api/v3";
const PROVIDER: &str = "VirusTotal";

// --- Wire Types ---

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SubmittedAnalysis {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Analysis {
    attributes: AnalysisAttributes,
}

#[derive(Debug, Deserialize)]
struct AnalysisAttributes {
    status: String,
    #[serde(default)]
    stats: AnalysisStats,
    #[serde(default)]
    results: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisStats {
    #[serde(default)]
    malicious: u32,
    #[serde(default)]
    suspicious: u32,
    #[serde(default)]
    harmless: u32,
    #[serde(default)]
    undetected: u32,
}

/// Multi-engine URL reputation via VirusTotal. A URL is submitted for
/// analysis and the analysis is polled until it completes.
pub struct ReputationScanner {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    poll: PollConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl ReputationScanner {
    pub fn new(client: Client, settings: &ProviderSettings, poll: PollConfig) -> Self {
        Self {
            client,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: settings.api_key.clone(),
            poll,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    async fn submit(&self, api_key: &str, target: &ScanTarget) -> ProviderResult<String> {
        let request = self
            .client
            .post(format!("{}/urls", self.base_url))
            .header("x-apikey", api_key)
            .header("accept", "application/json")
            .form(&[("url", target.as_str())]);
        let submitted: Envelope<SubmittedAnalysis> = send_json(PROVIDER, request).await?;
        if submitted.data.id.is_empty() {
            return Err(ScanError::malformed(PROVIDER, "no analysis id returned"));
        }
        Ok(submitted.data.id)
    }

    async fn check_analysis(&self, api_key: &str, analysis_id: &str) -> ProviderResult<JobStatus<ReputationReport>> {
        let request = self
            .client
            .get(format!("{}/analyses/{}", self.base_url, analysis_id))
            .header("x-apikey", api_key)
            .header("accept", "application/json");
        let analysis: Envelope<Analysis> = send_json(PROVIDER, request).await?;
        let attributes = analysis.data.attributes;

        Ok(match attributes.status.as_str() {
            "completed" => JobStatus::Finished(ReputationReport {
                analysis_id: analysis_id.to_string(),
                malicious: attributes.stats.malicious,
                suspicious: attributes.stats.suspicious,
                harmless: attributes.stats.harmless,
                undetected: attributes.stats.undetected,
                raw: attributes.results,
            }),
            "queued" | "in-progress" => JobStatus::Pending(attributes.status),
            other => JobStatus::Failed(format!("analysis ended with status '{other}'")),
        })
    }
}

#[async_trait]
impl ScanAdapter for ReputationScanner {
    type Output = ReputationReport;

    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, target: &ScanTarget) -> ProviderResult<ReputationReport> {
        let api_key = require_key(PROVIDER, self.api_key.as_deref(), "VIRUSTOTAL_API_KEY")?;
        info!(target = %target.as_str(), "Starting reputation scan.");

        let analysis_id = self.submit(api_key, target).await?;
        debug!(analysis_id = %analysis_id, "URL submitted for analysis.");

        let report = resolve_submission(
            PROVIDER,
            &self.poll,
            self.sleeper.as_ref(),
            Submission::Job(analysis_id.clone()),
            || self.check_analysis(api_key, &analysis_id),
        )
        .await?;

        info!(
            malicious = report.malicious,
            suspicious = report.suspicious,
            "Reputation scan finished."
        );
        Ok(report)
    }
}
