// src/core/scanner/mod.rs

// The public interface of the `scanner` module: the provider adapters and
// the orchestrator that fans a scan out across them.
pub mod cve_scanner;
pub mod domain_scanner;
pub mod headers_scanner;
pub mod http;
pub mod provider;
pub mod reputation_scanner;
pub mod summarizer;
pub mod threat_list_scanner;
pub mod tls_scanner;

use crate::config::Settings;
use crate::core::cache::ReportCache;
use crate::core::error::ScanError;
use crate::core::models::{
    AiSummary, CveLookup, DomainReport, HeaderGradeReport, ProviderResult, ReputationReport, ScanReport,
    SeverityLevel, SeverityTally, ThreatListReport, TlsReport,
};
use crate::core::param_screen::screen_url;
use crate::core::scoring::score_severity;
use crate::core::target::ScanTarget;
use chrono::Utc;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use self::cve_scanner::CveScanner;
use self::domain_scanner::DomainScanner;
use self::headers_scanner::HeadersScanner;
use self::provider::{CveSearch, ScanAdapter, Summarizer};
use self::reputation_scanner::ReputationScanner;
use self::summarizer::GeminiSummarizer;
use self::threat_list_scanner::ThreatListScanner;
use self::tls_scanner::TlsScanner;

/// One implementation per report slot.
#[derive(Clone)]
pub struct ScanAdapters {
    pub reputation: Arc<dyn ScanAdapter<Output = ReputationReport>>,
    pub threat_list: Arc<dyn ScanAdapter<Output = ThreatListReport>>,
    pub tls: Arc<dyn ScanAdapter<Output = TlsReport>>,
    pub headers: Arc<dyn ScanAdapter<Output = HeaderGradeReport>>,
    pub domain: Arc<dyn ScanAdapter<Output = DomainReport>>,
    pub cve: Arc<dyn CveSearch>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl ScanAdapters {
    /// The live providers, sharing one HTTP client.
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = http::build_client(settings.request_timeout())?;
        let poll = settings.poll_config();

        Ok(Self {
            reputation: Arc::new(ReputationScanner::new(client.clone(), &settings.virustotal, poll.clone())),
            threat_list: Arc::new(ThreatListScanner::new(client.clone(), &settings.safe_browsing)),
            tls: Arc::new(TlsScanner::new(client.clone(), &settings.ssl_labs, poll.clone())),
            headers: Arc::new(HeadersScanner::new(client.clone(), &settings.observatory, poll)),
            domain: Arc::new(DomainScanner::new(client.clone(), &settings.api_ninjas)),
            cve: Arc::new(CveScanner::new(client.clone(), &settings.nvd)),
            summarizer: Arc::new(GeminiSummarizer::new(client, &settings.summarizer)),
        })
    }
}

/// Runs scans: validates the target, fans out to every provider, scores the
/// collected results and asks for a summary.
pub struct Scanner {
    adapters: ScanAdapters,
    cache: Option<Arc<ReportCache>>,
    cve_keywords: Vec<String>,
    deadline: Option<Duration>,
}

impl Scanner {
    pub fn new(adapters: ScanAdapters) -> Self {
        Self {
            adapters,
            cache: None,
            cve_keywords: Vec::new(),
            deadline: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        let mut scanner = Self::new(ScanAdapters::from_settings(settings)?)
            .with_cve_keywords(settings.scan.cve_keywords.clone())
            .with_deadline(settings.scan_deadline());
        if settings.cache.enabled {
            scanner = scanner.with_cache(Arc::new(ReportCache::new(settings.cache_ttl())));
        }
        Ok(scanner)
    }

    pub fn with_cache(mut self, cache: Arc<ReportCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cve_keywords(mut self, keywords: Vec<String>) -> Self {
        self.cve_keywords = keywords;
        self
    }

    /// Bounds the whole scan, summary included. Providers still running when
    /// it passes are dropped and reported as timed out.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Scans one URL.
    ///
    /// Only an unusable URL is an error. Every provider failure is recorded in
    /// the report slot of that provider and the scan carries on.
    pub async fn run_scan(&self, raw_url: &str) -> Result<ScanReport, ScanError> {
        let target = ScanTarget::parse(raw_url).map_err(|e| {
            warn!(input = raw_url, error = %e, "Rejected scan target.");
            ScanError::from(e)
        })?;

        let cache_key = target.cache_key();
        if let Some(report) = self.cache.as_ref().and_then(|c| c.get(&cache_key)) {
            info!(target = %target.as_str(), "Serving report from cache.");
            return Ok(report);
        }

        info!(target = %target.as_str(), "Starting full scan.");
        let deadline = self.deadline.map(|d| Instant::now() + d);
        let parameters = screen_url(target.url());

        let a = &self.adapters;
        let tls = async {
            if target.is_https() {
                bounded(a.tls.name(), deadline, a.tls.fetch(&target)).await
            } else {
                debug!("Plain HTTP target, skipping TLS assessment.");
                Err(ScanError::skipped(a.tls.name(), "target is served over plain HTTP"))
            }
        };
        let cve = join_all(self.cve_keywords.iter().map(|keyword| async move {
            CveLookup {
                keyword: keyword.clone(),
                result: bounded(a.cve.name(), deadline, a.cve.search(keyword)).await,
            }
        }));

        let (reputation, threat_list, tls, headers, domain, cve) = tokio::join!(
            bounded(a.reputation.name(), deadline, a.reputation.fetch(&target)),
            bounded(a.threat_list.name(), deadline, a.threat_list.fetch(&target)),
            tls,
            bounded(a.headers.name(), deadline, a.headers.fetch(&target)),
            bounded(a.domain.name(), deadline, a.domain.fetch(&target)),
            cve,
        );

        let mut report = ScanReport {
            target,
            scanned_at: Utc::now(),
            reputation,
            threat_list,
            tls,
            headers,
            domain,
            cve,
            parameters,
            severity: SeverityTally::default(),
            summary: AiSummary::default(),
        };
        report.severity = score_severity(&report);

        let summarized = bounded(a.summarizer.name(), deadline, a.summarizer.summarize(&report)).await;
        let summary_transient = summarized.as_ref().is_err_and(|e| e.is_transient());
        report.summary = summarized.unwrap_or_else(|e| {
            warn!(error = %e, "Summary unavailable, using fallback text.");
            AiSummary::fallback(&e)
        });

        for error in report.provider_errors() {
            debug!(provider = %error.provider, kind = %error.kind, "Provider unavailable.");
        }
        info!(
            high = report.severity.count(SeverityLevel::High),
            medium = report.severity.count(SeverityLevel::Medium),
            low = report.severity.count(SeverityLevel::Low),
            unavailable = report.provider_errors().len(),
            "Full scan finished."
        );

        if let Some(cache) = &self.cache {
            if report.has_transient_failures() || summary_transient {
                debug!("Report has transient failures, not caching.");
            } else {
                cache.insert(cache_key, report.clone());
            }
        }

        Ok(report)
    }
}

/// Awaits `fut`, giving up at `deadline`. Dropping the future cancels any
/// request or poll loop it was running.
async fn bounded<T, F>(provider: &str, deadline: Option<Instant>, fut: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    let Some(deadline) = deadline else {
        return fut.await;
    };
    match timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(provider, "Provider cancelled at scan deadline.");
            Err(ScanError::timeout(provider, "scan deadline exceeded"))
        }
    }
}
