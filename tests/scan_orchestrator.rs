// Orchestrator behaviour against in-process stub providers.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vulnscan_rs::core::cache::ReportCache;
use vulnscan_rs::core::error::{ScanError, ScanErrorKind};
use vulnscan_rs::core::models::{
    AiSummary, CveSearchResult, DomainReport, HeaderGradeReport, ProviderResult, ReputationReport,
    ScanReport, SeverityLevel, ThreatListReport, TlsReport,
};
use vulnscan_rs::core::scanner::provider::{CveSearch, ScanAdapter, Summarizer};
use vulnscan_rs::core::scanner::{ScanAdapters, Scanner};
use vulnscan_rs::core::target::ScanTarget;

// --- Stubs ---

struct Stub<T> {
    name: &'static str,
    result: ProviderResult<T>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl<T> Stub<T> {
    fn new(name: &'static str, result: ProviderResult<T>) -> Arc<Self> {
        Arc::new(Self {
            name,
            result,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(name: &'static str, result: ProviderResult<T>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            result,
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> ProviderResult<T>
    where
        T: Clone,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ScanAdapter for Stub<T> {
    type Output = T;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _target: &ScanTarget) -> ProviderResult<T> {
        self.answer().await
    }
}

#[async_trait]
impl CveSearch for Stub<CveSearchResult> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, keyword: &str) -> ProviderResult<CveSearchResult> {
        self.answer().await.map(|mut result| {
            result.keyword = keyword.to_string();
            result
        })
    }
}

#[async_trait]
impl Summarizer for Stub<AiSummary> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn summarize(&self, _report: &ScanReport) -> ProviderResult<AiSummary> {
        self.answer().await
    }
}

struct Stubs {
    reputation: Arc<Stub<ReputationReport>>,
    threat_list: Arc<Stub<ThreatListReport>>,
    tls: Arc<Stub<TlsReport>>,
    headers: Arc<Stub<HeaderGradeReport>>,
    domain: Arc<Stub<DomainReport>>,
    cve: Arc<Stub<CveSearchResult>>,
    summarizer: Arc<Stub<AiSummary>>,
}

impl Stubs {
    /// Every provider answers with a clean, healthy result.
    fn clean() -> Self {
        Self {
            reputation: Stub::new(
                "VirusTotal",
                Ok(ReputationReport {
                    analysis_id: "u-1".to_string(),
                    harmless: 80,
                    ..Default::default()
                }),
            ),
            threat_list: Stub::new("Safe Browsing", Ok(ThreatListReport::default())),
            tls: Stub::new(
                "SSL Labs",
                Ok(TlsReport {
                    grade: "A+".to_string(),
                    protocols: vec!["TLS 1.3".to_string()],
                }),
            ),
            headers: Stub::new(
                "Mozilla Observatory",
                Ok(HeaderGradeReport {
                    grade: "A".to_string(),
                    score: 100,
                }),
            ),
            domain: Stub::new(
                "API Ninjas",
                Ok(DomainReport {
                    domain: "example.com".to_string(),
                    age_days: Some(10_000),
                    ..Default::default()
                }),
            ),
            cve: Stub::new("NVD", Ok(CveSearchResult::default())),
            summarizer: Stub::new(
                "Gemini",
                Ok(AiSummary {
                    overview: "Nothing of note.".to_string(),
                    ..Default::default()
                }),
            ),
        }
    }

    fn adapters(&self) -> ScanAdapters {
        ScanAdapters {
            reputation: self.reputation.clone(),
            threat_list: self.threat_list.clone(),
            tls: self.tls.clone(),
            headers: self.headers.clone(),
            domain: self.domain.clone(),
            cve: self.cve.clone(),
            summarizer: self.summarizer.clone(),
        }
    }

    fn total_calls(&self) -> usize {
        self.reputation.calls()
            + self.threat_list.calls()
            + self.tls.calls()
            + self.headers.calls()
            + self.domain.calls()
            + self.cve.calls()
            + self.summarizer.calls()
    }
}

// --- Tests ---

#[tokio::test]
async fn invalid_target_aborts_before_any_provider_call() {
    let stubs = Stubs::clean();
    let scanner = Scanner::new(stubs.adapters());

    for input in ["", "https://", "ftp://example.com/file"] {
        let err = scanner.run_scan(input).await.unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::InvalidInput, "input {input:?}");
    }
    assert_eq!(stubs.total_calls(), 0);
}

#[tokio::test]
async fn https_scan_fills_every_slot() {
    let stubs = Stubs::clean();
    let scanner =
        Scanner::new(stubs.adapters()).with_cve_keywords(vec!["apache".to_string(), "nginx".to_string()]);

    let report = scanner.run_scan("https://example.com/").await.unwrap();

    assert!(report.reputation.is_ok());
    assert!(report.threat_list.is_ok());
    assert_eq!(report.tls.as_ref().unwrap().grade, "A+");
    assert!(report.headers.is_ok());
    assert!(report.domain.is_ok());
    let keywords: Vec<&str> = report.cve.iter().map(|c| c.keyword.as_str()).collect();
    assert_eq!(keywords, ["apache", "nginx"]);
    assert_eq!(report.cve[1].result.as_ref().unwrap().keyword, "nginx");
    assert_eq!(stubs.cve.calls(), 2);

    assert!(report.severity.is_clean());
    assert_eq!(report.severity.signals[0].code, "NO_ISSUES_FOUND");
    assert_eq!(report.summary.overview, "Nothing of note.");
}

#[tokio::test]
async fn plain_http_skips_tls_and_scores_parameters() {
    let stubs = Stubs::clean();
    let scanner = Scanner::new(stubs.adapters());

    let report = scanner.run_scan("http://example.com/?token=abc123").await.unwrap();

    assert_eq!(stubs.tls.calls(), 0);
    assert_eq!(report.tls.as_ref().unwrap_err().kind, ScanErrorKind::Skipped);

    let severity = &report.severity;
    assert_eq!(severity.count(SeverityLevel::High), 1);
    assert_eq!(severity.weight(SeverityLevel::High), 2);
    assert_eq!(severity.count(SeverityLevel::Medium), 1);
    assert_eq!(severity.count(SeverityLevel::Secure), 0);
    let codes: Vec<&str> = severity.signals.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, ["HTTPS_MISSING", "PARAMETER_THREAT"]);
    assert_eq!(severity.total_count() as usize, severity.signals.len());
}

#[tokio::test]
async fn provider_failures_stay_in_their_slot() {
    let mut stubs = Stubs::clean();
    stubs.reputation = Stub::new(
        "VirusTotal",
        Err(ScanError::not_configured("VirusTotal", "VIRUSTOTAL_API_KEY is not set")),
    );
    stubs.headers = Stub::new(
        "Mozilla Observatory",
        Err(ScanError::provider_failed("Mozilla Observatory", "host unreachable")),
    );
    let scanner = Scanner::new(stubs.adapters());

    let report = scanner.run_scan("https://example.com/").await.unwrap();

    assert_eq!(report.reputation.as_ref().unwrap_err().kind, ScanErrorKind::NotConfigured);
    assert_eq!(report.headers.as_ref().unwrap_err().kind, ScanErrorKind::ProviderFailed);
    assert!(report.tls.is_ok());
    assert_eq!(report.provider_errors().len(), 2);
    assert!(report.severity.is_clean());
}

#[tokio::test]
async fn slow_provider_is_cut_off_at_the_deadline() {
    let mut stubs = Stubs::clean();
    stubs.tls = Stub::slow(
        "SSL Labs",
        Ok(TlsReport {
            grade: "A".to_string(),
            protocols: Vec::new(),
        }),
        Duration::from_secs(30),
    );
    let scanner = Scanner::new(stubs.adapters()).with_deadline(Some(Duration::from_millis(100)));

    let report = scanner.run_scan("https://example.com/").await.unwrap();

    let err = report.tls.as_ref().unwrap_err();
    assert_eq!(err.kind, ScanErrorKind::Timeout);
    assert_eq!(err.provider, "SSL Labs");
    assert!(report.reputation.is_ok());
}

#[tokio::test]
async fn summarizer_failure_falls_back() {
    let mut stubs = Stubs::clean();
    stubs.summarizer = Stub::new("Gemini", Err(ScanError::rate_limited("Gemini", "quota exhausted")));
    let scanner = Scanner::new(stubs.adapters());

    let report = scanner.run_scan("https://example.com/").await.unwrap();

    assert!(report.summary.fallback);
    assert!(report.summary.overview.contains("quota exhausted"));
    assert!(report.summary.vulnerabilities.is_empty());
}

#[tokio::test]
async fn cached_report_is_served_without_provider_calls() {
    let stubs = Stubs::clean();
    let cache = Arc::new(ReportCache::new(None));
    let scanner = Scanner::new(stubs.adapters()).with_cache(cache.clone());

    let first = scanner.run_scan("https://example.com/").await.unwrap();
    let calls = stubs.total_calls();
    let second = scanner.run_scan("https://example.com/").await.unwrap();

    assert_eq!(cache.len(), 1);
    assert_eq!(stubs.total_calls(), calls);
    assert_eq!(first, second);
}

#[tokio::test]
async fn transient_failures_are_not_cached() {
    let mut stubs = Stubs::clean();
    stubs.domain = Stub::new("API Ninjas", Err(ScanError::network("API Ninjas", "connection reset")));
    let cache = Arc::new(ReportCache::new(None));
    let scanner = Scanner::new(stubs.adapters()).with_cache(cache.clone());

    scanner.run_scan("https://example.com/").await.unwrap();
    scanner.run_scan("https://example.com/").await.unwrap();

    assert!(cache.is_empty());
    assert_eq!(stubs.domain.calls(), 2);
}
