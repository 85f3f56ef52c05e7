// src/core/scanner/cve_scanner.rs

use crate::config::ProviderSettings;
use crate::core::error::ScanError;
use crate::core::models::{CveItem, CveSearchResult, ProviderResult};
use crate::core::scanner::http::send_json;
use crate::core::scanner::provider::CveSearch;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
const PROVIDER: &str = "NVD";
const RESULTS_PER_PAGE: &str = "10";

/// Keyword search against the NVD CVE 2.0 API. The API key is optional and
/// only raises the rate limit.
pub struct CveScanner {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CveScanner {
    pub fn new(client: Client, settings: &ProviderSettings) -> Self {
        if settings.api_key.is_none() {
            warn!("NVD_API_KEY is not set, CVE searches use the public rate limit.");
        }
        Self {
            client,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: settings.api_key.clone(),
        }
    }
}

#[async_trait]
impl CveSearch for CveScanner {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, keyword: &str) -> ProviderResult<CveSearchResult> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ScanError::skipped(PROVIDER, "empty keyword"));
        }
        info!(keyword, "Starting CVE search.");

        let mut request = self
            .client
            .get(&self.base_url)
            .header("accept", "application/json")
            .query(&[("keywordSearch", keyword), ("resultsPerPage", RESULTS_PER_PAGE)]);
        if let Some(key) = &self.api_key {
            request = request.header("apiKey", key);
        }
        let body: Value = send_json(PROVIDER, request).await?;

        let result = parse_response(keyword, &body)?;
        info!(keyword, total = result.total_results, "CVE search finished.");
        Ok(result)
    }
}

fn parse_response(keyword: &str, body: &Value) -> ProviderResult<CveSearchResult> {
    let vulnerabilities = body
        .get("vulnerabilities")
        .and_then(Value::as_array)
        .ok_or_else(|| ScanError::malformed(PROVIDER, "response has no vulnerabilities array"))?;

    Ok(CveSearchResult {
        keyword: keyword.to_string(),
        total_results: body.get("totalResults").and_then(Value::as_u64).unwrap_or(0),
        items: vulnerabilities
            .iter()
            .filter_map(|v| v.get("cve"))
            .filter_map(parse_cve)
            .collect(),
    })
}

fn parse_cve(cve: &Value) -> Option<CveItem> {
    let id = cve.get("id")?.as_str()?.to_string();

    let description = cve
        .get("descriptions")
        .and_then(Value::as_array)
        .and_then(|descs| {
            descs
                .iter()
                .find(|d| d.get("lang").and_then(Value::as_str) == Some("en"))
                .or_else(|| descs.first())
        })
        .and_then(|d| d.get("value"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Prefer CVSS v3.1, then v3.0, then v2.
    let cvss = cve.get("metrics").and_then(|metrics| {
        ["cvssMetricV31", "cvssMetricV30", "cvssMetricV2"]
            .iter()
            .find_map(|key| metrics.get(*key).and_then(Value::as_array).and_then(|a| a.first()))
    });
    let score = cvss
        .and_then(|m| m.pointer("/cvssData/baseScore"))
        .and_then(Value::as_f64);
    // v2 keeps the severity outside `cvssData`.
    let severity = cvss
        .and_then(|m| m.pointer("/cvssData/baseSeverity").or_else(|| m.get("baseSeverity")))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(CveItem {
        id,
        description,
        score,
        severity,
        published: cve
            .get("published")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}
