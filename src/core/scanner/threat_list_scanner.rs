// src/core/scanner/threat_list_scanner.rs

use crate::config::ProviderSettings;
use crate::core::models::{ProviderResult, ThreatListReport, ThreatMatch};
use crate::core::scanner::http::{require_key, send_json};
use crate::core::scanner::provider::ScanAdapter;
use crate::core::target::ScanTarget;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://safebrowsing.googleapis.com/v4";
const PROVIDER: &str = "Safe Browsing";
const CLIENT_ID: &str = "vulnscan-rs";

const THREAT_TYPES: [&str; 4] = [
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    threat_type: String,
    #[serde(default)]
    platform_type: String,
    threat: RawThreat,
}

#[derive(Debug, Deserialize)]
struct RawThreat {
    url: String,
}

/// Looks the URL up on Google Safe Browsing threat lists. An empty response
/// body means the URL is not listed.
pub struct ThreatListScanner {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ThreatListScanner {
    pub fn new(client: Client, settings: &ProviderSettings) -> Self {
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
impl ScanAdapter for ThreatListScanner {
    type Output = ThreatListReport;

    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, target: &ScanTarget) -> ProviderResult<ThreatListReport> {
        let api_key = require_key(PROVIDER, self.api_key.as_deref(), "SAFE_BROWSING_API_KEY")?;
        info!(target = %target.as_str(), "Starting threat list lookup.");

        let body = json!({
            "client": {
                "clientId": CLIENT_ID,
                "clientVersion": env!("CARGO_PKG_VERSION"),
            },
            "threatInfo": {
                "threatTypes": THREAT_TYPES,
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{ "url": target.as_str() }],
            }
        });

        let request = self
            .client
            .post(format!("{}/threatMatches:find", self.base_url))
            .query(&[("key", api_key)])
            .json(&body);
        let response: FindResponse = send_json(PROVIDER, request).await?;

        let matches: Vec<ThreatMatch> = response
            .matches
            .into_iter()
            .map(|m| ThreatMatch {
                threat_type: m.threat_type,
                platform_type: m.platform_type,
                url: m.threat.url,
            })
            .collect();

        info!(matches = matches.len(), "Threat list lookup finished.");
        Ok(ThreatListReport { matches })
    }
}
