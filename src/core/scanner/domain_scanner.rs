// src/core/scanner/domain_scanner.rs

use crate::config::ProviderSettings;
use crate::core::models::{DomainReport, ProviderResult};
use crate::core::scanner::http::{require_key, send_json};
use crate::core::scanner::provider::ScanAdapter;
use crate::core::target::ScanTarget;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.api-ninjas.com/v1";
const PROVIDER: &str = "API Ninjas";

/// Domain registration metadata from the API Ninjas WHOIS endpoint.
pub struct DomainScanner {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl DomainScanner {
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
impl ScanAdapter for DomainScanner {
    type Output = DomainReport;

    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, target: &ScanTarget) -> ProviderResult<DomainReport> {
        let api_key = require_key(PROVIDER, self.api_key.as_deref(), "API_NINJAS_KEY")?;
        // WHOIS data lives on the registered domain, not the `www.` host.
        let domain = target.registrable_domain();
        info!(domain, "Starting domain lookup.");

        let request = self
            .client
            .get(format!("{}/whois", self.base_url))
            .header("X-Api-Key", api_key)
            .query(&[("domain", domain)]);
        let body: Value = send_json(PROVIDER, request).await?;

        let report = build_report(domain, &body, Utc::now());
        debug!(registrar = ?report.registrar, age_days = ?report.age_days, "Domain lookup parsed.");
        info!(domain, "Domain lookup finished.");
        Ok(report)
    }
}

fn build_report(domain: &str, body: &Value, now: DateTime<Utc>) -> DomainReport {
    let created = timestamp(body.get("creation_date"));
    DomainReport {
        domain: domain.to_string(),
        registrar: text(body.get("registrar")),
        country: text(body.get("country")),
        created,
        updated: timestamp(body.get("updated_date")),
        expires: timestamp(body.get("expiration_date")),
        age_days: created.map(|c| (now - c).num_days()),
    }
}

/// WHOIS records often repeat a field; the first value wins.
fn first(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.first(),
        Value::Null => None,
        other => Some(other),
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    first(value)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts Unix seconds as a number or numeric string, or a date string in
/// RFC 3339 or `YYYY-MM-DD HH:MM:SS` form.
fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match first(value)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<i64>() {
                return Utc.timestamp_opt(secs, 0).single();
            }
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                        .ok()
                        .map(|naive| naive.and_utc())
                })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamps_in_every_shape() {
        let expected = Utc.timestamp_opt(813_801_600, 0).single();
        assert_eq!(timestamp(Some(&json!(813_801_600))), expected);
        assert_eq!(timestamp(Some(&json!("813801600"))), expected);
        assert_eq!(timestamp(Some(&json!([813_801_600, 813_826_800]))), expected);
        assert_eq!(timestamp(Some(&json!("1995-10-16T00:00:00Z"))), expected);
        assert_eq!(timestamp(Some(&json!("1995-10-16 00:00:00"))), expected);
        assert_eq!(timestamp(Some(&json!("not a date"))), None);
        assert_eq!(timestamp(None), None);
    }

    #[test]
    fn report_computes_age() {
        let now = Utc.timestamp_opt(813_801_600 + 10 * 86_400, 0).unwrap();
        let body = json!({
            "domain_name": "example.com",
            "registrar": ["RESERVED-Internet Assigned Numbers Authority"],
            "creation_date": 813_801_600,
            "expiration_date": "1786442400",
        });
        let report = build_report("example.com", &body, now);
        assert_eq!(report.age_days, Some(10));
        assert_eq!(report.registrar.as_deref(), Some("RESERVED-Internet Assigned Numbers Authority"));
        assert!(report.expires.is_some());
        assert!(report.updated.is_none());
        assert!(report.country.is_none());
    }

    #[test]
    fn empty_body_yields_empty_report() {
        let report = build_report("unknown.example", &json!({}), Utc::now());
        assert_eq!(report.domain, "unknown.example");
        assert_eq!(report.age_days, None);
    }
}
