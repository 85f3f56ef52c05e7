// src/core/target.rs

use crate::core::error::TargetError;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// A validated absolute `http`/`https` URL, built once per scan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    url: Url,
    hostname: String,
    is_https: bool,
}

impl ScanTarget {
    /// Parses user input into a target.
    ///
    /// Input that arrives fully percent-encoded (`https%3A%2F%2F...`) is decoded
    /// once. Input without any scheme is assumed to be `http://`.
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }

        let decoded = if is_percent_encoded_url(trimmed) {
            urlencoding::decode(trimmed)
                .map_err(|e| TargetError::Decode(e.to_string()))?
                .into_owned()
        } else {
            trimmed.to_string()
        };

        let with_scheme = if decoded.contains("://") {
            decoded
        } else {
            format!("http://{decoded}")
        };

        let url = Url::parse(&with_scheme).map_err(|e| TargetError::Invalid {
            input: raw.to_string(),
            reason: e.to_string(),
        })?;

        let is_https = match url.scheme() {
            "https" => true,
            "http" => false,
            other => return Err(TargetError::UnsupportedScheme(other.to_string())),
        };

        let hostname = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(TargetError::MissingHost)?
            .to_string();

        debug!(url = %url, hostname = %hostname, is_https, "Parsed scan target.");
        Ok(Self { url, hostname, is_https })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn is_https(&self) -> bool {
        self.is_https
    }

    /// The host with a leading `www.` removed, used for WHOIS lookups.
    pub fn registrable_domain(&self) -> &str {
        self.hostname.strip_prefix("www.").unwrap_or(&self.hostname)
    }

    /// Normalized key for the report cache. Fragments never reach the server,
    /// so they do not distinguish reports.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }
}

fn is_percent_encoded_url(input: &str) -> bool {
    let lower = input.get(..8).unwrap_or(input).to_ascii_lowercase();
    lower.starts_with("http%3a") || lower.starts_with("https%3a")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_url() {
        let target = ScanTarget::parse("https://www.example.com/login?next=/").unwrap();
        assert!(target.is_https());
        assert_eq!(target.hostname(), "www.example.com");
        assert_eq!(target.registrable_domain(), "example.com");
    }

    #[test]
    fn bare_host_defaults_to_http() {
        let target = ScanTarget::parse("example.com").unwrap();
        assert!(!target.is_https());
        assert_eq!(target.as_str(), "http://example.com/");
    }

    #[test]
    fn decodes_percent_encoded_input() {
        let target = ScanTarget::parse("https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc").unwrap();
        assert_eq!(target.as_str(), "https://example.com/a?b=c");
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            ScanTarget::parse("ftp://example.com").unwrap_err(),
            TargetError::UnsupportedScheme("ftp".to_string())
        );
    }

    #[test]
    fn rejects_garbage_and_empty_input() {
        assert_eq!(ScanTarget::parse("   ").unwrap_err(), TargetError::Empty);
        assert!(matches!(
            ScanTarget::parse("http://exa mple.com").unwrap_err(),
            TargetError::Invalid { .. }
        ));
    }

    #[test]
    fn cache_key_ignores_fragment() {
        let a = ScanTarget::parse("https://example.com/page#top").unwrap();
        let b = ScanTarget::parse("https://example.com/page").unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
