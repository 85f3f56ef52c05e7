// src/core/scanner/http.rs

//! Request plumbing shared by every provider adapter: one client, one way of
//! turning HTTP failures into `ScanError`s.

use crate::core::error::ScanError;
use crate::core::models::ProviderResult;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

pub const USER_AGENT: &str = concat!("vulnscan-rs/", env!("CARGO_PKG_VERSION"));

/// Builds the client shared by all adapters.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).timeout(timeout).build()
}

/// A response that arrived, whatever its status.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Sends a request. Only transport failures become errors here.
pub async fn send(provider: &str, request: RequestBuilder) -> ProviderResult<RawResponse> {
    let response = request
        .send()
        .await
        .map_err(|e| classify_transport_error(provider, &e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| classify_transport_error(provider, &e))?;
    debug!(provider, status = %status, bytes = body.len(), "Received provider response.");
    Ok(RawResponse { status, body })
}

/// Sends a request and decodes a 2xx JSON body into `T`.
pub async fn send_json<T: DeserializeOwned>(provider: &str, request: RequestBuilder) -> ProviderResult<T> {
    let response = send(provider, request).await?;
    if !response.status.is_success() {
        return Err(classify_status(provider, response.status, &response.body));
    }
    parse_json(provider, &response.body)
}

pub fn parse_json<T: DeserializeOwned>(provider: &str, body: &str) -> ProviderResult<T> {
    serde_json::from_str(body).map_err(|e| {
        warn!(provider, error = %e, "Provider returned an undecodable payload.");
        ScanError::malformed(provider, format!("invalid JSON: {e}"))
    })
}

/// Maps a non-2xx status to an error kind, keeping the provider's own message
/// when the body carries one.
pub fn classify_status(provider: &str, status: StatusCode, body: &str) -> ScanError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| extract_error_message(&v))
        .unwrap_or_else(|| format!("request failed with status {status}"));
    warn!(provider, status = %status, detail = %detail, "Provider request failed.");

    match status.as_u16() {
        401 | 403 => ScanError::unauthorized(provider, detail),
        429 | 529 => ScanError::rate_limited(provider, detail),
        408 | 504 => ScanError::timeout(provider, detail),
        _ => ScanError::network(provider, detail),
    }
}

pub fn classify_transport_error(provider: &str, error: &reqwest::Error) -> ScanError {
    if error.is_timeout() {
        ScanError::timeout(provider, error.to_string())
    } else if error.is_decode() {
        ScanError::malformed(provider, error.to_string())
    } else {
        ScanError::network(provider, error.to_string())
    }
}

/// Finds a human-readable error in common vendor shapes: `{"error": {"message"}}`,
/// `{"message"}` or `{"error": "..."}`.
pub fn extract_error_message(body: &serde_json::Value) -> Option<String> {
    body.pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| body.get("message").and_then(|v| v.as_str()))
        .or_else(|| body.get("error").and_then(|v| v.as_str()))
        .map(str::to_string)
}

/// Returns the API key or a `NotConfigured` error naming the variable.
pub fn require_key<'a>(provider: &str, key: Option<&'a str>, env_var: &str) -> ProviderResult<&'a str> {
    key.filter(|k| !k.is_empty())
        .ok_or_else(|| ScanError::not_configured(provider, format!("{env_var} is not set")))
}
