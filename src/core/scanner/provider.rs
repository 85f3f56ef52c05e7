// src/core/scanner/provider.rs

//! The seams between the orchestrator and the outside world. Each remote
//! service sits behind one of these traits so scans can run against stubs.

use crate::core::models::{AiSummary, CveSearchResult, ProviderResult, ScanReport};
use crate::core::target::ScanTarget;
use async_trait::async_trait;

/// A provider that inspects one target and produces one report slot.
///
/// Implementations never panic or propagate: every failure is returned as a
/// `ScanError` and stored in the report in place of the value.
#[async_trait]
pub trait ScanAdapter: Send + Sync {
    type Output: Send;

    /// Display name used in logs and in "unavailable" messages.
    fn name(&self) -> &'static str;

    async fn fetch(&self, target: &ScanTarget) -> ProviderResult<Self::Output>;
}

/// Keyword search against a vulnerability database.
#[async_trait]
pub trait CveSearch: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, keyword: &str) -> ProviderResult<CveSearchResult>;
}

/// Turns a scored report into a prose summary. The report's own `summary`
/// field is empty when this is called.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn summarize(&self, report: &ScanReport) -> ProviderResult<AiSummary>;
}
