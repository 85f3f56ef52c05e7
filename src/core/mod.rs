// src/core/mod.rs

// The root of the `core` module: everything needed to run a scan without a
// terminal attached.

/// Data structures shared by the scanner, the scorer and the UI, such as
/// `ScanReport` and `SeverityTally`.
pub mod models;

/// The error taxonomy stored in report slots.
pub mod error;

pub mod target;

/// Bounded polling for remote jobs that finish asynchronously.
pub mod poll;

/// Lexical screening of query parameters.
pub mod param_screen;

pub mod scoring;
pub mod cache;

/// Provider adapters and the scan orchestrator.
pub mod scanner;

/// Human-readable explanations and remediation for every severity signal.
pub mod knowledge_base;
