// src/ui/widgets/mod.rs

pub mod analysis_view; // Scored signals, their details and the AI summary.
pub mod footer;
pub mod input;
pub mod summary; // Severity tally and provider status.
