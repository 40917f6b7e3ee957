//! Error types for the USDC panel
//!
//! Uses `eyre` for ergonomic error handling with context. `PanelError` is the
//! value kept in panel state when failures are surfaced to the view.

use std::fmt;

pub use eyre::{eyre, Context, Report, Result};

/// A failed panel operation, rendered for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelError {
    /// Operation that failed (e.g. "approve transfer")
    pub operation: &'static str,
    /// Rendered error chain
    pub message: String,
}

impl PanelError {
    /// Capture an eyre report, including its context chain
    pub fn new(operation: &'static str, report: &Report) -> Self {
        Self {
            operation,
            message: format!("{:#}", report),
        }
    }
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to {}: {}", self.operation, self.message)
    }
}

impl std::error::Error for PanelError {}
