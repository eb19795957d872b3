//! Errors an analysis provider can report.
//!
//! The pipeline never propagates these. It turns them into a `Failed` job
//! with one error log line.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider could not be reached.
    #[error("analysis provider unavailable: {0}")]
    Unavailable(String),

    /// The provider refused the document (unreadable, unsupported format).
    #[error("document rejected: {reason}")]
    Rejected { reason: String },

    #[error("analysis timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}
