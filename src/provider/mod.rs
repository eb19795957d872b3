//! Analysis providers: the service that turns a document into line items.

pub mod error;
mod simulated;

use async_trait::async_trait;

use crate::items::AuditItem;
use crate::state_machine::AuditJob;

pub use error::ProviderError;
pub use simulated::{SimulatedProvider, reference_results};

/// Extracts billable items from a job's document.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, job: &AuditJob) -> Result<Vec<AuditItem>, ProviderError>;
}
