use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an audit job.
///
/// Jobs flow strictly forward: QUEUED → PROCESSING → READY | FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Ready,
    Failed,
}

impl JobStatus {
    /// `Ready` and `Failed` end the lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            JobStatus::Ready | JobStatus::Failed => 2,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Processing => write!(f, "PROCESSING"),
            JobStatus::Ready => write!(f, "READY"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One fixed step of the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    InitializingContext,
    DocumentStructure,
    EntityExtraction,
    BillingValidation,
}

impl Stage {
    /// Every stage in execution order. The provider call that follows
    /// reports through its outcome.
    pub const LOGGED: [Stage; 4] = [
        Stage::InitializingContext,
        Stage::DocumentStructure,
        Stage::EntityExtraction,
        Stage::BillingValidation,
    ];

    pub fn log_message(self) -> &'static str {
        match self {
            Stage::InitializingContext => "AI agent: initializing context...",
            Stage::DocumentStructure => "AI agent: analyzing document structure...",
            Stage::EntityExtraction => "AI agent: extracting medical entities...",
            Stage::BillingValidation => "AI agent: validating billing rules...",
        }
    }

    pub fn progress_label(self) -> &'static str {
        match self {
            Stage::InitializingContext => "Initializing analysis...",
            Stage::DocumentStructure => "Analyzing structure...",
            Stage::EntityExtraction => "Extracting entities...",
            Stage::BillingValidation => "Validating rules...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::InitializingContext => write!(f, "INITIALIZING_CONTEXT"),
            Stage::DocumentStructure => write!(f, "DOCUMENT_STRUCTURE"),
            Stage::EntityExtraction => write!(f, "ENTITY_EXTRACTION"),
            Stage::BillingValidation => write!(f, "BILLING_VALIDATION"),
        }
    }
}

/// Simulated cost of each logged stage, applied before the stage announces itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTimings {
    pub document_structure: Duration,
    pub entity_extraction: Duration,
    pub billing_validation: Duration,
}

impl StageTimings {
    pub fn delay_before(&self, stage: Stage) -> Duration {
        match stage {
            Stage::InitializingContext => Duration::ZERO,
            Stage::DocumentStructure => self.document_structure,
            Stage::EntityExtraction => self.entity_extraction,
            Stage::BillingValidation => self.billing_validation,
        }
    }

    pub fn zero() -> Self {
        Self {
            document_structure: Duration::ZERO,
            entity_extraction: Duration::ZERO,
            billing_validation: Duration::ZERO,
        }
    }
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            document_structure: Duration::from_millis(1500),
            entity_extraction: Duration::from_millis(2000),
            billing_validation: Duration::from_millis(1500),
        }
    }
}

/// Guards job status changes.
pub struct StateMachine;

impl StateMachine {
    /// Whether `from → to` is allowed.
    ///
    /// Staying in the same non-terminal status is allowed so progress labels
    /// can change. Terminal statuses never change, and nothing moves backwards
    /// or skips `Processing`.
    pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
        if from.is_terminal() {
            return false;
        }
        if from == to {
            return true;
        }
        to.rank() == from.rank() + 1
    }
}
