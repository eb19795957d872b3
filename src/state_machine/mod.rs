mod job;
mod state;

pub use job::{AuditJob, AuthoringData, LogEntry, LogKind};
pub use state::{JobStatus, Stage, StageTimings, StateMachine};
