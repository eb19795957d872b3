//! Revena audit engine.
//!
//! Owns audit jobs, drives each through a staged analysis pipeline, and keeps
//! the editable item list of the job under review.

pub mod config;
pub mod error;
pub mod items;
pub mod keyboard;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod state_machine;
pub mod store;

pub use config::EngineConfig;
pub use error::RevenaError;
pub use store::{AuditStore, StoreEvent};
