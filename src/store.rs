//! The audit store: single owner of the job set, the active job and its
//! editable item collection.
//!
//! [`AuditStore`] is a cheap, cloneable handle. Every mutation goes through one
//! of its methods and is announced on a broadcast channel as a
//! [`StoreEvent`], so views subscribe instead of polling. The state lock is
//! never held across an `.await`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::RevenaError;
use crate::items::{AuditItem, ItemCollection, Kit, PricingResolver, Totals};
use crate::pipeline::PipelineRunner;
use crate::provider::AnalysisProvider;
use crate::report;
use crate::state_machine::{
    AuditJob, AuthoringData, JobStatus, LogEntry, LogKind, Stage, StateMachine,
};

const COMPLETED_LABEL: &str = "Completed";
const FAILED_LABEL: &str = "Error";

/// Change notification published after every store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    JobCreated {
        job_id: String,
    },
    JobUpdated {
        job_id: String,
        status: JobStatus,
        progress_step: Option<String>,
    },
    LogAppended {
        job_id: String,
        entry: LogEntry,
    },
    /// The job reached `Ready` or `Failed`. Always follows the job's last log line.
    JobFinished {
        job_id: String,
        status: JobStatus,
        item_count: Option<usize>,
    },
    ActiveJobChanged {
        job_id: String,
    },
    ItemsChanged {
        count: usize,
    },
}

#[derive(Default)]
struct EngineState {
    jobs: Vec<AuditJob>,
    active_job_id: Option<String>,
    items: ItemCollection,
    in_flight: HashSet<String>,
}

impl EngineState {
    fn job(&self, id: &str) -> Option<&AuditJob> {
        self.jobs.iter().find(|job| job.id == id)
    }

    fn job_mut(&mut self, id: &str) -> Option<&mut AuditJob> {
        self.jobs.iter_mut().find(|job| job.id == id)
    }

    fn is_active(&self, id: &str) -> bool {
        self.active_job_id.as_deref() == Some(id)
    }
}

struct Inner {
    state: Mutex<EngineState>,
    events: broadcast::Sender<StoreEvent>,
    runner: PipelineRunner,
    start_delay: Duration,
}

#[derive(Clone)]
pub struct AuditStore {
    inner: Arc<Inner>,
}

impl AuditStore {
    /// A store backed by the simulated analysis provider.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_provider(config, Arc::new(config.provider()))
    }

    pub fn with_provider(config: &EngineConfig, provider: Arc<dyn AnalysisProvider>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(EngineState::default()),
                events,
                runner: PipelineRunner::new(provider, config.stage_timings()),
                start_delay: config.start_delay(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_all(&self, events: Vec<StoreEvent>) {
        for event in events {
            // No subscribers is fine.
            let _ = self.inner.events.send(event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    // ─── Jobs ───────────────────────────────────────────────────────────────

    /// Add a queued job without scheduling its pipeline.
    pub fn queue_job(&self, filename: impl Into<String>, authoring: Option<AuthoringData>) -> String {
        let job = AuditJob::new(filename.into(), authoring);
        let job_id = job.id.clone();
        info!(job_id = %job_id, filename = %job.filename, "job queued");
        self.state().jobs.push(job);
        self.emit_all(vec![StoreEvent::JobCreated {
            job_id: job_id.clone(),
        }]);
        job_id
    }

    /// Add a queued job and start its pipeline after the configured delay.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn create_job(&self, filename: impl Into<String>, authoring: Option<AuthoringData>) -> String {
        let job_id = self.queue_job(filename, authoring);
        let store = self.clone();
        let delay = self.inner.start_delay;
        let scheduled = job_id.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            store.start_pipeline(&scheduled);
        });
        job_id
    }

    /// Create a job from hand-authored document content.
    pub fn create_authored_job(&self, data: AuthoringData) -> Result<String, RevenaError> {
        data.validate()?;
        let filename = data.filename();
        Ok(self.create_job(filename, Some(data)))
    }

    /// Start the pipeline for a job that has not finished yet.
    ///
    /// Returns `None` without doing anything when the job is unknown, already
    /// has a run in flight, or is `Ready`/`Failed`. A job moved to
    /// `Processing` by an override still gets its run.
    pub fn start_pipeline(&self, job_id: &str) -> Option<JoinHandle<JobStatus>> {
        {
            let mut state = self.state();
            let Some(status) = state.job(job_id).map(|job| job.status) else {
                debug!(job_id, "start_pipeline: no such job");
                return None;
            };
            if state.in_flight.contains(job_id) {
                debug!(job_id, "start_pipeline: run already in flight");
                return None;
            }
            if status.is_terminal() {
                debug!(job_id, %status, "start_pipeline: job already finished");
                return None;
            }
            state.in_flight.insert(job_id.to_string());
        }

        let store = self.clone();
        let job_id = job_id.to_string();
        Some(tokio::spawn(async move {
            let status = store.inner.runner.run(&store, &job_id).await;
            store.state().in_flight.remove(&job_id);
            status
        }))
    }

    /// Override a job's status and progress label. Logs are untouched.
    ///
    /// Returns `false` for unknown jobs and for transitions that would move
    /// the job backwards or out of a terminal status. Moving a job to
    /// `Ready`/`Failed` also announces [`StoreEvent::JobFinished`].
    pub fn set_job_status(&self, job_id: &str, status: JobStatus, progress_step: Option<String>) -> bool {
        let events = {
            let mut state = self.state();
            let Some(job) = state.job_mut(job_id) else {
                debug!(job_id, "set_job_status: no such job");
                return false;
            };
            if !StateMachine::can_transition(job.status, status) {
                warn!(job_id, from = %job.status, to = %status, "rejected status override");
                return false;
            }
            job.status = status;
            job.progress_step = progress_step;
            let mut events = vec![StoreEvent::JobUpdated {
                job_id: job_id.to_string(),
                status,
                progress_step: job.progress_step.clone(),
            }];
            if status.is_terminal() {
                events.push(StoreEvent::JobFinished {
                    job_id: job_id.to_string(),
                    status,
                    item_count: job.item_count,
                });
            }
            events
        };
        self.emit_all(events);
        true
    }

    /// Open a job for review, replacing the item collection with its results
    /// (empty while the job is still running).
    pub fn set_active_job(&self, job_id: &str) -> bool {
        let count = {
            let mut state = self.state();
            let Some(results) = state.job(job_id).map(|job| job.results.clone().unwrap_or_default()) else {
                debug!(job_id, "set_active_job: no such job");
                return false;
            };
            state.active_job_id = Some(job_id.to_string());
            state.items.replace_all(results);
            state.items.len()
        };
        self.emit_all(vec![
            StoreEvent::ActiveJobChanged {
                job_id: job_id.to_string(),
            },
            StoreEvent::ItemsChanged { count },
        ]);
        true
    }

    pub fn jobs(&self) -> Vec<AuditJob> {
        self.state().jobs.clone()
    }

    pub fn job(&self, job_id: &str) -> Option<AuditJob> {
        self.state().job(job_id).cloned()
    }

    pub fn active_job_id(&self) -> Option<String> {
        self.state().active_job_id.clone()
    }

    pub fn active_job(&self) -> Option<AuditJob> {
        let state = self.state();
        let id = state.active_job_id.as_deref()?;
        state.job(id).cloned()
    }

    /// Wait until the job reaches `Ready` or `Failed`. `None` for unknown jobs.
    pub async fn wait_for_terminal(&self, job_id: &str) -> Option<JobStatus> {
        let mut events = self.subscribe();
        loop {
            let status = self.job(job_id)?.status;
            if status.is_terminal() {
                return Some(status);
            }
            match events.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return self.job(job_id).map(|job| job.status),
            }
        }
    }

    // ─── Pipeline surface ───────────────────────────────────────────────────

    /// Move the job into `stage`: log it, then relabel. Fails if the job is
    /// gone or can no longer be processing.
    pub(crate) fn enter_stage(&self, job_id: &str, stage: Stage) -> bool {
        let events = {
            let mut state = self.state();
            let Some(job) = state.job_mut(job_id) else {
                return false;
            };
            if !StateMachine::can_transition(job.status, JobStatus::Processing) {
                return false;
            }
            job.status = JobStatus::Processing;
            let entry = job.push_log(LogEntry::new(stage.log_message(), LogKind::Info)).clone();
            job.progress_step = Some(stage.progress_label().to_string());
            vec![
                StoreEvent::LogAppended {
                    job_id: job_id.to_string(),
                    entry,
                },
                StoreEvent::JobUpdated {
                    job_id: job_id.to_string(),
                    status: JobStatus::Processing,
                    progress_step: job.progress_step.clone(),
                },
            ]
        };
        self.emit_all(events);
        true
    }

    /// Resolve a job with the provider outcome.
    ///
    /// The closing log line is appended before results are recorded, and the
    /// item collection is refreshed in the same critical section when the job
    /// is the active one.
    pub(crate) fn finish_job(&self, job_id: &str, outcome: Result<Vec<AuditItem>, String>) -> JobStatus {
        let target = match outcome {
            Ok(_) => JobStatus::Ready,
            Err(_) => JobStatus::Failed,
        };

        let (status, events) = {
            let mut state = self.state();
            let is_active = state.is_active(job_id);
            let Some(job) = state.job_mut(job_id) else {
                return JobStatus::Failed;
            };
            if !StateMachine::can_transition(job.status, target) {
                warn!(job_id, from = %job.status, to = %target, "discarding analysis outcome");
                return job.status;
            }

            let mut events = Vec::new();
            let mut hydrate = None;
            match outcome {
                Ok(items) => {
                    let entry = job
                        .push_log(LogEntry::new(
                            format!("Verification complete. {} items found.", items.len()),
                            LogKind::Success,
                        ))
                        .clone();
                    events.push(StoreEvent::LogAppended {
                        job_id: job_id.to_string(),
                        entry,
                    });
                    job.status = JobStatus::Ready;
                    job.progress_step = Some(COMPLETED_LABEL.to_string());
                    job.item_count = Some(items.len());
                    if is_active {
                        hydrate = Some(items.clone());
                    }
                    job.results = Some(items);
                    info!(job_id, items = ?job.item_count, "analysis complete");
                }
                Err(reason) => {
                    let entry = job
                        .push_log(LogEntry::new(format!("Analysis failed: {reason}"), LogKind::Error))
                        .clone();
                    events.push(StoreEvent::LogAppended {
                        job_id: job_id.to_string(),
                        entry,
                    });
                    job.status = JobStatus::Failed;
                    job.progress_step = Some(FAILED_LABEL.to_string());
                    job.results = None;
                    job.item_count = None;
                    warn!(job_id, %reason, "analysis failed");
                }
            }

            let status = job.status;
            events.push(StoreEvent::JobUpdated {
                job_id: job_id.to_string(),
                status,
                progress_step: job.progress_step.clone(),
            });
            events.push(StoreEvent::JobFinished {
                job_id: job_id.to_string(),
                status,
                item_count: job.item_count,
            });

            if let Some(items) = hydrate {
                state.items.replace_all(items);
                events.push(StoreEvent::ItemsChanged {
                    count: state.items.len(),
                });
            }
            (status, events)
        };
        self.emit_all(events);
        status
    }

    // ─── Item collection ────────────────────────────────────────────────────

    fn mutate_items<T>(&self, op: impl FnOnce(&mut ItemCollection) -> T) -> T {
        let (result, count) = {
            let mut state = self.state();
            let result = op(&mut state.items);
            (result, state.items.len())
        };
        self.emit_all(vec![StoreEvent::ItemsChanged { count }]);
        result
    }

    pub fn add_item(&self, item: AuditItem) {
        self.mutate_items(|items| items.add_item(item));
    }

    pub fn add_items(&self, new_items: Vec<AuditItem>) {
        self.mutate_items(|items| items.add_items(new_items));
    }

    /// Unknown ids are ignored.
    pub fn remove_item(&self, id: &str) -> bool {
        self.mutate_items(|items| items.remove_item(id))
    }

    /// Unknown ids are ignored.
    pub fn toggle_selected(&self, id: &str) -> Option<bool> {
        self.mutate_items(|items| items.toggle_selected(id))
    }

    /// Expand `kit` and add every component in one batch. Returns the number
    /// of items added.
    pub fn add_kit(&self, kit: &Kit, pricing: &dyn PricingResolver) -> usize {
        let expanded = crate::items::kit::expand(kit, pricing);
        let added = expanded.len();
        self.add_items(expanded);
        info!(kit = %kit.name, added, "kit added");
        added
    }

    pub fn items(&self) -> Vec<AuditItem> {
        self.state().items.items().to_vec()
    }

    pub fn item_count(&self) -> usize {
        self.state().items.len()
    }

    pub fn item_id_at(&self, index: usize) -> Option<String> {
        self.state().items.get(index).map(|item| item.id.clone())
    }

    pub fn totals(&self) -> Totals {
        self.state().items.totals()
    }

    /// Render the active job and its current items as an XML report.
    pub fn export_active_report(&self, generated_at: DateTime<Utc>) -> Result<String, RevenaError> {
        let state = self.state();
        let job = state
            .active_job_id
            .as_deref()
            .and_then(|id| state.job(id))
            .ok_or(RevenaError::NoActiveJob)?;
        report::export_xml(job, state.items.items(), generated_at)
    }
}
