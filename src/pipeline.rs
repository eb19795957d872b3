use std::sync::Arc;

use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::provider::AnalysisProvider;
use crate::state_machine::{JobStatus, Stage, StageTimings};
use crate::store::AuditStore;

/// Drives one job through the fixed analysis stages.
pub struct PipelineRunner {
    provider: Arc<dyn AnalysisProvider>,
    timings: StageTimings,
}

impl PipelineRunner {
    pub fn new(provider: Arc<dyn AnalysisProvider>, timings: StageTimings) -> Self {
        Self { provider, timings }
    }

    /// Run every stage for `job_id` and resolve it to `Ready` or `Failed`.
    ///
    /// Provider errors are absorbed into the job record; nothing is returned
    /// to the caller except the final status. If the job was moved to a
    /// terminal status from outside mid-run, the run stops and reports that
    /// status.
    #[instrument(skip(self, store))]
    pub async fn run(&self, store: &AuditStore, job_id: &str) -> JobStatus {
        for stage in Stage::LOGGED {
            let delay = self.timings.delay_before(stage);
            if !delay.is_zero() {
                sleep(delay).await;
            }
            if !store.enter_stage(job_id, stage) {
                let status = store.job(job_id).map(|job| job.status);
                warn!(%stage, ?status, "job left processing, stopping pipeline");
                return status.unwrap_or(JobStatus::Failed);
            }
            info!(%stage, "stage started");
        }

        let Some(job) = store.job(job_id) else {
            warn!("job disappeared before analysis");
            return JobStatus::Failed;
        };

        info!("invoking analysis provider");
        let outcome = self
            .provider
            .analyze(&job)
            .await
            .map_err(|err| err.to_string());
        store.finish_job(job_id, outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::config::EngineConfig;
    use crate::items::{AuditItem, Category};
    use crate::provider::ProviderError;
    use crate::state_machine::{AuditJob, LogKind};

    struct MockProvider {
        response: Result<Vec<AuditItem>, String>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn ok(items: Vec<AuditItem>) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(items),
                calls: AtomicUsize::new(0),
            })
        }

        fn err(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Err(reason.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AnalysisProvider for MockProvider {
        async fn analyze(&self, _job: &AuditJob) -> Result<Vec<AuditItem>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(items) => Ok(items.clone()),
                Err(reason) => Err(ProviderError::Unavailable(reason.clone())),
            }
        }
    }

    fn store_with(provider: Arc<dyn AnalysisProvider>) -> AuditStore {
        AuditStore::with_provider(&EngineConfig::instant(), provider)
    }

    #[tokio::test]
    async fn success_logs_every_stage_then_summary() {
        let items = vec![AuditItem::manual("Dipyrone 500mg", Category::Medicines, 1, Some(5.0))];
        let provider = MockProvider::ok(items);
        let store = store_with(provider.clone());
        let job_id = store.queue_job("Case_001.pdf", None);

        let runner = PipelineRunner::new(provider.clone(), StageTimings::zero());
        let status = runner.run(&store, &job_id).await;

        assert_eq!(status, JobStatus::Ready);
        let job = store.job(&job_id).unwrap();
        let messages: Vec<_> = job.logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "AI agent: initializing context...",
                "AI agent: analyzing document structure...",
                "AI agent: extracting medical entities...",
                "AI agent: validating billing rules...",
                "Verification complete. 1 items found.",
            ]
        );
        assert_eq!(job.logs[4].kind, LogKind::Success);
        assert_eq!(job.item_count, Some(1));
        assert_eq!(job.progress_step.as_deref(), Some("Completed"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_failure_marks_job_failed_without_results() {
        let provider = MockProvider::err("connection refused");
        let store = store_with(provider.clone());
        let job_id = store.queue_job("Case_002.pdf", None);

        let runner = PipelineRunner::new(provider, StageTimings::zero());
        let status = runner.run(&store, &job_id).await;

        assert_eq!(status, JobStatus::Failed);
        let job = store.job(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.results.is_none());
        assert!(job.item_count.is_none());
        assert_eq!(job.progress_step.as_deref(), Some("Error"));
        let errors: Vec<_> = job.logs.iter().filter(|l| l.kind == LogKind::Error).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("connection refused"));
        assert_eq!(job.logs.len(), 5);
    }

    #[tokio::test]
    async fn external_failure_override_stops_the_run() {
        let provider = MockProvider::ok(Vec::new());
        let store = store_with(provider.clone());
        let job_id = store.queue_job("Case_003.pdf", None);
        assert!(store.set_job_status(&job_id, JobStatus::Processing, None));
        assert!(store.set_job_status(&job_id, JobStatus::Failed, Some("Cancelled by operator".into())));

        let runner = PipelineRunner::new(provider.clone(), StageTimings::zero());
        assert_eq!(runner.run(&store, &job_id).await, JobStatus::Failed);
        assert!(store.job(&job_id).unwrap().logs.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stages_wait_their_latency() {
        let provider = MockProvider::ok(Vec::new());
        let store = store_with(provider.clone());
        let job_id = store.queue_job("Case_004.pdf", None);

        let runner = PipelineRunner::new(provider, StageTimings::default());
        let started = tokio::time::Instant::now();
        runner.run(&store, &job_id).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= std::time::Duration::from_millis(5000));
        assert!(elapsed < std::time::Duration::from_millis(5010));
    }
}
