use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;
use tracing::debug;
use uuid::Uuid;

use super::{AnalysisProvider, ProviderError};
use crate::items::{AuditItem, Category};
use crate::state_machine::AuditJob;

const AUTHORED_PROCEDURE_PRICE: f64 = 2000.00;
const ANESTHESIA_NAME: &str = "Anesthesia - General";
const ANESTHESIA_PRICE: f64 = 500.00;

/// Stand-in for the extraction service: waits a random latency, then returns
/// a fixed answer derived from the job.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    min_latency: Duration,
    max_latency: Duration,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000), Duration::from_millis(4000))
    }
}

impl SimulatedProvider {
    pub fn new(min_latency: Duration, max_latency: Duration) -> Self {
        Self {
            min_latency,
            max_latency: max_latency.max(min_latency),
        }
    }

    fn latency(&self) -> Duration {
        if self.max_latency == self.min_latency {
            return self.min_latency;
        }
        rand::thread_rng().gen_range(self.min_latency..=self.max_latency)
    }
}

#[async_trait]
impl AnalysisProvider for SimulatedProvider {
    async fn analyze(&self, job: &AuditJob) -> Result<Vec<AuditItem>, ProviderError> {
        let latency = self.latency();
        debug!(job_id = %job.id, latency_ms = latency.as_millis() as u64, "simulated analysis started");
        sleep(latency).await;

        let items = match &job.authoring {
            Some(data) => authored_items(&data.procedure),
            None => reference_results(),
        };
        Ok(items)
    }
}

fn found(id: String, name: &str, category: Category, quantity: u32, unit_price: f64, confidence: f64) -> AuditItem {
    AuditItem {
        id,
        name: name.to_string(),
        category,
        quantity,
        unit_price: Some(unit_price),
        found_in_doc: true,
        confidence,
        selected: false,
    }
}

fn authored_items(procedure: &str) -> Vec<AuditItem> {
    vec![
        found(
            format!("custom-{}", Uuid::new_v4()),
            procedure,
            Category::Procedures,
            1,
            AUTHORED_PROCEDURE_PRICE,
            0.98,
        ),
        found(
            format!("custom-{}", Uuid::new_v4()),
            ANESTHESIA_NAME,
            Category::Procedures,
            1,
            ANESTHESIA_PRICE,
            0.96,
        ),
    ]
}

/// The fixed answer for uploaded documents. The last item simulates a line
/// the extractor missed.
pub fn reference_results() -> Vec<AuditItem> {
    let mut missed = found(
        "auto-5".into(),
        "Nylon Suture 3-0",
        Category::Materials,
        2,
        15.00,
        0.0,
    );
    missed.found_in_doc = false;

    vec![
        found(
            "auto-1".into(),
            "Laparoscopic Cholecystectomy",
            Category::Procedures,
            1,
            1500.00,
            0.98,
        ),
        found("auto-2".into(), ANESTHESIA_NAME, Category::Procedures, 1, 450.00, 0.95),
        found("auto-3".into(), "Dipyrone 500mg", Category::Medicines, 1, 5.00, 0.99),
        found("auto-4".into(), "Trocar 10mm", Category::Materials, 1, 120.00, 0.92),
        missed,
    ]
}
