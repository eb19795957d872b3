use std::time::Duration;

use chrono::Utc;
use revena::items::{AuditItem, Category, RandomPricing, catalog};
use revena::keyboard::{Key, KeyboardNav, NavAction};
use revena::state_machine::{AuthoringData, JobStatus, LogKind};
use revena::{AuditStore, EngineConfig, StoreEvent};
use tokio::sync::broadcast;

fn drain(events: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn statuses_for(events: &[StoreEvent], id: &str) -> Vec<JobStatus> {
    let mut seen: Vec<JobStatus> = Vec::new();
    for event in events {
        let status = match event {
            StoreEvent::JobUpdated { job_id, status, .. } if job_id == id => *status,
            StoreEvent::JobFinished { job_id, status, .. } if job_id == id => *status,
            _ => continue,
        };
        if seen.last() != Some(&status) {
            seen.push(status);
        }
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn uploaded_document_is_queued_then_processed() {
    let store = AuditStore::new(&EngineConfig::default());
    let mut events = store.subscribe();

    let job_id = store.create_job("Case_001.pdf", None);
    assert_eq!(store.job(&job_id).map(|job| job.status), Some(JobStatus::Queued));

    tokio::time::sleep(Duration::from_millis(600)).await;
    let job = store.job(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert!(job.results.is_none());

    assert_eq!(store.wait_for_terminal(&job_id).await, Some(JobStatus::Ready));

    let events = drain(&mut events);
    let finished_at = events
        .iter()
        .position(|event| matches!(event, StoreEvent::JobFinished { .. }))
        .unwrap();
    let logs_before: Vec<_> = events[..finished_at]
        .iter()
        .filter_map(|event| match event {
            StoreEvent::LogAppended { entry, .. } => Some(entry.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(logs_before.len(), 5);
    assert!(logs_before[..4].iter().all(|entry| entry.kind == LogKind::Info));
    assert_eq!(logs_before[4].kind, LogKind::Success);
    assert_eq!(logs_before[4].message, "Verification complete. 5 items found.");
}

#[tokio::test(start_paused = true)]
async fn status_only_moves_forward() {
    let store = AuditStore::new(&EngineConfig::default());
    let mut events = store.subscribe();

    let first = store.create_job("Case_001.pdf", None);
    let second = store.create_job("Case_002.pdf", None);
    store.wait_for_terminal(&first).await;
    store.wait_for_terminal(&second).await;

    let events = drain(&mut events);
    for id in [&first, &second] {
        assert_eq!(statuses_for(&events, id), [JobStatus::Processing, JobStatus::Ready]);
    }
    assert!(!store.set_job_status(&first, JobStatus::Processing, None));
}

#[tokio::test(start_paused = true)]
async fn job_logs_have_non_decreasing_timestamps() {
    let store = AuditStore::new(&EngineConfig::default());
    let job_id = store.create_job("Case_001.pdf", None);
    store.wait_for_terminal(&job_id).await;

    let logs = store.job(&job_id).unwrap().logs;
    assert!(logs.windows(2).all(|pair| pair[0].at <= pair[1].at));
}

#[tokio::test]
async fn authored_document_yields_procedure_and_anesthesia() {
    let store = AuditStore::new(&EngineConfig::instant());
    let data = AuthoringData::new("Maria Silva", "Apendicectomia", "Emergency surgery");

    let job_id = store.create_authored_job(data).unwrap();
    assert_eq!(store.wait_for_terminal(&job_id).await, Some(JobStatus::Ready));

    let job = store.job(&job_id).unwrap();
    assert_eq!(job.filename, "Custom_Test_Maria_Silva.pdf");
    let results = job.results.unwrap();
    assert_eq!(results.len(), 2);

    let procedure = results.iter().find(|item| item.name == "Apendicectomia").unwrap();
    assert_eq!(procedure.unit_price, Some(2000.0));
    assert_eq!(procedure.category, Category::Procedures);

    let anesthesia = results
        .iter()
        .find(|item| item.name.starts_with("Anesthesia"))
        .unwrap();
    assert_eq!(anesthesia.unit_price, Some(500.0));
}

#[tokio::test]
async fn incomplete_authoring_creates_no_job() {
    let store = AuditStore::new(&EngineConfig::instant());
    let data = AuthoringData::new("Maria Silva", "", "Emergency surgery");

    assert!(store.create_authored_job(data).is_err());
    assert!(store.jobs().is_empty());
}

#[tokio::test]
async fn adding_a_kit_expands_its_components() {
    let store = AuditStore::new(&EngineConfig::instant());
    let job_id = store.create_job("Case_001.pdf", None);
    store.wait_for_terminal(&job_id).await;
    store.set_active_job(&job_id);
    let before = store.item_count();

    let kit = catalog::find_kit("Laparoscopy Kit").unwrap();
    let added = store.add_kit(&kit, &RandomPricing::default());

    assert_eq!(added, 3);
    let items = store.items();
    assert_eq!(items.len(), before + 3);
    let new = &items[before..];
    assert_eq!(new.iter().map(|item| item.quantity).collect::<Vec<_>>(), [2, 1, 1]);
    assert!(new.iter().all(|item| !item.found_in_doc && item.confidence == 1.0));
}

#[tokio::test]
async fn deleting_the_focused_last_row_moves_focus_up() {
    let store = AuditStore::new(&EngineConfig::instant());
    store.add_items(vec![
        AuditItem::manual("A", Category::Materials, 1, Some(1.0)),
        AuditItem::manual("B", Category::Materials, 1, Some(1.0)),
        AuditItem::manual("C", Category::Materials, 1, Some(1.0)),
    ]);

    let mut nav = KeyboardNav::new();
    nav.focus(2, store.item_count());
    let mut list = store.clone();
    let action = nav.handle_key(Key::Delete, false, &mut list);

    assert!(matches!(action, NavAction::Removed { .. }));
    assert_eq!(store.item_count(), 2);
    assert_eq!(nav.focused(), Some(1));
}

#[tokio::test]
async fn exported_report_sums_line_totals() {
    let store = AuditStore::new(&EngineConfig::instant());
    let job_id = store.queue_job("Case_001.pdf", None);
    store.set_active_job(&job_id);
    store.add_items(vec![
        AuditItem::manual("Dipyrone 500mg", Category::Medicines, 2, Some(5.0)),
        AuditItem::manual("Trocar 10mm", Category::Materials, 1, Some(120.0)),
    ]);

    let xml = store.export_active_report(Utc::now()).unwrap();
    assert!(xml.contains("<TotalValue>130.00</TotalValue>"));
    assert_eq!(xml.matches("<Item>").count(), 2);
    assert!(xml.contains("<TotalPrice>10.00</TotalPrice>"));
    assert!(xml.contains("<TotalPrice>120.00</TotalPrice>"));
}

#[tokio::test]
async fn export_without_active_job_fails() {
    let store = AuditStore::new(&EngineConfig::instant());
    assert!(store.export_active_report(Utc::now()).is_err());
}
