mod cli;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Command};
use revena::error::RevenaError;
use revena::items::{AuditItem, catalog};
use revena::keyboard::{Key, KeyboardNav};
use revena::state_machine::{AuthoringData, JobStatus};
use revena::{AuditStore, EngineConfig, logging};
use tracing::info;
use ui::JobBoard;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = EngineConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(scale) = cli.time_scale {
        config.time_scale = scale;
        config.validate()?;
    }

    match cli.command {
        Command::Analyze { files, export } => analyze(&config, files, export).await,
        Command::Author {
            patient,
            procedure,
            description,
            export,
        } => {
            let data = AuthoringData::new(patient, procedure, description);
            author(&config, data, export).await
        }
        Command::Kits { json } => {
            let kits = catalog::reference_kits();
            if json {
                println!("{}", serde_json::to_string_pretty(&kits)?);
            } else {
                ui::print_kits(&kits);
            }
            Ok(())
        }
        Command::Demo { kit } => demo(&config, &kit).await,
    }
}

/// Submit every file, follow the pipelines, then review the first job.
async fn analyze(config: &EngineConfig, files: Vec<String>, export: Option<PathBuf>) -> Result<()> {
    let store = AuditStore::new(config);
    let events = store.subscribe();
    let mut board = JobBoard::new();

    let mut job_ids = Vec::with_capacity(files.len());
    for file in files {
        let job_id = store.create_job(file.clone(), None);
        board.track(&job_id, &file);
        job_ids.push(job_id);
    }
    board.follow(&store, events).await;

    let Some(first) = job_ids.first() else {
        return Ok(());
    };
    review(&store, first, export.as_deref())
}

async fn author(config: &EngineConfig, data: AuthoringData, export: Option<PathBuf>) -> Result<()> {
    let store = AuditStore::new(config);
    let events = store.subscribe();
    let mut board = JobBoard::new();

    let filename = data.filename();
    let job_id = store.create_authored_job(data)?;
    board.track(&job_id, &filename);
    board.follow(&store, events).await;

    review(&store, &job_id, export.as_deref())
}

/// Activate a finished job, print its items and optionally write the report.
fn review(store: &AuditStore, job_id: &str, export: Option<&Path>) -> Result<()> {
    if !store.set_active_job(job_id) {
        return Err(RevenaError::JobNotFound(job_id.to_string()).into());
    }
    ui::print_items(&store.items(), None);
    ui::print_totals(&store.totals());

    if let Some(path) = export {
        let xml = store.export_active_report(Utc::now())?;
        std::fs::write(path, xml).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

/// Full review session: analysis, kit insertion, keyboard edits and export.
async fn demo(config: &EngineConfig, kit_name: &str) -> Result<()> {
    let kit = catalog::find_kit(kit_name).ok_or_else(|| RevenaError::UnknownKit(kit_name.to_string()))?;

    let store = AuditStore::new(config);
    let events = store.subscribe();
    let mut board = JobBoard::new();

    let filename = "Case_001.pdf";
    let job_id = store.create_job(filename, None);
    store.set_active_job(&job_id);
    board.track(&job_id, filename);
    board.follow(&store, events).await;

    if store.job(&job_id).map(|job| job.status) != Some(JobStatus::Ready) {
        anyhow::bail!("analysis of {filename} did not complete");
    }

    store.add_kit(&kit, &config.kit_pricing());

    if let Some(reference) = catalog::find_item("Dipyrone 500mg") {
        store.add_item(catalog::manual_item(reference));
    }
    store.add_item(AuditItem::document_suggestion("Ondansetron 4mg", 8.5));

    let mut nav = KeyboardNav::new();
    let mut list = store.clone();
    nav.sync(store.item_count());
    for name in ["ArrowDown", "Enter", "ArrowDown", "ArrowDown", "Delete"] {
        let action = nav.handle_key(Key::from_name(name), false, &mut list);
        ui::print_nav(name, &action);
    }

    ui::print_items(&store.items(), nav.focused());
    ui::print_totals(&store.totals());

    println!();
    println!("{}", store.export_active_report(Utc::now())?);
    Ok(())
}
