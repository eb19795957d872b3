//! Interface de terminal do Revena: spinners e saída colorida.
//!
//! Usa `indicatif` para um spinner por job e `console` para estilização.
//! O [`JobBoard`] acompanha os eventos do store e imprime cada linha de log
//! acima do spinner do job correspondente.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use console::Style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use revena::items::{AuditItem, Kit, Totals};
use revena::keyboard::NavAction;
use revena::state_machine::{JobStatus, LogEntry, LogKind};
use revena::store::{AuditStore, StoreEvent};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

/// Painel de spinners, um por job acompanhado.
pub struct JobBoard {
    multi: MultiProgress,
    bars: HashMap<String, ProgressBar>,
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl JobBoard {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: HashMap::new(),
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }

    /// Adiciona um spinner para o job.
    pub fn track(&mut self, job_id: &str, filename: &str) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {prefix:.bold} {msg}")
                .expect("invalid template"),
        );
        pb.set_prefix(filename.to_string());
        pb.set_message(JobStatus::Queued.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        self.bars.insert(job_id.to_string(), pb);
    }

    fn format_log(&self, entry: &LogEntry) -> String {
        let style = match entry.kind {
            LogKind::Info => &self.dim,
            LogKind::Success => &self.green,
            LogKind::Warning => &self.yellow,
            LogKind::Error => &self.red,
        };
        format!("  [{}] {}", entry.timestamp(), style.apply_to(&entry.message))
    }

    fn finish(&self, job_id: &str, status: JobStatus, item_count: Option<usize>) {
        let Some(pb) = self.bars.get(job_id) else {
            return;
        };
        let message = match (status, item_count) {
            (JobStatus::Ready, Some(count)) => format!("{} {count} items", self.green.apply_to("✓")),
            (JobStatus::Ready, None) => self.green.apply_to("✓").to_string(),
            (_, _) => format!("{} {status}", self.red.apply_to("✗")),
        };
        pb.finish_with_message(message);
    }

    /// Consome eventos até que todos os jobs acompanhados terminem.
    pub async fn follow(&self, store: &AuditStore, mut events: broadcast::Receiver<StoreEvent>) {
        let mut pending: HashSet<String> = self.bars.keys().cloned().collect();
        while !pending.is_empty() {
            match events.recv().await {
                Ok(StoreEvent::LogAppended { job_id, entry }) => {
                    if let Some(pb) = self.bars.get(&job_id) {
                        pb.println(self.format_log(&entry));
                    }
                }
                Ok(StoreEvent::JobUpdated {
                    job_id,
                    status,
                    progress_step,
                }) => {
                    if let Some(pb) = self.bars.get(&job_id) {
                        pb.set_message(progress_step.unwrap_or_else(|| status.to_string()));
                    }
                }
                Ok(StoreEvent::JobFinished {
                    job_id,
                    status,
                    item_count,
                }) => {
                    self.finish(&job_id, status, item_count);
                    pending.remove(&job_id);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "terminal fell behind store events");
                    // Eventos de término podem ter sido perdidos.
                    pending.retain(|job_id| match store.job(job_id) {
                        Some(job) if job.status.is_terminal() => {
                            self.finish(job_id, job.status, job.item_count);
                            false
                        }
                        Some(_) => true,
                        None => false,
                    });
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// Tabela de itens da revisão.
pub fn print_items(items: &[AuditItem], focused: Option<usize>) {
    let bold = Style::new().bold();
    let yellow = Style::new().yellow();
    println!();
    println!(
        "{}",
        bold.apply_to(format!(
            "   {:<32} {:<11} {:>4} {:>10} {:>10}  {}",
            "Item", "Category", "Qty", "Unit", "Total", "Doc"
        ))
    );
    for (index, item) in items.iter().enumerate() {
        let marker = if focused == Some(index) { '>' } else { ' ' };
        let check = if item.selected { '✓' } else { ' ' };
        let unit = match item.unit_price {
            Some(price) => format!("{price:.2}"),
            None => format!("{}", yellow.apply_to("--")),
        };
        println!(
            "{marker}{check} {:<32} {:<11} {:>4} {:>10} {:>10.2}  {}",
            item.name,
            item.category.to_string(),
            item.quantity,
            unit,
            item.total_price(),
            if item.found_in_doc { "yes" } else { "no" },
        );
    }
}

/// Totais por categoria antes do envio para faturamento.
pub fn print_totals(totals: &Totals) {
    let green = Style::new().green().bold();
    println!();
    println!("  Materials   R$ {:>10.2}", totals.materials);
    println!("  Medicines   R$ {:>10.2}", totals.medicines);
    println!("  Procedures  R$ {:>10.2}", totals.procedures);
    println!("  {}", green.apply_to(format!("Grand total R$ {:>10.2}", totals.grand_total)));
    if totals.unpriced > 0 {
        println!(
            "  {}",
            Style::new()
                .yellow()
                .apply_to(format!("{} item(s) without unit price", totals.unpriced))
        );
    }
}

pub fn print_kits(kits: &[Kit]) {
    let bold = Style::new().bold();
    for kit in kits {
        println!("{} ({} items)", bold.apply_to(&kit.name), kit.items.len());
        for item in &kit.items {
            println!("  {:>3} × {:<20} {}", item.quantity, item.name, item.billing_code);
        }
    }
}

pub fn print_nav(key: &str, action: &NavAction) {
    let dim = Style::new().dim();
    println!("  {} {key:<10} → {action:?}", dim.apply_to("key"));
}
