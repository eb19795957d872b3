//! XML audit report export.
//!
//! Layout:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <AuditReport>
//!   <Meta>JobId, Filename, Date, TotalValue</Meta>
//!   <Items><Item>Name, Category, Quantity, UnitPrice, TotalPrice, Verified</Item>...</Items>
//! </AuditReport>
//! ```
//!
//! Money is written with exactly two decimals. Totals are recomputed from the
//! items passed in, never read from a cache.

use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::warn;

use crate::error::RevenaError;
use crate::items::{AuditItem, Totals};
use crate::state_machine::AuditJob;

type XmlWriter = Writer<Vec<u8>>;

fn export_err(err: impl Display) -> RevenaError {
    RevenaError::Export(err.to_string())
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn open(writer: &mut XmlWriter, name: &str) -> Result<(), RevenaError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(export_err)
}

fn close(writer: &mut XmlWriter, name: &str) -> Result<(), RevenaError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(export_err)
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<(), RevenaError> {
    open(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(export_err)?;
    close(writer, name)
}

/// Suggested download name for a job's report.
pub fn file_name(job: &AuditJob) -> String {
    format!("Audit_{}.xml", job.id)
}

pub fn export_xml(job: &AuditJob, items: &[AuditItem], generated_at: DateTime<Utc>) -> Result<String, RevenaError> {
    let totals = Totals::of(items);
    if totals.unpriced > 0 {
        warn!(job_id = %job.id, unpriced = totals.unpriced, "exporting items without unit price");
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(export_err)?;

    open(&mut writer, "AuditReport")?;

    open(&mut writer, "Meta")?;
    text_element(&mut writer, "JobId", &job.id)?;
    text_element(&mut writer, "Filename", &job.filename)?;
    text_element(
        &mut writer,
        "Date",
        &generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    )?;
    text_element(&mut writer, "TotalValue", &money(totals.grand_total))?;
    close(&mut writer, "Meta")?;

    open(&mut writer, "Items")?;
    for item in items {
        open(&mut writer, "Item")?;
        text_element(&mut writer, "Name", &item.name)?;
        text_element(&mut writer, "Category", &item.category.to_string())?;
        text_element(&mut writer, "Quantity", &item.quantity.to_string())?;
        text_element(&mut writer, "UnitPrice", &money(item.unit_price.unwrap_or(0.0)))?;
        text_element(&mut writer, "TotalPrice", &money(item.total_price()))?;
        text_element(&mut writer, "Verified", &item.found_in_doc.to_string())?;
        close(&mut writer, "Item")?;
    }
    close(&mut writer, "Items")?;

    close(&mut writer, "AuditReport")?;

    String::from_utf8(writer.into_inner()).map_err(export_err)
}
