use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Billing category of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Materials,
    Medicines,
    Procedures,
    #[serde(rename = "OPME")]
    Opme,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Materials => write!(f, "Materials"),
            Category::Medicines => write!(f, "Medicines"),
            Category::Procedures => write!(f, "Procedures"),
            Category::Opme => write!(f, "OPME"),
        }
    }
}

/// Line total for `quantity` units. A missing unit price counts as zero.
///
/// Every total in the crate (editor, review summary, export) goes through here.
pub fn line_total(quantity: u32, unit_price: Option<f64>) -> f64 {
    f64::from(quantity) * unit_price.unwrap_or(0.0)
}

/// One billable line under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditItem {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub quantity: u32,
    pub unit_price: Option<f64>,
    /// Produced by the analysis provider rather than added by the reviewer.
    pub found_in_doc: bool,
    pub confidence: f64,
    pub selected: bool,
}

impl AuditItem {
    /// A reviewer-added item with a fresh id.
    pub fn manual(name: impl Into<String>, category: Category, quantity: u32, unit_price: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            category,
            quantity,
            unit_price,
            found_in_doc: false,
            confidence: 1.0,
            selected: false,
        }
    }

    /// An item the reviewer confirmed from highlighted document text.
    pub fn document_suggestion(name: impl Into<String>, unit_price: f64) -> Self {
        Self {
            found_in_doc: true,
            confidence: 0.99,
            ..Self::manual(name, Category::Medicines, 1, Some(unit_price))
        }
    }

    pub fn total_price(&self) -> f64 {
        line_total(self.quantity, self.unit_price)
    }

    /// No unit price: the item contributes nothing to totals and needs pricing.
    pub fn is_unpriced(&self) -> bool {
        self.unit_price.is_none()
    }
}

/// Review totals grouped the way billing reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    /// Materials and OPME together.
    pub materials: f64,
    pub medicines: f64,
    pub procedures: f64,
    pub grand_total: f64,
    /// Items with no unit price.
    pub unpriced: usize,
}

impl Totals {
    pub fn of(items: &[AuditItem]) -> Self {
        items.iter().fold(Self::default(), |mut acc, item| {
            let total = item.total_price();
            match item.category {
                Category::Materials | Category::Opme => acc.materials += total,
                Category::Medicines => acc.medicines += total,
                Category::Procedures => acc.procedures += total,
            }
            acc.grand_total += total;
            if item.is_unpriced() {
                acc.unpriced += 1;
            }
            acc
        })
    }
}
