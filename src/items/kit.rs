//! Kits and their expansion into concrete audit items.
//!
//! A [`Kit`] is a named template, not an item. [`expand`] turns every
//! [`KitItem`] into an [`AuditItem`], asking a [`PricingResolver`] for the
//! unit price so the pricing source can change without touching expansion.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::item::{AuditItem, Category};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitItem {
    pub id: String,
    pub name: String,
    pub billing_code: String,
    pub quantity: u32,
    #[serde(default)]
    pub active_ingredient: Option<String>,
}

impl KitItem {
    pub fn new(id: &str, name: &str, billing_code: &str, quantity: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            billing_code: billing_code.to_string(),
            quantity,
            active_ingredient: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kit {
    pub id: String,
    pub name: String,
    pub items: Vec<KitItem>,
}

/// Supplies a unit price for a kit component.
pub trait PricingResolver: Send + Sync {
    fn unit_price(&self, item: &KitItem) -> f64;
}

/// Placeholder pricing: a whole-number price drawn uniformly from `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomPricing {
    pub min: u32,
    pub max: u32,
}

impl Default for RandomPricing {
    fn default() -> Self {
        Self { min: 10, max: 60 }
    }
}

impl PricingResolver for RandomPricing {
    fn unit_price(&self, _item: &KitItem) -> f64 {
        if self.max <= self.min {
            return f64::from(self.min);
        }
        f64::from(rand::thread_rng().gen_range(self.min..self.max))
    }
}

/// Looks prices up by billing code, deferring to `fallback` for unknown codes.
pub struct CatalogPricing {
    prices: HashMap<String, f64>,
    fallback: Box<dyn PricingResolver>,
}

impl CatalogPricing {
    pub fn new(prices: HashMap<String, f64>, fallback: Box<dyn PricingResolver>) -> Self {
        Self { prices, fallback }
    }
}

impl PricingResolver for CatalogPricing {
    fn unit_price(&self, item: &KitItem) -> f64 {
        match self.prices.get(&item.billing_code) {
            Some(price) => *price,
            None => self.fallback.unit_price(item),
        }
    }
}

/// Expand every component of `kit` into a reviewer-added item.
pub fn expand(kit: &Kit, pricing: &dyn PricingResolver) -> Vec<AuditItem> {
    kit.items
        .iter()
        .map(|component| {
            AuditItem::manual(
                component.name.clone(),
                Category::Materials,
                component.quantity,
                Some(pricing.unit_price(component)),
            )
        })
        .collect()
}
