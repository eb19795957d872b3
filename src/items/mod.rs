pub mod catalog;
mod collection;
mod item;
pub mod kit;

pub use collection::ItemCollection;
pub use item::{AuditItem, Category, Totals, line_total};
pub use kit::{CatalogPricing, Kit, KitItem, PricingResolver, RandomPricing};
