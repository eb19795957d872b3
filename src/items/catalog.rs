// Reference kits and items offered by the "add item or kit" picker.

use super::item::{AuditItem, Category};
use super::kit::{Kit, KitItem};

/// A priced single item the reviewer can add by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceItem {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub unit_price: f64,
}

pub const REFERENCE_ITEMS: [ReferenceItem; 3] = [
    ReferenceItem {
        id: "ref-1",
        name: "Dipyrone 500mg",
        category: Category::Medicines,
        unit_price: 5.00,
    },
    ReferenceItem {
        id: "ref-2",
        name: "Paracetamol 750mg",
        category: Category::Medicines,
        unit_price: 3.50,
    },
    ReferenceItem {
        id: "ref-3",
        name: "Surgical Gloves 7.5",
        category: Category::Materials,
        unit_price: 12.00,
    },
];

pub fn reference_kits() -> Vec<Kit> {
    vec![
        Kit {
            id: "kit-1".into(),
            name: "Laparoscopy Kit".into(),
            items: vec![
                KitItem::new("k1-1", "Trocar 10mm", "TR10", 2),
                KitItem::new("k1-2", "Veress Needle", "VN01", 1),
                KitItem::new("k1-3", "Endobag", "EB01", 1),
            ],
        },
        Kit {
            id: "kit-2".into(),
            name: "Appendectomy Basic".into(),
            items: vec![
                KitItem::new("k2-1", "Scalpel #11", "SC11", 1),
                KitItem::new("k2-2", "Suture 2-0", "SU20", 3),
            ],
        },
    ]
}

/// Case-insensitive kit lookup.
pub fn find_kit(name: &str) -> Option<Kit> {
    reference_kits()
        .into_iter()
        .find(|kit| kit.name.eq_ignore_ascii_case(name))
}

/// Case-insensitive reference item lookup.
pub fn find_item(name: &str) -> Option<&'static ReferenceItem> {
    REFERENCE_ITEMS
        .iter()
        .find(|item| item.name.eq_ignore_ascii_case(name))
}

/// One unit of a reference item, added by hand.
pub fn manual_item(reference: &ReferenceItem) -> AuditItem {
    AuditItem::manual(reference.name, reference.category, 1, Some(reference.unit_price))
}
