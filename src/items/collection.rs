use tracing::debug;

use super::item::{AuditItem, Totals};

/// The editable item list of the active job.
///
/// Insertion order is preserved; new items always go to the end. Operations
/// addressed to an unknown id are no-ops.
#[derive(Debug, Clone, Default)]
pub struct ItemCollection {
    items: Vec<AuditItem>,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: AuditItem) {
        self.items.push(item);
    }

    pub fn add_items(&mut self, items: impl IntoIterator<Item = AuditItem>) {
        self.items.extend(items);
    }

    /// Returns whether an item was removed.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if !removed {
            debug!(item_id = id, "remove_item: no such item");
        }
        removed
    }

    /// Flips the verification flag, returning the new value.
    pub fn toggle_selected(&mut self, id: &str) -> Option<bool> {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.selected = !item.selected;
                Some(item.selected)
            }
            None => {
                debug!(item_id = id, "toggle_selected: no such item");
                None
            }
        }
    }

    /// Wholesale replacement, used when the active job changes or completes.
    pub fn replace_all(&mut self, items: Vec<AuditItem>) {
        self.items = items;
    }

    pub fn items(&self) -> &[AuditItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&AuditItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> Totals {
        Totals::of(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::Category;

    fn item(name: &str) -> AuditItem {
        AuditItem::manual(name, Category::Materials, 1, Some(10.0))
    }

    #[test]
    fn batch_add_appends_in_order() {
        let mut items = ItemCollection::new();
        items.add_item(item("a"));
        items.add_items(vec![item("b"), item("c")]);
        let names: Vec<_> = items.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn removing_unknown_id_is_noop() {
        let mut items = ItemCollection::new();
        items.add_item(item("a"));
        assert!(!items.remove_item("missing"));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut items = ItemCollection::new();
        items.add_items(vec![item("a"), item("b"), item("c")]);
        let middle = items.items()[1].id.clone();
        assert!(items.remove_item(&middle));
        let names: Vec<_> = items.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn toggle_flips_selection() {
        let mut items = ItemCollection::new();
        items.add_item(item("a"));
        let id = items.items()[0].id.clone();
        assert_eq!(items.toggle_selected(&id), Some(true));
        assert_eq!(items.toggle_selected(&id), Some(false));
        assert_eq!(items.toggle_selected("missing"), None);
    }

    #[test]
    fn totals_are_recomputed_after_mutation() {
        let mut items = ItemCollection::new();
        items.add_items(vec![item("a"), item("b")]);
        assert_eq!(items.totals().grand_total, 20.0);
        let first = items.items()[0].id.clone();
        items.remove_item(&first);
        assert_eq!(items.totals().grand_total, 10.0);
    }
}
