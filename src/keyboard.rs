//! Keyboard navigation over the active item list.
//!
//! [`KeyboardNav`] keeps a focus index and maps Up/Down/Enter/Delete to focus
//! moves and item mutations. It talks to the list through [`ItemList`], which
//! both the bare [`ItemCollection`] and the shared [`AuditStore`] implement.

use tracing::debug;

use crate::items::ItemCollection;
use crate::store::AuditStore;

/// Keys the review list reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Delete,
    Backspace,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowUp" | "Up" => Key::Up,
            "ArrowDown" | "Down" => Key::Down,
            "Enter" => Key::Enter,
            "Delete" => Key::Delete,
            "Backspace" => Key::Backspace,
            _ => Key::Other,
        }
    }
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    /// A text field has focus; the key belongs to it.
    Suppressed,
    /// Focus moved (or stayed clamped) at this index.
    Focused(usize),
    Toggled { id: String, selected: bool },
    Removed { id: String },
    /// Nothing to act on.
    Ignored,
}

/// Minimal list surface the controller needs.
pub trait ItemList {
    fn len(&self) -> usize;
    fn id_at(&self, index: usize) -> Option<String>;
    fn toggle(&mut self, id: &str) -> Option<bool>;
    fn remove(&mut self, id: &str) -> bool;
}

impl ItemList for ItemCollection {
    fn len(&self) -> usize {
        ItemCollection::len(self)
    }

    fn id_at(&self, index: usize) -> Option<String> {
        self.get(index).map(|item| item.id.clone())
    }

    fn toggle(&mut self, id: &str) -> Option<bool> {
        self.toggle_selected(id)
    }

    fn remove(&mut self, id: &str) -> bool {
        self.remove_item(id)
    }
}

impl ItemList for AuditStore {
    fn len(&self) -> usize {
        self.item_count()
    }

    fn id_at(&self, index: usize) -> Option<String> {
        self.item_id_at(index)
    }

    fn toggle(&mut self, id: &str) -> Option<bool> {
        self.toggle_selected(id)
    }

    fn remove(&mut self, id: &str) -> bool {
        self.remove_item(id)
    }
}

/// Focus state for the review list. `None` means no focus (empty list).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardNav {
    focused: Option<usize>,
}

impl KeyboardNav {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Focus a row directly (mouse click). Out-of-range rows are clamped.
    pub fn focus(&mut self, index: usize, len: usize) {
        self.focused = if len == 0 { None } else { Some(index.min(len - 1)) };
    }

    /// Reconcile focus with the current list length: the first row gains focus
    /// once the list fills, and focus is clamped after the list shrinks.
    pub fn sync(&mut self, len: usize) {
        self.focused = match (self.focused, len) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(index), len) => Some(index.min(len - 1)),
        };
    }

    pub fn handle_key(&mut self, key: Key, text_input_focused: bool, list: &mut impl ItemList) -> NavAction {
        if text_input_focused {
            return NavAction::Suppressed;
        }
        self.sync(list.len());
        let len = list.len();

        match key {
            Key::Down => match self.focused {
                Some(index) => {
                    let next = (index + 1).min(len - 1);
                    self.focused = Some(next);
                    NavAction::Focused(next)
                }
                None => NavAction::Ignored,
            },
            Key::Up => match self.focused {
                Some(index) => {
                    let prev = index.saturating_sub(1);
                    self.focused = Some(prev);
                    NavAction::Focused(prev)
                }
                None => NavAction::Ignored,
            },
            Key::Enter => {
                let Some(id) = self.focused.and_then(|index| list.id_at(index)) else {
                    return NavAction::Ignored;
                };
                match list.toggle(&id) {
                    Some(selected) => NavAction::Toggled { id, selected },
                    None => NavAction::Ignored,
                }
            }
            Key::Delete | Key::Backspace => {
                let Some(index) = self.focused else {
                    return NavAction::Ignored;
                };
                let Some(id) = list.id_at(index) else {
                    return NavAction::Ignored;
                };
                if !list.remove(&id) {
                    return NavAction::Ignored;
                }
                // Removing the last row moves focus up; otherwise focus stays
                // on the row that slid into place.
                let remaining = list.len();
                self.focused = if remaining == 0 {
                    None
                } else if index >= len - 1 {
                    Some(len.saturating_sub(2))
                } else {
                    Some(index.min(remaining - 1))
                };
                debug!(item_id = %id, focused = ?self.focused, "removed focused item");
                NavAction::Removed { id }
            }
            Key::Other => NavAction::Ignored,
        }
    }
}
