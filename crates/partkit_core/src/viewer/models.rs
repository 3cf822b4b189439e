//! Viewer-level interaction models installed as viewer adapters.

use super::ViewerId;
use crate::adapter::Adapter;
use crate::part::{PartId, PartTree};

/// Ordered selection; the first entry is the primary selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    selected: Vec<PartId>,
}

impl SelectionModel {
    pub fn selection(&self) -> &[PartId] {
        &self.selected
    }

    pub fn primary(&self) -> Option<PartId> {
        self.selected.first().copied()
    }

    pub fn is_selected(&self, part: PartId) -> bool {
        self.selected.contains(&part)
    }

    /// Replaces the selection, dropping duplicates while keeping order.
    pub fn set_selection(&mut self, parts: impl IntoIterator<Item = PartId>) {
        self.selected.clear();
        for part in parts {
            if !self.selected.contains(&part) {
                self.selected.push(part);
            }
        }
    }

    /// Appends `part` unless it is already selected.
    pub fn append(&mut self, part: PartId) {
        if !self.selected.contains(&part) {
            self.selected.push(part);
        }
    }

    pub fn deselect(&mut self, part: PartId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|selected| *selected != part);
        self.selected.len() != before
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub(crate) fn prune(&mut self, tree: &PartTree) {
        self.selected.retain(|part| tree.contains(*part));
    }
}

impl Adapter<ViewerId> for SelectionModel {}

/// Part currently under the pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverModel {
    hover: Option<PartId>,
}

impl HoverModel {
    pub fn hover(&self) -> Option<PartId> {
        self.hover
    }

    pub fn set_hover(&mut self, part: Option<PartId>) {
        self.hover = part;
    }

    pub(crate) fn prune(&mut self, tree: &PartTree) {
        if self.hover.is_some_and(|part| !tree.contains(part)) {
            self.hover = None;
        }
    }
}

impl Adapter<ViewerId> for HoverModel {}

/// Keyboard focus within one viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusModel {
    focus: Option<PartId>,
}

impl FocusModel {
    pub fn focus(&self) -> Option<PartId> {
        self.focus
    }

    pub fn set_focus(&mut self, part: Option<PartId>) {
        self.focus = part;
    }

    pub(crate) fn prune(&mut self, tree: &PartTree) {
        if self.focus.is_some_and(|part| !tree.contains(part)) {
            self.focus = None;
        }
    }
}

impl Adapter<ViewerId> for FocusModel {}
