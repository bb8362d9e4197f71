use shared::domain::ModId;

use crate::view::{StatusLine, Tone};

pub const FUSION_LABEL: &str = "FUSIONAR";
pub const IDLE_STATUS: &str = "Esperando órdenes...";

/// Identifiers the user has picked, in the order they were first toggled on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    ids: Vec<ModId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSummary {
    pub action_label: String,
    pub status: StatusLine,
}

impl SelectionSummary {
    pub fn empty() -> Self {
        Self {
            action_label: FUSION_LABEL.to_string(),
            status: StatusLine::new(IDLE_STATUS, Tone::Muted),
        }
    }
}

impl SelectionState {
    /// Flips membership of `id`; returns whether it is now selected.
    pub fn toggle(&mut self, id: &ModId) -> bool {
        match self.ids.iter().position(|selected| selected == id) {
            Some(index) => {
                self.ids.remove(index);
                false
            }
            None => {
                self.ids.push(id.clone());
                true
            }
        }
    }

    pub fn contains(&self, id: &ModId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[ModId] {
        &self.ids
    }

    pub(crate) fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn summary(&self) -> SelectionSummary {
        if self.ids.is_empty() {
            return SelectionSummary::empty();
        }
        let count = self.ids.len();
        SelectionSummary {
            action_label: format!("{FUSION_LABEL} ({count})"),
            status: StatusLine::new(format!("{count} mods listos."), Tone::Active),
        }
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
