use std::collections::BTreeSet;

use async_trait::async_trait;
use shared::catalog::{total_items, Category};

use crate::error::{ClientError, WizardError};

/// Where a wizard hands its final selection.
#[async_trait]
pub trait SelectionSink: Send + Sync {
    async fn persist(&self, selection: &BTreeSet<String>) -> Result<(), ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Category(usize),
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Moved(WizardStep),
    Completed,
}

/// Paged selection over a fixed list of categories followed by a summary step.
#[derive(Debug, Clone)]
pub struct Wizard {
    categories: &'static [Category],
    current_index: usize,
    selected: BTreeSet<String>,
    edited: bool,
    completed: bool,
}

impl Wizard {
    pub fn new(categories: &'static [Category]) -> Self {
        Self::with_selection(categories, BTreeSet::new())
    }

    pub fn with_selection(categories: &'static [Category], selected: BTreeSet<String>) -> Self {
        Self {
            categories,
            current_index: 0,
            selected,
            edited: false,
            completed: false,
        }
    }

    pub fn categories(&self) -> &'static [Category] {
        self.categories
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn step(&self) -> WizardStep {
        if self.current_index >= self.categories.len() {
            WizardStep::Summary
        } else {
            WizardStep::Category(self.current_index)
        }
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn is_selected(&self, item: &str) -> bool {
        self.selected.contains(item)
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Flips membership of `item`. Returns whether it is now selected.
    pub fn toggle_item(&mut self, item: &str) -> bool {
        self.edited = true;
        if self.selected.remove(item) {
            false
        } else {
            self.selected.insert(item.to_string());
            true
        }
    }

    /// Replaces the selection with a stored one unless the user has toggled
    /// items since the last save.
    pub fn apply_fetched(&mut self, selected: BTreeSet<String>) -> bool {
        if self.edited {
            return false;
        }
        self.selected = selected;
        true
    }

    /// Moves forward one page. Each call on the summary step hands the
    /// selection to `sink` once; a failed save keeps the wizard on the
    /// summary step.
    pub async fn advance<S>(&mut self, sink: &S) -> Result<AdvanceOutcome, WizardError>
    where
        S: SelectionSink + ?Sized,
    {
        if self.current_index < self.categories.len() {
            self.current_index += 1;
            return Ok(AdvanceOutcome::Moved(self.step()));
        }
        self.save(sink).await?;
        self.completed = true;
        Ok(AdvanceOutcome::Completed)
    }

    /// Writes the current selection without moving.
    pub async fn save<S>(&mut self, sink: &S) -> Result<(), WizardError>
    where
        S: SelectionSink + ?Sized,
    {
        sink.persist(&self.selected)
            .await
            .map_err(WizardError::Persist)?;
        self.edited = false;
        Ok(())
    }

    pub fn retreat(&mut self) -> WizardStep {
        if self.current_index > 0 {
            self.current_index -= 1;
        }
        self.step()
    }

    /// Back to the first page for another pass. The selection is kept.
    pub fn restart(&mut self) {
        self.current_index = 0;
        self.completed = false;
    }

    pub fn progress_fraction(&self) -> f64 {
        (self.current_index + 1) as f64 / (self.categories.len() + 1) as f64
    }

    /// Share of catalog items currently selected.
    pub fn completion_fraction(&self) -> f64 {
        let total = total_items(self.categories);
        if total == 0 {
            return 0.0;
        }
        let selected = self
            .categories
            .iter()
            .flat_map(|category| category.items.iter())
            .filter(|item| self.selected.contains(**item))
            .count();
        selected as f64 / total as f64
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
