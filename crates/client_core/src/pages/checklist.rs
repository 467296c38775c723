use std::collections::BTreeSet;

use shared::{
    catalog::{total_items, Category, AUDITORY_MILESTONES},
    domain::{Collection, MilestoneProgress},
};
use tracing::warn;

use super::{PageContext, ERROR_TITLE};
use crate::{
    error::PageError,
    record_cache::{RecordCache, SyncStatus},
};

/// Every milestone on one page, ticked independently.
pub struct ChecklistPage {
    ctx: PageContext,
    checked: RecordCache<BTreeSet<String>>,
}

impl ChecklistPage {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            checked: RecordCache::new(BTreeSet::new()),
        }
    }

    pub fn categories(&self) -> &'static [Category] {
        AUDITORY_MILESTONES
    }

    pub fn is_checked(&self, item: &str) -> bool {
        self.checked.value().contains(item)
    }

    pub fn status(&self) -> &SyncStatus {
        self.checked.status()
    }

    pub fn checked_count(&self) -> usize {
        self.checked.value().len()
    }

    pub fn completion_fraction(&self) -> f64 {
        let total = total_items(AUDITORY_MILESTONES);
        if total == 0 {
            return 0.0;
        }
        let done = AUDITORY_MILESTONES
            .iter()
            .flat_map(|category| category.items.iter())
            .filter(|item| self.is_checked(item))
            .count();
        done as f64 / total as f64
    }

    pub fn toggle(&mut self, item: &str) -> bool {
        let mut now_checked = false;
        self.checked.edit(|checked| {
            if !checked.remove(item) {
                checked.insert(item.to_string());
                now_checked = true;
            }
        });
        now_checked
    }

    pub async fn load(&mut self) {
        match self.ctx.backend.get_progress(Collection::Checklists).await {
            Ok(Some(progress)) => {
                self.checked.apply_fetched(progress.completed);
            }
            Ok(None) => {}
            Err(err) => {
                warn!("checklist: load failed: {err}");
                self.checked.fetch_failed(err.to_string());
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Failed to load checklist data.");
            }
        }
    }

    pub async fn save(&mut self) -> Result<MilestoneProgress, PageError> {
        let ticket = self.checked.begin_save();
        match self
            .ctx
            .backend
            .save_progress(Collection::Checklists, &ticket.value)
            .await
        {
            Ok(stored) => {
                self.checked
                    .finish_save(ticket, Some(stored.completed.clone()));
                self.ctx
                    .notifier
                    .success("Checklist Saved", "Your progress has been updated.");
                Ok(stored)
            }
            Err(err) => {
                warn!("checklist: save failed: {err}");
                self.checked.save_failed(err.to_string());
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Failed to save changes.");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/checklist_tests.rs"]
mod tests;
