use std::sync::Arc;

use shared::{catalog::AUDITORY_MILESTONES, domain::Collection};
use tracing::warn;

use super::{PageContext, ProgressSink, ERROR_TITLE};
use crate::{
    error::{PageError, WizardError},
    wizard::{AdvanceOutcome, Wizard},
};

/// Paged milestone tracking. Nothing is fetched until tracking starts.
pub struct MilestonesPage {
    ctx: PageContext,
    wizard: Option<Wizard>,
}

impl MilestonesPage {
    pub fn new(ctx: PageContext) -> Self {
        Self { ctx, wizard: None }
    }

    pub fn is_tracking(&self) -> bool {
        self.wizard.is_some()
    }

    pub fn wizard(&self) -> Option<&Wizard> {
        self.wizard.as_ref()
    }

    /// Loads stored progress and opens the wizard on the first age band.
    /// A failed load still opens it, with nothing ticked.
    pub async fn start_tracking(&mut self) {
        let mut wizard = Wizard::new(AUDITORY_MILESTONES);
        match self.ctx.backend.get_progress(Collection::Milestones).await {
            Ok(Some(progress)) => {
                wizard.apply_fetched(progress.completed);
            }
            Ok(None) => {}
            Err(err) => {
                warn!("milestones: load failed: {err}");
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Failed to load milestones data.");
            }
        }
        self.wizard = Some(wizard);
    }

    pub fn toggle(&mut self, item: &str) -> bool {
        match self.wizard.as_mut() {
            Some(wizard) => wizard.toggle_item(item),
            None => false,
        }
    }

    pub fn back(&mut self) {
        if let Some(wizard) = self.wizard.as_mut() {
            wizard.retreat();
        }
    }

    pub fn completion_fraction(&self) -> f64 {
        self.wizard
            .as_ref()
            .map_or(0.0, Wizard::completion_fraction)
    }

    /// Advances the wizard. Each submit on the summary step saves the
    /// current selection.
    pub async fn next(&mut self) -> Result<AdvanceOutcome, PageError> {
        let sink = self.sink();
        let Some(wizard) = self.wizard.as_mut() else {
            return Err(PageError::Invalid("Milestone tracking has not started.".into()));
        };
        let outcome = wizard.advance(&sink).await;
        match outcome {
            Ok(AdvanceOutcome::Completed) => {
                self.saved();
                Ok(AdvanceOutcome::Completed)
            }
            Ok(moved) => Ok(moved),
            Err(err) => Err(self.save_failed(err)),
        }
    }

    /// Saves the current selection without leaving the page.
    pub async fn save_progress(&mut self) -> Result<(), PageError> {
        let sink = self.sink();
        let Some(wizard) = self.wizard.as_mut() else {
            return Err(PageError::Invalid("Milestone tracking has not started.".into()));
        };
        let saved = wizard.save(&sink).await;
        match saved {
            Ok(()) => {
                self.saved();
                Ok(())
            }
            Err(err) => Err(self.save_failed(err)),
        }
    }

    fn sink(&self) -> ProgressSink {
        ProgressSink {
            backend: Arc::clone(&self.ctx.backend),
            collection: Collection::Milestones,
        }
    }

    fn saved(&self) {
        self.ctx
            .notifier
            .success("Milestones Saved", "Your progress has been updated.");
    }

    fn save_failed(&self, err: WizardError) -> PageError {
        warn!("milestones: save failed: {err}");
        self.ctx
            .notifier
            .error(ERROR_TITLE, "Failed to save changes.");
        err.into()
    }
}

#[cfg(test)]
#[path = "tests/milestones_tests.rs"]
mod tests;
