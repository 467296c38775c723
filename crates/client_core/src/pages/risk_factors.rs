use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use shared::catalog::HIGH_RISK_FACTORS;
use tracing::warn;

use super::{PageContext, ERROR_TITLE};
use crate::{
    client::TrackerBackend,
    error::{ClientError, PageError, WizardError},
    wizard::{AdvanceOutcome, SelectionSink, Wizard},
};

/// Merges the selection into the screening record.
struct RiskFactorSink {
    backend: Arc<dyn TrackerBackend>,
}

#[async_trait]
impl SelectionSink for RiskFactorSink {
    async fn persist(&self, selection: &BTreeSet<String>) -> Result<(), ClientError> {
        self.backend.save_risk_factors(selection).await.map(|_| ())
    }
}

pub struct RiskFactorsPage {
    ctx: PageContext,
    wizard: Wizard,
}

impl RiskFactorsPage {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            wizard: Wizard::new(HIGH_RISK_FACTORS),
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn toggle(&mut self, item: &str) -> bool {
        self.wizard.toggle_item(item)
    }

    pub fn back(&mut self) {
        self.wizard.retreat();
    }

    pub fn start_over(&mut self) {
        self.wizard.restart();
    }

    pub async fn load(&mut self) {
        match self.ctx.backend.get_screening().await {
            Ok(Some(record)) => {
                self.wizard.apply_fetched(record.risk_factors);
            }
            Ok(None) => {}
            Err(err) => {
                warn!("risk factors: load failed: {err}");
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Failed to load risk factors.");
            }
        }
    }

    pub async fn next(&mut self) -> Result<AdvanceOutcome, PageError> {
        let sink = self.sink();
        let outcome = self.wizard.advance(&sink).await;
        match outcome {
            Ok(AdvanceOutcome::Completed) => {
                self.saved();
                Ok(AdvanceOutcome::Completed)
            }
            Ok(moved) => Ok(moved),
            Err(err) => Err(self.save_failed(err)),
        }
    }

    /// Saves the factors ticked so far without leaving the current page.
    pub async fn save_progress(&mut self) -> Result<(), PageError> {
        let sink = self.sink();
        let saved = self.wizard.save(&sink).await;
        match saved {
            Ok(()) => {
                self.saved();
                Ok(())
            }
            Err(err) => Err(self.save_failed(err)),
        }
    }

    fn sink(&self) -> RiskFactorSink {
        RiskFactorSink {
            backend: Arc::clone(&self.ctx.backend),
        }
    }

    fn saved(&self) {
        self.ctx
            .notifier
            .success("Success", "Risk factors have been saved.");
    }

    fn save_failed(&self, err: WizardError) -> PageError {
        warn!("risk factors: save failed: {err}");
        self.ctx
            .notifier
            .error(ERROR_TITLE, "Could not save risk factors.");
        err.into()
    }
}

#[cfg(test)]
#[path = "tests/risk_factors_tests.rs"]
mod tests;
