//! Controllers behind each screen of the tracker.
//!
//! Each page loads its record through [`TrackerBackend`], keeps local edits
//! until saved, and reports outcomes to the user as notices on the shared
//! [`Notifier`].

pub mod checklist;
pub mod infants;
pub mod ling_test;
pub mod milestones;
pub mod profile;
pub mod report;
pub mod risk_factors;
pub mod screening;

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use shared::domain::Collection;

use crate::{client::TrackerBackend, error::ClientError, wizard::SelectionSink, Notifier};

pub use checklist::ChecklistPage;
pub use infants::InfantsPage;
pub use ling_test::{LingTestPage, SoundTile};
pub use milestones::MilestonesPage;
pub use profile::{ProfileDraft, ProfilePage};
pub use report::{render_report, ReportPage, ReportSection};
pub use risk_factors::RiskFactorsPage;
pub use screening::ScreeningPage;

const ERROR_TITLE: &str = "Error";

#[derive(Clone)]
pub struct PageContext {
    pub backend: Arc<dyn TrackerBackend>,
    pub notifier: Notifier,
}

impl PageContext {
    pub fn new(backend: Arc<dyn TrackerBackend>, notifier: Notifier) -> Self {
        Self { backend, notifier }
    }
}

/// Overwrites one progress collection with a wizard's selection.
pub(crate) struct ProgressSink {
    pub backend: Arc<dyn TrackerBackend>,
    pub collection: Collection,
}

#[async_trait]
impl SelectionSink for ProgressSink {
    async fn persist(&self, selection: &BTreeSet<String>) -> Result<(), ClientError> {
        self.backend
            .save_progress(self.collection, selection)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[path = "tests/fake.rs"]
pub(crate) mod fake;
