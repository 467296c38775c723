use shared::{
    domain::{Infant, InfantId},
    protocol::ServerEvent,
};
use tracing::{info, warn};

use super::{PageContext, ERROR_TITLE};
use crate::{
    error::PageError,
    selection::{SelectedInfant, SelectionStore},
};

pub struct InfantsPage {
    ctx: PageContext,
    infants: Vec<Infant>,
    store: SelectionStore,
    selected: Option<SelectedInfant>,
}

impl InfantsPage {
    pub fn new(ctx: PageContext, store: SelectionStore) -> Self {
        Self {
            ctx,
            infants: Vec::new(),
            store,
            selected: None,
        }
    }

    pub fn infants(&self) -> &[Infant] {
        &self.infants
    }

    pub fn selected(&self) -> Option<&SelectedInfant> {
        self.selected.as_ref()
    }

    /// Fetches the owner's infants and restores the remembered selection.
    pub async fn load(&mut self) {
        match self.store.load() {
            Ok(selected) => self.selected = selected,
            Err(err) => warn!("infants: could not read saved selection: {err:#}"),
        }
        match self.ctx.backend.list_infants().await {
            Ok(infants) => self.infants = infants,
            Err(err) => {
                warn!("infants: load failed: {err}");
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Failed to fetch infants.");
            }
        }
    }

    pub async fn add(&mut self, name: &str) -> Result<Infant, PageError> {
        let name = name.trim();
        if name.is_empty() {
            self.ctx.notifier.error(
                "Invalid Name",
                "Please enter a valid name for the infant.",
            );
            return Err(PageError::Invalid("infant name is empty".into()));
        }
        match self.ctx.backend.add_infant(name).await {
            Ok(infant) => {
                if !self.infants.iter().any(|known| known.id == infant.id) {
                    self.infants.push(infant.clone());
                }
                self.ctx.notifier.success(
                    "Infant Added",
                    format!("{name} has been added successfully."),
                );
                Ok(infant)
            }
            Err(err) => {
                warn!("infants: add failed: {err}");
                self.ctx.notifier.error(ERROR_TITLE, "Failed to add infant.");
                Err(err.into())
            }
        }
    }

    /// Applies a pushed server event. Returns whether the list changed.
    pub fn apply_event(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::InfantsUpdated { infants, .. } => {
                self.infants = infants.clone();
                true
            }
            _ => false,
        }
    }

    /// Remembers `infant_id` as the current infant across runs.
    pub fn select(&mut self, infant_id: InfantId) -> Result<&SelectedInfant, PageError> {
        let infant = self
            .infants
            .iter()
            .find(|infant| infant.id == infant_id)
            .ok_or_else(|| PageError::Invalid(format!("unknown infant {}", infant_id.0)))?;
        let selected = SelectedInfant {
            id: infant.id,
            name: infant.name.clone(),
        };
        if let Err(err) = self.store.save(&selected) {
            warn!("infants: could not save selection: {err:#}");
        }
        info!(infant_id = infant_id.0, "infants: selected");
        Ok(self.selected.insert(selected))
    }

    pub async fn open(&self, infant_id: InfantId) -> Result<Infant, PageError> {
        Ok(self.ctx.backend.get_infant(infant_id).await?)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        if let Err(err) = self.store.clear() {
            warn!("infants: could not clear selection: {err:#}");
        }
    }
}

#[cfg(test)]
#[path = "tests/infants_tests.rs"]
mod tests;
