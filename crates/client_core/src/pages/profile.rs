use chrono::NaiveDate;
use shared::domain::{Gender, InfantProfile};
use tracing::warn;

use super::{PageContext, ERROR_TITLE};
use crate::{
    error::PageError,
    record_cache::{RecordCache, SyncStatus},
};

/// Profile form contents. The date of birth stays empty until picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub guardian_name: String,
    pub guardian_contact: String,
}

impl From<InfantProfile> for ProfileDraft {
    fn from(value: InfantProfile) -> Self {
        Self {
            name: value.name,
            date_of_birth: Some(value.date_of_birth),
            gender: value.gender,
            guardian_name: value.guardian_name,
            guardian_contact: value.guardian_contact,
        }
    }
}

impl ProfileDraft {
    pub fn to_profile(&self, today: NaiveDate) -> Result<InfantProfile, PageError> {
        let date_of_birth = self
            .date_of_birth
            .ok_or_else(|| PageError::Invalid("Date of birth is required.".into()))?;
        let profile = InfantProfile {
            name: self.name.trim().to_string(),
            date_of_birth,
            gender: self.gender,
            guardian_name: self.guardian_name.trim().to_string(),
            guardian_contact: self.guardian_contact.trim().to_string(),
        };
        profile
            .validate(today)
            .map_err(|err| PageError::Invalid(err.to_string()))?;
        Ok(profile)
    }
}

pub struct ProfilePage {
    ctx: PageContext,
    draft: RecordCache<ProfileDraft>,
}

impl ProfilePage {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            draft: RecordCache::new(ProfileDraft::default()),
        }
    }

    pub fn draft(&self) -> &ProfileDraft {
        self.draft.value()
    }

    pub fn status(&self) -> &SyncStatus {
        self.draft.status()
    }

    pub fn edit(&mut self, f: impl FnOnce(&mut ProfileDraft)) {
        self.draft.edit(f);
    }

    pub async fn load(&mut self) {
        match self.ctx.backend.get_profile().await {
            Ok(Some(profile)) => {
                self.draft.apply_fetched(profile.into());
            }
            Ok(None) => {}
            Err(err) => {
                warn!("profile: load failed: {err}");
                self.draft.fetch_failed(err.to_string());
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Failed to fetch profile.");
            }
        }
    }

    /// Validates the draft and merge-saves it. Validation problems are
    /// returned without a request being made.
    pub async fn save(&mut self, today: NaiveDate) -> Result<InfantProfile, PageError> {
        let profile = self.draft.value().to_profile(today)?;
        let ticket = self.draft.begin_save();
        match self.ctx.backend.save_profile(&profile).await {
            Ok(stored) => {
                self.draft.finish_save(ticket, Some(stored.clone().into()));
                self.ctx.notifier.success(
                    "Profile Saved",
                    "Infant's profile has been updated successfully.",
                );
                Ok(stored)
            }
            Err(err) => {
                warn!("profile: save failed: {err}");
                self.draft.save_failed(err.to_string());
                self.ctx.notifier.error("Uh oh!", "Failed to save the profile.");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod tests;
