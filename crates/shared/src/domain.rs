use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(OwnerId);
id_newtype!(InfantId);

/// Document collections kept per owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Profiles,
    Screenings,
    Milestones,
    Checklists,
    LingTests,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Profiles => "profiles",
            Collection::Screenings => "screenings",
            Collection::Milestones => "milestones",
            Collection::Checklists => "checklists",
            Collection::LingTests => "ling_tests",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStatus {
    Passed,
    Referred,
    NotYetScreened,
}

impl ScreeningStatus {
    /// Human readable label, as shown to caregivers and sent to the generator.
    pub fn label(self) -> &'static str {
        match self {
            ScreeningStatus::Passed => "Passed",
            ScreeningStatus::Referred => "Referred",
            ScreeningStatus::NotYetScreened => "Not Yet Screened",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfantProfile {
    pub name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub gender: Gender,
    pub guardian_name: String,
    pub guardian_contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileValidationError {
    #[error("name must be at least 2 characters")]
    NameTooShort,
    #[error("guardian name is required")]
    GuardianNameTooShort,
    #[error("a valid contact number is required")]
    GuardianContactTooShort,
    #[error("date of birth cannot be in the future")]
    BornInFuture,
    #[error("date of birth is before 1900-01-01")]
    BornTooEarly,
}

const MIN_NAME_CHARS: usize = 2;
const MIN_CONTACT_CHARS: usize = 10;

impl InfantProfile {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ProfileValidationError> {
        if self.name.trim().chars().count() < MIN_NAME_CHARS {
            return Err(ProfileValidationError::NameTooShort);
        }
        if self.guardian_name.trim().chars().count() < MIN_NAME_CHARS {
            return Err(ProfileValidationError::GuardianNameTooShort);
        }
        if self.guardian_contact.trim().chars().count() < MIN_CONTACT_CHARS {
            return Err(ProfileValidationError::GuardianContactTooShort);
        }
        if self.date_of_birth > today {
            return Err(ProfileValidationError::BornInFuture);
        }
        let earliest = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
        if self.date_of_birth < earliest {
            return Err(ProfileValidationError::BornTooEarly);
        }
        Ok(())
    }

    /// Whole calendar months between the date of birth and `today`, never negative.
    pub fn age_in_months(&self, today: NaiveDate) -> u32 {
        let dob = self.date_of_birth;
        let mut months = (today.year() - dob.year()) * 12 + today.month() as i32 - dob.month() as i32;
        if today.day() < dob.day() {
            months -= 1;
        }
        months.max(0) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreeningRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screening_status: Option<ScreeningStatus>,
    #[serde(default)]
    pub risk_factors: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    #[serde(default)]
    pub reminder_needed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Completed milestone labels. Shared by the paged milestone flow and the flat checklist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MilestoneProgress {
    #[serde(default)]
    pub completed: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LingTestRecord {
    #[serde(default)]
    pub observations: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infant {
    pub id: InfantId,
    pub owner_id: OwnerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
