use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Category, EnvironmentalSound, LingSound},
    domain::{
        Collection, Infant, InfantProfile, LingTestRecord, MilestoneProgress, OwnerId,
        ScreeningRecord, ScreeningStatus,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub owner_id: OwnerId,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRiskFactorsRequest {
    pub risk_factors: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveProgressRequest {
    pub completed: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveLingTestRequest {
    pub observations: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub screening_status: ScreeningStatus,
}

/// Input handed to the recommendation generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationInput {
    pub screening_status: ScreeningStatus,
    pub age_in_months: u32,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationOutput {
    pub recommendations: String,
    pub reminder_needed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: String,
    pub reminder_needed: bool,
    pub age_in_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAudioRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAudioResponse {
    /// `data:audio/wav;base64,...`
    pub media: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddInfantRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub profile: Option<InfantProfile>,
    #[serde(default)]
    pub screening: Option<ScreeningRecord>,
    #[serde(default)]
    pub milestones: Option<MilestoneProgress>,
    #[serde(default)]
    pub ling_test: Option<LingTestRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub title: String,
    pub items: Vec<String>,
}

impl From<&Category> for CategoryPayload {
    fn from(value: &Category) -> Self {
        Self {
            title: value.title.to_string(),
            items: value.items.iter().map(|item| item.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundPayload {
    pub id: String,
    pub label: String,
    pub src: String,
    pub prompt: String,
}

impl From<&LingSound> for SoundPayload {
    fn from(value: &LingSound) -> Self {
        Self {
            id: value.sound.to_string(),
            label: format!("{} {}", value.ipa, value.description),
            src: value.asset_path(),
            prompt: value.generation_prompt(),
        }
    }
}

impl From<&EnvironmentalSound> for SoundPayload {
    fn from(value: &EnvironmentalSound) -> Self {
        Self {
            id: value.name.to_ascii_lowercase(),
            label: value.name.to_string(),
            src: value.src.to_string(),
            prompt: value.generation_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPayload {
    pub risk_factors: Vec<CategoryPayload>,
    pub milestones: Vec<CategoryPayload>,
    pub ling_sounds: Vec<SoundPayload>,
    pub environmental_sounds: Vec<SoundPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    InfantsUpdated {
        owner_id: OwnerId,
        infants: Vec<Infant>,
    },
    RecordSaved {
        owner_id: OwnerId,
        collection: Collection,
    },
}

impl ServerEvent {
    pub fn owner_id(&self) -> OwnerId {
        match self {
            ServerEvent::InfantsUpdated { owner_id, .. }
            | ServerEvent::RecordSaved { owner_id, .. } => *owner_id,
        }
    }
}
