use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use shared::{
    catalog::{AUDITORY_MILESTONES, ENVIRONMENTAL_SOUNDS, HIGH_RISK_FACTORS, LING_SIX_SOUNDS},
    domain::{
        Collection, Infant, InfantId, InfantProfile, LingTestRecord, MilestoneProgress, OwnerId,
        ScreeningRecord, ScreeningStatus,
    },
    error::{ApiError, ErrorCode},
    protocol::{CatalogPayload, RecommendationInput, RecommendationResponse, Report},
};
use std::collections::BTreeSet;
use storage::{partial_document, Storage};
use tracing::{info, warn};

pub mod generation;

pub use generation::{Generator, MissingGenerator};

const MAX_PROMPT_CHARS: usize = 2_000;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub generator: Arc<dyn Generator>,
}

impl ApiContext {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            generator: Arc::new(MissingGenerator),
        }
    }

    pub fn with_generator(storage: Storage, generator: Arc<dyn Generator>) -> Self {
        Self { storage, generator }
    }
}

pub async fn get_profile(
    ctx: &ApiContext,
    owner_id: OwnerId,
) -> Result<Option<InfantProfile>, ApiError> {
    ctx.storage
        .load_record(Collection::Profiles, owner_id)
        .await
        .map_err(internal)
}

pub async fn save_profile(
    ctx: &ApiContext,
    owner_id: OwnerId,
    profile: InfantProfile,
    today: NaiveDate,
) -> Result<InfantProfile, ApiError> {
    profile
        .validate(today)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let profile = InfantProfile {
        name: profile.name.trim().to_string(),
        guardian_name: profile.guardian_name.trim().to_string(),
        guardian_contact: profile.guardian_contact.trim().to_string(),
        ..profile
    };
    ctx.storage
        .save_record(Collection::Profiles, owner_id, &profile, true)
        .await
        .map_err(internal)?;
    Ok(profile)
}

pub async fn get_screening(
    ctx: &ApiContext,
    owner_id: OwnerId,
) -> Result<Option<ScreeningRecord>, ApiError> {
    ctx.storage
        .load_record(Collection::Screenings, owner_id)
        .await
        .map_err(internal)
}

/// Merges the selected risk factors into the screening record.
pub async fn save_risk_factors(
    ctx: &ApiContext,
    owner_id: OwnerId,
    risk_factors: BTreeSet<String>,
) -> Result<ScreeningRecord, ApiError> {
    let document = partial_document([
        ("risk_factors", json!(risk_factors)),
        ("last_updated", json!(Utc::now())),
    ]);
    ctx.storage
        .set_document(Collection::Screenings, owner_id, document, true)
        .await
        .map_err(internal)?;
    Ok(get_screening(ctx, owner_id).await?.unwrap_or_default())
}

pub async fn generate_recommendations(
    ctx: &ApiContext,
    owner_id: OwnerId,
    screening_status: ScreeningStatus,
    today: NaiveDate,
) -> Result<RecommendationResponse, ApiError> {
    let profile = get_profile(ctx, owner_id)
        .await?
        .ok_or_else(|| ApiError::validation("infant profile and age are required"))?;
    let age_in_months = profile.age_in_months(today);
    let risk_factors = get_screening(ctx, owner_id)
        .await?
        .map(|record| record.risk_factors.into_iter().collect())
        .unwrap_or_default();

    let input = RecommendationInput {
        screening_status,
        age_in_months,
        risk_factors,
    };
    let output = ctx.generator.recommend(&input).await.map_err(|error| {
        warn!(owner_id = owner_id.0, %error, "recommendation generation failed");
        ApiError::internal("recommendation service unavailable")
    })?;

    let document = partial_document([
        ("screening_status", json!(screening_status)),
        ("risk_factors", json!(input.risk_factors)),
        ("recommendations", json!(output.recommendations)),
        ("reminder_needed", json!(output.reminder_needed)),
        ("last_updated", json!(Utc::now())),
    ]);
    ctx.storage
        .set_document(Collection::Screenings, owner_id, document, true)
        .await
        .map_err(internal)?;
    info!(
        owner_id = owner_id.0,
        status = screening_status.label(),
        age_in_months,
        reminder_needed = output.reminder_needed,
        "recommendations generated"
    );

    Ok(RecommendationResponse {
        recommendations: output.recommendations,
        reminder_needed: output.reminder_needed,
        age_in_months,
    })
}

pub async fn get_progress(
    ctx: &ApiContext,
    owner_id: OwnerId,
    collection: Collection,
) -> Result<Option<MilestoneProgress>, ApiError> {
    ensure_progress_collection(collection)?;
    ctx.storage
        .load_record(collection, owner_id)
        .await
        .map_err(internal)
}

/// Replaces the owner's milestone (or checklist) progress wholesale.
pub async fn save_progress(
    ctx: &ApiContext,
    owner_id: OwnerId,
    collection: Collection,
    completed: BTreeSet<String>,
) -> Result<MilestoneProgress, ApiError> {
    ensure_progress_collection(collection)?;
    let progress = MilestoneProgress {
        completed,
        last_updated: Some(Utc::now()),
    };
    ctx.storage
        .save_record(collection, owner_id, &progress, false)
        .await
        .map_err(internal)?;
    Ok(progress)
}

fn ensure_progress_collection(collection: Collection) -> Result<(), ApiError> {
    match collection {
        Collection::Milestones | Collection::Checklists => Ok(()),
        other => Err(ApiError::internal(format!(
            "{} does not hold milestone progress",
            other.as_str()
        ))),
    }
}

pub async fn get_ling_test(
    ctx: &ApiContext,
    owner_id: OwnerId,
) -> Result<Option<LingTestRecord>, ApiError> {
    ctx.storage
        .load_record(Collection::LingTests, owner_id)
        .await
        .map_err(internal)
}

pub async fn save_ling_test(
    ctx: &ApiContext,
    owner_id: OwnerId,
    observations: String,
) -> Result<LingTestRecord, ApiError> {
    let record = LingTestRecord {
        observations,
        test_date: Some(Utc::now()),
    };
    ctx.storage
        .save_record(Collection::LingTests, owner_id, &record, true)
        .await
        .map_err(internal)?;
    Ok(record)
}

pub async fn list_infants(ctx: &ApiContext, owner_id: OwnerId) -> Result<Vec<Infant>, ApiError> {
    ctx.storage.list_infants(owner_id).await.map_err(internal)
}

pub async fn add_infant(
    ctx: &ApiContext,
    owner_id: OwnerId,
    name: &str,
) -> Result<Infant, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("please enter a valid name for the infant"));
    }
    ctx.storage
        .insert_infant(owner_id, name)
        .await
        .map_err(internal)
}

pub async fn get_infant(
    ctx: &ApiContext,
    owner_id: OwnerId,
    infant_id: InfantId,
) -> Result<Infant, ApiError> {
    ctx.storage
        .infant_for_owner(owner_id, infant_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("infant not found"))
}

pub async fn build_report(ctx: &ApiContext, owner_id: OwnerId) -> Result<Report, ApiError> {
    Ok(Report {
        profile: get_profile(ctx, owner_id).await?,
        screening: get_screening(ctx, owner_id).await?,
        milestones: get_progress(ctx, owner_id, Collection::Milestones).await?,
        ling_test: get_ling_test(ctx, owner_id).await?,
    })
}

/// Generates a clip for `prompt` and returns it as a WAV data URI.
pub async fn generate_audio(ctx: &ApiContext, prompt: &str) -> Result<String, ApiError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::validation("prompt must not be empty"));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(ApiError::validation(format!(
            "prompt exceeds {MAX_PROMPT_CHARS} characters"
        )));
    }

    let pcm = ctx.generator.synthesize(prompt).await.map_err(|error| {
        warn!(%error, "audio generation failed");
        ApiError::internal("audio generation unavailable")
    })?;
    if pcm.is_empty() {
        return Err(ApiError::internal("no media returned"));
    }
    let wav = generation::pcm_to_wav(&pcm).map_err(internal)?;
    Ok(generation::wav_data_uri(&wav))
}

pub fn catalog() -> CatalogPayload {
    CatalogPayload {
        risk_factors: HIGH_RISK_FACTORS.iter().map(Into::into).collect(),
        milestones: AUDITORY_MILESTONES.iter().map(Into::into).collect(),
        ling_sounds: LING_SIX_SOUNDS.iter().map(Into::into).collect(),
        environmental_sounds: ENVIRONMENTAL_SOUNDS.iter().map(Into::into).collect(),
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
