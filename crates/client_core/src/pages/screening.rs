use shared::{
    domain::{ScreeningRecord, ScreeningStatus},
    error::ErrorCode,
    protocol::RecommendationResponse,
};
use tracing::{info, warn};

use super::{PageContext, ERROR_TITLE};
use crate::error::PageError;

pub struct ScreeningPage {
    ctx: PageContext,
    status: Option<ScreeningStatus>,
    record: ScreeningRecord,
    age_in_months: Option<u32>,
}

impl ScreeningPage {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            status: None,
            record: ScreeningRecord::default(),
            age_in_months: None,
        }
    }

    pub fn status(&self) -> Option<ScreeningStatus> {
        self.status
    }

    pub fn select_status(&mut self, status: ScreeningStatus) {
        self.status = Some(status);
    }

    pub fn recommendations(&self) -> Option<&str> {
        self.record.recommendations.as_deref()
    }

    pub fn reminder_needed(&self) -> bool {
        self.record.reminder_needed
    }

    pub fn age_in_months(&self) -> Option<u32> {
        self.age_in_months
    }

    pub fn record(&self) -> &ScreeningRecord {
        &self.record
    }

    pub async fn load(&mut self) {
        match self.ctx.backend.get_screening().await {
            Ok(Some(record)) => {
                if self.status.is_none() {
                    self.status = record.screening_status;
                }
                self.record = record;
            }
            Ok(None) => {}
            Err(err) => {
                warn!("screening: load failed: {err}");
                self.ctx.notifier.error(ERROR_TITLE, "Failed to load data.");
            }
        }
    }

    /// Asks for recommendations for the selected status. The server derives
    /// the age from the stored profile and adds the saved risk factors.
    pub async fn generate(&mut self) -> Result<RecommendationResponse, PageError> {
        let status = self
            .status
            .ok_or_else(|| PageError::Invalid("Please select a screening status.".into()))?;
        match self.ctx.backend.request_recommendations(status).await {
            Ok(response) => {
                info!(
                    status = status.label(),
                    age_in_months = response.age_in_months,
                    reminder_needed = response.reminder_needed,
                    "screening: recommendations generated"
                );
                self.record.screening_status = Some(status);
                self.record.recommendations = Some(response.recommendations.clone());
                self.record.reminder_needed = response.reminder_needed;
                self.age_in_months = Some(response.age_in_months);
                self.ctx
                    .notifier
                    .success("Success", "Recommendations generated.");
                Ok(response)
            }
            Err(err) if err.code() == Some(ErrorCode::Validation) => {
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Infant profile and age are required.");
                Err(err.into())
            }
            Err(err) => {
                warn!("screening: recommendation request failed: {err}");
                self.ctx
                    .notifier
                    .error("AI Error", "Could not get recommendations.");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/screening_tests.rs"]
mod tests;
