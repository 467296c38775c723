use shared::protocol::Report;
use tracing::warn;

use super::{PageContext, ERROR_TITLE};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub title: &'static str,
    pub lines: Vec<String>,
}

/// Lays the report out as titled sections of text. Missing records are
/// shown as absent instead of being left out.
pub fn render_report(report: &Report) -> Vec<ReportSection> {
    let profile = match &report.profile {
        Some(profile) => vec![
            format!("Name: {}", profile.name),
            format!("Date of Birth: {}", profile.date_of_birth.format("%B %-d, %Y")),
            format!("Gender: {:?}", profile.gender),
            format!("Guardian: {}", profile.guardian_name),
            format!("Contact: {}", profile.guardian_contact),
        ],
        None => vec!["No profile data available.".to_string()],
    };

    let screening = match &report.screening {
        Some(screening) => {
            let mut lines = vec![format!(
                "Status: {}",
                screening
                    .screening_status
                    .map_or(NOT_AVAILABLE, |status| status.label())
            )];
            if screening.risk_factors.is_empty() {
                lines.push("No risk factors identified.".to_string());
            } else {
                lines.push("High-Risk Factors:".to_string());
                lines.extend(screening.risk_factors.iter().map(|f| format!("- {f}")));
            }
            lines.push(format!(
                "Recommendation: {}",
                screening
                    .recommendations
                    .as_deref()
                    .unwrap_or("No recommendations generated yet.")
            ));
            if screening.reminder_needed {
                lines.push("A follow-up screening is recommended.".to_string());
            }
            lines
        }
        None => vec!["No screening data available.".to_string()],
    };

    let milestones = match &report.milestones {
        Some(progress) if !progress.completed.is_empty() => progress
            .completed
            .iter()
            .map(|milestone| format!("- {milestone}"))
            .collect(),
        _ => vec!["No completed milestones recorded.".to_string()],
    };

    let ling_test = match &report.ling_test {
        Some(test) => vec![
            format!(
                "Test Date: {}",
                test.test_date.map_or_else(
                    || NOT_AVAILABLE.to_string(),
                    |date| date.format("%B %-d, %Y").to_string()
                )
            ),
            format!(
                "Observations: {}",
                if test.observations.is_empty() {
                    "No observations recorded."
                } else {
                    test.observations.as_str()
                }
            ),
        ],
        None => vec!["No Ling-6 test data available.".to_string()],
    };

    vec![
        ReportSection {
            title: "Infant Profile",
            lines: profile,
        },
        ReportSection {
            title: "Screening & Risks",
            lines: screening,
        },
        ReportSection {
            title: "Auditory Milestones",
            lines: milestones,
        },
        ReportSection {
            title: "Ling-6 Sound Test",
            lines: ling_test,
        },
    ]
}

pub struct ReportPage {
    ctx: PageContext,
    report: Option<Report>,
}

impl ReportPage {
    pub fn new(ctx: PageContext) -> Self {
        Self { ctx, report: None }
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn sections(&self) -> Vec<ReportSection> {
        render_report(self.report.as_ref().unwrap_or(&Report::default()))
    }

    pub async fn load(&mut self) {
        match self.ctx.backend.report().await {
            Ok(report) => self.report = Some(report),
            Err(err) => {
                warn!("report: load failed: {err}");
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Could not load the report data.");
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/report_tests.rs"]
mod tests;
