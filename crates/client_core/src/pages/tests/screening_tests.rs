use std::sync::Arc;

use super::*;
use crate::{
    pages::fake::{context, drain_notices, sample_profile, FakeBackend},
    NoticeLevel,
};

#[tokio::test]
async fn load_restores_the_stored_status_and_text() {
    let backend = Arc::new(FakeBackend::default());
    backend.state().screening = Some(ScreeningRecord {
        screening_status: Some(ScreeningStatus::Referred),
        recommendations: Some("See an audiologist.".into()),
        reminder_needed: true,
        ..Default::default()
    });
    let (ctx, _rx) = context(&backend);
    let mut page = ScreeningPage::new(ctx);

    page.load().await;
    assert_eq!(page.status(), Some(ScreeningStatus::Referred));
    assert_eq!(page.recommendations(), Some("See an audiologist."));
    assert!(page.reminder_needed());
}

#[tokio::test]
async fn generate_requires_a_status() {
    let backend = Arc::new(FakeBackend::default());
    let (ctx, _rx) = context(&backend);
    let mut page = ScreeningPage::new(ctx);

    assert!(matches!(page.generate().await, Err(PageError::Invalid(_))));
    assert_eq!(backend.state().generation_calls, 0);
}

#[tokio::test]
async fn missing_profile_is_reported_as_required() {
    let backend = Arc::new(FakeBackend::default());
    let (ctx, mut rx) = context(&backend);
    let mut page = ScreeningPage::new(ctx);
    page.select_status(ScreeningStatus::Passed);

    assert!(page.generate().await.is_err());
    assert_eq!(
        drain_notices(&mut rx),
        vec![(
            NoticeLevel::Error,
            "Error".to_string(),
            "Infant profile and age are required.".to_string()
        )]
    );
    assert_eq!(page.recommendations(), None);
}

#[tokio::test]
async fn generated_recommendations_are_shown_with_the_reminder() {
    let backend = Arc::new(FakeBackend::default());
    backend.state().profile = Some(sample_profile());
    let (ctx, mut rx) = context(&backend);
    let mut page = ScreeningPage::new(ctx);
    page.select_status(ScreeningStatus::Referred);

    let response = page.generate().await.expect("generate");
    assert_eq!(response.age_in_months, 10);
    assert_eq!(page.recommendations(), Some("Follow-up for Referred"));
    assert!(page.reminder_needed());
    assert_eq!(page.age_in_months(), Some(10));
    assert_eq!(drain_notices(&mut rx)[0].1, "Success");
}

#[tokio::test]
async fn generation_failure_keeps_previous_text() {
    let backend = Arc::new(FakeBackend::default());
    {
        let mut state = backend.state();
        state.profile = Some(sample_profile());
        state.fail_generation = true;
        state.screening = Some(ScreeningRecord {
            recommendations: Some("Earlier advice".into()),
            ..Default::default()
        });
    }
    let (ctx, mut rx) = context(&backend);
    let mut page = ScreeningPage::new(ctx);
    page.load().await;
    page.select_status(ScreeningStatus::Passed);

    assert!(page.generate().await.is_err());
    assert_eq!(page.recommendations(), Some("Earlier advice"));
    assert_eq!(
        drain_notices(&mut rx),
        vec![(
            NoticeLevel::Error,
            "AI Error".to_string(),
            "Could not get recommendations.".to_string()
        )]
    );
}
