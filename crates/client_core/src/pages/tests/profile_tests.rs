use std::sync::Arc;

use super::*;
use crate::{
    pages::fake::{context, drain_notices, sample_profile, today, FakeBackend},
    ClientEvent, NoticeLevel,
};

fn page(backend: &Arc<FakeBackend>) -> (ProfilePage, tokio::sync::broadcast::Receiver<ClientEvent>) {
    let (ctx, rx) = context(backend);
    (ProfilePage::new(ctx), rx)
}

#[tokio::test]
async fn load_fills_the_form_from_the_stored_profile() {
    let backend = Arc::new(FakeBackend::default());
    backend.state().profile = Some(sample_profile());
    let (mut page, _rx) = page(&backend);

    page.load().await;
    assert_eq!(page.draft(), &ProfileDraft::from(sample_profile()));
    assert_eq!(page.status(), &SyncStatus::Synced);
}

#[tokio::test]
async fn load_failure_keeps_the_empty_form_and_notifies() {
    let backend = Arc::new(FakeBackend::default());
    backend.state().fail_reads = true;
    let (mut page, mut rx) = page(&backend);

    page.load().await;
    assert_eq!(page.draft(), &ProfileDraft::default());
    assert_eq!(
        drain_notices(&mut rx),
        vec![(
            NoticeLevel::Error,
            "Error".to_string(),
            "Failed to fetch profile.".to_string()
        )]
    );
}

#[tokio::test]
async fn missing_date_of_birth_is_rejected_without_a_request() {
    let backend = Arc::new(FakeBackend::default());
    let (mut page, _rx) = page(&backend);
    page.edit(|draft| {
        draft.name = "Ada".into();
        draft.guardian_name = "Grace".into();
        draft.guardian_contact = "0123456789".into();
    });

    let err = page.save(today()).await.expect_err("invalid");
    assert!(matches!(err, PageError::Invalid(message) if message == "Date of birth is required."));
    assert!(backend.state().saves.is_empty());
    assert_eq!(page.status(), &SyncStatus::Dirty);
}

#[tokio::test]
async fn save_trims_and_stores_the_profile() {
    let backend = Arc::new(FakeBackend::default());
    let (mut page, mut rx) = page(&backend);
    page.edit(|draft| {
        *draft = ProfileDraft::from(sample_profile());
        draft.name = "  Ada  ".into();
    });

    let stored = page.save(today()).await.expect("save");
    assert_eq!(stored.name, "Ada");
    assert_eq!(backend.state().profile, Some(sample_profile()));
    assert_eq!(page.status(), &SyncStatus::Synced);
    assert_eq!(page.draft().name, "Ada");
    assert_eq!(
        drain_notices(&mut rx),
        vec![(
            NoticeLevel::Success,
            "Profile Saved".to_string(),
            "Infant's profile has been updated successfully.".to_string()
        )]
    );
}

#[tokio::test]
async fn failed_save_keeps_the_draft_for_retry() {
    let backend = Arc::new(FakeBackend::default());
    backend.state().fail_writes = true;
    let (mut page, mut rx) = page(&backend);
    page.edit(|draft| *draft = ProfileDraft::from(sample_profile()));

    assert!(page.save(today()).await.is_err());
    assert_eq!(page.draft(), &ProfileDraft::from(sample_profile()));
    assert!(matches!(page.status(), SyncStatus::Error(_)));
    let notices = drain_notices(&mut rx);
    assert_eq!(notices[0].1, "Uh oh!");

    backend.state().fail_writes = false;
    page.save(today()).await.expect("retry");
    assert_eq!(page.status(), &SyncStatus::Synced);
}
