use super::*;

#[test]
fn fetch_is_applied_to_a_clean_cache() {
    let mut cache = RecordCache::new(String::new());
    assert!(cache.apply_fetched("stored".to_string()));
    assert_eq!(cache.value(), "stored");
    assert_eq!(cache.status(), &SyncStatus::Synced);
}

#[test]
fn fetch_does_not_clobber_local_edits() {
    let mut cache = RecordCache::new(String::new());
    cache.edit(|v| v.push_str("typed"));
    assert_eq!(cache.status(), &SyncStatus::Dirty);

    assert!(!cache.apply_fetched("stale".to_string()));
    assert_eq!(cache.value(), "typed");
    assert_eq!(cache.status(), &SyncStatus::Dirty);
}

#[test]
fn save_after_further_edits_stays_dirty() {
    let mut cache = RecordCache::new(0u32);
    cache.edit(|v| *v = 1);
    let ticket = cache.begin_save();
    assert_eq!(cache.status(), &SyncStatus::Syncing);
    assert_eq!(ticket.value, 1);

    cache.edit(|v| *v = 2);
    cache.finish_save(ticket, Some(1));
    assert_eq!(cache.status(), &SyncStatus::Dirty);
    assert_eq!(*cache.value(), 2);
    assert!(cache.has_unsaved_edits());

    let ticket = cache.begin_save();
    cache.finish_save(ticket, None);
    assert_eq!(cache.status(), &SyncStatus::Synced);
    assert!(!cache.has_unsaved_edits());
}

#[test]
fn failed_save_keeps_value_and_blocks_fetches() {
    let mut cache = RecordCache::new(vec!["a"]);
    cache.edit(|v| v.push("b"));
    let _ticket = cache.begin_save();
    cache.save_failed("Failed to save changes.");

    assert_eq!(
        cache.status(),
        &SyncStatus::Error("Failed to save changes.".into())
    );
    assert_eq!(cache.value(), &vec!["a", "b"]);
    assert!(!cache.apply_fetched(vec![]));
}

#[test]
fn fetch_failure_marks_error_only_when_clean() {
    let mut cache = RecordCache::new(1);
    cache.fetch_failed("offline");
    assert_eq!(cache.status(), &SyncStatus::Error("offline".into()));
    assert!(cache.apply_fetched(5));
    assert_eq!(cache.status(), &SyncStatus::Synced);

    cache.edit(|v| *v += 1);
    cache.fetch_failed("offline");
    assert_eq!(cache.status(), &SyncStatus::Dirty);
}
