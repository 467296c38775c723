use super::*;
use serde_json::json;
use shared::domain::{LingTestRecord, MilestoneProgress};

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("tracker.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn create_owner_is_idempotent_per_username() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let first = storage.create_owner("carer").await.expect("owner");
    let again = storage.create_owner("carer").await.expect("owner");
    let other = storage.create_owner("someone-else").await.expect("owner");
    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(
        storage.username_for_owner(first).await.expect("lookup"),
        Some("carer".to_string())
    );
}

#[tokio::test]
async fn missing_document_reads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let owner = storage.create_owner("carer").await.expect("owner");
    let doc = storage
        .get_document(Collection::Profiles, owner)
        .await
        .expect("get");
    assert!(doc.is_none());
}

#[tokio::test]
async fn merge_keeps_fields_the_write_does_not_mention() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let owner = storage.create_owner("carer").await.expect("owner");

    storage
        .set_document(
            Collection::Screenings,
            owner,
            json!({ "screening_status": "referred", "risk_factors": ["a"] }),
            false,
        )
        .await
        .expect("seed");
    storage
        .set_document(
            Collection::Screenings,
            owner,
            json!({ "risk_factors": ["b", "c"] }),
            true,
        )
        .await
        .expect("merge");

    let doc = storage
        .get_document(Collection::Screenings, owner)
        .await
        .expect("get")
        .expect("doc");
    assert_eq!(doc["screening_status"], "referred");
    assert_eq!(doc["risk_factors"], json!(["b", "c"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_merges_on_a_file_database_all_land() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("tracker.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));
    let storage = Storage::new(&database_url).await.expect("db");
    let owner = storage.create_owner("carer").await.expect("owner");

    let writers: Vec<_> = (0..20)
        .map(|i| {
            let storage = storage.clone();
            tokio::spawn(async move {
                let mut fields = Map::new();
                fields.insert(format!("field_{i}"), json!(i));
                storage
                    .set_document(Collection::Profiles, owner, Value::Object(fields), true)
                    .await
            })
        })
        .collect();
    for writer in writers {
        writer.await.expect("join").expect("merge");
    }

    let doc = storage
        .get_document(Collection::Profiles, owner)
        .await
        .expect("get")
        .expect("doc");
    let fields = doc.as_object().expect("object");
    assert_eq!(fields.len(), 20);
    assert_eq!(fields["field_7"], 7);
}

#[tokio::test]
async fn overwrite_drops_previous_fields() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let owner = storage.create_owner("carer").await.expect("owner");

    storage
        .set_document(
            Collection::Milestones,
            owner,
            json!({ "completed": ["x"], "stale": true }),
            false,
        )
        .await
        .expect("seed");
    storage
        .set_document(Collection::Milestones, owner, json!({ "completed": [] }), false)
        .await
        .expect("overwrite");

    let doc = storage
        .get_document(Collection::Milestones, owner)
        .await
        .expect("get")
        .expect("doc");
    assert!(doc.get("stale").is_none());
}

#[tokio::test]
async fn documents_are_isolated_per_owner_and_collection() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let alice = storage.create_owner("alice").await.expect("owner");
    let bob = storage.create_owner("bob").await.expect("owner");

    let record = LingTestRecord {
        observations: "turned head at /s/".into(),
        test_date: None,
    };
    storage
        .save_record(Collection::LingTests, alice, &record, true)
        .await
        .expect("save");

    let for_bob: Option<LingTestRecord> = storage
        .load_record(Collection::LingTests, bob)
        .await
        .expect("load");
    assert!(for_bob.is_none());

    let other_collection: Option<MilestoneProgress> = storage
        .load_record(Collection::Milestones, alice)
        .await
        .expect("load");
    assert!(other_collection.is_none());

    let for_alice: Option<LingTestRecord> = storage
        .load_record(Collection::LingTests, alice)
        .await
        .expect("load");
    assert_eq!(for_alice, Some(record));
}

#[tokio::test]
async fn infants_are_listed_per_owner_in_insertion_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let alice = storage.create_owner("alice").await.expect("owner");
    let bob = storage.create_owner("bob").await.expect("owner");

    let first = storage.insert_infant(alice, "Ada").await.expect("infant");
    let second = storage.insert_infant(alice, "Ben").await.expect("infant");
    storage.insert_infant(bob, "Cal").await.expect("infant");

    let listed = storage.list_infants(alice).await.expect("list");
    assert_eq!(
        listed.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    assert!(storage
        .infant_for_owner(bob, first.id)
        .await
        .expect("lookup")
        .is_none());
    assert_eq!(
        storage
            .infant_for_owner(alice, first.id)
            .await
            .expect("lookup")
            .map(|i| i.name),
        Some("Ada".to_string())
    );
}

#[test]
fn merge_replaces_non_object_documents() {
    assert_eq!(merge_documents(json!([1, 2]), json!({ "a": 1 })), json!({ "a": 1 }));
    assert_eq!(
        merge_documents(json!({ "a": 1, "b": 2 }), json!({ "b": 3 })),
        json!({ "a": 1, "b": 3 })
    );
}

#[test]
fn memory_urls_have_no_parent_directory() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/tracker.db?mode=rwc"),
        Some(PathBuf::from("./data/tracker.db"))
    );
}
