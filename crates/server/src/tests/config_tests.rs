use super::{normalize_database_url, prepare_database_url, settings_from, DEV_JWT_SECRET};

use std::{collections::HashMap, fs};

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = settings_from("does-not-exist.toml", HashMap::new()).expect("settings");
    assert_eq!(settings.bind_addr, "127.0.0.1:8443");
    assert_eq!(settings.database_url, "sqlite://./data/tracker.db");
    assert_eq!(settings.auth.jwt_secret, DEV_JWT_SECRET);
    assert!(settings.generation.base_url.is_none());
    assert_eq!(settings.generation.timeout_seconds, 30);
}

#[test]
fn file_values_are_overridden_by_prefixed_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("server.toml");
    fs::write(
        &file,
        "bind_addr = \"0.0.0.0:9000\"\naudio_dir = \"/srv/audio\"\n\n[generation]\nbase_url = \"http://gen.local\"\n",
    )
    .expect("write");

    let settings = settings_from(
        file.to_string_lossy().as_ref(),
        vars(&[
            ("APP__BIND_ADDR", "127.0.0.1:7000"),
            ("APP__AUTH__TOKEN_TTL_SECONDS", "60"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.bind_addr, "127.0.0.1:7000");
    assert_eq!(settings.audio_dir, "/srv/audio");
    assert_eq!(settings.auth.token_ttl_seconds, 60);
    assert_eq!(settings.generation.base_url.as_deref(), Some("http://gen.local"));
}

#[test]
fn legacy_names_apply_only_without_prefixed_form() {
    let settings = settings_from(
        "does-not-exist.toml",
        vars(&[("SERVER_BIND", "0.0.0.0:1"), ("DATABASE_URL", "legacy.db")]),
    )
    .expect("settings");
    assert_eq!(settings.bind_addr, "0.0.0.0:1");
    assert_eq!(settings.database_url, "legacy.db");

    let settings = settings_from(
        "does-not-exist.toml",
        vars(&[
            ("SERVER_BIND", "0.0.0.0:1"),
            ("APP__BIND_ADDR", "0.0.0.0:2"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.bind_addr, "0.0.0.0:2");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("  "), "sqlite://./data/tracker.db");
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn keeps_windows_absolute_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("sqlite:C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
    assert_eq!(
        normalize_database_url("C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite://C:/Users/alice/test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("tracker.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    assert!(temp_root.path().join("nested").exists());

    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
