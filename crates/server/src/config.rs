use std::{collections::HashMap, env};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

const DEFAULT_DATABASE_URL: &str = "sqlite://./data/tracker.db";
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub audio_dir: String,
    pub auth: AuthSettings,
    pub generation: GenerationSettings,
}

/// Defaults, then `server.toml`, then `APP__*` variables. The flat
/// `SERVER_BIND` and `DATABASE_URL` names apply when their `APP__` form is unset.
pub fn load_settings() -> Result<Settings, ConfigError> {
    settings_from("server.toml", env::vars().collect())
}

pub(crate) fn settings_from(
    file: &str,
    vars: HashMap<String, String>,
) -> Result<Settings, ConfigError> {
    let legacy = |legacy: &str, preferred: &str| {
        if vars.contains_key(preferred) {
            None
        } else {
            vars.get(legacy).cloned()
        }
    };
    let legacy_bind = legacy("SERVER_BIND", "APP__BIND_ADDR");
    let legacy_database = legacy("DATABASE_URL", "APP__DATABASE_URL");

    Config::builder()
        .set_default("bind_addr", "127.0.0.1:8443")?
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("audio_dir", "./public/audio")?
        .set_default("auth.jwt_secret", DEV_JWT_SECRET)?
        .set_default("auth.token_ttl_seconds", 7_i64 * 24 * 3600)?
        .set_default("generation.timeout_seconds", 30_i64)?
        .add_source(File::with_name(file).format(FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars)),
        )
        .set_override_option("bind_addr", legacy_bind)?
        .set_override_option("database_url", legacy_database)?
        .build()?
        .try_deserialize()
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    storage::ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

pub(crate) fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }
    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    let path = if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        path
    } else if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        path
    } else if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    } else {
        raw_database_url
    };

    let path = path.replace('\\', "/");
    if has_windows_drive(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn has_windows_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
