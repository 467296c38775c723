use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::debug;

use shared::domain::{Collection, Infant, InfantId, OwnerId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Returns the owner for `username`, creating it on first sight.
    pub async fn create_owner(&self, username: &str) -> Result<OwnerId> {
        let rec = sqlx::query(
            "INSERT INTO owners (username) VALUES (?)
             ON CONFLICT(username) DO UPDATE SET username=excluded.username
             RETURNING id",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(OwnerId(rec.get::<i64, _>(0)))
    }

    pub async fn username_for_owner(&self, owner_id: OwnerId) -> Result<Option<String>> {
        let row = sqlx::query("SELECT username FROM owners WHERE id = ?")
            .bind(owner_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    pub async fn get_document(
        &self,
        collection: Collection,
        owner_id: OwnerId,
    ) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND owner_id = ?")
            .bind(collection.as_str())
            .bind(owner_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| {
            let body = r.get::<String, _>(0);
            serde_json::from_str(&body).with_context(|| {
                format!(
                    "corrupt {} document for owner {}",
                    collection.as_str(),
                    owner_id.0
                )
            })
        })
        .transpose()
    }

    /// Writes `document` for the owner. With `merge`, top-level fields of an
    /// existing object document that `document` does not mention are kept.
    pub async fn set_document(
        &self,
        collection: Collection,
        owner_id: OwnerId,
        document: Value,
        merge: bool,
    ) -> Result<()> {
        // IMMEDIATE takes the write lock up front so concurrent merges queue
        // on the busy timeout instead of failing the read-to-write upgrade.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        let written = write_document(&mut conn, collection, owner_id, document, merge).await;
        let written = match written {
            Ok(()) => sqlx::query("COMMIT")
                .execute(&mut *conn)
                .await
                .map(|_| ())
                .map_err(anyhow::Error::from),
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                debug!("rollback after failed write: {rollback}");
            }
            return Err(err);
        }

        debug!(
            collection = collection.as_str(),
            owner_id = owner_id.0,
            merge,
            "document stored"
        );
        Ok(())
    }

    pub async fn load_record<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner_id: OwnerId,
    ) -> Result<Option<T>> {
        let Some(document) = self.get_document(collection, owner_id).await? else {
            return Ok(None);
        };
        let record = serde_json::from_value(document).with_context(|| {
            format!(
                "{} document for owner {} does not match its record shape",
                collection.as_str(),
                owner_id.0
            )
        })?;
        Ok(Some(record))
    }

    pub async fn save_record<T: Serialize>(
        &self,
        collection: Collection,
        owner_id: OwnerId,
        record: &T,
        merge: bool,
    ) -> Result<()> {
        let document = serde_json::to_value(record)?;
        self.set_document(collection, owner_id, document, merge)
            .await
    }

    pub async fn insert_infant(&self, owner_id: OwnerId, name: &str) -> Result<Infant> {
        let created_at = Utc::now();
        let rec = sqlx::query(
            "INSERT INTO infants (owner_id, name, created_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(owner_id.0)
        .bind(name)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(Infant {
            id: InfantId(rec.get::<i64, _>(0)),
            owner_id,
            name: name.to_string(),
            created_at,
        })
    }

    pub async fn list_infants(&self, owner_id: OwnerId) -> Result<Vec<Infant>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, name, created_at FROM infants WHERE owner_id = ? ORDER BY id ASC",
        )
        .bind(owner_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(infant_from_row).collect())
    }

    pub async fn infant_for_owner(
        &self,
        owner_id: OwnerId,
        infant_id: InfantId,
    ) -> Result<Option<Infant>> {
        let row = sqlx::query(
            "SELECT id, owner_id, name, created_at FROM infants WHERE id = ? AND owner_id = ?",
        )
        .bind(infant_id.0)
        .bind(owner_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(infant_from_row))
    }
}

async fn write_document(
    conn: &mut SqliteConnection,
    collection: Collection,
    owner_id: OwnerId,
    document: Value,
    merge: bool,
) -> Result<()> {
    let body = if merge {
        let existing = sqlx::query("SELECT body FROM documents WHERE collection = ? AND owner_id = ?")
            .bind(collection.as_str())
            .bind(owner_id.0)
            .fetch_optional(&mut *conn)
            .await?
            .map(|r| r.get::<String, _>(0));
        match existing {
            Some(raw) => {
                let existing: Value = serde_json::from_str(&raw).with_context(|| {
                    format!(
                        "corrupt {} document for owner {}",
                        collection.as_str(),
                        owner_id.0
                    )
                })?;
                merge_documents(existing, document)
            }
            None => document,
        }
    } else {
        document
    };

    sqlx::query(
        "INSERT INTO documents (collection, owner_id, body, updated_at)
         VALUES (?, ?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(collection, owner_id) DO UPDATE SET
            body = excluded.body,
            updated_at = CURRENT_TIMESTAMP",
    )
    .bind(collection.as_str())
    .bind(owner_id.0)
    .bind(body.to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn infant_from_row(r: sqlx::sqlite::SqliteRow) -> Infant {
    Infant {
        id: InfantId(r.get::<i64, _>(0)),
        owner_id: OwnerId(r.get::<i64, _>(1)),
        name: r.get::<String, _>(2),
        created_at: r.get::<DateTime<Utc>, _>(3),
    }
}

/// Shallow field-wise overlay of `incoming` onto `existing`.
/// Anything other than two objects is a plain replacement.
pub fn merge_documents(existing: Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, incoming) => incoming,
    }
}

/// Builds a JSON object from `(field, value)` pairs for partial merge writes.
pub fn partial_document<I>(fields: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    let map: Map<String, Value> = fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    Value::Object(map)
}

/// Creates the directory a file-backed SQLite URL points into.
pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
