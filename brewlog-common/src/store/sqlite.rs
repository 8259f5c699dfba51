//! SQLite document backend
//!
//! Each collection is a table `(id TEXT PRIMARY KEY, body TEXT)`; `body` holds
//! the whole document, `_id` included, as canonical Extended JSON so object
//! ids, dates and integer widths survive a round trip. Tables are created when
//! the pool opens a connection.

use std::str::FromStr;

use bson::{oid::ObjectId, Bson, Document};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Connection, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::{Error, Result};

const MAX_CONNECTIONS: u32 = 5;

/// SQLITE_BUSY and its extended codes
const BUSY_CODES: [&str; 3] = ["5", "261", "517"];

pub(super) struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Lazy pool; the database file is opened (and created) on first checkout
    pub(super) fn connect(config: &StoreConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.uri)
            .map_err(|e| Error::Config(format!("Invalid sqlite URI: {}", e)))?
            .busy_timeout(config.timeout)
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(true);

        let tables = vec![
            config.maduradores_collection.clone(),
            config.lotes_collection.clone(),
        ];
        for name in &tables {
            if !is_valid_table_name(name) {
                return Err(Error::Config(format!("Invalid collection name: {}", name)));
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(config.timeout)
            .after_connect(move |conn, _meta| {
                let tables = tables.clone();
                Box::pin(async move {
                    for table in &tables {
                        sqlx::query(&create_table_sql(table))
                            .execute(&mut *conn)
                            .await?;
                    }
                    debug!("SQLite connection ready: tables={:?}", tables);
                    Ok(())
                })
            })
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    /// Check out a connection; any failure here means the store is unreachable
    async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(|e| {
            warn!("SQLite store unreachable: {}", e);
            Error::StorageUnavailable(e.to_string())
        })
    }

    pub(super) async fn insert(&self, table: &str, id: ObjectId, doc: Document) -> Result<()> {
        let mut conn = self.acquire().await?;
        sqlx::query(&format!("INSERT INTO \"{}\" (id, body) VALUES (?, ?)", table))
            .bind(id.to_hex())
            .bind(encode(doc))
            .execute(&mut *conn)
            .await
            .map_err(classify)?;
        Ok(())
    }

    pub(super) async fn find_all(&self, table: &str) -> Result<Vec<Document>> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query(&format!("SELECT body FROM \"{}\" ORDER BY rowid", table))
            .fetch_all(&mut *conn)
            .await
            .map_err(classify)?;

        rows.iter().map(|row| decode(row.get("body"))).collect()
    }

    pub(super) async fn find_one(&self, table: &str, id: ObjectId) -> Result<Option<Document>> {
        let mut conn = self.acquire().await?;
        select_body(&mut *conn, table, id).await
    }

    /// Read-merge-write inside one transaction; rolls back on any early return
    ///
    /// The write lock is taken up front so concurrent updates queue on the
    /// busy timeout instead of failing on lock upgrade.
    pub(super) async fn update(
        &self,
        table: &str,
        id: ObjectId,
        fields: Document,
    ) -> Result<bool> {
        let mut conn = self.acquire().await?;
        let mut tx = Connection::begin_with(&mut *conn, "BEGIN IMMEDIATE")
            .await
            .map_err(classify)?;

        let Some(mut doc) = select_body(&mut *tx, table, id).await? else {
            return Ok(false);
        };
        doc.extend(fields);

        sqlx::query(&format!("UPDATE \"{}\" SET body = ? WHERE id = ?", table))
            .bind(encode(doc))
            .bind(id.to_hex())
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        tx.commit().await.map_err(classify)?;
        Ok(true)
    }

    pub(super) async fn delete(&self, table: &str, id: ObjectId) -> Result<bool> {
        let mut conn = self.acquire().await?;
        let result = sqlx::query(&format!("DELETE FROM \"{}\" WHERE id = ?", table))
            .bind(id.to_hex())
            .execute(&mut *conn)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }
}

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" (id TEXT PRIMARY KEY, body TEXT NOT NULL)",
        table
    )
}

async fn select_body(
    conn: &mut SqliteConnection,
    table: &str,
    id: ObjectId,
) -> Result<Option<Document>> {
    let row = sqlx::query(&format!("SELECT body FROM \"{}\" WHERE id = ?", table))
        .bind(id.to_hex())
        .fetch_optional(&mut *conn)
        .await
        .map_err(classify)?;

    row.map(|row| decode(row.get("body"))).transpose()
}

fn encode(doc: Document) -> String {
    Bson::Document(doc).into_canonical_extjson().to_string()
}

fn decode(body: String) -> Result<Document> {
    let value: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| Error::Storage(format!("Corrupt stored document: {}", e)))?;
    match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(_) => Err(Error::Storage("Stored value is not a document".to_string())),
        Err(e) => Err(Error::Storage(format!("Corrupt stored document: {}", e))),
    }
}

fn classify(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            warn!("SQLite store unreachable: {}", err);
            Error::StorageUnavailable(err.to_string())
        }
        sqlx::Error::Database(ref db)
            if db.code().is_some_and(|code| BUSY_CODES.contains(&code.as_ref())) =>
        {
            warn!("SQLite store locked past busy timeout: {}", err);
            Error::StorageUnavailable(err.to_string())
        }
        other => {
            warn!("SQLite rejected operation: {}", other);
            Error::Storage(other.to_string())
        }
    }
}

/// Collection names become table names; alphanumeric and underscore only
fn is_valid_table_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.is_empty()
        && name.len() < 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_extjson_round_trip_keeps_types() {
        let id = ObjectId::new();
        let original = doc! {
            "_id": id,
            "litros": 10_i64,
            "ratio": 12.5,
            "fecha": bson::DateTime::from_millis(1_709_251_200_000),
            "lote": { "_id": id },
        };
        let decoded = decode(encode(original.clone())).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_table_name_validation() {
        assert!(is_valid_table_name("maduradores"));
        assert!(!is_valid_table_name("lotes; DROP TABLE x"));
        assert!(!is_valid_table_name(""));
    }

    #[test]
    fn test_create_table_sql_quotes_name() {
        assert_eq!(
            create_table_sql("lotes"),
            "CREATE TABLE IF NOT EXISTS \"lotes\" (id TEXT PRIMARY KEY, body TEXT NOT NULL)"
        );
    }

    #[test]
    fn test_corrupt_body_is_storage_error() {
        assert!(matches!(decode("not json".to_string()), Err(Error::Storage(_))));
    }
}
