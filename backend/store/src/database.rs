use std::path::PathBuf;

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Number, Value};
use tracing::{debug, info, warn};

use codedoc_config::DatabaseConfig;
use codedoc_core::CodedocError;

use crate::schema::SchemaInfo;

const SCHEMA_QUERY: &str = "SELECT m.name, p.name, p.type
     FROM sqlite_master m JOIN pragma_table_info(m.name) p
     WHERE m.type IN ('table', 'view') AND m.name NOT LIKE 'sqlite_%'
     ORDER BY m.name, p.cid";

/// The database natural-language queries run against.
///
/// Holds only settings. Every operation opens its own connection on the
/// blocking pool and closes it before returning, whatever the outcome.
#[derive(Debug, Clone)]
pub struct SqlDatabase {
    path: Option<PathBuf>,
    read_only: bool,
}

impl SqlDatabase {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            path: config.path.as_ref().map(PathBuf::from),
            read_only: config.read_only,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.path.is_some()
    }

    /// Read the catalog.
    pub async fn schema(&self) -> Result<SchemaInfo> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(SCHEMA_QUERY)?;
            let mut schema = SchemaInfo::default();
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                ))
            })?;
            for row in rows {
                let (table, column, data_type) = row?;
                schema.push(table, column, data_type);
            }
            Ok(schema)
        })
        .await
        .context("Failed to read database schema")
    }

    /// Run one SQL statement and return its rows as JSON objects keyed by column.
    ///
    /// Statements without result columns run for their effect and return no rows.
    pub async fn execute(&self, sql: &str) -> Result<Vec<Map<String, Value>>> {
        let sql = sql.to_string();
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            if columns.is_empty() {
                let changed = stmt.execute([])?;
                debug!(changed, "Statement executed");
                return Ok(Vec::new());
            }

            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut object = Map::with_capacity(columns.len());
                for (i, name) in columns.iter().enumerate() {
                    object.insert(name.clone(), to_json(row.get_ref(i)?));
                }
                out.push(object);
            }
            Ok(out)
        })
        .await
    }

    /// Open and close a connection to prove the database is reachable.
    pub async fn ping(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let path = self
            .path
            .clone()
            .ok_or_else(|| CodedocError::Database("no database configured".into()))?;
        let read_only = self.read_only;

        tokio::task::spawn_blocking(move || {
            let conn = open(&path, read_only)?;
            let result = f(&conn);
            if let Err((_, e)) = conn.close() {
                warn!(error = %e, "Failed to close database connection");
            }
            result
        })
        .await
        .context("Database task panicked")?
    }
}

fn open(path: &PathBuf, read_only: bool) -> Result<Connection> {
    let flags = if read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
    } else {
        OpenFlags::default()
    };
    let conn = Connection::open_with_flags(path, flags)
        .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
    info!(path = %path.display(), read_only, "Database connection opened");
    Ok(conn)
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(bytes.iter().map(|b| format!("{b:02x}")).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, score REAL, avatar BLOB);
             INSERT INTO users (name, score, avatar) VALUES ('ada', 9.5, x'cafe');
             INSERT INTO users (name, score, avatar) VALUES ('bob', NULL, NULL);
             CREATE TABLE orders (id INTEGER, user_id INTEGER);",
        )
        .unwrap();
        (dir, path)
    }

    fn db(path: &PathBuf, read_only: bool) -> SqlDatabase {
        SqlDatabase::new(&DatabaseConfig {
            path: Some(path.to_string_lossy().into_owned()),
            read_only,
        })
    }

    #[tokio::test]
    async fn test_schema_lists_tables_and_columns_in_order() {
        let (_dir, path) = fixture();
        let schema = db(&path, true).schema().await.unwrap();
        let tables: Vec<&String> = schema.tables.keys().collect();
        assert_eq!(tables, vec!["orders", "users"]);
        let columns: Vec<&str> = schema.tables["users"].iter().map(|c| c.column.as_str()).collect();
        assert_eq!(columns, vec!["id", "name", "score", "avatar"]);
        assert_eq!(schema.tables["users"][1].data_type, "TEXT");
    }

    #[tokio::test]
    async fn test_execute_returns_json_objects() {
        let (_dir, path) = fixture();
        let rows = db(&path, true)
            .execute("SELECT id, name, score, avatar FROM users ORDER BY id")
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(rows[0]["name"], "ada");
        assert_eq!(rows[0]["score"], 9.5);
        assert_eq!(rows[0]["avatar"], "cafe");
        assert!(rows[1]["score"].is_null());
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let (_dir, path) = fixture();
        let err = db(&path, true)
            .execute("DELETE FROM users")
            .await
            .unwrap_err();
        assert!(format!("{err:#}").to_lowercase().contains("readonly"));
    }

    #[tokio::test]
    async fn test_writable_statement_without_columns() {
        let (_dir, path) = fixture();
        let database = db(&path, false);
        let rows = database.execute("DELETE FROM orders").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_database_fails() {
        let database = SqlDatabase::new(&DatabaseConfig::default());
        assert!(!database.is_configured());
        assert!(database.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_ping_and_invalid_sql() {
        let (_dir, path) = fixture();
        let database = db(&path, true);
        database.ping().await.unwrap();
        assert!(database.execute("SELEC nonsense").await.is_err());
    }
}
