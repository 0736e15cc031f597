//! SQLite driver backed by a single sqlx connection

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use futures::lock::Mutex;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Row as _, Sqlite, TypeInfo, ValueRef};

use super::{Binding, Driver, Executed, Row};
use crate::connection::{Connection, ConnectionConfig};
use crate::instrument::Instrumentation;
use crate::{Error, Result};

/// Database name that opens a private in-memory database
pub const MEMORY: &str = ":memory:";

/// One SQLite connection; concurrent statements queue on the mutex
pub struct SqliteDriver {
    inner: Mutex<SqliteConnection>,
}

impl SqliteDriver {
    pub fn from_connection(connection: SqliteConnection) -> Self {
        Self {
            inner: Mutex::new(connection),
        }
    }

    async fn run(&self, sql: &str) -> Result<()> {
        let mut conn = self.inner.lock().await;
        sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map_err(driver_error)?;
        Ok(())
    }
}

/// Open the database named by `config` and wrap it in a [`Connection`].
///
/// Entries in `config.options` are applied as PRAGMAs.
pub async fn connect(
    config: ConnectionConfig,
    instrumentation: Arc<dyn Instrumentation>,
) -> Result<Connection<SqliteDriver>> {
    let mut options = if config.database.is_empty() || config.database == MEMORY {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|err| Error::connection(err.to_string()))?
    } else {
        SqliteConnectOptions::new()
            .filename(&config.database)
            .create_if_missing(true)
    };
    for (key, value) in &config.options {
        options = options.pragma(key.clone(), value.clone());
    }

    let started = Instant::now();
    let connection = options
        .connect()
        .await
        .map_err(|err| Error::connection(format!("{}: {}", config.database, err)))?;
    let elapsed = started.elapsed();

    tracing::info!(
        database = %config.database,
        elapsed = ?elapsed,
        "sqlite connected"
    );
    instrumentation.after_connect(elapsed);

    Ok(Connection::new(SqliteDriver::from_connection(connection), config)?
        .with_instrumentation(instrumentation))
}

fn driver_error(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::Database(db) => Error::execution(db.message()),
        other => Error::Database(other),
    }
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    bindings: &[Binding],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    for binding in bindings {
        query = match binding {
            Binding::Int(i) => query.bind(*i),
            Binding::Text(s) => query.bind(s.clone()),
            Binding::Null => query.bind(None::<String>),
        };
    }
    query
}

impl Driver for SqliteDriver {
    type Row = SqliteRow;

    async fn fetch(&self, sql: &str, bindings: &[Binding]) -> Result<Vec<SqliteRow>> {
        let mut conn = self.inner.lock().await;
        bind_all(sqlx::query(sql), bindings)
            .fetch_all(&mut *conn)
            .await
            .map_err(driver_error)
    }

    /// Columns decode by their storage class
    fn decode(&self, row: SqliteRow) -> Result<Row> {
        let mut decoded = Row::new();
        for (index, column) in row.columns().iter().enumerate() {
            let raw = row.try_get_raw(index).map_err(driver_error)?;
            let value = if raw.is_null() {
                serde_json::Value::Null
            } else {
                let type_name = raw.type_info().name().to_ascii_uppercase();
                match type_name.as_str() {
                    "INTEGER" | "BOOLEAN" => row
                        .try_get_unchecked::<i64, _>(index)
                        .map(serde_json::Value::from)
                        .map_err(driver_error)?,
                    "REAL" | "NUMERIC" => row
                        .try_get_unchecked::<f64, _>(index)
                        .map(serde_json::Value::from)
                        .map_err(driver_error)?,
                    "BLOB" => row
                        .try_get_unchecked::<Vec<u8>, _>(index)
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned().into())
                        .map_err(driver_error)?,
                    _ => row
                        .try_get_unchecked::<String, _>(index)
                        .map(serde_json::Value::from)
                        .map_err(driver_error)?,
                }
            };
            decoded.insert(column.name().to_string(), value);
        }
        Ok(decoded)
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> Result<Executed> {
        let mut conn = self.inner.lock().await;
        let result = bind_all(sqlx::query(sql), bindings)
            .execute(&mut *conn)
            .await
            .map_err(driver_error)?;
        Ok(Executed {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    async fn begin(&self) -> Result<()> {
        self.run("BEGIN").await
    }

    async fn commit(&self) -> Result<()> {
        self.run("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        self.run("ROLLBACK").await
    }
}
