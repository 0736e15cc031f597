//! Raw-mode statements: SQL and bindings pass through uncompiled

use serde::de::DeserializeOwned;

use crate::compiler::Compiled;
use crate::connection::Connection;
use crate::executor::{Driver, Row};
use crate::instrument::Operation;
use crate::{Error, Raw, Result};

/// A verbatim statement bound to a connection.
///
/// No prefixing, quoting or placeholder rewriting is applied.
pub struct RawQuery<D: Driver> {
    connection: Connection<D>,
    raw: Raw,
}

impl<D: Driver> RawQuery<D> {
    pub(crate) fn new(connection: Connection<D>, raw: Raw) -> Self {
        Self { connection, raw }
    }

    pub fn sql(&self) -> &str {
        self.raw.sql()
    }

    fn compiled(&self) -> Result<Compiled> {
        if self.raw.sql().trim().is_empty() {
            return Err(Error::invalid_query("Raw statement is empty"));
        }
        Ok(Compiled::new(self.raw.sql(), self.raw.bindings().to_vec()))
    }

    pub fn to_display_sql(&self) -> Result<String> {
        Ok(self.connection.display_sql(&self.compiled()?))
    }

    pub async fn get(&self) -> Result<Vec<Row>> {
        self.connection.run_select(self.compiled()?).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.get()
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(serde_json::Value::Object(row)).map_err(Error::from))
            .collect()
    }

    pub async fn first(&self) -> Result<Option<Row>> {
        Ok(self.get().await?.into_iter().next())
    }

    /// Generated id when exactly one row was affected
    pub async fn insert(&self) -> Result<Option<i64>> {
        let executed = self
            .connection
            .run_mutation(self.compiled()?, Operation::Insert)
            .await?;
        Ok(executed.insert_id())
    }

    pub async fn update(&self) -> Result<u64> {
        let executed = self
            .connection
            .run_mutation(self.compiled()?, Operation::Update)
            .await?;
        Ok(executed.rows_affected)
    }

    pub async fn delete(&self) -> Result<u64> {
        let executed = self
            .connection
            .run_mutation(self.compiled()?, Operation::Delete)
            .await?;
        Ok(executed.rows_affected)
    }
}
