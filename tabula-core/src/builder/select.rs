//! Read terminals: `get`, `first`, aggregates and lookups

use serde::de::DeserializeOwned;

use super::common::Criteria;
use super::QueryBuilder;
use crate::compiler::Compiled;
use crate::executor::{Driver, Row};
use crate::statement::Field;
use crate::{Error, Raw, Result, Value};

/// Column the aggregate helpers alias their result to
const AGGREGATE_FIELD: &str = "field";

impl<D: Driver> QueryBuilder<D> {
    /// Compile the SELECT this builder describes
    pub fn to_sql(&self) -> Result<Compiled> {
        self.ensure_statement()?;
        self.connection.compiler().select(&self.statements)
    }

    /// The SELECT with bindings inlined, for logs
    pub fn to_display_sql(&self) -> Result<String> {
        Ok(self.connection.display_sql(&self.to_sql()?))
    }

    /// Fetch every matching row
    pub async fn get(&self) -> Result<Vec<Row>> {
        let compiled = self.to_sql()?;
        self.connection.run_select(compiled).await
    }

    /// Fetch every matching row deserialized into `T`
    pub async fn get_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.get()
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(serde_json::Value::Object(row)).map_err(Error::from))
            .collect()
    }

    /// First matching row. Sets `LIMIT 1` on this builder.
    pub async fn first(&mut self) -> Result<Option<Row>> {
        self.statements.limit = Some(1);
        Ok(self.get().await?.into_iter().next())
    }

    pub async fn first_as<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.first().await? {
            Some(row) => Ok(Some(serde_json::from_value(serde_json::Value::Object(row))?)),
            None => Ok(None),
        }
    }

    /// Run an aggregate over the current criteria without touching this
    /// builder's selects, ordering or paging.
    async fn aggregate(&self, expression: String) -> Result<Option<serde_json::Value>> {
        self.ensure_statement()?;
        let selection = Raw::new(format!("{} as {}", expression, AGGREGATE_FIELD));
        let statements = self.statements.for_aggregate(selection);
        let compiled = self.connection.compiler().select(&statements)?;
        let rows = self.connection.run_select(compiled).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove(AGGREGATE_FIELD)))
    }

    fn aggregate_column(&self, function: &str, column: &str) -> String {
        let column = match self.scope.column(Field::from(column)) {
            Field::Column(column) => self.connection.compiler().wrap_sanitizer(&column),
            _ => column.to_string(),
        };
        format!("{}({})", function, column)
    }

    /// Number of matching rows; 0 when the result is absent
    pub async fn count(&self) -> Result<i64> {
        let value = self.aggregate("count(*)".to_string()).await?;
        Ok(value.as_ref().and_then(as_i64).unwrap_or(0))
    }

    pub async fn sum(&self, column: &str) -> Result<Option<f64>> {
        let value = self.aggregate(self.aggregate_column("sum", column)).await?;
        Ok(value.as_ref().and_then(as_f64))
    }

    pub async fn avg(&self, column: &str) -> Result<Option<f64>> {
        let value = self.aggregate(self.aggregate_column("avg", column)).await?;
        Ok(value.as_ref().and_then(as_f64))
    }

    pub async fn min(&self, column: &str) -> Result<Option<f64>> {
        let value = self.aggregate(self.aggregate_column("min", column)).await?;
        Ok(value.as_ref().and_then(as_f64))
    }

    pub async fn max(&self, column: &str) -> Result<Option<f64>> {
        let value = self.aggregate(self.aggregate_column("max", column)).await?;
        Ok(value.as_ref().and_then(as_f64))
    }

    /// First row whose `id` equals `value`
    pub async fn find(&self, value: impl Into<Value>) -> Result<Option<Row>> {
        self.find_by("id", value).await
    }

    /// First row whose `field` equals `value`; this builder is not modified
    pub async fn find_by(&self, field: &str, value: impl Into<Value>) -> Result<Option<Row>> {
        let value: Value = value.into();
        let mut query = self.clone().where_((field, value));
        query.first().await
    }

    /// Every row whose `field` equals `value`
    pub async fn find_all(&self, field: &str, value: impl Into<Value>) -> Result<Vec<Row>> {
        let value: Value = value.into();
        self.clone().where_((field, value)).get().await
    }
}

fn as_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64)),
        _ => None,
    }
}

fn as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
