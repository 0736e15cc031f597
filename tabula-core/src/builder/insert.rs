//! Insert terminals and row payloads

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::QueryBuilder;
use crate::compiler::InsertKind;
use crate::executor::{Driver, Row};
use crate::instrument::Operation;
use crate::statement::{Operand, TablePrefix};
use crate::{Error, Result, Value};

/// Ordered column/value pairs of one row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowData(Vec<(String, Operand)>);

impl RowData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; chainable
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.0.push((column.into(), value.into()));
        self
    }

    /// Build a row from any value serializing to a JSON object
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(map.into_row_data()),
            other => Err(Error::invalid_query(format!(
                "Row data must serialize to an object, got {}",
                other
            ))),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(column, _)| column.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[(String, Operand)] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<(String, Operand)> {
        self.0
    }

    /// Prefix qualified column names
    pub fn prefixed(self, prefix: &TablePrefix) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|(column, value)| (prefix.apply_str(&column, true), value))
                .collect(),
        )
    }
}

/// Types usable as a row payload for insert, update and upsert
pub trait IntoRowData {
    fn into_row_data(self) -> RowData;
}

impl IntoRowData for RowData {
    fn into_row_data(self) -> RowData {
        self
    }
}

impl<K: Into<String>, V: Into<Operand>> IntoRowData for Vec<(K, V)> {
    fn into_row_data(self) -> RowData {
        RowData(
            self.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Operand>, const N: usize> IntoRowData for [(K, V); N] {
    fn into_row_data(self) -> RowData {
        RowData(
            self.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Operand>> IntoRowData for BTreeMap<K, V> {
    fn into_row_data(self) -> RowData {
        RowData(
            self.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}

/// Columns are sorted so the generated SQL is stable
impl<V: Into<Operand>> IntoRowData for HashMap<String, V> {
    fn into_row_data(self) -> RowData {
        let mut pairs: Vec<(String, Operand)> = self
            .into_iter()
            .map(|(column, value)| (column, value.into()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        RowData(pairs)
    }
}

/// A fetched row can be inserted again as-is
impl IntoRowData for Row {
    fn into_row_data(self) -> RowData {
        RowData(
            self.into_iter()
                .map(|(column, value)| (column, Operand::Value(Value::from_json(value))))
                .collect(),
        )
    }
}

fn operation(kind: InsertKind) -> Operation {
    match kind {
        InsertKind::Insert => Operation::Insert,
        InsertKind::InsertIgnore => Operation::InsertIgnore,
        InsertKind::Replace => Operation::Replace,
    }
}

impl<D: Driver> QueryBuilder<D> {
    async fn insert_row(&self, kind: InsertKind, row: RowData) -> Result<Option<i64>> {
        self.ensure_statement()?;
        let row = row.prefixed(&self.scope.prefix);
        let compiled = self
            .connection
            .compiler()
            .insert(&self.statements, row.as_slice(), kind)?;
        let executed = self.connection.run_mutation(compiled, operation(kind)).await?;
        Ok(executed.insert_id())
    }

    /// One statement per row. Rows that fail to compile or execute are
    /// reported and skipped; ids are collected for rows that affected
    /// exactly one row.
    async fn insert_rows<I>(&self, kind: InsertKind, rows: I) -> Result<Vec<i64>>
    where
        I: IntoIterator,
        I::Item: IntoRowData,
    {
        self.ensure_statement()?;
        let mut ids = Vec::new();
        for row in rows {
            let row = row.into_row_data().prefixed(&self.scope.prefix);
            let compiled = match self
                .connection
                .compiler()
                .insert(&self.statements, row.as_slice(), kind)
            {
                Ok(compiled) => compiled,
                Err(err) => {
                    self.connection.report_failure("", operation(kind), err);
                    continue;
                }
            };
            match self.connection.run_mutation(compiled, operation(kind)).await {
                Ok(executed) => ids.extend(executed.insert_id()),
                Err(_) => continue,
            }
        }
        Ok(ids)
    }

    /// Insert one row; the generated id when exactly one row was affected
    pub async fn insert<R: IntoRowData>(&self, row: R) -> Result<Option<i64>> {
        self.insert_row(InsertKind::Insert, row.into_row_data()).await
    }

    pub async fn insert_many<I>(&self, rows: I) -> Result<Vec<i64>>
    where
        I: IntoIterator,
        I::Item: IntoRowData,
    {
        self.insert_rows(InsertKind::Insert, rows).await
    }

    pub async fn insert_ignore<R: IntoRowData>(&self, row: R) -> Result<Option<i64>> {
        self.insert_row(InsertKind::InsertIgnore, row.into_row_data()).await
    }

    pub async fn insert_ignore_many<I>(&self, rows: I) -> Result<Vec<i64>>
    where
        I: IntoIterator,
        I::Item: IntoRowData,
    {
        self.insert_rows(InsertKind::InsertIgnore, rows).await
    }

    pub async fn replace<R: IntoRowData>(&self, row: R) -> Result<Option<i64>> {
        self.insert_row(InsertKind::Replace, row.into_row_data()).await
    }

    pub async fn replace_many<I>(&self, rows: I) -> Result<Vec<i64>>
    where
        I: IntoIterator,
        I::Item: IntoRowData,
    {
        self.insert_rows(InsertKind::Replace, rows).await
    }
}
