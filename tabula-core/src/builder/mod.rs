//! The fluent query builder.
//!
//! Mutators consume and return the builder; terminal operations (`get`,
//! `first`, `count`, `insert`, `update`, `delete`, ...) compile the
//! accumulated [`Statements`] and run them on the bound connection.

pub mod common;
pub mod delete;
pub mod insert;
pub mod nested;
pub mod raw_query;
pub mod select;
pub mod update;

use std::fmt;

pub use common::{Condition, Criteria, IntoCondition, IntoFields, IntoOrderings, Scope};
pub use insert::{IntoRowData, RowData};
pub use nested::{JoinBuilder, NestedCriteria};
pub use raw_query::RawQuery;
pub use update::Upserted;

use crate::connection::Connection;
use crate::executor::Driver;
use crate::statement::{Criterion, Field, JoinType, Joiner, SortDirection, Statements};
use crate::{Error, IntoOperator, Raw, Result};

/// Builder for one query on a connection.
///
/// A builder from [`Connection::query_builder`] is a raw-mode factory: it
/// only spawns table builders and raw queries. [`QueryBuilder::table`]
/// returns an independent child with its base table set.
pub struct QueryBuilder<D: Driver> {
    connection: Connection<D>,
    scope: Scope,
    statements: Statements,
    raw_mode: bool,
}

impl<D: Driver> QueryBuilder<D> {
    pub(crate) fn new(connection: Connection<D>) -> Self {
        let scope = Scope::new(connection.prefix().clone(), connection.compiler().clone());
        Self {
            connection,
            scope,
            statements: Statements::default(),
            raw_mode: true,
        }
    }

    /// A new builder on the same connection with `table` as its base table.
    /// `self` is left untouched.
    pub fn table(&self, table: &str) -> Self {
        QueryBuilder::new(self.connection.clone()).from(table)
    }

    /// A fresh raw-mode factory on the same connection
    pub fn new_query_builder(&self) -> Self {
        QueryBuilder::new(self.connection.clone())
    }

    /// Run verbatim SQL with its bindings, bypassing compilation
    pub fn raw(&self, raw: impl Into<Raw>) -> RawQuery<D> {
        RawQuery::new(self.connection.clone(), raw.into())
    }

    pub fn connection(&self) -> &Connection<D> {
        &self.connection
    }

    pub fn statements(&self) -> &Statements {
        &self.statements
    }

    pub fn is_raw(&self) -> bool {
        self.raw_mode
    }

    /// Replace the base tables and leave raw mode
    pub fn from<T: IntoFields>(mut self, tables: T) -> Self {
        self.statements.tables = tables
            .into_fields()
            .into_iter()
            .map(|table| self.scope.table(table))
            .collect();
        self.raw_mode = false;
        self
    }

    pub fn select<T: IntoFields>(mut self, fields: T) -> Self {
        let fields = self.scope.prefix.apply_all(fields.into_fields(), true);
        self.statements.selects.extend(fields);
        self
    }

    pub fn select_distinct<T: IntoFields>(mut self, fields: T) -> Self {
        self.statements.distinct = true;
        self.select(fields)
    }

    pub fn distinct(mut self) -> Self {
        self.statements.distinct = true;
        self
    }

    pub fn group_by<T: IntoFields>(mut self, fields: T) -> Self {
        let fields = self.scope.prefix.apply_all(fields.into_fields(), true);
        self.statements.group_bys.extend(fields);
        self
    }

    pub fn order_by<T: IntoOrderings>(self, orderings: T) -> Self {
        self.push_orderings(orderings, SortDirection::Asc)
    }

    pub fn order_by_desc<T: IntoOrderings>(self, orderings: T) -> Self {
        self.push_orderings(orderings, SortDirection::Desc)
    }

    fn push_orderings<T: IntoOrderings>(mut self, orderings: T, default: SortDirection) -> Self {
        for mut ordering in orderings.into_orderings(default) {
            ordering.field = self.scope.column(ordering.field);
            self.statements.order_bys.push(ordering);
        }
        self
    }

    pub fn having<C: IntoCondition>(mut self, condition: C) -> Self {
        let criterion = self.scope.criterion(condition.into_condition(), Joiner::And);
        self.statements.havings.push(criterion);
        self
    }

    pub fn or_having<C: IntoCondition>(mut self, condition: C) -> Self {
        let criterion = self.scope.criterion(condition.into_condition(), Joiner::Or);
        self.statements.havings.push(criterion);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.statements.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.statements.offset = Some(offset);
        self
    }

    /// INNER JOIN on a single column comparison
    pub fn join<O: IntoOperator>(self, table: &str, first: &str, operator: O, second: &str) -> Self {
        self.join_with(table, JoinType::Inner, |join| join.on(first, operator, second))
    }

    pub fn inner_join<O: IntoOperator>(
        self,
        table: &str,
        first: &str,
        operator: O,
        second: &str,
    ) -> Self {
        self.join(table, first, operator, second)
    }

    pub fn left_join<O: IntoOperator>(
        self,
        table: &str,
        first: &str,
        operator: O,
        second: &str,
    ) -> Self {
        self.join_with(table, JoinType::Left, |join| join.on(first, operator, second))
    }

    pub fn right_join<O: IntoOperator>(
        self,
        table: &str,
        first: &str,
        operator: O,
        second: &str,
    ) -> Self {
        self.join_with(table, JoinType::Right, |join| join.on(first, operator, second))
    }

    /// Join whose criteria are built on a fresh [`JoinBuilder`]
    pub fn join_with<T, F>(mut self, table: T, join_type: JoinType, build: F) -> Self
    where
        T: Into<Field>,
        F: FnOnce(JoinBuilder) -> JoinBuilder,
    {
        let builder = JoinBuilder::new(self.scope.clone(), join_type, table.into());
        self.statements.joins.push(build(builder).into_join());
        self
    }

    /// Assignments applied when an insert hits a duplicate key
    pub fn on_duplicate_key_update<R: IntoRowData>(mut self, row: R) -> Self {
        let row = row.into_row_data().prefixed(&self.scope.prefix);
        self.statements.on_duplicate.extend(row.into_inner());
        self
    }

    /// Fail if this builder has no statement of its own
    pub(crate) fn ensure_statement(&self) -> Result<()> {
        if self.raw_mode {
            return Err(Error::invalid_query(
                "Raw-mode builder has no statement; call table() or raw() first",
            ));
        }
        Ok(())
    }
}

impl<D: Driver> Criteria for QueryBuilder<D> {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn push_criterion(mut self, criterion: Criterion) -> Self {
        self.statements.wheres.push(criterion);
        self
    }
}

impl<D: Driver> Clone for QueryBuilder<D> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            scope: self.scope.clone(),
            statements: self.statements.clone(),
            raw_mode: self.raw_mode,
        }
    }
}

impl<D: Driver> fmt::Debug for QueryBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("connection", &self.connection)
            .field("statements", &self.statements)
            .field("raw_mode", &self.raw_mode)
            .finish()
    }
}
