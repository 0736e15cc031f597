//! Update terminals

use super::insert::IntoRowData;
use super::QueryBuilder;
use crate::executor::Driver;
use crate::instrument::Operation;
use crate::Result;

/// Outcome of [`QueryBuilder::update_or_insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    /// A matching row existed; carries the affected count
    Updated(u64),
    /// No row matched; carries the generated id, if any
    Inserted(Option<i64>),
}

impl<D: Driver> QueryBuilder<D> {
    /// Apply `row` to every matching row and return the affected count
    pub async fn update<R: IntoRowData>(&self, row: R) -> Result<u64> {
        self.ensure_statement()?;
        let row = row.into_row_data().prefixed(&self.scope.prefix);
        let compiled = self
            .connection
            .compiler()
            .update(&self.statements, row.as_slice())?;
        let executed = self.connection.run_mutation(compiled, Operation::Update).await?;
        Ok(executed.rows_affected)
    }

    /// Update the matching rows, or insert `row` when none match.
    ///
    /// The probe and the write are separate statements: concurrent callers
    /// can both miss and both insert unless a unique key prevents it.
    pub async fn update_or_insert<R: IntoRowData>(&self, row: R) -> Result<Upserted> {
        let row = row.into_row_data();
        let mut probe = self.clone();
        if probe.first().await?.is_some() {
            Ok(Upserted::Updated(self.update(row).await?))
        } else {
            Ok(Upserted::Inserted(self.insert(row).await?))
        }
    }
}
