//! Statement execution: the driver interface and the pipeline that binds,
//! times and reports every statement a builder runs.

#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::future::Future;
use std::time::{Duration, Instant};

use crate::compiler::Compiled;
use crate::connection::Connection;
use crate::instrument::Operation;
use crate::interpolate::render_display_sql;
use crate::{Error, Result, Value};

/// A fetched row keyed by column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A parameter as handed to the driver.
///
/// Integers and booleans bind as integers, `Null` as NULL and everything else
/// as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Int(i64),
    Text(String),
    Null,
}

impl Binding {
    pub fn coerce(value: &Value) -> Self {
        match value {
            Value::Null => Binding::Null,
            Value::Bool(b) => Binding::Int(i64::from(*b)),
            Value::I32(i) => Binding::Int(i64::from(*i)),
            Value::I64(i) => Binding::Int(*i),
            other => Binding::Text(other.to_text()),
        }
    }
}

pub fn bind_all(values: &[Value]) -> Vec<Binding> {
    values.iter().map(Binding::coerce).collect()
}

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Executed {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

impl Executed {
    /// The generated id, only when exactly one row was affected
    pub fn insert_id(&self) -> Option<i64> {
        self.last_insert_id.filter(|_| self.rows_affected == 1)
    }
}

/// A database driver the pipeline can run statements on.
///
/// The driver owns serialization of concurrent calls on its handle.
pub trait Driver: Send + Sync {
    /// Driver native row type
    type Row: Send;

    /// Prepare, bind and run a statement that returns rows
    fn fetch(
        &self,
        sql: &str,
        bindings: &[Binding],
    ) -> impl Future<Output = Result<Vec<Self::Row>>> + Send;

    /// Convert a native row into a column-keyed map
    fn decode(&self, row: Self::Row) -> Result<Row>;

    /// Prepare, bind and run a statement that returns no rows
    fn execute(
        &self,
        sql: &str,
        bindings: &[Binding],
    ) -> impl Future<Output = Result<Executed>> + Send;

    fn begin(&self) -> impl Future<Output = Result<()>> + Send;

    fn commit(&self) -> impl Future<Output = Result<()>> + Send;

    fn rollback(&self) -> impl Future<Output = Result<()>> + Send;
}

impl<D: Driver> Connection<D> {
    /// Interpolated SQL used for logs and instrumentation
    pub fn display_sql(&self, compiled: &Compiled) -> String {
        let compiler = self.compiler();
        render_display_sql(&compiled.sql, &compiled.bindings, |text| {
            compiler.quote_literal(text)
        })
    }

    /// Log a failed statement and forward it to the sink
    pub(crate) fn report_failure(&self, sql: &str, operation: Operation, error: Error) -> Error {
        tracing::warn!(
            operation = operation.as_str(),
            sql = %sql,
            error = %error,
            "statement failed"
        );
        self.instrumentation().on_exception(sql, operation, &error);
        error
    }

    /// Run a statement returning rows; fetch and decode time are summed
    pub(crate) async fn run_select(&self, compiled: Compiled) -> Result<Vec<Row>> {
        let shown = self.display_sql(&compiled);
        let bindings = bind_all(&compiled.bindings);

        let started = Instant::now();
        let fetched = self.driver().fetch(&compiled.sql, &bindings).await;
        let fetch_elapsed = started.elapsed();

        let decoded = fetched.and_then(|rows| {
            let started = Instant::now();
            let rows = rows
                .into_iter()
                .map(|row| self.driver().decode(row))
                .collect::<Result<Vec<_>>>()?;
            Ok((rows, started.elapsed()))
        });

        match decoded {
            Ok((rows, decode_elapsed)) => {
                let elapsed = fetch_elapsed + decode_elapsed;
                tracing::debug!(
                    operation = "select",
                    sql = %shown,
                    rows = rows.len(),
                    elapsed = ?elapsed,
                );
                self.instrumentation()
                    .after_select(&shown, rows.len(), elapsed);
                Ok(rows)
            }
            Err(err) => Err(self.report_failure(&shown, Operation::Select, err)),
        }
    }

    /// Run a statement returning no rows and report it under `operation`
    pub(crate) async fn run_mutation(
        &self,
        compiled: Compiled,
        operation: Operation,
    ) -> Result<Executed> {
        let shown = self.display_sql(&compiled);
        let bindings = bind_all(&compiled.bindings);

        let started = Instant::now();
        let executed = match self.driver().execute(&compiled.sql, &bindings).await {
            Ok(executed) => executed,
            Err(err) => return Err(self.report_failure(&shown, operation, err)),
        };
        let elapsed: Duration = started.elapsed();

        tracing::debug!(
            operation = operation.as_str(),
            sql = %shown,
            affected = executed.rows_affected,
            elapsed = ?elapsed,
        );
        let sink = self.instrumentation();
        match operation {
            Operation::Update => sink.after_update(&shown, executed.rows_affected, elapsed),
            Operation::Delete => sink.after_delete(&shown, executed.rows_affected, elapsed),
            Operation::Insert | Operation::InsertIgnore | Operation::Replace => {
                sink.after_insert(&shown, executed.rows_affected, executed.insert_id(), elapsed)
            }
            // executed without fetching, so no rows came back
            Operation::Select => sink.after_select(&shown, 0, elapsed),
        }
        Ok(executed)
    }

    /// Start a transaction on the driver handle. Never nested or retried.
    pub async fn begin_transaction(&self) -> Result<()> {
        self.driver().begin().await
    }

    pub async fn commit(&self) -> Result<()> {
        self.driver().commit().await
    }

    pub async fn rollback(&self) -> Result<()> {
        self.driver().rollback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, MockDriver, RecordingSink};
    use crate::ConnectionConfig;
    use std::sync::Arc;

    fn connection() -> (Connection<MockDriver>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let connection = Connection::new(MockDriver::new(), ConnectionConfig::new("sqlite"))
            .unwrap()
            .with_instrumentation(sink.clone());
        (connection, sink)
    }

    #[test]
    fn test_binding_coercion() {
        assert_eq!(Binding::coerce(&Value::Bool(true)), Binding::Int(1));
        assert_eq!(Binding::coerce(&Value::I32(-4)), Binding::Int(-4));
        assert_eq!(Binding::coerce(&Value::Null), Binding::Null);
        assert_eq!(Binding::coerce(&Value::F64(1.5)), Binding::Text("1.5".into()));
        assert_eq!(
            bind_all(&[Value::from("x"), Value::from(vec![1, 2])]),
            vec![Binding::Text("x".into()), Binding::Text("1,2".into())]
        );
    }

    #[test]
    fn test_insert_id_requires_single_row() {
        let one = Executed {
            rows_affected: 1,
            last_insert_id: Some(9),
        };
        let none = Executed {
            rows_affected: 0,
            last_insert_id: Some(9),
        };
        assert_eq!(one.insert_id(), Some(9));
        assert_eq!(none.insert_id(), None);
    }

    #[tokio::test]
    async fn test_select_reports_display_sql() {
        let (connection, sink) = connection();
        connection.driver().push_rows(vec![crate::mock::row(&[("id", 1.into())])]);
        let rows = connection
            .run_select(Compiled::new("SELECT * FROM t WHERE name = ?", vec!["a".into()]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            sink.events(),
            vec![Event::Select {
                sql: "SELECT * FROM t WHERE name = 'a'".into(),
                rows: 1
            }]
        );
        assert_eq!(
            connection.driver().statements(),
            vec![(
                "SELECT * FROM t WHERE name = ?".to_string(),
                vec![Binding::Text("a".into())]
            )]
        );
    }

    #[tokio::test]
    async fn test_select_failure_reports_once() {
        let (connection, sink) = connection();
        connection.driver().fail_next_fetch("no such table: t");
        let err = connection
            .run_select(Compiled::new("SELECT * FROM t", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
        assert_eq!(
            sink.events(),
            vec![Event::Exception {
                sql: "SELECT * FROM t".into(),
                operation: Operation::Select,
                message: "Execution error: no such table: t".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_mutation_hooks_by_operation() {
        let (connection, sink) = connection();
        connection.driver().push_executed(Executed {
            rows_affected: 3,
            last_insert_id: None,
        });
        let executed = connection
            .run_mutation(Compiled::new("DELETE FROM t", vec![]), Operation::Delete)
            .await
            .unwrap();
        assert_eq!(executed.rows_affected, 3);
        assert_eq!(
            sink.events(),
            vec![Event::Delete {
                sql: "DELETE FROM t".into(),
                affected: 3
            }]
        );
    }

    #[tokio::test]
    async fn test_elapsed_covers_driver_time() {
        let (connection, sink) = connection();
        connection.driver().set_latency(Duration::from_millis(20));

        connection
            .run_select(Compiled::new("SELECT 1", vec![]))
            .await
            .unwrap();
        connection
            .run_mutation(Compiled::new("UPDATE t SET a = 1", vec![]), Operation::Update)
            .await
            .unwrap();

        let elapsed = sink.elapsed();
        assert_eq!(elapsed.len(), 2);
        assert!(elapsed.iter().all(|e| *e >= Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_select_run_without_fetch_reports_no_rows() {
        let (connection, sink) = connection();
        connection
            .run_mutation(Compiled::new("SELECT 1", vec![]), Operation::Select)
            .await
            .unwrap();
        assert_eq!(
            sink.events(),
            vec![Event::Select {
                sql: "SELECT 1".into(),
                rows: 0
            }]
        );
    }

    #[tokio::test]
    async fn test_transactions_pass_through() {
        let (connection, _) = connection();
        connection.begin_transaction().await.unwrap();
        connection.rollback().await.unwrap();
        connection.begin_transaction().await.unwrap();
        connection.commit().await.unwrap();
        assert_eq!(
            connection.driver().transactions(),
            vec!["BEGIN", "ROLLBACK", "BEGIN", "COMMIT"]
        );
    }
}
