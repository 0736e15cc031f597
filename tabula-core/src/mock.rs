//! Recording driver and instrumentation sink for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::executor::{Binding, Driver, Executed, Row};
use crate::instrument::{Instrumentation, Operation};
use crate::{Error, Result};

pub(crate) fn row(columns: &[(&str, serde_json::Value)]) -> Row {
    columns
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[derive(Default)]
struct MockState {
    fetches: VecDeque<Result<Vec<Row>>>,
    executions: VecDeque<Result<Executed>>,
    statements: Vec<(String, Vec<Binding>)>,
    transactions: Vec<&'static str>,
    next_id: i64,
    latency: Option<Duration>,
}

/// Replays queued results; unqueued fetches return no rows and unqueued
/// executes affect one row with an incrementing id.
#[derive(Default)]
pub(crate) struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_rows(&self, rows: Vec<Row>) {
        self.state.lock().unwrap().fetches.push_back(Ok(rows));
    }

    pub(crate) fn fail_next_fetch(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .fetches
            .push_back(Err(Error::execution(message)));
    }

    /// Delay every later fetch and execute by `latency`
    pub(crate) fn set_latency(&self, latency: Duration) {
        self.state.lock().unwrap().latency = Some(latency);
    }

    pub(crate) fn push_executed(&self, executed: Executed) {
        self.state.lock().unwrap().executions.push_back(Ok(executed));
    }

    pub(crate) fn fail_next_execute(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .executions
            .push_back(Err(Error::execution(message)));
    }

    pub(crate) fn statements(&self) -> Vec<(String, Vec<Binding>)> {
        self.state.lock().unwrap().statements.clone()
    }

    pub(crate) fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|(sql, _)| sql).collect()
    }

    pub(crate) fn transactions(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().transactions.clone()
    }

    fn record(&self, sql: &str, bindings: &[Binding]) -> std::sync::MutexGuard<'_, MockState> {
        let mut state = self.state.lock().unwrap();
        state.statements.push((sql.to_string(), bindings.to_vec()));
        state
    }
}

impl Driver for MockDriver {
    type Row = Row;

    async fn fetch(&self, sql: &str, bindings: &[Binding]) -> Result<Vec<Row>> {
        let (result, latency) = {
            let mut state = self.record(sql, bindings);
            let result = state.fetches.pop_front().unwrap_or_else(|| Ok(Vec::new()));
            (result, state.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        result
    }

    fn decode(&self, row: Row) -> Result<Row> {
        Ok(row)
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> Result<Executed> {
        let (result, latency) = {
            let mut state = self.record(sql, bindings);
            let result = match state.executions.pop_front() {
                Some(result) => result,
                None => {
                    state.next_id += 1;
                    Ok(Executed {
                        rows_affected: 1,
                        last_insert_id: Some(state.next_id),
                    })
                }
            };
            (result, state.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        result
    }

    async fn begin(&self) -> Result<()> {
        self.state.lock().unwrap().transactions.push("BEGIN");
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.state.lock().unwrap().transactions.push("COMMIT");
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.state.lock().unwrap().transactions.push("ROLLBACK");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Connect,
    Select {
        sql: String,
        rows: usize,
    },
    Insert {
        sql: String,
        affected: u64,
        insert_id: Option<i64>,
    },
    Update {
        sql: String,
        affected: u64,
    },
    Delete {
        sql: String,
        affected: u64,
    },
    Exception {
        sql: String,
        operation: Operation,
        message: String,
    },
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<Event>>,
    elapsed: Mutex<Vec<Duration>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn exceptions(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, Event::Exception { .. }))
            .collect()
    }

    /// Durations passed to the success hooks, in call order
    pub(crate) fn elapsed(&self) -> Vec<Duration> {
        self.elapsed.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn timed(&self, event: Event, elapsed: Duration) {
        self.elapsed.lock().unwrap().push(elapsed);
        self.push(event);
    }
}

impl Instrumentation for RecordingSink {
    fn after_connect(&self, elapsed: Duration) {
        self.timed(Event::Connect, elapsed);
    }

    fn after_select(&self, sql: &str, rows: usize, elapsed: Duration) {
        self.timed(
            Event::Select {
                sql: sql.to_string(),
                rows,
            },
            elapsed,
        );
    }

    fn after_insert(&self, sql: &str, affected: u64, insert_id: Option<i64>, elapsed: Duration) {
        self.timed(
            Event::Insert {
                sql: sql.to_string(),
                affected,
                insert_id,
            },
            elapsed,
        );
    }

    fn after_update(&self, sql: &str, affected: u64, elapsed: Duration) {
        self.timed(
            Event::Update {
                sql: sql.to_string(),
                affected,
            },
            elapsed,
        );
    }

    fn after_delete(&self, sql: &str, affected: u64, elapsed: Duration) {
        self.timed(
            Event::Delete {
                sql: sql.to_string(),
                affected,
            },
            elapsed,
        );
    }

    fn on_exception(&self, sql: &str, operation: Operation, error: &Error) {
        self.push(Event::Exception {
            sql: sql.to_string(),
            operation,
            message: error.to_string(),
        });
    }
}
