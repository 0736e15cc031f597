//! Instrumentation hooks for statement execution.
//!
//! Every terminal operation reports to the connection's [`Instrumentation`]
//! sink: a success hook carrying the display SQL, the row or affected count
//! and the elapsed time, or [`Instrumentation::on_exception`] on failure.
//!
//! ```
//! use std::time::Duration;
//! use tabula_core::instrument::Instrumentation;
//!
//! struct SlowSelects;
//!
//! impl Instrumentation for SlowSelects {
//!     fn after_select(&self, sql: &str, _rows: usize, elapsed: Duration) {
//!         if elapsed > Duration::from_secs(1) {
//!             eprintln!("slow: {sql}");
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use tracing::Level;

use crate::Error;

/// Operation tag attached to exception events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    InsertIgnore,
    Replace,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::InsertIgnore => "insertignore",
            Operation::Replace => "replace",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(
            self,
            Operation::Insert | Operation::InsertIgnore | Operation::Replace
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink receiving one event per executed statement.
///
/// Every hook defaults to doing nothing.
pub trait Instrumentation: Send + Sync {
    fn after_connect(&self, _elapsed: Duration) {}

    fn after_select(&self, _sql: &str, _rows: usize, _elapsed: Duration) {}

    fn after_insert(
        &self,
        _sql: &str,
        _affected: u64,
        _insert_id: Option<i64>,
        _elapsed: Duration,
    ) {
    }

    fn after_update(&self, _sql: &str, _affected: u64, _elapsed: Duration) {}

    fn after_delete(&self, _sql: &str, _affected: u64, _elapsed: Duration) {}

    fn on_exception(&self, _sql: &str, _operation: Operation, _error: &Error) {}
}

/// Sink that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstrumentation;

impl Instrumentation for NoopInstrumentation {}

/// Sink forwarding every event to `tracing` under the `tabula.sql` target
#[derive(Debug, Clone)]
pub struct TracingInstrumentation {
    /// Level for success events; exceptions are always `WARN`
    pub level: Level,
}

impl Default for TracingInstrumentation {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
        }
    }
}

impl TracingInstrumentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

macro_rules! emit {
    ($level:expr, $($field:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!(target: "tabula.sql", $($field)+),
            Level::WARN => tracing::warn!(target: "tabula.sql", $($field)+),
            Level::INFO => tracing::info!(target: "tabula.sql", $($field)+),
            Level::DEBUG => tracing::debug!(target: "tabula.sql", $($field)+),
            Level::TRACE => tracing::trace!(target: "tabula.sql", $($field)+),
        }
    };
}

impl Instrumentation for TracingInstrumentation {
    fn after_connect(&self, elapsed: Duration) {
        emit!(self.level, elapsed = ?elapsed, "connected");
    }

    fn after_select(&self, sql: &str, rows: usize, elapsed: Duration) {
        emit!(
            self.level,
            operation = "select",
            sql = %sql,
            rows,
            elapsed = ?elapsed,
        );
    }

    fn after_insert(&self, sql: &str, affected: u64, insert_id: Option<i64>, elapsed: Duration) {
        emit!(
            self.level,
            operation = "insert",
            sql = %sql,
            affected,
            insert_id = ?insert_id,
            elapsed = ?elapsed,
        );
    }

    fn after_update(&self, sql: &str, affected: u64, elapsed: Duration) {
        emit!(
            self.level,
            operation = "update",
            sql = %sql,
            affected,
            elapsed = ?elapsed,
        );
    }

    fn after_delete(&self, sql: &str, affected: u64, elapsed: Duration) {
        emit!(
            self.level,
            operation = "delete",
            sql = %sql,
            affected,
            elapsed = ?elapsed,
        );
    }

    fn on_exception(&self, sql: &str, operation: Operation, error: &Error) {
        tracing::warn!(
            target: "tabula.sql",
            operation = operation.as_str(),
            sql = %sql,
            error = %error,
        );
    }
}
