//! Tabula Core - statement model, dialect compilers and execution pipeline
//!
//! A [`Connection`] binds a [`Driver`] to the [`Compiler`] of its dialect. Every
//! builder is created from a connection, accumulates a [`Statements`] model
//! through fluent mutators, and compiles it only when a terminal operation
//! runs. Each execution is reported to the connection's [`Instrumentation`].
//!
//! ```
//! use tabula_core::compiler::CompilerRegistry;
//! use tabula_core::{ConnectionConfig, Operator};
//!
//! let config = ConnectionConfig::from_json(r#"{"driver": "mysql", "prefix": "cb_"}"#).unwrap();
//! let compiler = CompilerRegistry::default().resolve(&config.driver).unwrap();
//! assert_eq!(compiler.name(), "mysql");
//! assert!(Operator::custom("; DROP").validate().is_err());
//! ```

pub mod builder;
pub mod compiler;
pub mod connection;
pub mod error;
pub mod executor;
pub mod instrument;
pub mod interpolate;
pub mod operator;
pub mod raw;
pub mod statement;
pub mod value;

#[cfg(test)]
mod mock;

pub use builder::{
    Condition, Criteria, IntoCondition, IntoFields, IntoOrderings, IntoRowData, JoinBuilder,
    NestedCriteria, QueryBuilder, RawQuery, RowData, Upserted,
};
pub use compiler::{Compiled, Compiler, CompilerRegistry};
pub use connection::{Connection, ConnectionConfig};
pub use error::{Error, Result};
pub use executor::{Binding, Driver, Executed, Row};
pub use instrument::{Instrumentation, NoopInstrumentation, Operation, TracingInstrumentation};
pub use operator::{op, IntoOperator, Operator};
pub use raw::{raw, Raw};
pub use statement::{
    Criterion, Field, JoinType, Joiner, Operand, SortDirection, Statements, TablePrefix,
};
pub use value::Value;

/// Everything needed to build and run queries
pub mod prelude {
    pub use crate::builder::{Criteria, IntoRowData, QueryBuilder, RowData, Upserted};
    pub use crate::connection::{Connection, ConnectionConfig};
    pub use crate::error::{Error, Result};
    pub use crate::executor::{Driver, Row};
    pub use crate::operator::op;
    pub use crate::raw::{raw, Raw};
    pub use crate::statement::{JoinType, SortDirection};
    pub use crate::value::Value;
}
