//! Connection configuration and the handle every builder is bound to

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::QueryBuilder;
use crate::compiler::{Compiler, CompilerRegistry};
use crate::executor::Driver;
use crate::instrument::{Instrumentation, NoopInstrumentation};
use crate::statement::TablePrefix;
use crate::Result;

/// Backend configuration for one connection.
///
/// # Examples
/// ```
/// use tabula_core::ConnectionConfig;
///
/// let config = ConnectionConfig::from_json(
///     r#"{"driver": "sqlite", "database": ":memory:", "prefix": "cb_"}"#,
/// ).unwrap();
/// assert_eq!(config.driver, "sqlite");
/// assert_eq!(config.prefix.as_deref(), Some("cb_"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Dialect tag resolved through the compiler registry
    pub driver: String,
    /// Database name, file path or URL understood by the driver
    #[serde(default)]
    pub database: String,
    /// Prefix prepended to table names
    #[serde(default)]
    pub prefix: Option<String>,
    /// Driver specific options
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ConnectionConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// A driver handle bound to its dialect compiler, table prefix and
/// instrumentation sink. Cloning is cheap and shares the driver.
pub struct Connection<D: Driver> {
    config: Arc<ConnectionConfig>,
    driver: Arc<D>,
    compiler: Arc<dyn Compiler>,
    prefix: TablePrefix,
    instrumentation: Arc<dyn Instrumentation>,
}

impl<D: Driver> Connection<D> {
    /// Bind a driver using the built-in dialects
    pub fn new(driver: D, config: ConnectionConfig) -> Result<Self> {
        Self::with_registry(driver, config, &CompilerRegistry::default())
    }

    /// Bind a driver, resolving the dialect through `registry`
    pub fn with_registry(
        driver: D,
        config: ConnectionConfig,
        registry: &CompilerRegistry,
    ) -> Result<Self> {
        let compiler = registry.resolve(&config.driver)?;
        Ok(Self {
            prefix: TablePrefix::new(config.prefix.clone()),
            config: Arc::new(config),
            driver: Arc::new(driver),
            compiler,
            instrumentation: Arc::new(NoopInstrumentation),
        })
    }

    pub fn with_instrumentation(mut self, instrumentation: Arc<dyn Instrumentation>) -> Self {
        self.instrumentation = instrumentation;
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    pub fn prefix(&self) -> &TablePrefix {
        &self.prefix
    }

    pub fn instrumentation(&self) -> &dyn Instrumentation {
        self.instrumentation.as_ref()
    }

    /// A factory builder in raw mode; use [`QueryBuilder::table`] or
    /// [`QueryBuilder::raw`] to start a statement.
    pub fn query_builder(&self) -> QueryBuilder<D> {
        QueryBuilder::new(self.clone())
    }

    /// A fresh builder targeting `table`
    pub fn table(&self, table: &str) -> QueryBuilder<D> {
        self.query_builder().table(table)
    }
}

impl<D: Driver> Clone for Connection<D> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            driver: Arc::clone(&self.driver),
            compiler: Arc::clone(&self.compiler),
            prefix: self.prefix.clone(),
            instrumentation: Arc::clone(&self.instrumentation),
        }
    }
}

impl<D: Driver> fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.config.driver)
            .field("database", &self.config.database)
            .field("prefix", &self.prefix.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;
    use crate::Error;

    #[test]
    fn test_config_defaults_and_setters() {
        let config = ConnectionConfig::from_json(r#"{"driver": "mysql"}"#).unwrap();
        assert_eq!(config.database, "");
        assert!(config.prefix.is_none());

        let config = ConnectionConfig::new("pgsql")
            .database("app")
            .prefix("t_")
            .option("sslmode", "disable");
        assert_eq!(config.options.get("sslmode").map(String::as_str), Some("disable"));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        assert!(matches!(
            ConnectionConfig::from_json("{").unwrap_err(),
            Error::Serialization(_)
        ));
    }

    #[test]
    fn test_unknown_dialect_fails_construction() {
        let err = Connection::new(MockDriver::new(), ConnectionConfig::new("oracle")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_connection_resolves_compiler_and_prefix() {
        let connection =
            Connection::new(MockDriver::new(), ConnectionConfig::new("mysql").prefix("cb_")).unwrap();
        assert_eq!(connection.compiler().name(), "mysql");
        assert_eq!(connection.prefix().as_str(), Some("cb_"));
        let clone = connection.clone();
        assert!(std::ptr::eq(clone.driver(), connection.driver()));
    }
}
