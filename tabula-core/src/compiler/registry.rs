//! Dialect tag to compiler constructor mapping

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Compiler, MySqlCompiler, PostgresCompiler, SqliteCompiler};
use crate::{Error, Result};

/// Constructor for a dialect compiler
pub type CompilerFactory = fn() -> Arc<dyn Compiler>;

fn mysql() -> Arc<dyn Compiler> {
    Arc::new(MySqlCompiler)
}

fn sqlite() -> Arc<dyn Compiler> {
    Arc::new(SqliteCompiler)
}

fn postgres() -> Arc<dyn Compiler> {
    Arc::new(PostgresCompiler)
}

/// Registry of compiler constructors keyed by lower-case dialect tag.
///
/// # Examples
/// ```
/// use tabula_core::compiler::CompilerRegistry;
///
/// let registry = CompilerRegistry::default();
/// assert_eq!(registry.resolve("SQLite").unwrap().name(), "sqlite");
/// assert!(registry.resolve("oracle").is_err());
/// ```
#[derive(Clone)]
pub struct CompilerRegistry {
    factories: HashMap<String, CompilerFactory>,
}

impl CompilerRegistry {
    /// A registry without any dialects
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for a tag
    pub fn register(mut self, tag: &str, factory: CompilerFactory) -> Self {
        self.factories.insert(tag.to_ascii_lowercase(), factory);
        self
    }

    pub fn resolve(&self, tag: &str) -> Result<Arc<dyn Compiler>> {
        self.factories
            .get(&tag.to_ascii_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| Error::configuration(format!("Unsupported database driver '{}'", tag)))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(&tag.to_ascii_lowercase())
    }
}

impl Default for CompilerRegistry {
    fn default() -> Self {
        Self::empty()
            .register("mysql", mysql)
            .register("sqlite", sqlite)
            .register("pgsql", postgres)
            .register("postgres", postgres)
    }
}

impl fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.factories.keys().collect();
        tags.sort();
        f.debug_struct("CompilerRegistry").field("tags", &tags).finish()
    }
}
