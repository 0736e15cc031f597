//! Tabula - a fluent, dialect-agnostic SQL query builder and executor
//!
//! Re-exports [`tabula_core`] and adds an optional process-wide default
//! connection for applications that do not want to thread a [`Connection`]
//! through every call site. Prefer passing connections explicitly.
//!
//! ```
//! use tabula::{ConnectionConfig, CompilerRegistry};
//!
//! let config = ConnectionConfig::new("sqlite").database(":memory:");
//! assert!(CompilerRegistry::default().contains(&config.driver));
//! ```

use std::any::Any;
use std::sync::{OnceLock, RwLock};

pub use tabula_core::*;

type Slot = RwLock<Option<Box<dyn Any + Send + Sync>>>;

fn slot() -> &'static Slot {
    static DEFAULT: OnceLock<Slot> = OnceLock::new();
    DEFAULT.get_or_init(|| RwLock::new(None))
}

/// Install `connection` as the process default.
///
/// Only the first registration is kept; later calls return `false` until
/// [`clear_default`] runs.
pub fn register_default<D: Driver + 'static>(connection: Connection<D>) -> bool {
    let mut guard = match slot().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if guard.is_some() {
        return false;
    }
    *guard = Some(Box::new(connection));
    true
}

/// Forget the process default connection
pub fn clear_default() {
    let mut guard = match slot().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.take();
}

fn default_connection<D: Driver + 'static>() -> Result<Connection<D>> {
    let guard = match slot().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let stored = guard
        .as_ref()
        .ok_or_else(|| Error::configuration("No default connection registered"))?;
    stored
        .downcast_ref::<Connection<D>>()
        .cloned()
        .ok_or_else(|| {
            Error::configuration(format!(
                "Default connection does not use driver {}",
                std::any::type_name::<D>()
            ))
        })
}

/// Raw-mode factory on the default connection
pub fn query_builder<D: Driver + 'static>() -> Result<QueryBuilder<D>> {
    Ok(default_connection::<D>()?.query_builder())
}

/// Builder for `name` on the default connection
pub fn table<D: Driver + 'static>(name: &str) -> Result<QueryBuilder<D>> {
    Ok(default_connection::<D>()?.table(name))
}
