//! Raw SQL fragments

use std::fmt::{self, Display};

use crate::Value;

/// A verbatim SQL fragment carrying its own bindings.
///
/// Raw fragments are never prefixed, quoted or rewritten by a compiler; their
/// bindings are spliced into the final binding list at the position where the
/// fragment appears.
///
/// # Examples
/// ```
/// use tabula_core::Raw;
///
/// let raw = Raw::with_bindings("age > ?", [18]);
/// assert_eq!(raw.sql(), "age > ?");
/// assert_eq!(raw.bindings().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    sql: String,
    bindings: Vec<Value>,
}

impl Raw {
    /// A fragment without bindings
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }

    /// A fragment with positional bindings, in placeholder order
    pub fn with_bindings<I>(sql: impl Into<String>, bindings: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self {
            sql: sql.into(),
            bindings: bindings.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn bindings(&self) -> &[Value] {
        &self.bindings
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.bindings)
    }
}

impl Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl From<&str> for Raw {
    fn from(sql: &str) -> Self {
        Raw::new(sql)
    }
}

impl From<String> for Raw {
    fn from(sql: String) -> Self {
        Raw::new(sql)
    }
}

/// Shorthand for [`Raw::with_bindings`]
pub fn raw<I>(sql: impl Into<String>, bindings: I) -> Raw
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Raw::with_bindings(sql, bindings)
}
