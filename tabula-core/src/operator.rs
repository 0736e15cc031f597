//! SQL operator types and conversions

use std::borrow::Cow;
use std::fmt::{self, Display};

use crate::{Error, Result};

/// SQL comparison operator used in criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(Cow<'static, str>);

impl Operator {
    pub const GT: Self = Operator(Cow::Borrowed(">"));
    pub const LT: Self = Operator(Cow::Borrowed("<"));
    pub const EQ: Self = Operator(Cow::Borrowed("="));
    pub const NEQ: Self = Operator(Cow::Borrowed("!="));
    pub const LTGT: Self = Operator(Cow::Borrowed("<>"));
    pub const GTE: Self = Operator(Cow::Borrowed(">="));
    pub const LTE: Self = Operator(Cow::Borrowed("<="));
    pub const LIKE: Self = Operator(Cow::Borrowed("LIKE"));
    pub const NOT_LIKE: Self = Operator(Cow::Borrowed("NOT LIKE"));
    pub const ILIKE: Self = Operator(Cow::Borrowed("ILIKE"));
    pub const IN: Self = Operator(Cow::Borrowed("IN"));
    pub const NOT_IN: Self = Operator(Cow::Borrowed("NOT IN"));
    pub const BETWEEN: Self = Operator(Cow::Borrowed("BETWEEN"));
    pub const IS: Self = Operator(Cow::Borrowed("IS"));
    pub const IS_NOT: Self = Operator(Cow::Borrowed("IS NOT"));

    /// Create a custom operator for database-specific operations
    ///
    /// # Examples
    /// ```
    /// use tabula_core::Operator;
    ///
    /// // PostgreSQL full-text search
    /// let fts_op = Operator::custom("@@");
    /// assert_eq!(fts_op.as_str(), "@@");
    /// ```
    pub fn custom(op: impl Into<Cow<'static, str>>) -> Self {
        Operator(op.into())
    }

    /// Get the string representation of the operator
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the operator expects a two element sequence (`? AND ?`)
    pub fn is_between(&self) -> bool {
        self.0.eq_ignore_ascii_case("BETWEEN") || self.0.eq_ignore_ascii_case("NOT BETWEEN")
    }

    /// Reject operators that could smuggle extra statements into the query.
    pub fn validate(&self) -> Result<()> {
        let op = self.0.trim();
        if op.is_empty() {
            return Err(Error::invalid_query("Operator must not be empty"));
        }
        if op.contains(';') || op.contains("--") || op.contains("/*") || op.contains('?') {
            return Err(Error::invalid_query(format!(
                "Operator '{}' contains forbidden characters",
                op
            )));
        }
        Ok(())
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for types that can be converted to SQL operators
pub trait IntoOperator {
    fn into_operator(self) -> Operator;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Operator {
        self
    }
}

/// String literals map onto the well-known constants; anything else becomes a
/// custom operator checked by [`Operator::validate`] when the query compiles.
impl IntoOperator for &str {
    fn into_operator(self) -> Operator {
        match self.trim().to_ascii_uppercase().as_str() {
            ">" => Operator::GT,
            "<" => Operator::LT,
            "=" => Operator::EQ,
            "!=" => Operator::NEQ,
            "<>" => Operator::LTGT,
            ">=" => Operator::GTE,
            "<=" => Operator::LTE,
            "LIKE" => Operator::LIKE,
            "NOT LIKE" => Operator::NOT_LIKE,
            "ILIKE" => Operator::ILIKE,
            "IN" => Operator::IN,
            "NOT IN" => Operator::NOT_IN,
            "BETWEEN" => Operator::BETWEEN,
            "IS" => Operator::IS,
            "IS NOT" => Operator::IS_NOT,
            _ => Operator::custom(self.trim().to_string()),
        }
    }
}

impl IntoOperator for String {
    fn into_operator(self) -> Operator {
        self.as_str().into_operator()
    }
}

/// Convenience module for operator constants
pub mod op {
    use super::Operator;

    pub const GT: Operator = Operator::GT;
    pub const LT: Operator = Operator::LT;
    pub const EQ: Operator = Operator::EQ;
    pub const NEQ: Operator = Operator::NEQ;
    pub const GTE: Operator = Operator::GTE;
    pub const LTE: Operator = Operator::LTE;
    pub const LIKE: Operator = Operator::LIKE;
    pub const NOT_LIKE: Operator = Operator::NOT_LIKE;
    pub const ILIKE: Operator = Operator::ILIKE;
    pub const IN: Operator = Operator::IN;
    pub const NOT_IN: Operator = Operator::NOT_IN;
    pub const BETWEEN: Operator = Operator::BETWEEN;
}
