//! The statement model: accumulated, not-yet-compiled clauses of one query

use std::fmt;

use crate::{Operator, Raw, Value};

/// A column or table reference
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Bare or `table.column` identifier
    Column(String),
    /// Alias mapping; the column is the key that gets prefixed
    Aliased { column: String, alias: String },
    /// Verbatim fragment, never prefixed or quoted
    Raw(Raw),
}

impl Field {
    /// Create an aliased field (`column AS alias`)
    pub fn aliased(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Field::Aliased {
            column: column.into(),
            alias: alias.into(),
        }
    }

    /// Alias this field. Raw fragments are returned unchanged.
    pub fn as_alias(self, alias: &str) -> Self {
        match self {
            Field::Column(column) | Field::Aliased { column, .. } => Field::Aliased {
                column,
                alias: alias.to_string(),
            },
            raw @ Field::Raw(_) => raw,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Field::Raw(_))
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Column(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Column(value)
    }
}

impl From<&String> for Field {
    fn from(value: &String) -> Self {
        Field::Column(value.clone())
    }
}

impl From<Raw> for Field {
    fn from(value: Raw) -> Self {
        Field::Raw(value)
    }
}

/// Right-hand side of a criterion
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Bound parameter; arrays expand to one placeholder per element
    Value(Value),
    /// Quoted identifier rendered inline (join `ON a.id = b.a_id`)
    Column(String),
    /// Verbatim fragment with its own bindings
    Raw(Raw),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<Raw> for Operand {
    fn from(value: Raw) -> Self {
        Operand::Raw(value)
    }
}

macro_rules! operand_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Operand::Value(Value::from(value))
                }
            }
        )*
    };
}

operand_from_value!(
    (),
    bool,
    i32,
    i64,
    u32,
    f32,
    f64,
    String,
    &str,
    &String,
    serde_json::Value,
);

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(value: Vec<T>) -> Self {
        Operand::Value(Value::from(value))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(value: [T; N]) -> Self {
        Operand::Value(Value::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        Operand::Value(Value::from(value))
    }
}

/// How a criterion attaches to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
    AndNot,
    OrNot,
}

impl Joiner {
    /// Keyword used between two criteria
    pub fn as_str(&self) -> &'static str {
        match self {
            Joiner::And => "AND",
            Joiner::Or => "OR",
            Joiner::AndNot => "AND NOT",
            Joiner::OrNot => "OR NOT",
        }
    }

    /// Keyword used when the criterion opens a clause; plain AND/OR vanish
    pub fn leading(&self) -> Option<&'static str> {
        match self {
            Joiner::And | Joiner::Or => None,
            Joiner::AndNot | Joiner::OrNot => Some("NOT"),
        }
    }
}

impl fmt::Display for Joiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single WHERE, HAVING or JOIN ON criterion
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Compare {
        key: Field,
        operator: Operator,
        value: Operand,
        joiner: Joiner,
    },
    Raw {
        raw: Raw,
        joiner: Joiner,
    },
    Group {
        criteria: Vec<Criterion>,
        joiner: Joiner,
    },
}

impl Criterion {
    pub fn joiner(&self) -> Joiner {
        match self {
            Criterion::Compare { joiner, .. }
            | Criterion::Raw { joiner, .. }
            | Criterion::Group { joiner, .. } => *joiner,
        }
    }
}

/// JOIN types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
            JoinType::Full => write!(f, "FULL OUTER"),
        }
    }
}

/// A JOIN with its ON criteria
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: Field,
    pub criteria: Vec<Criterion>,
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// An ORDER BY entry
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub field: Field,
    pub direction: SortDirection,
}

/// Clauses of one query, in the order they were added.
///
/// Sequence clauses append; `limit`, `offset` and `distinct` overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statements {
    pub selects: Vec<Field>,
    pub tables: Vec<Field>,
    pub wheres: Vec<Criterion>,
    pub joins: Vec<Join>,
    pub havings: Vec<Criterion>,
    pub group_bys: Vec<Field>,
    pub order_bys: Vec<Ordering>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub on_duplicate: Vec<(String, Operand)>,
    pub distinct: bool,
}

impl Statements {
    /// The table mutations target: the last one added
    pub fn target_table(&self) -> Option<&Field> {
        self.tables.last()
    }

    /// Copy of the statements reshaped for an aggregate over the same rows
    pub fn for_aggregate(&self, selection: Raw) -> Statements {
        let mut statements = self.clone();
        statements.order_bys.clear();
        statements.limit = None;
        statements.offset = None;
        statements.selects = vec![Field::Raw(selection)];
        statements
    }
}

/// Configured table prefix, applied to identifiers as they enter the model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePrefix(Option<String>);

impl TablePrefix {
    pub fn new(prefix: Option<String>) -> Self {
        Self(prefix.filter(|p| !p.is_empty()))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Prefix a single field.
    ///
    /// With `allow_mix` set (column context) only `table.column` references
    /// are prefixed; otherwise (table context) every identifier is.
    pub fn apply(&self, field: Field, allow_mix: bool) -> Field {
        let Some(prefix) = self.0.as_deref() else {
            return field;
        };
        let prefixed = |target: String| {
            if !allow_mix || target.contains('.') {
                format!("{prefix}{target}")
            } else {
                target
            }
        };
        match field {
            Field::Raw(raw) => Field::Raw(raw),
            Field::Column(column) => Field::Column(prefixed(column)),
            Field::Aliased { column, alias } => Field::Aliased {
                column: prefixed(column),
                alias,
            },
        }
    }

    /// Prefix a sequence of fields, preserving its shape
    pub fn apply_all(&self, fields: Vec<Field>, allow_mix: bool) -> Vec<Field> {
        fields
            .into_iter()
            .map(|field| self.apply(field, allow_mix))
            .collect()
    }

    /// Prefix a plain identifier string
    pub fn apply_str(&self, value: &str, allow_mix: bool) -> String {
        match self.apply(Field::Column(value.to_string()), allow_mix) {
            Field::Column(column) => column,
            _ => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix() -> TablePrefix {
        TablePrefix::new(Some("cb_".to_string()))
    }

    #[test]
    fn test_empty_prefix_is_noop() {
        let none = TablePrefix::new(Some(String::new()));
        assert_eq!(none.apply("users".into(), false), Field::from("users"));
        assert_eq!(TablePrefix::none().apply_str("users.id", true), "users.id");
    }

    #[test]
    fn test_table_context_always_prefixes() {
        assert_eq!(prefix().apply("users".into(), false), Field::from("cb_users"));
    }

    #[test]
    fn test_column_context_prefixes_only_qualified() {
        assert_eq!(prefix().apply("name".into(), true), Field::from("name"));
        assert_eq!(
            prefix().apply("users.name".into(), true),
            Field::from("cb_users.name")
        );
    }

    #[test]
    fn test_alias_mapping_prefixes_key_not_alias() {
        let field = prefix().apply(Field::aliased("users.name", "users.n"), true);
        assert_eq!(field, Field::aliased("cb_users.name", "users.n"));
    }

    #[test]
    fn test_raw_passes_through() {
        let raw = Field::Raw(Raw::new("users.id + 1"));
        assert_eq!(prefix().apply(raw.clone(), false), raw);
    }

    #[test]
    fn test_apply_all_preserves_shape() {
        let fields = prefix().apply_all(vec!["a.x".into(), "y".into()], true);
        assert_eq!(fields, vec![Field::from("cb_a.x"), Field::from("y")]);
    }

    #[test]
    fn test_for_aggregate_drops_ordering_and_paging() {
        let statements = Statements {
            selects: vec!["name".into()],
            order_bys: vec![Ordering {
                field: "name".into(),
                direction: SortDirection::Desc,
            }],
            limit: Some(5),
            offset: Some(10),
            ..Statements::default()
        };
        let counted = statements.for_aggregate(Raw::new("count(*) as field"));
        assert!(counted.order_bys.is_empty());
        assert_eq!(counted.limit, None);
        assert_eq!(counted.offset, None);
        assert_eq!(counted.selects, vec![Field::Raw(Raw::new("count(*) as field"))]);
        assert_eq!(statements.limit, Some(5));
    }

    #[test]
    fn test_leading_joiner() {
        assert_eq!(Joiner::Or.leading(), None);
        assert_eq!(Joiner::AndNot.leading(), Some("NOT"));
        assert_eq!(Joiner::OrNot.as_str(), "OR NOT");
    }
}
