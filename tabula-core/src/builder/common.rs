//! Conversion traits and the where-family shared by every criteria builder

use std::sync::Arc;

use super::nested::NestedCriteria;
use crate::compiler::Compiler;
use crate::statement::{Criterion, Field, Joiner, Operand, Ordering, SortDirection, TablePrefix};
use crate::{IntoOperator, Operator, Raw, Value};

/// Prefix and quoting rules a criteria builder needs while it records
/// criteria.
#[derive(Debug, Clone)]
pub struct Scope {
    pub prefix: TablePrefix,
    pub compiler: Arc<dyn Compiler>,
}

impl Scope {
    pub fn new(prefix: TablePrefix, compiler: Arc<dyn Compiler>) -> Self {
        Self { prefix, compiler }
    }

    pub fn column(&self, field: Field) -> Field {
        self.prefix.apply(field, true)
    }

    pub fn table(&self, field: Field) -> Field {
        self.prefix.apply(field, false)
    }

    /// Build a criterion from a condition, prefixing its column references
    pub fn criterion(&self, condition: Condition, joiner: Joiner) -> Criterion {
        match condition {
            Condition::Compare {
                key,
                operator,
                value,
            } => Criterion::Compare {
                key: self.column(key),
                operator,
                value: match value {
                    Operand::Column(column) => Operand::Column(self.prefix.apply_str(&column, true)),
                    other => other,
                },
                joiner,
            },
            Condition::Raw(raw) => Criterion::Raw { raw, joiner },
        }
    }

    /// `<quoted column> IS [NOT] NULL` as a raw criterion
    pub fn null_check(&self, key: &str, negate: bool, joiner: Joiner) -> Criterion {
        let column = self.prefix.apply_str(key, true);
        let sql = format!(
            "{} IS {}NULL",
            self.compiler.wrap_sanitizer(&column),
            if negate { "NOT " } else { "" }
        );
        Criterion::Raw {
            raw: Raw::new(sql),
            joiner,
        }
    }
}

/// A single condition before it is attached with a joiner
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        key: Field,
        operator: Operator,
        value: Operand,
    },
    Raw(Raw),
}

/// Types usable as a where/having condition.
///
/// - `("age", 18)` implies `=`
/// - `("age", ">", 18)` or `("age", op::GT, 18)` names the operator
/// - `Raw` is used verbatim
pub trait IntoCondition {
    fn into_condition(self) -> Condition;
}

impl<K, T> IntoCondition for (K, T)
where
    K: Into<Field>,
    T: Into<Operand>,
{
    fn into_condition(self) -> Condition {
        Condition::Compare {
            key: self.0.into(),
            operator: Operator::EQ,
            value: self.1.into(),
        }
    }
}

impl<K, O, T> IntoCondition for (K, O, T)
where
    K: Into<Field>,
    O: IntoOperator,
    T: Into<Operand>,
{
    fn into_condition(self) -> Condition {
        Condition::Compare {
            key: self.0.into(),
            operator: self.1.into_operator(),
            value: self.2.into(),
        }
    }
}

impl IntoCondition for Raw {
    fn into_condition(self) -> Condition {
        Condition::Raw(self)
    }
}

impl IntoCondition for Condition {
    fn into_condition(self) -> Condition {
        self
    }
}

/// Types convertible into a list of fields (select, group by, from)
pub trait IntoFields {
    fn into_fields(self) -> Vec<Field>;
}

macro_rules! single_field {
    ($($ty:ty),*) => {
        $(
            impl IntoFields for $ty {
                fn into_fields(self) -> Vec<Field> {
                    vec![Field::from(self)]
                }
            }
        )*
    };
}

single_field!(&str, String, &String, Raw);

impl IntoFields for Field {
    fn into_fields(self) -> Vec<Field> {
        vec![self]
    }
}

impl<T: Into<Field>> IntoFields for Vec<T> {
    fn into_fields(self) -> Vec<Field> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Field>, const N: usize> IntoFields for [T; N] {
    fn into_fields(self) -> Vec<Field> {
        self.into_iter().map(Into::into).collect()
    }
}

macro_rules! tuple_fields {
    ($($name:ident),+) => {
        impl<$($name: Into<Field>),+> IntoFields for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_fields(self) -> Vec<Field> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

tuple_fields!(A, B);
tuple_fields!(A, B, C);
tuple_fields!(A, B, C, D);
tuple_fields!(A, B, C, D, E);

/// Types convertible into ORDER BY entries. Plain fields take the default
/// direction supplied by the caller.
pub trait IntoOrderings {
    fn into_orderings(self, default: SortDirection) -> Vec<Ordering>;
}

macro_rules! single_ordering {
    ($($ty:ty),*) => {
        $(
            impl IntoOrderings for $ty {
                fn into_orderings(self, default: SortDirection) -> Vec<Ordering> {
                    vec![Ordering {
                        field: Field::from(self),
                        direction: default,
                    }]
                }
            }
        )*
    };
}

single_ordering!(&str, String, Raw, Field);

impl<K: Into<Field>> IntoOrderings for (K, SortDirection) {
    fn into_orderings(self, _default: SortDirection) -> Vec<Ordering> {
        vec![Ordering {
            field: self.0.into(),
            direction: self.1,
        }]
    }
}

impl<T: IntoOrderings> IntoOrderings for Vec<T> {
    fn into_orderings(self, default: SortDirection) -> Vec<Ordering> {
        self.into_iter()
            .flat_map(|item| item.into_orderings(default))
            .collect()
    }
}

impl<T: IntoOrderings, const N: usize> IntoOrderings for [T; N] {
    fn into_orderings(self, default: SortDirection) -> Vec<Ordering> {
        self.into_iter()
            .flat_map(|item| item.into_orderings(default))
            .collect()
    }
}

/// The where-family. Every method funnels into
/// [`Criteria::push_criterion`], so the query builder, nested groups and
/// join builders record criteria identically.
pub trait Criteria: Sized {
    fn scope(&self) -> &Scope;

    fn push_criterion(self, criterion: Criterion) -> Self;

    fn add_condition<C: IntoCondition>(self, condition: C, joiner: Joiner) -> Self {
        let criterion = self.scope().criterion(condition.into_condition(), joiner);
        self.push_criterion(criterion)
    }

    fn where_<C: IntoCondition>(self, condition: C) -> Self {
        self.add_condition(condition, Joiner::And)
    }

    fn or_where<C: IntoCondition>(self, condition: C) -> Self {
        self.add_condition(condition, Joiner::Or)
    }

    fn where_not<C: IntoCondition>(self, condition: C) -> Self {
        self.add_condition(condition, Joiner::AndNot)
    }

    fn or_where_not<C: IntoCondition>(self, condition: C) -> Self {
        self.add_condition(condition, Joiner::OrNot)
    }

    fn where_in<K, I>(self, key: K, values: I) -> Self
    where
        K: Into<Field>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.add_condition((key, Operator::IN, in_list(values)), Joiner::And)
    }

    fn where_not_in<K, I>(self, key: K, values: I) -> Self
    where
        K: Into<Field>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.add_condition((key, Operator::NOT_IN, in_list(values)), Joiner::And)
    }

    fn or_where_in<K, I>(self, key: K, values: I) -> Self
    where
        K: Into<Field>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.add_condition((key, Operator::IN, in_list(values)), Joiner::Or)
    }

    fn or_where_not_in<K, I>(self, key: K, values: I) -> Self
    where
        K: Into<Field>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.add_condition((key, Operator::NOT_IN, in_list(values)), Joiner::Or)
    }

    fn where_between<K, L, H>(self, key: K, low: L, high: H) -> Self
    where
        K: Into<Field>,
        L: Into<Value>,
        H: Into<Value>,
    {
        let bounds = Value::Array(vec![low.into(), high.into()]);
        self.add_condition((key, Operator::BETWEEN, bounds), Joiner::And)
    }

    fn or_where_between<K, L, H>(self, key: K, low: L, high: H) -> Self
    where
        K: Into<Field>,
        L: Into<Value>,
        H: Into<Value>,
    {
        let bounds = Value::Array(vec![low.into(), high.into()]);
        self.add_condition((key, Operator::BETWEEN, bounds), Joiner::Or)
    }

    fn where_null(self, key: &str) -> Self {
        let criterion = self.scope().null_check(key, false, Joiner::And);
        self.push_criterion(criterion)
    }

    fn where_not_null(self, key: &str) -> Self {
        let criterion = self.scope().null_check(key, true, Joiner::And);
        self.push_criterion(criterion)
    }

    fn or_where_null(self, key: &str) -> Self {
        let criterion = self.scope().null_check(key, false, Joiner::Or);
        self.push_criterion(criterion)
    }

    fn or_where_not_null(self, key: &str) -> Self {
        let criterion = self.scope().null_check(key, true, Joiner::Or);
        self.push_criterion(criterion)
    }

    /// Verbatim criterion; its bindings keep their position
    fn where_raw(self, raw: impl Into<Raw>) -> Self {
        self.push_criterion(Criterion::Raw {
            raw: raw.into(),
            joiner: Joiner::And,
        })
    }

    fn or_where_raw(self, raw: impl Into<Raw>) -> Self {
        self.push_criterion(Criterion::Raw {
            raw: raw.into(),
            joiner: Joiner::Or,
        })
    }

    /// Parenthesized group built on a fresh [`NestedCriteria`]
    fn where_group<F>(self, build: F) -> Self
    where
        F: FnOnce(NestedCriteria) -> NestedCriteria,
    {
        let nested = build(NestedCriteria::new(self.scope().clone()));
        self.push_criterion(nested.into_group(Joiner::And))
    }

    fn or_where_group<F>(self, build: F) -> Self
    where
        F: FnOnce(NestedCriteria) -> NestedCriteria,
    {
        let nested = build(NestedCriteria::new(self.scope().clone()));
        self.push_criterion(nested.into_group(Joiner::Or))
    }
}

fn in_list<I>(values: I) -> Value
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Value::Array(values.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::SqliteCompiler;
    use crate::operator::op;

    fn scope(prefix: Option<&str>) -> Scope {
        Scope::new(
            TablePrefix::new(prefix.map(str::to_string)),
            Arc::new(SqliteCompiler),
        )
    }

    #[test]
    fn test_condition_shorthand_implies_eq() {
        let condition = ("name", "John").into_condition();
        assert_eq!(
            condition,
            Condition::Compare {
                key: "name".into(),
                operator: op::EQ,
                value: Operand::from("John"),
            }
        );
    }

    #[test]
    fn test_condition_with_string_operator() {
        let Condition::Compare { operator, value, .. } = ("age", ">", 18).into_condition() else {
            panic!("expected comparison");
        };
        assert_eq!(operator, op::GT);
        assert_eq!(value, Operand::from(18));
    }

    #[test]
    fn test_criterion_prefixes_qualified_keys_only() {
        let scope = scope(Some("cb_"));
        let Criterion::Compare { key, .. } = scope.criterion(("users.id", 1).into_condition(), Joiner::And) else {
            panic!("expected comparison");
        };
        assert_eq!(key, Field::from("cb_users.id"));
        let Criterion::Compare { key, .. } = scope.criterion(("id", 1).into_condition(), Joiner::And) else {
            panic!("expected comparison");
        };
        assert_eq!(key, Field::from("id"));
    }

    #[test]
    fn test_null_check_uses_dialect_quoting() {
        let criterion = scope(Some("cb_")).null_check("users.deleted_at", true, Joiner::Or);
        assert_eq!(
            criterion,
            Criterion::Raw {
                raw: Raw::new(r#""cb_users"."deleted_at" IS NOT NULL"#),
                joiner: Joiner::Or,
            }
        );
    }

    #[test]
    fn test_into_fields() {
        assert_eq!("name".into_fields(), vec![Field::from("name")]);
        assert_eq!(
            ("id", Field::aliased("name", "n")).into_fields(),
            vec![Field::from("id"), Field::aliased("name", "n")]
        );
        assert_eq!(vec!["a", "b"].into_fields().len(), 2);
    }

    #[test]
    fn test_into_orderings() {
        let orderings = vec![("name", SortDirection::Desc), ("id", SortDirection::Asc)]
            .into_orderings(SortDirection::Asc);
        assert_eq!(orderings[0].direction, SortDirection::Desc);
        let orderings = ["a", "b"].into_orderings(SortDirection::Desc);
        assert!(orderings.iter().all(|o| o.direction == SortDirection::Desc));
    }
}
