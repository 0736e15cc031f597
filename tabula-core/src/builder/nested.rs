//! Scoped sub-builders for grouped criteria and join conditions

use super::common::{Criteria, Scope};
use crate::statement::{Criterion, Field, Join, JoinType, Joiner, Operand};
use crate::IntoOperator;

/// Criteria collected inside a `where_group` callback
#[derive(Debug, Clone)]
pub struct NestedCriteria {
    scope: Scope,
    criteria: Vec<Criterion>,
}

impl NestedCriteria {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            criteria: Vec::new(),
        }
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn into_group(self, joiner: Joiner) -> Criterion {
        Criterion::Group {
            criteria: self.criteria,
            joiner,
        }
    }
}

impl Criteria for NestedCriteria {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn push_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }
}

/// ON criteria of one join.
///
/// `on` compares two columns; the where-family binds values.
#[derive(Debug, Clone)]
pub struct JoinBuilder {
    scope: Scope,
    join_type: JoinType,
    table: Field,
    criteria: Vec<Criterion>,
}

impl JoinBuilder {
    pub fn new(scope: Scope, join_type: JoinType, table: Field) -> Self {
        let table = scope.table(table);
        Self {
            scope,
            join_type,
            table,
            criteria: Vec::new(),
        }
    }

    fn column_criterion<O: IntoOperator>(
        mut self,
        first: &str,
        operator: O,
        second: &str,
        joiner: Joiner,
    ) -> Self {
        let prefix = &self.scope.prefix;
        let criterion = Criterion::Compare {
            key: Field::Column(prefix.apply_str(first, true)),
            operator: operator.into_operator(),
            value: Operand::Column(prefix.apply_str(second, true)),
            joiner,
        };
        self.criteria.push(criterion);
        self
    }

    pub fn on<O: IntoOperator>(self, first: &str, operator: O, second: &str) -> Self {
        self.column_criterion(first, operator, second, Joiner::And)
    }

    pub fn or_on<O: IntoOperator>(self, first: &str, operator: O, second: &str) -> Self {
        self.column_criterion(first, operator, second, Joiner::Or)
    }

    pub fn into_join(self) -> Join {
        Join {
            join_type: self.join_type,
            table: self.table,
            criteria: self.criteria,
        }
    }
}

impl Criteria for JoinBuilder {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn push_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::SqliteCompiler;
    use crate::statement::TablePrefix;
    use crate::Operator;
    use std::sync::Arc;

    fn scope() -> Scope {
        Scope::new(TablePrefix::new(Some("cb_".into())), Arc::new(SqliteCompiler))
    }

    #[test]
    fn test_join_builder_prefixes_table_and_columns() {
        let join = JoinBuilder::new(scope(), JoinType::Left, "posts".into())
            .on("posts.user_id", "=", "users.id")
            .or_on("posts.editor_id", Operator::EQ, "users.id")
            .where_(("posts.published", 1))
            .into_join();
        assert_eq!(join.table, Field::from("cb_posts"));
        assert_eq!(join.criteria.len(), 3);
        assert_eq!(
            join.criteria[0],
            Criterion::Compare {
                key: "cb_posts.user_id".into(),
                operator: Operator::EQ,
                value: Operand::Column("cb_users.id".into()),
                joiner: Joiner::And,
            }
        );
        assert_eq!(join.criteria[1].joiner(), Joiner::Or);
        assert!(matches!(
            &join.criteria[2],
            Criterion::Compare { value: Operand::Value(_), .. }
        ));
    }

    #[test]
    fn test_nested_criteria_group() {
        let group = NestedCriteria::new(scope())
            .where_(("role", "admin"))
            .or_where_null("deleted_at")
            .into_group(Joiner::Or);
        let Criterion::Group { criteria, joiner } = group else {
            panic!("expected group");
        };
        assert_eq!(joiner, Joiner::Or);
        assert_eq!(criteria.len(), 2);
    }
}
