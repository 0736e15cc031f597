//! MySQL grammar

use super::{Compiler, InsertKind};
use crate::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlCompiler;

impl Compiler for MySqlCompiler {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn sanitizer(&self) -> char {
        '`'
    }

    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    fn insert_verb(&self, kind: InsertKind) -> Result<&'static str> {
        Ok(match kind {
            InsertKind::Insert => "INSERT",
            InsertKind::InsertIgnore => "INSERT IGNORE",
            InsertKind::Replace => "REPLACE",
        })
    }

    fn upsert_clause(&self) -> Option<&'static str> {
        Some("ON DUPLICATE KEY UPDATE")
    }

    fn supports_mutation_limit(&self) -> bool {
        true
    }

    fn offset_only_limit(&self) -> Option<&'static str> {
        Some("LIMIT 18446744073709551615")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{Criterion, Joiner, Operand, Statements};
    use crate::{Operator, Raw, Value};

    fn users() -> Statements {
        Statements {
            tables: vec!["users".into()],
            ..Statements::default()
        }
    }

    #[test]
    fn test_backtick_quoting() {
        let mut statements = users();
        statements.selects = vec!["users.id".into()];
        let compiled = MySqlCompiler.select(&statements).unwrap();
        assert_eq!(compiled.sql, "SELECT `users`.`id` FROM `users`");
    }

    #[test]
    fn test_on_duplicate_key_update() {
        let mut statements = users();
        statements.on_duplicate = vec![
            ("visits".to_string(), Operand::Raw(Raw::new("visits + 1"))),
            ("name".to_string(), Operand::from("b")),
        ];
        let row = vec![
            ("id".to_string(), Operand::from(1)),
            ("name".to_string(), Operand::from("a")),
        ];
        let compiled = MySqlCompiler
            .insert(&statements, &row, InsertKind::Insert)
            .unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO `users` (`id`, `name`) VALUES (?, ?) ON DUPLICATE KEY UPDATE `visits` = visits + 1, `name` = ?"
        );
        assert_eq!(
            compiled.bindings,
            vec![Value::I32(1), Value::from("a"), Value::from("b")]
        );
    }

    #[test]
    fn test_insert_ignore_and_replace() {
        let row = vec![("id".to_string(), Operand::from(1))];
        let ignore = MySqlCompiler
            .insert(&users(), &row, InsertKind::InsertIgnore)
            .unwrap();
        assert_eq!(ignore.sql, "INSERT IGNORE INTO `users` (`id`) VALUES (?)");
        let replace = MySqlCompiler
            .insert(&users(), &row, InsertKind::Replace)
            .unwrap();
        assert_eq!(replace.sql, "REPLACE INTO `users` (`id`) VALUES (?)");
    }

    #[test]
    fn test_update_with_limit() {
        let mut statements = users();
        statements.wheres = vec![Criterion::Compare {
            key: "active".into(),
            operator: Operator::EQ,
            value: Operand::from(0),
            joiner: Joiner::And,
        }];
        statements.limit = Some(10);
        let row = vec![("active".to_string(), Operand::from(1))];
        let compiled = MySqlCompiler.update(&statements, &row).unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE `users` SET `active` = ? WHERE `active` = ? LIMIT 10"
        );
    }

    #[test]
    fn test_literal_escaping() {
        assert_eq!(MySqlCompiler.quote_literal(r"it's a \ test"), r"'it\'s a \\ test'");
    }
}
