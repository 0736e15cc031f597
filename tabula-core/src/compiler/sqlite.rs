//! SQLite grammar

use super::{Compiler, InsertKind};
use crate::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteCompiler;

impl Compiler for SqliteCompiler {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn sanitizer(&self) -> char {
        '"'
    }

    fn insert_verb(&self, kind: InsertKind) -> Result<&'static str> {
        Ok(match kind {
            InsertKind::Insert => "INSERT",
            InsertKind::InsertIgnore => "INSERT OR IGNORE",
            InsertKind::Replace => "REPLACE",
        })
    }

    fn offset_only_limit(&self) -> Option<&'static str> {
        Some("LIMIT -1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{Operand, Statements};

    fn row() -> Vec<(String, Operand)> {
        vec![("email".to_string(), Operand::from("a@b.c"))]
    }

    fn users() -> Statements {
        Statements {
            tables: vec!["users".into()],
            ..Statements::default()
        }
    }

    #[test]
    fn test_insert_variants() {
        let ignore = SqliteCompiler
            .insert(&users(), &row(), InsertKind::InsertIgnore)
            .unwrap();
        assert_eq!(ignore.sql, r#"INSERT OR IGNORE INTO "users" ("email") VALUES (?)"#);
        let replace = SqliteCompiler
            .insert(&users(), &row(), InsertKind::Replace)
            .unwrap();
        assert_eq!(replace.sql, r#"REPLACE INTO "users" ("email") VALUES (?)"#);
    }

    #[test]
    fn test_no_upsert_clause() {
        let mut statements = users();
        statements.on_duplicate = row();
        assert!(SqliteCompiler
            .insert(&statements, &row(), InsertKind::Insert)
            .unwrap_err()
            .is_misuse());
    }

    #[test]
    fn test_offset_without_limit() {
        let mut statements = users();
        statements.offset = Some(5);
        let compiled = SqliteCompiler.select(&statements).unwrap();
        assert_eq!(compiled.sql, r#"SELECT * FROM "users" LIMIT -1 OFFSET 5"#);
    }

    #[test]
    fn test_update_limit_unsupported() {
        let mut statements = users();
        statements.limit = Some(1);
        assert!(SqliteCompiler.update(&statements, &row()).unwrap_err().is_misuse());
    }
}
