//! PostgreSQL grammar

use super::{Compiler, InsertKind};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresCompiler;

impl Compiler for PostgresCompiler {
    fn name(&self) -> &'static str {
        "pgsql"
    }

    fn sanitizer(&self) -> char {
        '"'
    }

    fn insert_verb(&self, kind: InsertKind) -> Result<&'static str> {
        match kind {
            InsertKind::Insert | InsertKind::InsertIgnore => Ok("INSERT"),
            InsertKind::Replace => Err(Error::invalid_query("pgsql does not support REPLACE")),
        }
    }

    fn insert_suffix(&self, kind: InsertKind) -> Option<&'static str> {
        (kind == InsertKind::InsertIgnore).then_some("ON CONFLICT DO NOTHING")
    }

    fn finalize(&self, sql: String) -> String {
        number_placeholders(&sql)
    }
}

/// Replace each `?` outside quoted text with `$1`, `$2`, ...
fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut index = 0;
    for ch in sql.chars() {
        match quote {
            Some(open) => {
                if ch == open {
                    quote = None;
                }
                out.push(ch);
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '?' => {
                    index += 1;
                    out.push('$');
                    out.push_str(&index.to_string());
                }
                _ => out.push(ch),
            },
        }
    }
    out
}
