//! Dialect compilers: pure translation of [`Statements`] into SQL text and
//! ordered bindings.
//!
//! Every dialect shares the clause rendering below and overrides only the
//! hooks where its grammar differs (identifier quoting, insert verbs, upsert
//! clause, placeholder style).

pub mod mysql;
pub mod postgres;
pub mod registry;
pub mod sqlite;

use std::fmt;

use crate::statement::{Criterion, Field, Join, Operand, Statements};
use crate::{Error, Operator, Result, Value};

pub use mysql::MySqlCompiler;
pub use postgres::PostgresCompiler;
pub use registry::{CompilerFactory, CompilerRegistry};
pub use sqlite::SqliteCompiler;

/// SQL text with bindings in placeholder appearance order
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl Compiled {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }
}

/// Flavour of an INSERT statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertKind {
    Insert,
    InsertIgnore,
    Replace,
}

/// Translation of the statement model for one backend grammar
pub trait Compiler: Send + Sync + fmt::Debug {
    /// Dialect tag this compiler was registered under
    fn name(&self) -> &'static str;

    /// Identifier quote character
    fn sanitizer(&self) -> char;

    /// Quote an identifier. `table.column` is quoted per part and `*` is left
    /// alone.
    fn wrap_sanitizer(&self, identifier: &str) -> String {
        let quote = self.sanitizer();
        let wrap = |part: &str| {
            let part = part.trim();
            if part == "*" {
                part.to_string()
            } else {
                let doubled = format!("{quote}{quote}");
                format!("{quote}{}{quote}", part.replace(quote, &doubled))
            }
        };
        match identifier.split_once('.') {
            Some((table, column)) => format!("{}.{}", wrap(table), wrap(column)),
            None => wrap(identifier),
        }
    }

    /// Quote a string literal for display SQL
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Leading keywords of an INSERT of the given kind
    fn insert_verb(&self, kind: InsertKind) -> Result<&'static str>;

    /// Trailing clause of an INSERT of the given kind
    fn insert_suffix(&self, _kind: InsertKind) -> Option<&'static str> {
        None
    }

    /// Keyword introducing the upsert assignment list, if the dialect has one
    fn upsert_clause(&self) -> Option<&'static str> {
        None
    }

    fn supports_mutation_limit(&self) -> bool {
        false
    }

    /// LIMIT emitted when only an OFFSET was requested
    fn offset_only_limit(&self) -> Option<&'static str> {
        None
    }

    /// Rewrite the finished SQL text, e.g. to renumber placeholders
    fn finalize(&self, sql: String) -> String {
        sql
    }

    fn select(&self, statements: &Statements) -> Result<Compiled> {
        compile_select(self, statements)
    }

    fn insert(
        &self,
        statements: &Statements,
        row: &[(String, Operand)],
        kind: InsertKind,
    ) -> Result<Compiled> {
        compile_insert(self, statements, row, kind)
    }

    fn update(&self, statements: &Statements, row: &[(String, Operand)]) -> Result<Compiled> {
        compile_update(self, statements, row)
    }

    fn delete(&self, statements: &Statements) -> Result<Compiled> {
        compile_delete(self, statements)
    }
}

/// Accumulates SQL fragments and their bindings in appearance order
struct Renderer<'a, C: ?Sized> {
    compiler: &'a C,
    bindings: Vec<Value>,
}

impl<'a, C: Compiler + ?Sized> Renderer<'a, C> {
    fn new(compiler: &'a C) -> Self {
        Self {
            compiler,
            bindings: Vec::new(),
        }
    }

    fn raw(&mut self, raw: &crate::Raw) -> String {
        self.bindings.extend(raw.bindings().iter().cloned());
        raw.sql().to_string()
    }

    fn field(&mut self, field: &Field) -> String {
        match field {
            Field::Column(column) => self.compiler.wrap_sanitizer(column),
            Field::Aliased { column, alias } => format!(
                "{} AS {}",
                self.compiler.wrap_sanitizer(column),
                self.compiler.wrap_sanitizer(alias)
            ),
            Field::Raw(raw) => self.raw(raw),
        }
    }

    fn fields(&mut self, fields: &[Field]) -> String {
        fields
            .iter()
            .map(|field| self.field(field))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn operand(&mut self, operator: &Operator, operand: &Operand) -> Result<String> {
        match operand {
            Operand::Column(column) => Ok(self.compiler.wrap_sanitizer(column)),
            Operand::Raw(raw) => Ok(self.raw(raw)),
            Operand::Value(value) if operator.is_between() => match value.as_array() {
                Some(bounds) if bounds.len() == 2 => {
                    self.bindings.extend(bounds.iter().cloned());
                    Ok("? AND ?".to_string())
                }
                _ => Err(Error::invalid_query(format!(
                    "{} requires exactly two values",
                    operator
                ))),
            },
            Operand::Value(Value::Array(items)) => {
                if items.is_empty() {
                    return Err(Error::invalid_query(format!(
                        "{} requires at least one value",
                        operator
                    )));
                }
                self.bindings.extend(items.iter().cloned());
                Ok(format!("({})", vec!["?"; items.len()].join(", ")))
            }
            Operand::Value(value) => {
                self.bindings.push(value.clone());
                Ok("?".to_string())
            }
        }
    }

    fn criterion(&mut self, criterion: &Criterion) -> Result<Option<String>> {
        match criterion {
            Criterion::Compare {
                key,
                operator,
                value,
                ..
            } => {
                operator.validate()?;
                let key = self.field(key);
                let value = self.operand(operator, value)?;
                Ok(Some(format!("{} {} {}", key, operator, value)))
            }
            Criterion::Raw { raw, .. } => Ok(Some(self.raw(raw))),
            Criterion::Group { criteria, .. } => {
                Ok(self.criteria(criteria)?.map(|inner| format!("({})", inner)))
            }
        }
    }

    /// Render criteria joined by their joiners; `None` when nothing renders
    fn criteria(&mut self, criteria: &[Criterion]) -> Result<Option<String>> {
        let mut parts: Vec<String> = Vec::new();
        for criterion in criteria {
            let Some(rendered) = self.criterion(criterion)? else {
                continue;
            };
            let joiner = criterion.joiner();
            let keyword = if parts.is_empty() {
                joiner.leading()
            } else {
                Some(joiner.as_str())
            };
            match keyword {
                Some(keyword) => parts.push(format!("{} {}", keyword, rendered)),
                None => parts.push(rendered),
            }
        }
        Ok((!parts.is_empty()).then(|| parts.join(" ")))
    }

    fn join(&mut self, join: &Join) -> Result<String> {
        let table = self.field(&join.table);
        match self.criteria(&join.criteria)? {
            Some(on) => Ok(format!("{} JOIN {} ON {}", join.join_type, table, on)),
            None => Ok(format!("{} JOIN {}", join.join_type, table)),
        }
    }

    fn assignments(&mut self, row: &[(String, Operand)]) -> String {
        row.iter()
            .map(|(column, value)| {
                let value = self.value(value);
                format!("{} = {}", self.compiler.wrap_sanitizer(column), value)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// A single row value; arrays bind as one parameter here
    fn value(&mut self, operand: &Operand) -> String {
        match operand {
            Operand::Column(column) => self.compiler.wrap_sanitizer(column),
            Operand::Raw(raw) => self.raw(raw),
            Operand::Value(value) => {
                self.bindings.push(value.clone());
                "?".to_string()
            }
        }
    }

    fn finish(self, parts: Vec<String>) -> Compiled {
        Compiled {
            sql: self.compiler.finalize(parts.join(" ")),
            bindings: self.bindings,
        }
    }
}

fn target_table(statements: &Statements) -> Result<&Field> {
    statements
        .target_table()
        .ok_or_else(|| Error::invalid_query("No table specified"))
}

fn check_mutation_limit<C: Compiler + ?Sized>(
    compiler: &C,
    statements: &Statements,
    verb: &str,
) -> Result<()> {
    if statements.limit.is_some() && !compiler.supports_mutation_limit() {
        return Err(Error::invalid_query(format!(
            "{} does not support {} ... LIMIT",
            compiler.name(),
            verb
        )));
    }
    Ok(())
}

pub(crate) fn compile_select<C: Compiler + ?Sized>(
    compiler: &C,
    statements: &Statements,
) -> Result<Compiled> {
    if statements.tables.is_empty() {
        return Err(Error::invalid_query("No table specified"));
    }
    let mut renderer = Renderer::new(compiler);
    let mut parts = vec![if statements.distinct {
        "SELECT DISTINCT".to_string()
    } else {
        "SELECT".to_string()
    }];

    if statements.selects.is_empty() {
        parts.push("*".to_string());
    } else {
        parts.push(renderer.fields(&statements.selects));
    }
    parts.push("FROM".to_string());
    parts.push(renderer.fields(&statements.tables));

    for join in &statements.joins {
        parts.push(renderer.join(join)?);
    }
    if let Some(wheres) = renderer.criteria(&statements.wheres)? {
        parts.push(format!("WHERE {}", wheres));
    }
    if !statements.group_bys.is_empty() {
        parts.push(format!("GROUP BY {}", renderer.fields(&statements.group_bys)));
    }
    if let Some(havings) = renderer.criteria(&statements.havings)? {
        parts.push(format!("HAVING {}", havings));
    }
    if !statements.order_bys.is_empty() {
        let orderings = statements
            .order_bys
            .iter()
            .map(|ordering| format!("{} {}", renderer.field(&ordering.field), ordering.direction))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("ORDER BY {}", orderings));
    }
    match (statements.limit, statements.offset) {
        (Some(limit), _) => parts.push(format!("LIMIT {}", limit)),
        (None, Some(_)) => {
            if let Some(limit) = compiler.offset_only_limit() {
                parts.push(limit.to_string());
            }
        }
        (None, None) => {}
    }
    if let Some(offset) = statements.offset {
        parts.push(format!("OFFSET {}", offset));
    }

    Ok(renderer.finish(parts))
}

pub(crate) fn compile_insert<C: Compiler + ?Sized>(
    compiler: &C,
    statements: &Statements,
    row: &[(String, Operand)],
    kind: InsertKind,
) -> Result<Compiled> {
    let table = target_table(statements)?;
    if row.is_empty() {
        return Err(Error::invalid_query("No values to insert"));
    }
    let verb = compiler.insert_verb(kind)?;
    let mut renderer = Renderer::new(compiler);
    let table = renderer.field(table);
    let columns = row
        .iter()
        .map(|(column, _)| compiler.wrap_sanitizer(column))
        .collect::<Vec<_>>()
        .join(", ");
    let values = row
        .iter()
        .map(|(_, value)| renderer.value(value))
        .collect::<Vec<_>>()
        .join(", ");

    let mut parts = vec![
        verb.to_string(),
        "INTO".to_string(),
        table,
        format!("({})", columns),
        format!("VALUES ({})", values),
    ];
    if let Some(suffix) = compiler.insert_suffix(kind) {
        parts.push(suffix.to_string());
    }
    if !statements.on_duplicate.is_empty() {
        let clause = compiler.upsert_clause().ok_or_else(|| {
            Error::invalid_query(format!("{} does not support upserts", compiler.name()))
        })?;
        if kind != InsertKind::Insert {
            return Err(Error::invalid_query("Upsert requires a plain insert"));
        }
        parts.push(clause.to_string());
        parts.push(renderer.assignments(&statements.on_duplicate));
    }

    Ok(renderer.finish(parts))
}

pub(crate) fn compile_update<C: Compiler + ?Sized>(
    compiler: &C,
    statements: &Statements,
    row: &[(String, Operand)],
) -> Result<Compiled> {
    let table = target_table(statements)?;
    if row.is_empty() {
        return Err(Error::invalid_query("No values to update"));
    }
    check_mutation_limit(compiler, statements, "UPDATE")?;
    let mut renderer = Renderer::new(compiler);
    let mut parts = vec!["UPDATE".to_string(), renderer.field(table)];
    parts.push(format!("SET {}", renderer.assignments(row)));
    if let Some(wheres) = renderer.criteria(&statements.wheres)? {
        parts.push(format!("WHERE {}", wheres));
    }
    if let Some(limit) = statements.limit {
        parts.push(format!("LIMIT {}", limit));
    }
    Ok(renderer.finish(parts))
}

pub(crate) fn compile_delete<C: Compiler + ?Sized>(
    compiler: &C,
    statements: &Statements,
) -> Result<Compiled> {
    let table = target_table(statements)?;
    check_mutation_limit(compiler, statements, "DELETE")?;
    let mut renderer = Renderer::new(compiler);
    let mut parts = vec!["DELETE FROM".to_string(), renderer.field(table)];
    if let Some(wheres) = renderer.criteria(&statements.wheres)? {
        parts.push(format!("WHERE {}", wheres));
    }
    if let Some(limit) = statements.limit {
        parts.push(format!("LIMIT {}", limit));
    }
    Ok(renderer.finish(parts))
}
