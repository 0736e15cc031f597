//! Human-readable SQL for logs and instrumentation.
//!
//! The output inlines bindings as literals and is never executed.

use crate::Value;

fn literal(value: &Value, quote: &dyn Fn(&str) -> String) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => u8::from(*b).to_string(),
        Value::I32(_) | Value::I64(_) | Value::F32(_) | Value::F64(_) => value.to_text(),
        Value::Array(items) => items
            .iter()
            .map(|item| literal(item, quote))
            .collect::<Vec<_>>()
            .join(", "),
        other => quote(&other.to_text()),
    }
}

/// Substitute `?`, `:name` and `$n` placeholders outside quoted text with
/// quoted literals, in appearance order. `::` casts are left alone. Surplus
/// placeholders stay as written.
pub fn render_display_sql(sql: &str, bindings: &[Value], quote: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(sql.len() + bindings.len() * 4);
    let mut values = bindings.iter();
    let mut chars = sql.chars().peekable();
    let mut in_quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(open) = in_quote {
            if ch == open {
                in_quote = None;
            }
            out.push(ch);
            continue;
        }
        match ch {
            '\'' | '"' | '`' => {
                in_quote = Some(ch);
                out.push(ch);
            }
            ':' if chars.peek() == Some(&':') => {
                out.push_str("::");
                chars.next();
            }
            ':' | '$' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    let accepted = if ch == '$' {
                        next.is_ascii_digit()
                    } else {
                        next.is_alphanumeric() || next == '_'
                    };
                    if !accepted {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                if name.is_empty() {
                    out.push(ch);
                } else {
                    match values.next() {
                        Some(value) => out.push_str(&literal(value, &quote)),
                        None => {
                            out.push(ch);
                            out.push_str(&name);
                        }
                    }
                }
            }
            '?' => match values.next() {
                Some(value) => out.push_str(&literal(value, &quote)),
                None => out.push('?'),
            },
            _ => out.push(ch),
        }
    }
    out
}
