//! SQL quoting helpers for identifiers and literals built at runtime.
//!
//! Ledger table and column names come from configuration, and migration
//! filenames are written as string literals, so both go through here before
//! being spliced into a statement.

/// Quote one identifier, doubling embedded double quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified name component by component.
///
/// ```
/// use sd_core::sql::quote_qualified;
/// assert_eq!(quote_qualified("schema_info"), r#""schema_info""#);
/// assert_eq!(quote_qualified("ops.schema_info"), r#""ops"."schema_info""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Render a value as a single-quoted SQL string literal.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Split `schema.table` on the last dot; unqualified names live in `main`.
pub fn split_qualified(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    }
}

/// Schema part of a qualified name, if the name has one.
pub fn schema_of(name: &str) -> Option<&str> {
    name.rfind('.').map(|pos| &name[..pos])
}

#[cfg(test)]
#[path = "sql_test.rs"]
mod tests;
