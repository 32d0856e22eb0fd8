//! SQL identifier sanitization
//!
//! Every identifier that reaches a query string goes through quoting; names
//! that originate from caller input are validated first.

use regex::Regex;

use crate::error::{EngineError, Result};

/// Quote a SQL identifier to make it safe for use in queries
///
/// # Example
/// ```
/// use dynaquery::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("my_table"), "\"my_table\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    // Escape any double quotes in the identifier by doubling them
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Quote a table-qualified column reference (`"table"."column"`)
pub fn quote_qualified(table: &str, column: &str) -> String {
    format!("{}.{}", quote_identifier(table), quote_identifier(column))
}

/// Validate a column or table name supplied by a caller
///
/// Must start with a letter and contain only letters, numbers, and
/// underscores. Reserved words are acceptable because every identifier is
/// quoted before interpolation.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EngineError::invalid_identifier("(empty)"));
    }

    let re = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
    if !re.is_match(name) {
        return Err(EngineError::invalid_identifier(name));
    }

    Ok(())
}
