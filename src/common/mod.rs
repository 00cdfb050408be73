//! Common SQL-building helpers.

use std::sync::OnceLock;

use regex::Regex;

use crate::err::{Error, Result};

/// Prefix reserved for the columns, indexes, and tables maintained by the
/// extension.
pub const GRI_PREFIX: &str = "_gri_";

static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();

/// Validate a table or schema name against a conservative identifier pattern.
///
/// Coordinate expressions are deliberately *not* validated; they pass through
/// to the emitted SQL verbatim so that arithmetic coordinate sources keep
/// working. Sanitizing those is the caller's responsibility.
pub fn check_identifier(what: &str, name: &str) -> Result<()> {
    let re = IDENTIFIER_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"));
    if !re.is_match(name) {
        return Err(Error::Schema(format!(
            "{} name {:?} is not a plain identifier",
            what, name
        )));
    }
    Ok(())
}

/// Validate that a caller-supplied name does not collide with the reserved
/// `_gri_` namespace.
pub fn check_not_reserved(what: &str, name: &str) -> Result<()> {
    if name.starts_with(GRI_PREFIX) {
        return Err(Error::Schema(format!(
            "{} name {:?} collides with the reserved {:?} prefix",
            what, name, GRI_PREFIX
        )));
    }
    Ok(())
}

/// Double-quote an identifier for interpolation into SQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Render a TEXT value as a single-quoted SQL literal.
pub fn quote_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render an optional TEXT value as a SQL literal, `NULL` when absent.
pub fn quote_text_or_null(value: Option<&str>) -> String {
    match value {
        Some(value) => quote_text(value),
        None => "NULL".to_string(),
    }
}

/// Render the `"schema".` prefix for an attached database, empty for `main`.
pub fn schema_prefix(schema: Option<&str>) -> Result<String> {
    match schema {
        Some(schema) => {
            check_identifier("schema", schema)?;
            Ok(format!("{}.", quote_identifier(schema)))
        }
        None => Ok(String::new()),
    }
}
