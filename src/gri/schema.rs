//! Emitter for creating a genomic range index on an existing table.

use crate::common::{check_identifier, check_not_reserved, quote_identifier};
use crate::err::{Error, Result};

use super::binning;

/// Name of the composite index backing the range index of `table`.
pub fn gri_index_name(table: &str) -> String {
    format!("_gri_{}", table)
}

/// Emit the SQL script that adds a genomic range index to `table`.
///
/// The script adds four virtual generated columns (`_gri_rid`, `_gri_beg`,
/// `_gri_len`, `_gri_lvl`) and the composite index
/// `_gri_<table>(_gri_rid, _gri_lvl, _gri_beg)`. The three coordinate
/// expressions are interpolated verbatim; they may be bare column names or
/// arithmetic over the table's columns. `floor` collapses all levels below it
/// into one (`-1` = no floor).
///
/// The script must be executed within a single transaction; if any statement
/// fails the caller rolls back. Re-running against an already indexed table
/// fails with the host engine's duplicate-column error.
pub fn create_genomic_range_index_sql(
    table: &str,
    rid_expr: &str,
    beg_expr: &str,
    end_expr: &str,
    floor: i64,
) -> Result<String> {
    check_identifier("table", table)?;
    check_not_reserved("table", table)?;
    binning::check_floor(floor)?;
    for (what, expr) in [("rid", rid_expr), ("begin", beg_expr), ("end", end_expr)] {
        if expr.trim().is_empty() {
            return Err(Error::Schema(format!("empty {} expression", what)));
        }
    }

    let qtable = quote_identifier(table);
    let qindex = quote_identifier(&gri_index_name(table));
    let sql = format!(
        "ALTER TABLE {qtable} ADD COLUMN _gri_rid AS ({rid_expr}) VIRTUAL;\n\
         ALTER TABLE {qtable} ADD COLUMN _gri_beg INTEGER AS ({beg_expr}) VIRTUAL;\n\
         ALTER TABLE {qtable} ADD COLUMN _gri_len INTEGER AS (({end_expr})-({beg_expr})) VIRTUAL;\n\
         ALTER TABLE {qtable} ADD COLUMN _gri_lvl INTEGER AS ({level_expr}) VIRTUAL;\n\
         CREATE INDEX {qindex} ON {qtable}(_gri_rid, _gri_lvl, _gri_beg);",
        level_expr = binning::level_case_sql(floor),
    );
    tracing::debug!("create range index on {}: {}", table, sql);
    Ok(sql)
}
