//! Query planner emitting rowid-set subqueries over a genomic range index.
//!
//! The planner emits SQL rather than executing it: the emitted subquery is
//! compiled once by the caller and re-bound many times as a prepared
//! statement. When the level ceiling is not supplied, the planner probes the
//! index for the set of populated levels and bakes that set into the emitted
//! text. Writes that later extend the level range therefore invalidate the
//! emission and the caller must regenerate; supplying an explicit ceiling
//! skips the probe and stays correct under any future writes bounded by it.

use itertools::Itertools;
use rusqlite::Connection;

use crate::common::{check_identifier, quote_identifier};
use crate::err::{Error, Result};

use super::binning;
use super::schema::gri_index_name;

/// Coordinate expressions and level bounds for emitting a range query.
///
/// The three `q*` expressions are interpolated verbatim into the emitted SQL;
/// the defaults are the positional parameters `?1`, `?2`, `?3`. They may
/// reference columns of other tables in the enclosing query, which is how
/// range joins are written.
#[derive(Debug, Clone)]
pub struct GriQueryOptions {
    /// Expression for the query reference sequence (chromosome or rid).
    pub qrid: String,
    /// Expression for the query interval begin position.
    pub qbeg: String,
    /// Expression for the query interval end position.
    pub qend: String,
    /// Highest level to scan; `-1` probes the index instead.
    pub ceiling: i64,
    /// Lowest level to scan; `-1` takes the lowest populated level.
    pub floor: i64,
}

impl Default for GriQueryOptions {
    fn default() -> Self {
        Self {
            qrid: "?1".to_string(),
            qbeg: "?2".to_string(),
            qend: "?3".to_string(),
            ceiling: -1,
            floor: -1,
        }
    }
}

/// Levels observed populated in a range index, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GriLevels {
    /// Populated levels, ascending; empty for a table without indexed rows.
    pub levels: Vec<i64>,
}

impl GriLevels {
    /// Lowest populated level.
    pub fn floor(&self) -> Option<i64> {
        self.levels.first().copied()
    }

    /// Highest populated level.
    pub fn ceiling(&self) -> Option<i64> {
        self.levels.last().copied()
    }

    /// Check a caller-cached ceiling against the observed maximum level.
    pub fn require_ceiling(&self, ceiling: i64) -> Result<()> {
        if let Some(max) = self.ceiling() {
            if ceiling < max {
                return Err(Error::Integrity(format!(
                    "ceiling {} is below the observed maximum level {}",
                    ceiling, max
                )));
            }
        }
        Ok(())
    }
}

/// An emitted range subquery together with the level bounds baked into it,
/// so callers can cache the SQL and invalidate knowingly.
#[derive(Debug, Clone)]
pub struct GriQuery {
    /// Parenthesized `SELECT _rowid_ …` subquery.
    pub sql: String,
    /// Effective floor baked into the SQL.
    pub floor: i64,
    /// Effective ceiling baked into the SQL.
    pub ceiling: i64,
    /// Exact levels scanned, ascending.
    pub levels: Vec<i64>,
}

/// Probe the range index of `table` for the set of populated levels.
///
/// Issues one `SELECT DISTINCT` range-scanning the composite index; blocks
/// on I/O like any read. Also verifies that `table` is an ordinary rowid
/// table, since the emitted subqueries select `_rowid_`.
pub fn probe_gri_levels(conn: &Connection, table: &str) -> Result<GriLevels> {
    check_identifier("table", table)?;
    let without_rowid: i64 = conn
        .query_row(
            "SELECT wr FROM pragma_table_list WHERE name = ?1 AND schema IN ('main', 'temp') \
             LIMIT 1",
            rusqlite::params![table],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::Schema(format!("no such table: {}", table))
            }
            e => Error::Probe(e.to_string()),
        })?;
    if without_rowid != 0 {
        return Err(Error::Schema(format!(
            "table {} is a WITHOUT ROWID table, which cannot carry a genomic range index",
            table
        )));
    }

    let sql = format!(
        "SELECT DISTINCT _gri_lvl FROM {} INDEXED BY {} WHERE _gri_lvl IS NOT NULL \
         ORDER BY _gri_lvl",
        quote_identifier(table),
        quote_identifier(&gri_index_name(table)),
    );
    let probe = || -> rusqlite::Result<Vec<i64>> {
        let mut stmt = conn.prepare(&sql)?;
        let levels = stmt.query_map([], |row| row.get(0))?.collect();
        levels
    };
    let levels = probe().map_err(|e| Error::Probe(format!("{} (while probing {})", e, table)))?;
    tracing::trace!("probed {}: populated levels {:?}", table, levels);
    Ok(GriLevels { levels })
}

/// Emit the subquery yielding the rowids of rows in `table` whose interval is
/// non-disjoint from the query interval.
///
/// The emitted text is a parenthesized `SELECT _rowid_ …` meant to be
/// composed as `WHERE rowid IN (…)` or joined against; its result is
/// ascending by rowid. Matching is `NOT (qbeg > _gri_beg + _gri_len OR
/// qend < _gri_beg)` on equal rid, so abutting intervals match; callers
/// tighten to strict overlap or containment in their outer `WHERE`.
///
/// With `ceiling >= 0` the subquery covers the full `[max(0, floor),
/// ceiling]` level range without touching the database. Otherwise the index
/// is probed and only the populated levels are emitted; see the module
/// documentation for the invalidation consequences.
pub fn genomic_range_rowids_sql(
    conn: &Connection,
    table: &str,
    options: &GriQueryOptions,
) -> Result<GriQuery> {
    check_identifier("table", table)?;
    binning::check_floor(options.floor)?;
    let floor = options.floor.max(0);

    let levels: Vec<i64> = if options.ceiling >= 0 {
        if options.ceiling > binning::LEVEL_MAX {
            return Err(Error::Config(format!(
                "level ceiling must be -1 or in 0..=15, got {}",
                options.ceiling
            )));
        }
        if options.ceiling < floor {
            return Err(Error::Config(format!(
                "level ceiling {} is below floor {}",
                options.ceiling, floor
            )));
        }
        (floor..=options.ceiling).collect()
    } else {
        let probed = probe_gri_levels(conn, table)?;
        let levels: Vec<i64> = probed
            .levels
            .into_iter()
            .filter(|&level| options.floor < 0 || level >= options.floor)
            .collect();
        if levels.is_empty() {
            // No indexed rows yet: emit the floor level alone so the
            // statement still carries the caller's parameter expressions.
            // Stale as soon as anything is written, like any probed emission.
            vec![floor]
        } else {
            levels
        }
    };

    let qtable = quote_identifier(table);
    let qindex = quote_identifier(&gri_index_name(table));
    let branches = levels
        .iter()
        .map(|&level| {
            format!(
                "SELECT _rowid_ FROM {qtable} INDEXED BY {qindex} \
                 WHERE _gri_rid = ({qrid}) AND _gri_lvl = {level} \
                 AND _gri_beg BETWEEN ({qbeg}) - {width} AND ({qend}) \
                 AND (_gri_beg + _gri_len) >= ({qbeg})",
                qrid = options.qrid,
                qbeg = options.qbeg,
                qend = options.qend,
                width = binning::bin_width(level),
            )
        })
        .join("\n  UNION ALL\n  ");
    let sql = format!("(SELECT _rowid_ FROM\n  ({})\n ORDER BY _rowid_)", branches);
    tracing::debug!("range query on {} over levels {:?}", table, levels);

    Ok(GriQuery {
        sql,
        floor: levels[0],
        ceiling: levels[levels.len() - 1],
        levels,
    })
}
