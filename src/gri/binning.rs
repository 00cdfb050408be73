//! Level arithmetic for the genomic range index.
//!
//! Intervals are classified by a level `lvl` in `0..=15`; level `lvl`
//! partitions the coordinate axis into bins of width `16^lvl`. An interval of
//! length `len` is stored at the smallest level whose bin width is at least
//! `len`, so a query scanning level `lvl` only has to look back `16^lvl`
//! positions before its own start to find every interval that could still
//! reach it. Bin numbers are never stored; they are implicit in
//! `(_gri_lvl, _gri_beg)` and a range scan on the composite index is cheaper
//! than bin-equality lookups.

use crate::err::{Error, Result};

/// Highest level; bins at this level are `16^15 = 2^60` positions wide.
pub const LEVEL_MAX: i64 = 15;

/// Width of a bin at the given level, `16^level`.
pub fn bin_width(level: i64) -> i64 {
    debug_assert!((0..=LEVEL_MAX).contains(&level));
    1i64 << (4 * level)
}

/// Validate a level floor parameter (`-1` = unset, otherwise `0..=15`).
pub fn check_floor(floor: i64) -> Result<()> {
    if floor != -1 && !(0..=LEVEL_MAX).contains(&floor) {
        return Err(Error::Config(format!(
            "level floor must be -1 or in 0..=15, got {}",
            floor
        )));
    }
    Ok(())
}

/// Level assigned to an interval of the given length.
///
/// `None` for negative lengths (the row is excluded from all range queries).
/// Zero-length intervals land on the floor level so that empty features are
/// still indexed and match abutting queries. Lengths beyond `16^15` clamp to
/// level 15; positions are specified up to `2^60 = 16^15`, so such lengths
/// are outside the supported coordinate domain anyway.
pub fn level_for_len(len: i64, floor: i64) -> Option<i64> {
    if len < 0 {
        return None;
    }
    let mut level = floor.max(0);
    while level < LEVEL_MAX && len > bin_width(level) {
        level += 1;
    }
    Some(level)
}

/// SQL `CASE` ladder over `_gri_len` equivalent to [`level_for_len`].
///
/// Used as the expression of the `_gri_lvl` generated column; a test holds
/// the two implementations to agreement.
pub fn level_case_sql(floor: i64) -> String {
    let floor = floor.max(0);
    let mut arms = vec!["CASE WHEN _gri_len IS NULL OR _gri_len < 0 THEN NULL".to_string()];
    for level in floor..LEVEL_MAX {
        arms.push(format!(
            "WHEN _gri_len <= {} THEN {}",
            bin_width(level),
            level
        ));
    }
    arms.push(format!("ELSE {} END", LEVEL_MAX));
    arms.join(" ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{bin_width, level_case_sql, level_for_len, LEVEL_MAX};

    #[test]
    fn bin_widths() {
        assert_eq!(bin_width(0), 1);
        assert_eq!(bin_width(1), 16);
        assert_eq!(bin_width(2), 256);
        assert_eq!(bin_width(LEVEL_MAX), 1 << 60);
    }

    #[rstest::rstest]
    #[case(-1, -1, None)]
    #[case(0, -1, Some(0))]
    #[case(1, -1, Some(0))]
    #[case(2, -1, Some(1))]
    #[case(16, -1, Some(1))]
    #[case(17, -1, Some(2))]
    #[case(256, -1, Some(2))]
    #[case(257, -1, Some(3))]
    #[case(0, 2, Some(2))]
    #[case(4096, 2, Some(3))]
    #[case(100, 15, Some(15))]
    #[case(1 << 60, -1, Some(15))]
    #[case((1 << 60) + 1, -1, Some(15))]
    fn levels(#[case] len: i64, #[case] floor: i64, #[case] expected: Option<i64>) {
        assert_eq!(level_for_len(len, floor), expected);
    }

    #[test]
    fn level_bounds_invariant() {
        for level in 1..=LEVEL_MAX {
            // lengths in (16^(level-1), 16^level] land exactly on `level`
            assert_eq!(level_for_len(bin_width(level - 1) + 1, -1), Some(level));
            assert_eq!(level_for_len(bin_width(level), -1), Some(level));
        }
    }

    #[test]
    fn check_floor_domain() {
        assert!(super::check_floor(-1).is_ok());
        assert!(super::check_floor(0).is_ok());
        assert!(super::check_floor(15).is_ok());
        assert!(super::check_floor(-2).is_err());
        assert!(super::check_floor(16).is_err());
    }

    /// The SQL CASE ladder and the Rust function must agree, including at the
    /// boundary lengths of every level.
    #[rstest::rstest]
    #[case(-1)]
    #[case(0)]
    #[case(3)]
    #[case(15)]
    fn sql_ladder_agrees(#[case] floor: i64) -> Result<(), anyhow::Error> {
        let conn = rusqlite::Connection::open_in_memory()?;
        conn.execute_batch("CREATE TABLE lengths(_gri_len INTEGER)")?;

        let mut lengths: Vec<Option<i64>> = vec![None, Some(-100), Some(-1), Some(0), Some(1)];
        for level in 0..=LEVEL_MAX {
            lengths.push(Some(bin_width(level)));
            lengths.push(Some(bin_width(level) + 1));
        }
        {
            let mut stmt = conn.prepare("INSERT INTO lengths(_gri_len) VALUES (?1)")?;
            for len in &lengths {
                stmt.execute(rusqlite::params![len])?;
            }
        }

        let sql = format!(
            "SELECT _gri_len, {} FROM lengths ORDER BY rowid",
            level_case_sql(floor)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<i64>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for ((len, sql_level), expected_len) in rows.iter().zip(&lengths) {
            assert_eq!(len, expected_len);
            let rust_level = len.and_then(|len| level_for_len(len, floor));
            assert_eq!(*sql_level, rust_level, "length {:?} floor {}", len, floor);
        }
        Ok(())
    }
}
