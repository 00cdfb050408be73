//! Reference-sequence catalog: the `_gri_refseq` table and its emitters.

pub mod data;

use indexmap::IndexMap;
use itertools::Itertools;
use rusqlite::Connection;

use crate::common::{quote_text, quote_text_or_null, schema_prefix};
use crate::err::{Error, Result};

/// Genomic reference sequence metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RefSeq {
    /// Reference-sequence id; `-1` lets the database auto-assign on insert.
    pub rid: i64,
    /// Sequence name, e.g. `chr1`.
    pub name: String,
    /// Sequence length in base pairs.
    pub length: i64,
    /// Assembly the sequence belongs to, if known.
    pub assembly: Option<String>,
    /// refget sequence digest, if known.
    pub refget_id: Option<String>,
    /// Free-form metadata; must be a JSON object.
    pub meta_json: serde_json::Value,
}

impl RefSeq {
    /// A sequence with auto-assigned rid and empty metadata.
    pub fn new(name: &str, length: i64) -> Self {
        Self {
            rid: -1,
            name: name.to_string(),
            length,
            assembly: None,
            refget_id: None,
            meta_json: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Idempotent DDL for the catalog table and its scoped-uniqueness index.
fn catalog_ddl(prefix: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {prefix}_gri_refseq(\n\
         _gri_rid INTEGER PRIMARY KEY,\n\
         gri_refseq_name TEXT NOT NULL,\n\
         gri_refseq_length INTEGER NOT NULL,\n\
         gri_assembly TEXT,\n\
         gri_refget_id TEXT,\n\
         gri_refseq_meta_json TEXT DEFAULT '{{}}');\n\
         CREATE UNIQUE INDEX IF NOT EXISTS {prefix}_gri_refseq_name ON \
         _gri_refseq(gri_refseq_name, COALESCE(gri_assembly, ''));"
    )
}

fn insert_sql(
    prefix: &str,
    rid: i64,
    name: &str,
    length: i64,
    assembly: Option<&str>,
    refget_id: Option<&str>,
    meta_json: &str,
) -> String {
    let rid = if rid == -1 {
        "NULL".to_string()
    } else {
        rid.to_string()
    };
    format!(
        "INSERT INTO {prefix}_gri_refseq(_gri_rid, gri_refseq_name, gri_refseq_length, \
         gri_assembly, gri_refget_id, gri_refseq_meta_json) VALUES({rid}, {name}, {length}, \
         {assembly}, {refget}, {meta});",
        name = quote_text(name),
        assembly = quote_text_or_null(assembly),
        refget = quote_text_or_null(refget_id),
        meta = quote_text(meta_json),
    )
}

/// Emit SQL that creates the catalog (idempotently) and inserts one sequence.
///
/// `schema` addresses an attached database; `None` targets `main`.
pub fn put_refseq_sql(refseq: &RefSeq, schema: Option<&str>) -> Result<String> {
    if refseq.name.is_empty() {
        return Err(Error::Config("reference sequence name is empty".to_string()));
    }
    if refseq.length < 0 {
        return Err(Error::Config(format!(
            "reference sequence {} has negative length {}",
            refseq.name, refseq.length
        )));
    }
    if refseq.rid < -1 {
        return Err(Error::Config(format!(
            "reference sequence rid must be -1 (auto-assign) or nonnegative, got {}",
            refseq.rid
        )));
    }
    if !refseq.meta_json.is_object() {
        return Err(Error::Config(format!(
            "meta_json for {} must be a JSON object",
            refseq.name
        )));
    }
    let prefix = schema_prefix(schema)?;
    let meta = serde_json::to_string(&refseq.meta_json)
        .map_err(|e| Error::Config(format!("meta_json for {}: {}", refseq.name, e)))?;
    Ok(format!(
        "{}\n{}",
        catalog_ddl(&prefix),
        insert_sql(
            &prefix,
            refseq.rid,
            &refseq.name,
            refseq.length,
            refseq.assembly.as_deref(),
            refseq.refget_id.as_deref(),
            &meta,
        )
    ))
}

/// Emit SQL that creates the catalog (idempotently) and bulk-loads a bundled
/// assembly. Rids are auto-assigned 1-based in assembly order on a fresh
/// catalog.
pub fn put_assembly_sql(assembly: &str, schema: Option<&str>) -> Result<String> {
    let sequences = data::bundled_assembly(assembly)
        .ok_or_else(|| Error::Config(format!("unknown bundled assembly {:?}", assembly)))?;
    let prefix = schema_prefix(schema)?;
    let inserts = sequences
        .iter()
        .map(|seq| insert_sql(&prefix, -1, seq.name, seq.length, Some(assembly), None, "{}"))
        .join("\n");
    tracing::debug!("bulk-load assembly {} ({} sequences)", assembly, sequences.len());
    Ok(format!("{}\n{}", catalog_ddl(&prefix), inserts))
}

fn select_refseqs(
    conn: &Connection,
    assembly: Option<&str>,
    schema: Option<&str>,
) -> Result<Vec<RefSeq>> {
    let prefix = schema_prefix(schema)?;
    let sql = format!(
        "SELECT _gri_rid, gri_refseq_name, gri_refseq_length, gri_assembly, gri_refget_id, \
         gri_refseq_meta_json FROM {prefix}_gri_refseq{filter} ORDER BY _gri_rid",
        filter = assembly.map_or("", |_| " WHERE gri_assembly = ?1"),
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(assembly.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(rid, name, length, assembly, refget_id, meta)| {
            let meta_json: serde_json::Value = match meta {
                Some(text) => serde_json::from_str(&text).map_err(|e| {
                    Error::Schema(format!("invalid gri_refseq_meta_json for rid {}: {}", rid, e))
                })?,
                None => serde_json::Value::Object(serde_json::Map::new()),
            };
            if !meta_json.is_object() {
                return Err(Error::Schema(format!(
                    "gri_refseq_meta_json for rid {} is not a JSON object",
                    rid
                )));
            }
            Ok(RefSeq {
                rid,
                name,
                length,
                assembly,
                refget_id,
                meta_json,
            })
        })
        .collect()
}

/// Snapshot the catalog keyed by rid, optionally restricted to one assembly.
///
/// The snapshot assumes `_gri_refseq` is read-only from here on; it is a
/// plain copy, not a live view.
pub fn refseqs_by_rid(
    conn: &Connection,
    assembly: Option<&str>,
    schema: Option<&str>,
) -> Result<IndexMap<i64, RefSeq>> {
    Ok(select_refseqs(conn, assembly, schema)?
        .into_iter()
        .map(|refseq| (refseq.rid, refseq))
        .collect())
}

/// Snapshot the catalog keyed by sequence name.
pub fn refseqs_by_name(
    conn: &Connection,
    assembly: Option<&str>,
    schema: Option<&str>,
) -> Result<IndexMap<String, RefSeq>> {
    Ok(select_refseqs(conn, assembly, schema)?
        .into_iter()
        .map(|refseq| (refseq.name.clone(), refseq))
        .collect())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::db::config::Config;
    use crate::db::open::open;
    use crate::err::Error;

    use super::{put_assembly_sql, put_refseq_sql, refseqs_by_name, refseqs_by_rid, RefSeq};

    fn memory_db() -> Result<rusqlite::Connection, anyhow::Error> {
        Ok(open(
            ":memory:",
            rusqlite::OpenFlags::default(),
            &Config::default(),
        )?)
    }

    #[test]
    fn assembly_load_and_lookup() -> Result<(), anyhow::Error> {
        let conn = memory_db()?;
        conn.execute_batch(&put_assembly_sql("GRCh38_no_alt_analysis_set", None)?)?;

        let by_name = refseqs_by_name(&conn, None, None)?;
        assert!(by_name.len() >= 24);
        for chrom in (1..=22)
            .map(|i| format!("chr{}", i))
            .chain(["chrX", "chrY", "chrM"].map(String::from))
        {
            assert!(by_name.contains_key(&chrom), "missing {}", chrom);
        }
        let chr3 = &by_name["chr3"];
        assert_eq!(chr3.rid, 3);
        assert_eq!(chr3.length, 198_295_559);
        assert_eq!(chr3.assembly.as_deref(), Some("GRCh38_no_alt_analysis_set"));
        assert_eq!(by_name["chrM"].length, 16_569);

        let by_rid = refseqs_by_rid(&conn, Some("GRCh38_no_alt_analysis_set"), None)?;
        assert_eq!(by_rid[&1].name, "chr1");
        assert_eq!(by_rid.len(), by_name.len());
        Ok(())
    }

    #[test]
    fn unknown_assembly_rejected() {
        assert!(matches!(
            put_assembly_sql("GRCh99", None),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn put_get_roundtrip() -> Result<(), anyhow::Error> {
        let conn = memory_db()?;
        let mut refseq = RefSeq::new("chr1", 248_956_422);
        refseq.assembly = Some("GRCh38".to_string());
        refseq.refget_id = Some("2648ae1bacce4ec4b6cf337dcae37816".to_string());
        refseq.meta_json = serde_json::json!({"alias": "NC_000001.11", "circular": false});
        conn.execute_batch(&put_refseq_sql(&refseq, None)?)?;

        let by_name = refseqs_by_name(&conn, None, None)?;
        let stored = &by_name["chr1"];
        assert_eq!(stored.length, refseq.length);
        assert_eq!(stored.assembly, refseq.assembly);
        assert_eq!(stored.refget_id, refseq.refget_id);
        // canonical serialization round-trips byte for byte
        assert_eq!(
            serde_json::to_string(&stored.meta_json)?,
            serde_json::to_string(&refseq.meta_json)?
        );
        assert!(stored.rid >= 1);
        Ok(())
    }

    #[test]
    fn explicit_rid_preserved() -> Result<(), anyhow::Error> {
        let conn = memory_db()?;
        let mut refseq = RefSeq::new("chrTest", 1000);
        refseq.rid = 42;
        conn.execute_batch(&put_refseq_sql(&refseq, None)?)?;
        let by_rid = refseqs_by_rid(&conn, None, None)?;
        assert_eq!(by_rid[&42].name, "chrTest");
        Ok(())
    }

    #[test]
    fn name_unique_within_assembly_scope() -> Result<(), anyhow::Error> {
        let conn = memory_db()?;
        let mut a = RefSeq::new("chr1", 1000);
        a.assembly = Some("asm1".to_string());
        conn.execute_batch(&put_refseq_sql(&a, None)?)?;
        // same name, different assembly: allowed
        let mut b = RefSeq::new("chr1", 2000);
        b.assembly = Some("asm2".to_string());
        conn.execute_batch(&put_refseq_sql(&b, None)?)?;
        // same name and assembly: rejected by the unique index
        assert!(conn.execute_batch(&put_refseq_sql(&a, None)?).is_err());

        let by_rid = refseqs_by_rid(&conn, Some("asm2"), None)?;
        assert_eq!(by_rid.len(), 1);
        Ok(())
    }

    #[test]
    fn attached_schema_addressing() -> Result<(), anyhow::Error> {
        let conn = memory_db()?;
        conn.execute_batch("ATTACH ':memory:' AS aux")?;
        conn.execute_batch(&put_refseq_sql(&RefSeq::new("chrZ", 7), Some("aux"))?)?;
        let by_name = refseqs_by_name(&conn, None, Some("aux"))?;
        assert_eq!(by_name["chrZ"].length, 7);
        // nothing landed in main
        assert!(refseqs_by_name(&conn, None, None).is_err());
        Ok(())
    }

    #[rstest::rstest]
    #[case("", 100, -1, serde_json::json!({}))]
    #[case("chr1", -5, -1, serde_json::json!({}))]
    #[case("chr1", 100, -2, serde_json::json!({}))]
    #[case("chr1", 100, -1, serde_json::json!([1, 2]))]
    fn put_validation(
        #[case] name: &str,
        #[case] length: i64,
        #[case] rid: i64,
        #[case] meta_json: serde_json::Value,
    ) {
        let mut refseq = RefSeq::new(name, length);
        refseq.rid = rid;
        refseq.meta_json = meta_json;
        assert!(matches!(put_refseq_sql(&refseq, None), Err(Error::Config(_))));
    }
}
