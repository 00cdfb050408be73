//! Genomic range index: interval-overlap queries over ordinary relational
//! primitives.
//!
//! The index is nothing exotic on the host engine's side: four virtual
//! generated columns and one composite B-tree index ([`schema`]). The
//! engineering sits in the binning scheme making overlap queries logarithmic
//! in the maximum feature length ([`binning`]) and in the planner emitting
//! subqueries shaped to the observed length distribution ([`query`]).

pub mod binning;
pub mod query;
pub mod schema;

pub use query::{
    genomic_range_rowids_sql, probe_gri_levels, GriLevels, GriQuery, GriQueryOptions,
};
pub use schema::create_genomic_range_index_sql;
