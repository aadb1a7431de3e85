//! Shared database schema, migrations, and query builders.
//!
//! Every builder returns a [`Built`] pair of SQL text and bind values; the
//! domain layer executes them against rusqlite.

pub mod assignees;
pub mod buckets;
pub mod link_shares;
pub mod lists;
pub mod migrations;
pub mod namespaces;
pub mod saved_filters;
pub mod shares;
pub mod tables;
pub mod tasks;
pub mod teams;
pub mod users;

// Re-export tables for convenience
pub use tables::*;

/// SQL text plus its positional bind values.
pub type Built = (String, sea_query::Values);

/// A paged SELECT together with the COUNT query for the same filter.
pub struct BuiltListQuery {
    pub count_query: Built,
    pub select_query: Built,
}
