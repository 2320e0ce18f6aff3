//! Lineage resolution: scheduled scan, terminal path search, consolidation

mod consolidate;
mod path;
mod resolver;

pub use consolidate::{Consolidator, UnitOutcome};
pub use path::{find_nearby_with_label, find_terminal_column, is_terminal_column};
pub use resolver::LineageResolver;

use crate::store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Errors raised during resolution and consolidation
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Vertex not found in working graph: {0}")]
    VertexNotFound(String),

    #[error("Vertex {0} carries no guid")]
    MissingGuid(String),
}

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// A resolved `(input column, output column, process)` triple, the unit of
/// work handed to the consolidator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFlow {
    pub input_guid: String,
    pub output_guid: String,
    pub process_guid: String,
}

/// Tuning knobs for one resolution pass
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Depth bound for the lineage-mapping walk
    pub max_mapping_depth: usize,
    /// Hop bound when locating a column's enclosing table or file
    pub table_search_depth: usize,
    /// Hop bound when locating a column's schema container
    pub schema_search_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_mapping_depth: 20,
            table_search_depth: 2,
            schema_search_depth: 3,
        }
    }
}

/// Counters from one resolution pass. Distinguishes "nothing to do"
/// (skipped, unresolved, existing) from actual unit failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Process vertices enumerated in the working graph
    pub processes_scanned: usize,
    /// Process scans aborted by an error before any of their units ran
    pub processes_failed: usize,
    /// Column pairs resolved to a `(Cin, Cout, process)` triple
    pub flows_resolved: usize,
    /// Units newly promoted into the summary graph
    pub units_committed: usize,
    /// Units whose data flow was already recorded by an earlier run
    pub units_existing: usize,
    /// Units rolled back because of an error
    pub units_failed: usize,
    /// Candidates with no mapping predecessor belonging to the process
    pub candidates_skipped: usize,
    /// Candidates whose mapping chain reached no terminal column
    pub paths_unresolved: usize,
}
