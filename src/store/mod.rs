//! Embedded transactional property-graph store
//!
//! The engine works against two independent store instances: the working
//! graph (raw facts) and the summary graph (consolidated output). Each
//! unit of work opens its own transaction on each graph and commits or
//! rolls back at the unit boundary.

mod graph;

pub use graph::{GraphStore, GraphTx, Vertex, VertexId};

use thiserror::Error;

/// Errors that can occur during graph store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
