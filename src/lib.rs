//! Tributary: Column-Level Lineage Graph Consolidation Engine
//!
//! Ingests raw technical-metadata provenance facts (processes, ports,
//! schemas, column mapping edges) into a working property graph, resolves
//! end-to-end column-level lineage paths across process boundaries, and
//! promotes the findings into a deduplicated, query-oriented summary graph.
//!
//! # Core Concepts
//!
//! - **Working graph**: append-only mirror of ingested facts, source of truth
//! - **Summary graph**: derived, consolidated graph keyed by `nodeId`,
//!   fully reconstructible by re-running resolution
//! - **Resolution pass**: sequential batch scan; each resolved column pair
//!   is its own transactional unit of work
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tributary::{GraphStore, LineageResolver};
//!
//! let working = Arc::new(GraphStore::open_in_memory().unwrap());
//! let summary = Arc::new(GraphStore::open_in_memory().unwrap());
//! let resolver = LineageResolver::new(working, summary);
//! let report = resolver.run().unwrap();
//! assert_eq!(report.processes_scanned, 0);
//! ```

pub mod ingest;
pub mod model;
pub mod resolve;
pub mod store;

pub use ingest::{GraphMapper, IngestError, UpsertOutcome};
pub use model::{
    keys, node_label, port_type, EdgeLabel, LineageEntity, LineageEvent, LineageRelationship,
    TerminalKind,
};
pub use resolve::{LineageResolver, ResolveError, ResolveResult, ResolverConfig, RunReport};
pub use store::{GraphStore, GraphTx, StoreError, StoreResult, Vertex, VertexId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
