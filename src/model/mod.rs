//! Data model for raw lineage facts and graph vocabulary

mod entity;
mod labels;

pub mod keys;

pub use entity::{LineageEntity, LineageEvent, LineageRelationship};
pub use labels::{node_label, port_type, EdgeLabel, TerminalKind, SCHEMA_CONTAINER_LABELS};
