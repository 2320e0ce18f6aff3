//! Ingestion boundary: maps entity/relationship facts onto the working graph
//!
//! The event pipeline guarantees per-field completeness: an omitted optional
//! field means "clear this property". Vertex creation is insert-only
//! idempotent; a second fact with the same guid is a no-op.

use crate::model::{keys, EdgeLabel, LineageEntity, LineageRelationship};
use crate::store::{GraphStore, GraphTx, StoreError, VertexId};
use thiserror::Error;
use tracing::debug;

/// Errors raised while mapping facts into the working graph
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unknown relationship type: {0:?}")]
    UnknownRelationshipType(String),

    #[error("Entity not found in graph: {0}")]
    EntityNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of an upsert: whether the fact created anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    /// A vertex/edge with this guid already exists; nothing was written
    Existing,
}

/// Maps abstract provenance records into graph vertices and edges.
///
/// Holds an explicit store handle rather than an ambient connection; each
/// call runs in its own transaction.
pub struct GraphMapper<'a> {
    graph: &'a GraphStore,
}

impl<'a> GraphMapper<'a> {
    pub fn new(graph: &'a GraphStore) -> Self {
        Self { graph }
    }

    /// Insert a vertex for the entity unless one with its guid exists.
    ///
    /// On creation the vertex gets the entity's type label, the audit
    /// properties, and every instance property under the `vep` namespace.
    /// An existing vertex is left untouched.
    pub fn upsert_vertex(&self, entity: &LineageEntity) -> Result<UpsertOutcome, IngestError> {
        self.graph.update(|tx| {
            if tx.vertex_by_guid(&entity.guid)?.is_some() {
                debug!(guid = %entity.guid, "vertex already present, skipping");
                return Ok(UpsertOutcome::Existing);
            }

            let vertex = tx.create_vertex(&entity.type_name, Some(&entity.guid))?;
            Self::apply_properties(tx, entity, vertex)?;
            for (name, value) in &entity.properties {
                tx.set_property(vertex, &keys::instance(name), value)?;
            }
            Ok(UpsertOutcome::Created)
        })
    }

    /// Converge the vertex's audit properties to the incoming fact: present
    /// values are set, absent values remove any stored value.
    pub fn apply_properties(
        tx: &GraphTx<'_>,
        entity: &LineageEntity,
        vertex: VertexId,
    ) -> Result<(), IngestError> {
        tx.set_property(vertex, keys::ENTITY_GUID, &entity.guid)?;
        tx.set_property(vertex, keys::ENTITY_VERSION, &entity.version.to_string())?;

        Self::set_or_remove(tx, vertex, keys::ENTITY_CREATED_BY, entity.created_by.as_deref())?;
        Self::set_or_remove(
            tx,
            vertex,
            keys::ENTITY_CREATE_TIME,
            entity.create_time.map(|t| t.to_rfc3339()).as_deref(),
        )?;
        Self::set_or_remove(tx, vertex, keys::ENTITY_UPDATED_BY, entity.updated_by.as_deref())?;
        Self::set_or_remove(
            tx,
            vertex,
            keys::ENTITY_UPDATE_TIME,
            entity.update_time.map(|t| t.to_rfc3339()).as_deref(),
        )?;
        Ok(())
    }

    fn set_or_remove(
        tx: &GraphTx<'_>,
        vertex: VertexId,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), IngestError> {
        match value {
            Some(v) => tx.set_property(vertex, key, v)?,
            None => tx.remove_property(vertex, key)?,
        }
        Ok(())
    }

    /// Insert an edge for the relationship unless one with its guid exists.
    ///
    /// Fails with `UnknownRelationshipType` when the type label is empty or
    /// not part of the engine's vocabulary, and with `EntityNotFound` when
    /// either endpoint has not been ingested yet.
    pub fn upsert_edge(&self, relationship: &LineageRelationship) -> Result<UpsertOutcome, IngestError> {
        let label = EdgeLabel::from_label(&relationship.type_name).ok_or_else(|| {
            IngestError::UnknownRelationshipType(relationship.type_name.clone())
        })?;

        self.graph.update(|tx| {
            if tx.edge_guid_exists(&relationship.guid)? {
                debug!(guid = %relationship.guid, "edge already present, skipping");
                return Ok(UpsertOutcome::Existing);
            }

            let from = tx
                .vertex_by_guid(&relationship.from_guid)?
                .ok_or_else(|| IngestError::EntityNotFound(relationship.from_guid.clone()))?;
            let to = tx
                .vertex_by_guid(&relationship.to_guid)?
                .ok_or_else(|| IngestError::EntityNotFound(relationship.to_guid.clone()))?;

            tx.create_edge(label, from.id, to.id, Some(&relationship.guid))?;
            Ok(UpsertOutcome::Created)
        })
    }
}
