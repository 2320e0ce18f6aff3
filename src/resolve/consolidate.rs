//! Promotion of resolved column pairs into the summary graph
//!
//! Every summary node carries a `nodeId` property equal to the originating
//! working-graph guid, so repeated runs find and reuse existing nodes. The
//! only exception is the subProcess node, whose `nodeId` is random: one
//! subProcess per recorded column pair.

use super::path::find_nearby_with_label;
use super::{ResolveError, ResolvedFlow, ResolverConfig};
use crate::model::{keys, node_label, EdgeLabel, TerminalKind, SCHEMA_CONTAINER_LABELS};
use crate::store::{GraphTx, Vertex, VertexId};
use tracing::debug;
use uuid::Uuid;

/// Outcome of one consolidation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Promoted,
    /// The data flow was recorded by an earlier run; nothing new written
    AlreadyRecorded,
}

/// Promotes one `(input column, output column, process)` triple into the
/// summary graph. All operations run inside the caller's pair of
/// transactions (working read, summary update), so an error rolls back the
/// whole unit.
pub struct Consolidator<'a> {
    config: &'a ResolverConfig,
}

impl<'a> Consolidator<'a> {
    pub fn new(config: &'a ResolverConfig) -> Self {
        Self { config }
    }

    pub fn promote(
        &self,
        wtx: &GraphTx<'_>,
        stx: &GraphTx<'_>,
        flow: &ResolvedFlow,
        process_guid: &str,
    ) -> Result<UnitOutcome, ResolveError> {
        let input = self.load_working(wtx, &flow.input_guid)?;
        let output = self.load_working(wtx, &flow.output_guid)?;
        let process = self.load_working(wtx, process_guid)?;

        let input_col = self.ensure_column(wtx, stx, &input)?;
        let output_col = self.ensure_column(wtx, stx, &output)?;

        // Idempotency gate: a dataFlow edge from the input column to a node
        // carrying this process guid means the pair is already recorded.
        for neighbor in stx.out_neighbors(input_col, EdgeLabel::DataFlow)? {
            if stx.property(neighbor.id, keys::PROCESS_GUID)?.as_deref() == Some(process_guid) {
                debug!(
                    input = %flow.input_guid,
                    process = %process_guid,
                    "data flow already recorded"
                );
                return Ok(UnitOutcome::AlreadyRecorded);
            }
        }

        // One subProcess per concrete column-pair invocation of the process.
        let sub_process = stx.create_vertex(node_label::SUMMARY_SUB_PROCESS, None)?;
        stx.set_property(sub_process, keys::NODE_ID, &Uuid::new_v4().to_string())?;
        stx.set_property(sub_process, keys::PROCESS_GUID, process_guid)?;
        if let Some(name) = wtx.property(process.id, &keys::instance(keys::DISPLAY_NAME))? {
            stx.set_property(sub_process, keys::DISPLAY_NAME, &name)?;
        }
        stx.create_edge(EdgeLabel::DataFlow, input_col, sub_process, None)?;
        stx.create_edge(EdgeLabel::DataFlow, sub_process, output_col, None)?;

        let process_node = self.ensure_process(wtx, stx, &process)?;
        stx.create_edge(EdgeLabel::SubProcessOf, sub_process, process_node, None)?;

        self.attach_table(wtx, stx, &input, input_col, process_node, false)?;
        self.attach_table(wtx, stx, &output, output_col, process_node, true)?;

        Ok(UnitOutcome::Promoted)
    }

    fn load_working(&self, wtx: &GraphTx<'_>, guid: &str) -> Result<Vertex, ResolveError> {
        wtx.vertex_by_guid(guid)?
            .ok_or_else(|| ResolveError::VertexNotFound(guid.to_string()))
    }

    /// Create-if-absent summary column for a working-graph column, copying
    /// its properties verbatim and enriching it with the display names of
    /// its nearest table/file and schema container, plus any assigned
    /// glossary term.
    fn ensure_column(
        &self,
        wtx: &GraphTx<'_>,
        stx: &GraphTx<'_>,
        column: &Vertex,
    ) -> Result<VertexId, ResolveError> {
        let guid = Self::require_guid(column)?;
        if let Some(existing) = stx.find_by_property(keys::NODE_ID, guid)? {
            return Ok(existing.id);
        }

        let node = stx.create_vertex(node_label::SUMMARY_COLUMN, None)?;
        stx.set_property(node, keys::NODE_ID, guid)?;
        for (key, value) in wtx.properties(column.id)? {
            stx.set_property(node, &key, &value)?;
        }

        let terminal_labels = TerminalKind::ALL.map(|k| k.label());
        if let Some(asset) =
            find_nearby_with_label(wtx, column.id, &terminal_labels, self.config.table_search_depth)?
        {
            if let Some(name) = wtx.property(asset.id, &keys::instance(keys::DISPLAY_NAME))? {
                stx.set_property(node, keys::TABLE_DISPLAY_NAME, &name)?;
            }
        }
        if let Some(container) = find_nearby_with_label(
            wtx,
            column.id,
            &SCHEMA_CONTAINER_LABELS,
            self.config.schema_search_depth,
        )? {
            if let Some(name) = wtx.property(container.id, &keys::instance(keys::DISPLAY_NAME))? {
                stx.set_property(node, keys::SCHEMA_DISPLAY_NAME, &name)?;
            }
        }

        for term in wtx.out_neighbors(column.id, EdgeLabel::SemanticAssignment)? {
            let term_node = self.ensure_copy(wtx, stx, &term, node_label::SUMMARY_GLOSSARY_TERM)?;
            if !stx.edge_exists(node, term_node, EdgeLabel::Semantic)? {
                stx.create_edge(EdgeLabel::Semantic, node, term_node, None)?;
            }
        }

        Ok(node)
    }

    /// Create-if-absent top-level summary process node keyed by the
    /// process guid.
    fn ensure_process(
        &self,
        wtx: &GraphTx<'_>,
        stx: &GraphTx<'_>,
        process: &Vertex,
    ) -> Result<VertexId, ResolveError> {
        let guid = Self::require_guid(process)?;
        if let Some(existing) = stx.find_by_property(keys::NODE_ID, guid)? {
            return Ok(existing.id);
        }
        let node = self.copy_vertex(wtx, stx, process, node_label::SUMMARY_PROCESS)?;
        stx.set_property(node, keys::PROCESS_GUID, guid)?;
        Ok(node)
    }

    /// Resolve the enclosing table/file of a column and wire it into the
    /// summary: table -> process data flow and column -> table containment.
    /// For the output side, bulk-import sibling columns that have no
    /// lineage mapping of their own.
    fn attach_table(
        &self,
        wtx: &GraphTx<'_>,
        stx: &GraphTx<'_>,
        column: &Vertex,
        column_node: VertexId,
        process_node: VertexId,
        is_output: bool,
    ) -> Result<(), ResolveError> {
        let terminal_labels = TerminalKind::ALL.map(|k| k.label());
        let Some(asset) =
            find_nearby_with_label(wtx, column.id, &terminal_labels, self.config.table_search_depth)?
        else {
            debug!(column = ?column.guid, "no enclosing table or file within bound");
            return Ok(());
        };

        let table_node = self.ensure_copy(wtx, stx, &asset, node_label::SUMMARY_TABLE)?;
        if !stx.edge_exists(table_node, process_node, EdgeLabel::DataFlow)? {
            stx.create_edge(EdgeLabel::DataFlow, table_node, process_node, None)?;
        }
        if !stx.edge_exists(column_node, table_node, EdgeLabel::IncludedIn)? {
            stx.create_edge(EdgeLabel::IncludedIn, column_node, table_node, None)?;
        }

        if is_output {
            self.import_siblings(wtx, stx, &asset, table_node)?;
        }
        Ok(())
    }

    /// Copy the output table's remaining working-graph columns into the
    /// summary. Compensates for columns that have no LineageMapping edge of
    /// their own and would otherwise never be promoted.
    fn import_siblings(
        &self,
        wtx: &GraphTx<'_>,
        stx: &GraphTx<'_>,
        asset: &Vertex,
        table_node: VertexId,
    ) -> Result<(), ResolveError> {
        let Some(kind) = TerminalKind::from_vertex_label(&asset.label) else {
            return Ok(());
        };
        for schema_type in wtx.out_neighbors(asset.id, kind.schema_edge())? {
            for sibling in wtx.in_neighbors(schema_type.id, EdgeLabel::AttributeForSchema)? {
                let Some(guid) = sibling.guid.as_deref() else {
                    continue;
                };
                if stx.find_by_property(keys::NODE_ID, guid)?.is_some() {
                    continue;
                }
                let node = self.copy_vertex(wtx, stx, &sibling, node_label::SUMMARY_COLUMN)?;
                stx.create_edge(EdgeLabel::IncludedIn, node, table_node, None)?;
            }
        }
        Ok(())
    }

    /// Create-if-absent summary node mirroring a working-graph vertex,
    /// deduplicated by nodeId.
    fn ensure_copy(
        &self,
        wtx: &GraphTx<'_>,
        stx: &GraphTx<'_>,
        source: &Vertex,
        label: &str,
    ) -> Result<VertexId, ResolveError> {
        let guid = Self::require_guid(source)?;
        if let Some(existing) = stx.find_by_property(keys::NODE_ID, guid)? {
            return Ok(existing.id);
        }
        self.copy_vertex(wtx, stx, source, label)
    }

    fn copy_vertex(
        &self,
        wtx: &GraphTx<'_>,
        stx: &GraphTx<'_>,
        source: &Vertex,
        label: &str,
    ) -> Result<VertexId, ResolveError> {
        let guid = Self::require_guid(source)?;
        let node = stx.create_vertex(label, None)?;
        stx.set_property(node, keys::NODE_ID, guid)?;
        for (key, value) in wtx.properties(source.id)? {
            stx.set_property(node, &key, &value)?;
        }
        Ok(node)
    }

    fn require_guid(vertex: &Vertex) -> Result<&str, ResolveError> {
        match vertex.guid.as_deref() {
            Some(guid) if !guid.is_empty() => Ok(guid),
            _ => Err(ResolveError::MissingGuid(vertex.id.to_string())),
        }
    }
}
