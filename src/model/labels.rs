//! Graph vocabulary: edge labels, terminal asset kinds, node labels
//!
//! Traversal code dispatches on these closed enums; the string form only
//! appears at the graph boundary (storage rows and incoming facts).

use serde::{Deserialize, Serialize};

/// Relationship types the engine stores and traverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeLabel {
    /// process -> port
    ProcessPort,
    /// outer port -> delegated (implementing) port
    PortDelegation,
    /// port -> schema type
    PortSchema,
    /// attribute -> owning schema type
    AttributeForSchema,
    /// relational table -> its table type
    SchemaAttributeType,
    /// data file -> its tabular schema type
    AssetSchemaType,
    /// source attribute -> target attribute (column-to-column transformation)
    LineageMapping,
    /// asset -> glossary term
    SemanticAssignment,
    /// summary graph: asset -> process, or subProcess -> asset
    DataFlow,
    /// summary graph: column -> table
    IncludedIn,
    /// summary graph: asset -> glossary term
    Semantic,
    /// summary graph: subProcess -> owning process
    SubProcessOf,
}

impl EdgeLabel {
    /// The label string stored on graph edges
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeLabel::ProcessPort => "ProcessPort",
            EdgeLabel::PortDelegation => "PortDelegation",
            EdgeLabel::PortSchema => "PortSchema",
            EdgeLabel::AttributeForSchema => "AttributeForSchema",
            EdgeLabel::SchemaAttributeType => "SchemaAttributeType",
            EdgeLabel::AssetSchemaType => "AssetSchemaType",
            EdgeLabel::LineageMapping => "LineageMapping",
            EdgeLabel::SemanticAssignment => "SemanticAssignment",
            EdgeLabel::DataFlow => "dataFlow",
            EdgeLabel::IncludedIn => "includedIn",
            EdgeLabel::Semantic => "semantic",
            EdgeLabel::SubProcessOf => "subProcessOf",
        }
    }

    /// Map an incoming relationship type name to a label, if known
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ProcessPort" => Some(EdgeLabel::ProcessPort),
            "PortDelegation" => Some(EdgeLabel::PortDelegation),
            "PortSchema" => Some(EdgeLabel::PortSchema),
            "AttributeForSchema" => Some(EdgeLabel::AttributeForSchema),
            "SchemaAttributeType" => Some(EdgeLabel::SchemaAttributeType),
            "AssetSchemaType" => Some(EdgeLabel::AssetSchemaType),
            "LineageMapping" => Some(EdgeLabel::LineageMapping),
            "SemanticAssignment" => Some(EdgeLabel::SemanticAssignment),
            "dataFlow" => Some(EdgeLabel::DataFlow),
            "includedIn" => Some(EdgeLabel::IncludedIn),
            "semantic" => Some(EdgeLabel::Semantic),
            "subProcessOf" => Some(EdgeLabel::SubProcessOf),
            _ => None,
        }
    }
}

impl std::fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The asset kinds a lineage-mapping chain can terminate at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    RelationalTable,
    DataFile,
}

impl TerminalKind {
    pub const ALL: [TerminalKind; 2] = [TerminalKind::RelationalTable, TerminalKind::DataFile];

    /// Vertex label of the terminal asset
    pub fn label(&self) -> &'static str {
        match self {
            TerminalKind::RelationalTable => "RelationalTable",
            TerminalKind::DataFile => "DataFile",
        }
    }

    /// Edge label connecting the asset to the schema type its columns hang off
    pub fn schema_edge(&self) -> EdgeLabel {
        match self {
            TerminalKind::RelationalTable => EdgeLabel::SchemaAttributeType,
            TerminalKind::DataFile => EdgeLabel::AssetSchemaType,
        }
    }

    pub fn from_vertex_label(label: &str) -> Option<Self> {
        match label {
            "RelationalTable" => Some(TerminalKind::RelationalTable),
            "DataFile" => Some(TerminalKind::DataFile),
            _ => None,
        }
    }
}

/// Schema-container labels used for the column's schema display-name search
pub const SCHEMA_CONTAINER_LABELS: [&str; 2] = ["RelationalDBSchemaType", "TabularSchemaType"];

/// Node labels of the two graphs
pub mod node_label {
    /// Working graph: process entity type
    pub const PROCESS: &str = "Process";

    // Summary graph labels
    pub const SUMMARY_PROCESS: &str = "process";
    pub const SUMMARY_SUB_PROCESS: &str = "subProcess";
    pub const SUMMARY_TABLE: &str = "table";
    pub const SUMMARY_COLUMN: &str = "column";
    pub const SUMMARY_GLOSSARY_TERM: &str = "glossaryTerm";
}

/// Port type property values
pub mod port_type {
    pub const INPUT: &str = "INPUT_PORT";
    pub const OUTPUT: &str = "OUTPUT_PORT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_labels_round_trip() {
        for label in [
            EdgeLabel::ProcessPort,
            EdgeLabel::PortDelegation,
            EdgeLabel::PortSchema,
            EdgeLabel::AttributeForSchema,
            EdgeLabel::SchemaAttributeType,
            EdgeLabel::AssetSchemaType,
            EdgeLabel::LineageMapping,
            EdgeLabel::SemanticAssignment,
            EdgeLabel::DataFlow,
            EdgeLabel::IncludedIn,
            EdgeLabel::Semantic,
            EdgeLabel::SubProcessOf,
        ] {
            assert_eq!(EdgeLabel::from_label(label.as_str()), Some(label));
        }
    }

    #[test]
    fn unknown_labels_are_rejected() {
        assert_eq!(EdgeLabel::from_label("ForeignKey"), None);
        assert_eq!(EdgeLabel::from_label(""), None);
    }

    #[test]
    fn terminal_kinds_map_to_schema_edges() {
        assert_eq!(
            TerminalKind::RelationalTable.schema_edge(),
            EdgeLabel::SchemaAttributeType
        );
        assert_eq!(TerminalKind::DataFile.schema_edge(), EdgeLabel::AssetSchemaType);
        assert_eq!(
            TerminalKind::from_vertex_label("DataFile"),
            Some(TerminalKind::DataFile)
        );
        assert_eq!(TerminalKind::from_vertex_label("Port"), None);
    }
}
