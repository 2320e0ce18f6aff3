//! Entity and relationship facts as delivered by the metadata event pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node fact: one technical-metadata entity from the event pipeline.
///
/// `guid` is the pipeline-assigned globally unique identifier; at most one
/// vertex exists per guid per graph. Optional audit fields that arrive as
/// `None` mean "clear this property" on the stored vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEntity {
    /// Globally unique identifier of the entity
    pub guid: String,
    /// Open-metadata type name, used as the vertex label (e.g. "Process")
    #[serde(rename = "typeName")]
    pub type_name: String,
    /// Entity version as reported by the source repository
    pub version: i64,
    #[serde(default, rename = "createdBy", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, rename = "createTime", skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "updatedBy", skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, rename = "updateTime", skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    /// Instance properties (property name -> string value)
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl LineageEntity {
    /// Create an entity fact with the given guid and type label
    pub fn new(guid: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            type_name: type_name.into(),
            version: 1,
            created_by: None,
            create_time: None,
            updated_by: None,
            update_time: None,
            properties: BTreeMap::new(),
        }
    }

    /// Add an instance property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// An edge fact: one relationship between two entities, by guid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageRelationship {
    /// Globally unique identifier of the relationship
    pub guid: String,
    /// Relationship type name, used as the edge label
    #[serde(rename = "typeName")]
    pub type_name: String,
    /// Guid of the entity the edge leaves from
    #[serde(rename = "fromGuid")]
    pub from_guid: String,
    /// Guid of the entity the edge arrives at
    #[serde(rename = "toGuid")]
    pub to_guid: String,
}

impl LineageRelationship {
    pub fn new(
        guid: impl Into<String>,
        type_name: impl Into<String>,
        from_guid: impl Into<String>,
        to_guid: impl Into<String>,
    ) -> Self {
        Self {
            guid: guid.into(),
            type_name: type_name.into(),
            from_guid: from_guid.into(),
            to_guid: to_guid.into(),
        }
    }
}

/// One record of the ingestion stream (JSON Lines on disk).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LineageEvent {
    Entity(LineageEntity),
    Relationship(LineageRelationship),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_round_trips_through_json() {
        let entity = LineageEntity::new("guid-1", "RelationalColumn")
            .with_property("displayName", "customer_id");

        let json = serde_json::to_string(&entity).unwrap();
        let back: LineageEntity = serde_json::from_str(&json).unwrap();
        assert_eq!(entity, back);
    }

    #[test]
    fn event_stream_is_tagged_by_kind() {
        let line = r#"{"kind":"relationship","guid":"r1","typeName":"LineageMapping","fromGuid":"a","toGuid":"b"}"#;
        let event: LineageEvent = serde_json::from_str(line).unwrap();
        match event {
            LineageEvent::Relationship(rel) => {
                assert_eq!(rel.type_name, "LineageMapping");
                assert_eq!(rel.from_guid, "a");
            }
            LineageEvent::Entity(_) => panic!("expected relationship"),
        }
    }

    #[test]
    fn absent_audit_fields_deserialize_as_none() {
        let line = r#"{"guid":"g","typeName":"Process","version":3}"#;
        let entity: LineageEntity = serde_json::from_str(line).unwrap();
        assert_eq!(entity.version, 3);
        assert!(entity.created_by.is_none());
        assert!(entity.update_time.is_none());
        assert!(entity.properties.is_empty());
    }
}
