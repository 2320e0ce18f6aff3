//! Property key vocabulary for stored vertices and edges
//!
//! Core audit keys carry a `ve` prefix and instance properties a `vep`
//! prefix so incoming property names can never collide with structural
//! properties of the graph.

/// Prefix for core (audit) vertex properties
pub const PREFIX_CORE: &str = "ve";
/// Prefix for instance properties copied from the entity fact
pub const PREFIX_INSTANCE: &str = "vep";

pub const ENTITY_GUID: &str = "veguid";
pub const ENTITY_VERSION: &str = "veversion";
pub const ENTITY_CREATED_BY: &str = "vecreatedBy";
pub const ENTITY_CREATE_TIME: &str = "vecreateTime";
pub const ENTITY_UPDATED_BY: &str = "veupdatedBy";
pub const ENTITY_UPDATE_TIME: &str = "veupdateTime";

/// Summary graph: originating working-graph guid of a node. Distinct from
/// any internally generated identifier so repeated runs can find and reuse
/// existing nodes.
pub const NODE_ID: &str = "nodeId";
/// Summary graph: working-graph guid carried by process and subProcess nodes
pub const PROCESS_GUID: &str = "guid";
/// Summary graph: human-readable name
pub const DISPLAY_NAME: &str = "displayName";
/// Summary column enrichment: display name of the nearest table or file
pub const TABLE_DISPLAY_NAME: &str = "tableDisplayname";
/// Summary column enrichment: display name of the nearest schema container
pub const SCHEMA_DISPLAY_NAME: &str = "schemaDisplayname";

/// Instance property name under which ports carry their type
pub const PORT_TYPE: &str = "portType";

/// Namespace an instance property name
pub fn instance(name: &str) -> String {
    format!("{PREFIX_INSTANCE}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_keys_are_namespaced() {
        assert_eq!(instance("displayName"), "vepdisplayName");
        // A malicious property named like a core key stays in its namespace
        assert_eq!(instance("guid"), "vepguid");
        assert_ne!(instance("guid"), ENTITY_GUID);
    }
}
