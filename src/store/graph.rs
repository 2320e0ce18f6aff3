//! SQLite-backed property graph with closure-scoped transactions

use super::{StoreError, StoreResult};
use crate::model::EdgeLabel;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// Internal row identifier of a vertex. Never leaves the process; entity
/// identity across runs is the `guid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexId(pub(crate) i64);

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A vertex as returned by lookups and traversals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub id: VertexId,
    /// Type label (e.g. "Process", "RelationalColumn", "column")
    pub label: String,
    /// Working-graph guid, when the vertex represents an ingested entity
    pub guid: Option<String>,
}

/// One graph database, usable as a working or a summary graph.
///
/// Thread-safe via an internal mutex on the connection; transactions are
/// scoped to closures so a unit of work cannot leak an open transaction.
pub struct GraphStore {
    conn: Mutex<Connection>,
}

impl GraphStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Create an in-memory store (useful for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS vertices (
                id INTEGER PRIMARY KEY,
                label TEXT NOT NULL,
                guid TEXT UNIQUE
            );
            CREATE INDEX IF NOT EXISTS idx_vertices_label ON vertices(label);

            CREATE TABLE IF NOT EXISTS properties (
                vertex_id INTEGER NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (vertex_id, key),
                FOREIGN KEY (vertex_id) REFERENCES vertices(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_properties_lookup ON properties(key, value);

            CREATE TABLE IF NOT EXISTS edges (
                id INTEGER PRIMARY KEY,
                guid TEXT UNIQUE,
                label TEXT NOT NULL,
                source_id INTEGER NOT NULL,
                target_id INTEGER NOT NULL,
                FOREIGN KEY (source_id) REFERENCES vertices(id) ON DELETE CASCADE,
                FOREIGN KEY (target_id) REFERENCES vertices(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id, label);
            CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id, label);

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Run a read-only transaction. The transaction is always rolled back;
    /// any writes made through the handle are discarded.
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&GraphTx<'_>) -> Result<T, E>,
    {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(StoreError::from)?;
        let result = f(&GraphTx { tx: &tx });
        // Dropping the transaction rolls it back.
        result
    }

    /// Run a write transaction: commit on `Ok`, roll back on `Err`.
    pub fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&GraphTx<'_>) -> Result<T, E>,
    {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(StoreError::from)?;
        match f(&GraphTx { tx: &tx }) {
            Ok(value) => {
                tx.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }
}

/// Transactional handle passed into every graph operation
pub struct GraphTx<'a> {
    tx: &'a rusqlite::Transaction<'a>,
}

impl GraphTx<'_> {
    // === Vertex operations ===

    /// Create a vertex with the given label and optional entity guid
    pub fn create_vertex(&self, label: &str, guid: Option<&str>) -> StoreResult<VertexId> {
        self.tx.execute(
            "INSERT INTO vertices (label, guid) VALUES (?1, ?2)",
            params![label, guid],
        )?;
        Ok(VertexId(self.tx.last_insert_rowid()))
    }

    /// Look up a vertex by its entity guid
    pub fn vertex_by_guid(&self, guid: &str) -> StoreResult<Option<Vertex>> {
        self.tx
            .query_row(
                "SELECT id, label, guid FROM vertices WHERE guid = ?1",
                params![guid],
                Self::row_to_vertex,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// First vertex (in insertion order) carrying the given property value
    pub fn find_by_property(&self, key: &str, value: &str) -> StoreResult<Option<Vertex>> {
        self.tx
            .query_row(
                r#"
                SELECT v.id, v.label, v.guid FROM vertices v
                JOIN properties p ON p.vertex_id = v.id
                WHERE p.key = ?1 AND p.value = ?2
                ORDER BY v.id LIMIT 1
                "#,
                params![key, value],
                Self::row_to_vertex,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// All vertices with the given label, in insertion order
    pub fn vertices_with_label(&self, label: &str) -> StoreResult<Vec<Vertex>> {
        let mut stmt = self
            .tx
            .prepare("SELECT id, label, guid FROM vertices WHERE label = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![label], Self::row_to_vertex)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Set (insert or replace) a vertex property
    pub fn set_property(&self, vertex: VertexId, key: &str, value: &str) -> StoreResult<()> {
        self.tx.execute(
            r#"
            INSERT INTO properties (vertex_id, key, value) VALUES (?1, ?2, ?3)
            ON CONFLICT(vertex_id, key) DO UPDATE SET value = excluded.value
            "#,
            params![vertex.0, key, value],
        )?;
        Ok(())
    }

    /// Remove a vertex property if present
    pub fn remove_property(&self, vertex: VertexId, key: &str) -> StoreResult<()> {
        self.tx.execute(
            "DELETE FROM properties WHERE vertex_id = ?1 AND key = ?2",
            params![vertex.0, key],
        )?;
        Ok(())
    }

    /// Get a single vertex property
    pub fn property(&self, vertex: VertexId, key: &str) -> StoreResult<Option<String>> {
        self.tx
            .query_row(
                "SELECT value FROM properties WHERE vertex_id = ?1 AND key = ?2",
                params![vertex.0, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// All properties of a vertex
    pub fn properties(&self, vertex: VertexId) -> StoreResult<BTreeMap<String, String>> {
        let mut stmt = self
            .tx
            .prepare("SELECT key, value FROM properties WHERE vertex_id = ?1")?;
        let rows = stmt.query_map(params![vertex.0], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(StoreError::from)
    }

    // === Edge operations ===

    /// Create an edge; `guid` is the relationship guid for ingested facts,
    /// `None` for derived summary edges
    pub fn create_edge(
        &self,
        label: EdgeLabel,
        from: VertexId,
        to: VertexId,
        guid: Option<&str>,
    ) -> StoreResult<()> {
        self.tx.execute(
            "INSERT INTO edges (guid, label, source_id, target_id) VALUES (?1, ?2, ?3, ?4)",
            params![guid, label.as_str(), from.0, to.0],
        )?;
        Ok(())
    }

    /// Whether an edge with this relationship guid already exists
    pub fn edge_guid_exists(&self, guid: &str) -> StoreResult<bool> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM edges WHERE guid = ?1",
            params![guid],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether any edge with this label connects `from` to `to`
    pub fn edge_exists(&self, from: VertexId, to: VertexId, label: EdgeLabel) -> StoreResult<bool> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM edges WHERE source_id = ?1 AND target_id = ?2 AND label = ?3",
            params![from.0, to.0, label.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Vertices reachable over one outgoing edge with the given label
    pub fn out_neighbors(&self, vertex: VertexId, label: EdgeLabel) -> StoreResult<Vec<Vertex>> {
        let mut stmt = self.tx.prepare(
            r#"
            SELECT v.id, v.label, v.guid FROM edges e
            JOIN vertices v ON v.id = e.target_id
            WHERE e.source_id = ?1 AND e.label = ?2
            ORDER BY e.id
            "#,
        )?;
        let rows = stmt.query_map(params![vertex.0, label.as_str()], Self::row_to_vertex)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Vertices reachable over one incoming edge with the given label
    pub fn in_neighbors(&self, vertex: VertexId, label: EdgeLabel) -> StoreResult<Vec<Vertex>> {
        let mut stmt = self.tx.prepare(
            r#"
            SELECT v.id, v.label, v.guid FROM edges e
            JOIN vertices v ON v.id = e.source_id
            WHERE e.target_id = ?1 AND e.label = ?2
            ORDER BY e.id
            "#,
        )?;
        let rows = stmt.query_map(params![vertex.0, label.as_str()], Self::row_to_vertex)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Neighbors over the given label in either direction
    pub fn neighbors(&self, vertex: VertexId, label: EdgeLabel) -> StoreResult<Vec<Vertex>> {
        let mut result = self.out_neighbors(vertex, label)?;
        result.extend(self.in_neighbors(vertex, label)?);
        Ok(result)
    }

    /// All adjacent vertices regardless of edge label or direction
    pub fn adjacent(&self, vertex: VertexId) -> StoreResult<Vec<Vertex>> {
        let mut stmt = self.tx.prepare(
            r#"
            SELECT v.id, v.label, v.guid FROM edges e
            JOIN vertices v ON v.id = e.target_id
            WHERE e.source_id = ?1
            UNION
            SELECT v.id, v.label, v.guid FROM edges e
            JOIN vertices v ON v.id = e.source_id
            WHERE e.target_id = ?1
            ORDER BY 1
            "#,
        )?;
        let rows = stmt.query_map(params![vertex.0], Self::row_to_vertex)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Discard every vertex, edge and property (full rebuild support)
    pub fn clear(&self) -> StoreResult<()> {
        self.tx.execute_batch(
            r#"
            DELETE FROM properties;
            DELETE FROM edges;
            DELETE FROM vertices;
            "#,
        )?;
        Ok(())
    }

    fn row_to_vertex(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vertex> {
        Ok(Vertex {
            id: VertexId(row.get(0)?),
            label: row.get(1)?,
            guid: row.get(2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_commits_and_read_sees_it() {
        let store = GraphStore::open_in_memory().unwrap();

        let id = store
            .update(|tx| {
                let id = tx.create_vertex("Process", Some("p-1"))?;
                tx.set_property(id, "vepdisplayName", "load_customers")?;
                Ok::<_, StoreError>(id)
            })
            .unwrap();

        store
            .read(|tx| {
                let found = tx.vertex_by_guid("p-1")?.expect("vertex committed");
                assert_eq!(found.id, id);
                assert_eq!(found.label, "Process");
                assert_eq!(
                    tx.property(id, "vepdisplayName")?.as_deref(),
                    Some("load_customers")
                );
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn failed_update_rolls_back() {
        let store = GraphStore::open_in_memory().unwrap();

        let result: Result<(), StoreError> = store.update(|tx| {
            tx.create_vertex("Process", Some("p-1"))?;
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected",
            )))
        });
        assert!(result.is_err());

        store
            .read(|tx| {
                assert!(tx.vertex_by_guid("p-1")?.is_none());
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn read_transactions_discard_writes() {
        let store = GraphStore::open_in_memory().unwrap();

        store
            .read(|tx| {
                tx.create_vertex("Process", Some("p-1"))?;
                Ok::<_, StoreError>(())
            })
            .unwrap();

        store
            .read(|tx| {
                assert!(tx.vertex_by_guid("p-1")?.is_none());
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn duplicate_vertex_guid_is_a_constraint_error() {
        let store = GraphStore::open_in_memory().unwrap();

        store
            .update(|tx| tx.create_vertex("Process", Some("p-1")).map(|_| ()))
            .unwrap();

        let result: Result<(), StoreError> =
            store.update(|tx| tx.create_vertex("Process", Some("p-1")).map(|_| ()));
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[test]
    fn neighbors_follow_label_and_direction() {
        let store = GraphStore::open_in_memory().unwrap();

        store
            .update(|tx| {
                let a = tx.create_vertex("RelationalColumn", Some("a"))?;
                let b = tx.create_vertex("RelationalColumn", Some("b"))?;
                let c = tx.create_vertex("TabularSchemaType", Some("c"))?;
                tx.create_edge(EdgeLabel::LineageMapping, a, b, None)?;
                tx.create_edge(EdgeLabel::AttributeForSchema, a, c, None)?;

                let out = tx.out_neighbors(a, EdgeLabel::LineageMapping)?;
                assert_eq!(out.len(), 1);
                assert_eq!(out[0].guid.as_deref(), Some("b"));

                assert!(tx.out_neighbors(b, EdgeLabel::LineageMapping)?.is_empty());
                let inbound = tx.in_neighbors(b, EdgeLabel::LineageMapping)?;
                assert_eq!(inbound.len(), 1);
                assert_eq!(inbound[0].guid.as_deref(), Some("a"));

                // Both directions, single label
                assert_eq!(tx.neighbors(a, EdgeLabel::LineageMapping)?.len(), 1);
                // All labels, both directions
                assert_eq!(tx.adjacent(a)?.len(), 2);
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn open_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("working.db");

        {
            let store = GraphStore::open(&path).unwrap();
            store
                .update(|tx| tx.create_vertex("Process", Some("p-1")).map(|_| ()))
                .unwrap();
        }

        let reopened = GraphStore::open(&path).unwrap();
        reopened
            .read(|tx| {
                assert!(tx.vertex_by_guid("p-1")?.is_some());
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }
}
