//! Terminal search over lineage-mapping chains
//!
//! Walks LineageMapping edges from a starting column to the column whose
//! schema hangs off a terminal asset (relational table or data file). The
//! walk keeps a full visited set and a depth bound, so a cyclic mapping
//! graph terminates with "not found" instead of recursing forever.

use crate::model::{EdgeLabel, TerminalKind};
use crate::store::{GraphTx, StoreResult, Vertex, VertexId};
use std::collections::HashSet;

/// Whether the vertex is a column attached (via its schema type) to a
/// terminal asset.
pub fn is_terminal_column(tx: &GraphTx<'_>, vertex: VertexId) -> StoreResult<bool> {
    for schema_type in tx.out_neighbors(vertex, EdgeLabel::AttributeForSchema)? {
        for kind in TerminalKind::ALL {
            let assets = tx.in_neighbors(schema_type.id, kind.schema_edge())?;
            if assets.iter().any(|a| a.label == kind.label()) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Depth-first walk over LineageMapping edges (either direction) from
/// `start`, returning the first terminal column found.
///
/// `exclude` seeds the visited set, keeping the walk from immediately
/// backtracking into the vertex the caller arrived from. Exhaustion or the
/// depth bound yields `Ok(None)`; the caller treats that as "no lineage
/// edge for this column in this run".
pub fn find_terminal_column(
    tx: &GraphTx<'_>,
    start: &Vertex,
    exclude: Option<VertexId>,
    max_depth: usize,
) -> StoreResult<Option<Vertex>> {
    let mut visited: HashSet<VertexId> = exclude.into_iter().collect();
    let mut stack: Vec<(Vertex, usize)> = vec![(start.clone(), 0)];

    while let Some((vertex, depth)) = stack.pop() {
        if !visited.insert(vertex.id) {
            continue;
        }
        if is_terminal_column(tx, vertex.id)? {
            return Ok(Some(vertex));
        }
        if depth >= max_depth {
            continue;
        }
        for neighbor in tx.neighbors(vertex.id, EdgeLabel::LineageMapping)? {
            if !visited.contains(&neighbor.id) {
                stack.push((neighbor, depth + 1));
            }
        }
    }
    Ok(None)
}

/// Breadth-first search outward from `from` over every edge label and
/// direction, up to `max_depth` hops, for the first vertex whose label is
/// in `labels`. Used to locate a column's enclosing table/file and schema
/// container.
pub fn find_nearby_with_label(
    tx: &GraphTx<'_>,
    from: VertexId,
    labels: &[&str],
    max_depth: usize,
) -> StoreResult<Option<Vertex>> {
    let mut visited: HashSet<VertexId> = HashSet::from([from]);
    let mut frontier: Vec<VertexId> = vec![from];

    for _ in 0..max_depth {
        let mut next: Vec<VertexId> = Vec::new();
        for vertex in frontier {
            for neighbor in tx.adjacent(vertex)? {
                if !visited.insert(neighbor.id) {
                    continue;
                }
                if labels.contains(&neighbor.label.as_str()) {
                    return Ok(Some(neighbor));
                }
                next.push(neighbor.id);
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GraphStore, StoreError};

    /// Build a mapping chain c0 -> c1 -> ... -> c{n-1}, with the last
    /// column attached to a RelationalTable.
    fn chain_fixture(store: &GraphStore, len: usize) -> Vec<Vertex> {
        store
            .update(|tx| {
                let mut columns = Vec::new();
                for i in 0..len {
                    let id = tx.create_vertex("RelationalColumn", Some(&format!("c-{i}")))?;
                    columns.push(Vertex {
                        id,
                        label: "RelationalColumn".into(),
                        guid: Some(format!("c-{i}")),
                    });
                }
                for pair in columns.windows(2) {
                    tx.create_edge(EdgeLabel::LineageMapping, pair[0].id, pair[1].id, None)?;
                }

                let table_type = tx.create_vertex("RelationalTableType", Some("tt"))?;
                let table = tx.create_vertex("RelationalTable", Some("t"))?;
                tx.create_edge(
                    EdgeLabel::AttributeForSchema,
                    columns[len - 1].id,
                    table_type,
                    None,
                )?;
                tx.create_edge(EdgeLabel::SchemaAttributeType, table, table_type, None)?;
                Ok::<_, StoreError>(columns)
            })
            .unwrap()
    }

    #[test]
    fn chain_resolves_from_any_starting_vertex() {
        let store = GraphStore::open_in_memory().unwrap();
        let columns = chain_fixture(&store, 5);

        store
            .read(|tx| {
                for start in &columns {
                    let terminal = find_terminal_column(tx, start, None, 20)?
                        .expect("terminal column reachable");
                    assert_eq!(terminal.guid.as_deref(), Some("c-4"));
                }
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn unterminated_chain_resolves_to_none() {
        let store = GraphStore::open_in_memory().unwrap();
        store
            .update(|tx| {
                let a = tx.create_vertex("TabularColumn", Some("a"))?;
                let b = tx.create_vertex("TabularColumn", Some("b"))?;
                tx.create_edge(EdgeLabel::LineageMapping, a, b, None)?;

                let start = Vertex {
                    id: a,
                    label: "TabularColumn".into(),
                    guid: Some("a".into()),
                };
                assert!(find_terminal_column(tx, &start, None, 20)?.is_none());
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn mapping_cycle_terminates_with_none() {
        let store = GraphStore::open_in_memory().unwrap();
        store
            .update(|tx| {
                // a -> b -> c -> a, none attached to an asset
                let a = tx.create_vertex("TabularColumn", Some("a"))?;
                let b = tx.create_vertex("TabularColumn", Some("b"))?;
                let c = tx.create_vertex("TabularColumn", Some("c"))?;
                tx.create_edge(EdgeLabel::LineageMapping, a, b, None)?;
                tx.create_edge(EdgeLabel::LineageMapping, b, c, None)?;
                tx.create_edge(EdgeLabel::LineageMapping, c, a, None)?;

                let start = Vertex {
                    id: a,
                    label: "TabularColumn".into(),
                    guid: Some("a".into()),
                };
                assert!(find_terminal_column(tx, &start, None, 20)?.is_none());
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn depth_bound_stops_the_walk() {
        let store = GraphStore::open_in_memory().unwrap();
        let columns = chain_fixture(&store, 5);

        store
            .read(|tx| {
                // Terminal is 4 hops from c-0; a bound of 2 cannot reach it.
                assert!(find_terminal_column(tx, &columns[0], None, 2)?.is_none());
                assert!(find_terminal_column(tx, &columns[0], None, 4)?.is_some());
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn exclude_guards_the_arrival_direction() {
        let store = GraphStore::open_in_memory().unwrap();
        store
            .update(|tx| {
                // upstream table <- u <- m -> d -> downstream table;
                // excluding u from m must resolve to the downstream side.
                let u = tx.create_vertex("RelationalColumn", Some("u"))?;
                let m = tx.create_vertex("TabularColumn", Some("m"))?;
                let d = tx.create_vertex("RelationalColumn", Some("d"))?;
                tx.create_edge(EdgeLabel::LineageMapping, u, m, None)?;
                tx.create_edge(EdgeLabel::LineageMapping, m, d, None)?;

                for (col, guid) in [(u, "u"), (d, "d")] {
                    let tt = tx.create_vertex("RelationalTableType", Some(&format!("tt-{guid}")))?;
                    let t = tx.create_vertex("RelationalTable", Some(&format!("t-{guid}")))?;
                    tx.create_edge(EdgeLabel::AttributeForSchema, col, tt, None)?;
                    tx.create_edge(EdgeLabel::SchemaAttributeType, t, tt, None)?;
                }

                let start = Vertex {
                    id: m,
                    label: "TabularColumn".into(),
                    guid: Some("m".into()),
                };
                let terminal = find_terminal_column(tx, &start, Some(u), 20)?.unwrap();
                assert_eq!(terminal.guid.as_deref(), Some("d"));
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn nearby_search_respects_depth_and_labels() {
        let store = GraphStore::open_in_memory().unwrap();
        store
            .update(|tx| {
                let col = tx.create_vertex("RelationalColumn", Some("c"))?;
                let tt = tx.create_vertex("RelationalTableType", Some("tt"))?;
                let table = tx.create_vertex("RelationalTable", Some("t"))?;
                let db_schema = tx.create_vertex("RelationalDBSchemaType", Some("s"))?;
                tx.create_edge(EdgeLabel::AttributeForSchema, col, tt, None)?;
                tx.create_edge(EdgeLabel::SchemaAttributeType, table, tt, None)?;
                tx.create_edge(EdgeLabel::AttributeForSchema, table, db_schema, None)?;

                // Table is two hops away from the column
                let found = find_nearby_with_label(tx, col, &["RelationalTable", "DataFile"], 2)?;
                assert_eq!(found.unwrap().guid.as_deref(), Some("t"));

                // Schema container is three hops away
                assert!(find_nearby_with_label(tx, col, &["RelationalDBSchemaType"], 2)?.is_none());
                let schema = find_nearby_with_label(tx, col, &["RelationalDBSchemaType"], 3)?;
                assert_eq!(schema.unwrap().guid.as_deref(), Some("s"));
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }
}
