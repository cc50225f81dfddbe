//! Connected-component analysis over an edge list.
//!
//! Used to explain why a round has no perfect matching, and by tests to
//! trace the shape of a built graph.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::models::{Component, EdgePair, VertexKey};

use super::PairingError;

/// Adjacency derived from an edge list. Vertices iterate in key order.
pub type AdjacencyList = BTreeMap<VertexKey, BTreeSet<VertexKey>>;

/// Build the adjacency list for every vertex mentioned by `edges`.
pub fn build_adjacency(edges: &[EdgePair]) -> Result<AdjacencyList, PairingError> {
    let mut adjacency = AdjacencyList::new();
    for edge in edges {
        let (a, b) = edge.endpoints();
        adjacency.entry(a).or_default();
        adjacency.entry(b).or_default();
    }

    for edge in edges {
        let (a, b) = edge.endpoints();
        neighbours_mut(&mut adjacency, a, edge)?.insert(b);
        neighbours_mut(&mut adjacency, b, edge)?.insert(a);
    }

    Ok(adjacency)
}

fn neighbours_mut<'a>(
    adjacency: &'a mut AdjacencyList,
    key: VertexKey,
    edge: &EdgePair,
) -> Result<&'a mut BTreeSet<VertexKey>, PairingError> {
    adjacency
        .get_mut(&key)
        .ok_or_else(|| PairingError::InvariantViolation(format!(
            "vertex {} of edge {} missing from adjacency after initialisation",
            key, edge
        )))
}

/// Partition the vertices of `edges` into connected components.
///
/// Components come out in the order their first vertex is met while walking
/// the vertex set in key order; each lists its vertices in BFS order.
pub fn find_connected_components(edges: &[EdgePair]) -> Result<Vec<Component>, PairingError> {
    let adjacency = build_adjacency(edges)?;
    let mut visited = BTreeSet::new();
    let mut components = Vec::new();

    for &start in adjacency.keys() {
        if visited.contains(&start) {
            continue;
        }
        components.push(bfs(&adjacency, start, &mut visited)?);
    }

    Ok(components)
}

/// Breadth-first walk from `start`, marking vertices in `visited` as they are dequeued.
fn bfs(
    adjacency: &AdjacencyList,
    start: VertexKey,
    visited: &mut BTreeSet<VertexKey>,
) -> Result<Component, PairingError> {
    let mut component = Vec::new();
    let mut queue = VecDeque::from([start]);

    while let Some(vertex) = queue.pop_front() {
        // A vertex can sit in the queue more than once
        if !visited.insert(vertex) {
            continue;
        }
        component.push(vertex);

        let neighbours = adjacency.get(&vertex).ok_or_else(|| {
            PairingError::InvariantViolation(format!(
                "vertex {} reached by BFS has no adjacency entry",
                vertex
            ))
        })?;
        for &next in neighbours {
            if !visited.contains(&next) {
                queue.push_back(next);
            }
        }
    }

    Ok(component)
}
