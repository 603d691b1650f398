//! Turns raw Dijkstra output into the artifacts a query actually reports:
//! the node path, its approximation ratio against the straight-line
//! distance, and the set of mesh cells the path passes through.
//!
//! `traversed_cells` walks the predecessor chain from target back to source
//! and, for each node on the path, unions in whatever cells are incident to
//! its live anchor (a vertex's cell star, an edge's fan, or a face's ≤2
//! sides).

use std::collections::BTreeSet;

use noisy_float::prelude::N64;

use crate::error::WspError;
use crate::graph::{euclidean, Anchor, NodeId, WspGraph};
use crate::mesh::{CellHandle, MeshStore};
use crate::solver::ShortestPaths;

/// Tolerance below 1.0 an approximation ratio may fall before it is treated
/// as a correctness bug rather than floating-point noise.
pub const STRETCH_VIOLATION_TOLERANCE: f64 = 1e-9;

pub struct QueryResult {
    pub source: NodeId,
    pub target: NodeId,
    pub path: Vec<NodeId>,
    pub distance: N64,
    pub straight_line_distance: N64,
    pub approx_ratio: f64,
    pub traversed_cells: Vec<CellHandle>,
}

/// Reconstructs the path `source..=target` and its stretch ratio. Returns
/// [`WspError::Unreachable`] if `dist[target]` is infinite.
pub fn extract(
    mesh: &MeshStore,
    graph: &WspGraph,
    paths: &ShortestPaths,
    source: NodeId,
    target: NodeId,
) -> Result<QueryResult, WspError> {
    if paths.dist[target].is_infinite() {
        return Err(WspError::Unreachable { source, target });
    }

    let mut path = vec![target];
    let mut cur = target;
    while cur != source {
        cur = paths.pred[cur];
        path.push(cur);
    }
    path.reverse();

    let distance = paths.dist[target];
    let straight_line_distance = euclidean(graph, source, target);
    let approx_ratio = if straight_line_distance.raw() > 0.0 {
        distance.raw() / straight_line_distance.raw()
    } else {
        1.0
    };

    if approx_ratio < 1.0 - STRETCH_VIOLATION_TOLERANCE {
        // Non-fatal: a bug indicator (reported path shorter than the
        // straight-line distance would allow), logged and not propagated.
        log::error!(
            "{}",
            WspError::StretchViolation { source, target, ratio: approx_ratio }
        );
    }

    let traversed_cells = traversed_cells(mesh, graph, &path);

    Ok(QueryResult {
        source,
        target,
        path,
        distance,
        straight_line_distance,
        approx_ratio,
        traversed_cells,
    })
}

fn traversed_cells(mesh: &MeshStore, graph: &WspGraph, path: &[NodeId]) -> Vec<CellHandle> {
    let mut cells: BTreeSet<CellHandle> = BTreeSet::new();
    for &node in path {
        match graph.node(node).anchor {
            Anchor::Vertex(v) if v.is_valid() => cells.extend(mesh.vertex_cells(v).iter().copied()),
            Anchor::Vertex(_) => {}
            Anchor::Edge(e) => cells.extend(mesh.edge_cells(e).iter().copied()),
            Anchor::Face(f) => cells.extend(mesh.face_cells(f).into_iter().flatten()),
        }
    }
    cells.into_iter().collect()
}
