//! The Steiner graph: an undirected weighted graph whose nodes carry a
//! mesh-feature anchor and a 3D point, and whose edges are collapsed to a
//! simple graph keeping only the minimum-cost edge for any node pair.
//!
//! `IndexMap`-backed adjacency, undirected only, weight is a plain `N64`, and
//! `add_edge` itself performs the "keep the cheaper of any duplicate" dedup
//! instead of leaving multi-edges to the caller.

use indexmap::IndexMap;
use noisy_float::prelude::{n64, N64};

use crate::mesh::{EdgeHandle, FaceHandle, VertexHandle};

pub type NodeId = usize;

/// The mesh feature a graph node is attached to. Exactly one variant is ever
/// live for a given node — a tagged sum type rather than three optional
/// handles sharing one struct.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Anchor {
    Vertex(VertexHandle),
    Edge(EdgeHandle),
    Face(FaceHandle),
}

#[derive(Clone, Debug)]
pub struct GraphNode {
    pub anchor: Anchor,
    pub point: glam::DVec3,
}

/// Undirected weighted graph with integer node ids.
#[derive(Clone, Debug, Default)]
pub struct WspGraph {
    nodes: Vec<GraphNode>,
    /// adjacency[u][v] = cost of the cheapest edge between u and v; maintained
    /// symmetrically (an edge (u,v) is stored at both adjacency[u] and
    /// adjacency[v]).
    adjacency: Vec<IndexMap<NodeId, N64>>,
    edge_count: usize,
}

impl WspGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, anchor: Anchor, point: glam::DVec3) -> NodeId {
        self.nodes.push(GraphNode { anchor, point });
        self.adjacency.push(IndexMap::new());
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.nodes.iter().enumerate()
    }

    /// Node ids anchored on an actual mesh vertex (excludes the synthetic
    /// cell-interior nodes the barycentric scheme creates with
    /// `VertexHandle::INVALID`). Used to keep random batch queries comparable
    /// across differently-refined Steiner graphs: restricting to original
    /// mesh vertices means the same (s, t) candidate pool exists regardless
    /// of how densely the graph subdivides edges and faces.
    pub fn mesh_vertex_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n.anchor, Anchor::Vertex(v) if v.is_valid()))
            .map(|(id, _)| id)
            .collect()
    }

    /// Adds an undirected edge `(u, v)` with the given cost. Self-loops are
    /// skipped (degenerate zero-length edges). If an edge
    /// between `u` and `v` already exists, keeps whichever cost is lower —
    /// this is what collapses the per-cell edge generation in `steiner.rs`
    /// down to a simple graph.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, cost: N64) {
        if u == v {
            return;
        }
        let keep_existing = matches!(self.adjacency[u].get(&v), Some(existing) if *existing <= cost);
        if keep_existing {
            return;
        }
        let is_new_pair = !self.adjacency[u].contains_key(&v);
        self.adjacency[u].insert(v, cost);
        self.adjacency[v].insert(u, cost);
        if is_new_pair {
            self.edge_count += 1;
        }
    }

    pub fn neighbors(&self, u: NodeId) -> impl Iterator<Item = (NodeId, N64)> + '_ {
        self.adjacency[u].iter().map(|(v, w)| (*v, *w))
    }

    pub fn degree(&self, u: NodeId) -> usize {
        self.adjacency[u].len()
    }
}

/// Euclidean distance between two nodes' points, unweighted.
pub fn euclidean(graph: &WspGraph, u: NodeId, v: NodeId) -> N64 {
    n64(graph.node(u).point.distance(graph.node(v).point))
}
