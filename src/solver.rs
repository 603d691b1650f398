//! Single-source Dijkstra over a [`WspGraph`].
//!
//! Uses a `priority_queue::PriorityQueue` as a max-heap, pushed with the
//! *negated* distance since the crate has no min-heap mode, and an `N64`
//! distance type so the queue's `Ord` bound is satisfiable (plain `f64` has
//! no total order). Fills the complete `dist`/`pred` arrays for every node
//! rather than stopping at a single target, since downstream consumers need
//! distances to the whole graph (the shortest-path tree, batch queries).

use noisy_float::prelude::{n64, N64};
use priority_queue::PriorityQueue;

use crate::graph::{NodeId, WspGraph};

pub struct ShortestPaths {
    pub dist: Vec<N64>,
    pub pred: Vec<NodeId>,
}

/// Runs Dijkstra from `source`. `dist[v]` is `N64::infinity()` when `v` is
/// unreachable; `pred[source] == source`. Ties are broken by insertion
/// order into the adjacency lists (whichever neighbor relaxes first wins),
/// which is deterministic for a fixed graph but otherwise unspecified.
pub fn dijkstra(graph: &WspGraph, source: NodeId) -> ShortestPaths {
    let n = graph.node_count();
    let mut dist = vec![N64::infinity(); n];
    let mut pred: Vec<NodeId> = (0..n).collect();
    let mut visited = vec![false; n];

    dist[source] = n64(0.0);
    let mut queue = PriorityQueue::new();
    // PriorityQueue pops the *maximum* priority; negate distance to get a min-heap.
    queue.push(source, -n64(0.0));

    while let Some((u, _)) = queue.pop() {
        if visited[u] {
            continue;
        }
        visited[u] = true;
        let du = dist[u];
        for (v, w) in graph.neighbors(u) {
            if visited[v] {
                continue;
            }
            let candidate = du + w;
            if candidate < dist[v] {
                dist[v] = candidate;
                pred[v] = u;
                queue.push(v, -candidate);
            }
        }
    }

    ShortestPaths { dist, pred }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::Anchor;
    use crate::mesh::VertexHandle;
    use glam::DVec3;

    #[test]
    fn shortest_path_on_a_triangle() {
        let mut g = WspGraph::new();
        let a = g.add_node(Anchor::Vertex(VertexHandle::new(0)), DVec3::new(0.0, 0.0, 0.0));
        let b = g.add_node(Anchor::Vertex(VertexHandle::new(1)), DVec3::new(1.0, 0.0, 0.0));
        let c = g.add_node(Anchor::Vertex(VertexHandle::new(2)), DVec3::new(2.0, 0.0, 0.0));
        g.add_edge(a, b, n64(1.0));
        g.add_edge(b, c, n64(1.0));
        g.add_edge(a, c, n64(5.0));

        let sp = dijkstra(&g, a);
        assert_eq!(sp.dist[c], n64(2.0));
        assert_eq!(sp.pred[c], b);
        assert_eq!(sp.pred[b], a);
        assert_eq!(sp.pred[a], a);
    }

    #[test]
    fn unreachable_node_has_infinite_distance() {
        let mut g = WspGraph::new();
        let a = g.add_node(Anchor::Vertex(VertexHandle::new(0)), DVec3::ZERO);
        let b = g.add_node(Anchor::Vertex(VertexHandle::new(1)), DVec3::X);
        let _ = b;
        let sp = dijkstra(&g, a);
        assert!(sp.dist[b].is_infinite());
    }
}
