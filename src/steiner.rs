//! Builds a [`WspGraph`] over a [`MeshStore`] under one of three Steiner-point
//! placement schemes:
//!
//! - [`SteinerScheme::Barycentric`] — cheapest and loosest: a node at every
//!   vertex, face centroid and cell centroid, wired vertex–face–cell by
//!   incidence. No approximation-ratio guarantee, just a usable graph.
//! - [`SteinerScheme::SurfaceOnly`] — subdivides boundary edges/faces at the
//!   `yardstick` interval scheme below, but leaves interior edges as a single
//!   vertex-to-vertex hop; for queries that only care about surface-hugging
//!   paths.
//! - [`SteinerScheme::SpannerInterval`] — the primary scheme: every edge gets
//!   `⌈L / yardstick⌉ − 1` interior nodes, and every face gets interior nodes
//!   on concentric rings around its centroid, whose radii grow geometrically
//!   by `1 + (stretch - 1)` and whose angular spacing is chosen so each ring's
//!   arc length between neighbors is ~`yardstick` (ring radius `r_k =
//!   yardstick * g^k` with `g = 1 + (stretch - 1)`, ring point count `n_k =
//!   max(3, ⌈2πr_k / yardstick⌉)`) — an Aleksandrov-style cone/ring
//!   subdivision whose spacing tightens as `stretch` approaches 1. With
//!   `yardstick <= 0.0` there is no edge subdivision and each face
//!   contributes a single centroid node instead of a ring stack — the
//!   CLI's `-x >= 0 -y 0` default, vertex and face nodes only.

use std::collections::HashMap;
use std::f64::consts::PI;

use glam::DVec3;

use crate::graph::{Anchor, NodeId, WspGraph};
use crate::mesh::{EdgeHandle, FaceHandle, MeshStore, VertexHandle};

#[derive(Clone, Copy, Debug)]
pub enum SteinerScheme {
    Barycentric,
    SurfaceOnly { yardstick: f64 },
    SpannerInterval { stretch: f64, yardstick: f64 },
}

/// Quantizes points to a grid of `tolerance` so two Steiner points computed
/// by different paths (e.g. the same edge node reached from two adjacent
/// faces) collapse onto one graph node instead of creating near-duplicates.
struct NodeRegistry {
    tolerance: f64,
    index: HashMap<(i64, i64, i64), NodeId>,
}

impl NodeRegistry {
    fn new(tolerance: f64) -> Self {
        Self { tolerance, index: HashMap::new() }
    }

    fn key(&self, p: DVec3) -> (i64, i64, i64) {
        let q = |x: f64| (x / self.tolerance).round() as i64;
        (q(p.x), q(p.y), q(p.z))
    }

    fn get_or_insert(&mut self, graph: &mut WspGraph, anchor: Anchor, p: DVec3) -> NodeId {
        let key = self.key(p);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = graph.add_node(anchor, p);
        self.index.insert(key, id);
        id
    }
}

/// Default point-dedup tolerance: coarse
/// enough to collapse floating-point noise from two different derivations
/// of the same boundary point, fine enough not to merge distinct Steiner
/// points at any yardstick the CLI's default range covers.
pub const DEFAULT_DEDUP_TOLERANCE: f64 = 1e-8;

pub fn build_graph(mesh: &MeshStore, scheme: SteinerScheme, dedup_tolerance: f64) -> WspGraph {
    match scheme {
        SteinerScheme::Barycentric => build_barycentric(mesh, dedup_tolerance),
        SteinerScheme::SurfaceOnly { yardstick } => build_surface_only(mesh, yardstick, dedup_tolerance),
        SteinerScheme::SpannerInterval { stretch, yardstick } => {
            build_spanner_interval(mesh, stretch, yardstick, dedup_tolerance)
        }
    }
}

fn is_boundary_face(mesh: &MeshStore, f: FaceHandle) -> bool {
    let [c0, c1] = mesh.face_cells(f);
    c0.is_none() || c1.is_none()
}

fn is_boundary_edge(mesh: &MeshStore, e: EdgeHandle) -> bool {
    mesh.edge_halffaces(e).iter().any(|hf| is_boundary_face(mesh, hf.face()))
}

/// Barycentric scheme: a node per vertex, per face centroid and per cell centroid,
/// connected vertex–face by the face's own vertices and face–cell by the
/// cell's own faces. Every edge cost is the weight of the coarser-grained
/// feature it passes through (face weight for vertex–face hops, cell weight
/// for face–cell hops), times Euclidean distance — the loosest of the three
/// schemes but always connected and cheap to build.
fn build_barycentric(mesh: &MeshStore, dedup_tolerance: f64) -> WspGraph {
    let mut graph = WspGraph::new();
    let mut registry = NodeRegistry::new(dedup_tolerance);

    let vertex_nodes: Vec<NodeId> = mesh
        .vertices()
        .map(|v| registry.get_or_insert(&mut graph, Anchor::Vertex(v), mesh.point(v)))
        .collect();

    let face_nodes: Vec<NodeId> = mesh
        .face_handles()
        .map(|f| registry.get_or_insert(&mut graph, Anchor::Face(f), mesh.face_centroid(f)))
        .collect();

    for f in mesh.face_handles() {
        let fn_id = face_nodes[f.idx()];
        let fw = mesh.face_weight(f);
        for v in mesh.face(f).vertices {
            let v_id = vertex_nodes[v.idx()];
            let dist = (mesh.point(v) - mesh.face_centroid(f)).length();
            graph.add_edge(v_id, fn_id, noisy_float::prelude::n64(fw * dist));
        }
    }

    for c in mesh.cell_handles() {
        let cell_centroid = mesh.cell_centroid(c);
        // No live mesh handle anchors a cell-interior node (`Anchor` only
        // tags vertex/edge/face features); `VertexHandle::INVALID` marks it
        // as synthetic for anything walking anchors back to mesh handles.
        let cell_node = graph.add_node(Anchor::Vertex(VertexHandle::INVALID), cell_centroid);
        let cw = mesh.cell_weight(c);
        for f in mesh.cell(c).faces {
            let f_id = face_nodes[f.idx()];
            let dist = (mesh.face_centroid(f) - cell_centroid).length();
            graph.add_edge(cell_node, f_id, noisy_float::prelude::n64(cw * dist));
        }
    }

    graph
}

/// Places `⌈L / yardstick⌉ − 1` interior nodes evenly along edge `e` and
/// wires up the resulting chain of (vertex, interior..., vertex) nodes with
/// `edge_weight(e) * segment_length` costs. Returns the full ordered chain,
/// `from`-endpoint first, so callers can also hang face-interior nodes off
/// the interior points that lie on a shared face boundary.
fn subdivide_edge(
    mesh: &MeshStore,
    e: EdgeHandle,
    yardstick: f64,
    graph: &mut WspGraph,
    registry: &mut NodeRegistry,
    vertex_nodes: &[NodeId],
) -> Vec<NodeId> {
    let edge = mesh.edge(e);
    let from = mesh.point(edge.from);
    let to = mesh.point(edge.to);
    let length = mesh.edge_length(e);
    // `yardstick <= 0.0` means "no edge subdivision" (§4.2.c): a single
    // vertex-to-vertex segment, rather than dividing by zero.
    let steps = if yardstick > 0.0 { ((length / yardstick).ceil() as usize).max(1) } else { 1 };

    let mut chain = vec![vertex_nodes[edge.from.idx()]];
    for k in 1..steps {
        let t = k as f64 / steps as f64;
        let p = from.lerp(to, t);
        let id = registry.get_or_insert(graph, Anchor::Edge(e), p);
        chain.push(id);
    }
    chain.push(vertex_nodes[edge.to.idx()]);

    let w = mesh.edge_weight(e);
    for pair in chain.windows(2) {
        let seg_len = length / steps as f64;
        graph.add_edge(pair[0], pair[1], noisy_float::prelude::n64(w * seg_len));
    }
    chain
}

fn point_in_triangle_2d(p: (f64, f64), tri: [(f64, f64); 3]) -> bool {
    let sign = |a: (f64, f64), b: (f64, f64), c: (f64, f64)| {
        (a.0 - c.0) * (b.1 - c.1) - (b.0 - c.0) * (a.1 - c.1)
    };
    let d1 = sign(p, tri[0], tri[1]);
    let d2 = sign(p, tri[1], tri[2]);
    let d3 = sign(p, tri[2], tri[0]);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Concentric-ring face-interior Steiner points (see module doc for the
/// exact radius/angle formula). Returns 3D points only; the caller assigns
/// them graph nodes and wiring. With `yardstick <= 0.0` there is no length
/// scale to build rings against (a ring radius of 0 would never grow), so
/// this falls back to a single centroid node, same as the barycentric
/// scheme's face node.
fn face_interior_points(mesh: &MeshStore, f: FaceHandle, stretch: f64, yardstick: f64) -> Vec<DVec3> {
    let face = mesh.face(f);
    let p0 = mesh.point(face.vertices[0]);
    let p1 = mesh.point(face.vertices[1]);
    let p2 = mesh.point(face.vertices[2]);
    let centroid = (p0 + p1 + p2) / 3.0;

    if yardstick <= 0.0 {
        return vec![centroid];
    }

    let edge1 = p1 - p0;
    let edge2 = p2 - p0;
    let normal = edge1.cross(edge2);
    if normal.length_squared() < 1e-20 {
        return Vec::new();
    }
    let u = edge1.normalize();
    let n = normal.normalize();
    let v = n.cross(u);

    let to_2d = |p: DVec3| {
        let d = p - centroid;
        (d.dot(u), d.dot(v))
    };
    let tri2 = [to_2d(p0), to_2d(p1), to_2d(p2)];
    let max_radius = tri2.iter().map(|&(x, y)| (x * x + y * y).sqrt()).fold(0.0_f64, f64::max);

    let growth = 1.0 + (stretch - 1.0).max(1e-3);
    let mut points = Vec::new();
    let mut radius = yardstick;
    while radius < max_radius {
        let circumference = 2.0 * PI * radius;
        let n_points = ((circumference / yardstick).ceil() as usize).max(3);
        for k in 0..n_points {
            let theta = 2.0 * PI * (k as f64) / (n_points as f64);
            let local = (radius * theta.cos(), radius * theta.sin());
            if point_in_triangle_2d(local, tri2) {
                points.push(centroid + u * local.0 + v * local.1);
            }
        }
        radius *= growth;
    }
    points
}

/// The primary scheme: vertex nodes, edge-interior nodes at the
/// yardstick interval, and face-interior nodes on the concentric rings
/// described in the module doc. Every node reachable within a cell (its 4
/// vertices, the interior nodes of its 6 edges, and the interior nodes of
/// its 4 faces) is wired to every other such node with cost `cell_weight *
/// distance` — a complete local graph per cell, which is what bounds the
/// stretch of the straight-line replacement within a cell to the spanner
/// guarantee the scheme is named for.
fn build_spanner_interval(mesh: &MeshStore, stretch: f64, yardstick: f64, dedup_tolerance: f64) -> WspGraph {
    let mut graph = WspGraph::new();
    let mut registry = NodeRegistry::new(dedup_tolerance);

    let vertex_nodes: Vec<NodeId> = mesh
        .vertices()
        .map(|v| registry.get_or_insert(&mut graph, Anchor::Vertex(v), mesh.point(v)))
        .collect();

    let mut edge_chains: HashMap<EdgeHandle, Vec<NodeId>> = HashMap::new();
    for e in mesh.edge_handles() {
        let chain = subdivide_edge(mesh, e, yardstick, &mut graph, &mut registry, &vertex_nodes);
        edge_chains.insert(e, chain);
    }

    let mut face_nodes: HashMap<FaceHandle, Vec<NodeId>> = HashMap::new();
    for f in mesh.face_handles() {
        let ids: Vec<NodeId> = face_interior_points(mesh, f, stretch, yardstick)
            .into_iter()
            .map(|p| registry.get_or_insert(&mut graph, Anchor::Face(f), p))
            .collect();
        face_nodes.insert(f, ids);
    }

    // Wire each face's own node set (its 3 edges' chains plus its own
    // interior points) as a clique, at face_weight.
    for f in mesh.face_handles() {
        let fw = mesh.face_weight(f);
        let mut members: Vec<NodeId> = Vec::new();
        for e in mesh.face(f).edges {
            members.extend(edge_chains[&e].iter().copied());
        }
        members.extend(face_nodes[&f].iter().copied());
        members.sort_unstable();
        members.dedup();
        wire_clique(&mut graph, &members, fw);
    }

    // Wire each cell's full node set (its 4 vertices, 6 edges' chains, 4
    // faces' interior points) as a clique, at cell_weight.
    for c in mesh.cell_handles() {
        let cw = mesh.cell_weight(c);
        let mut members: Vec<NodeId> = Vec::new();
        members.extend(mesh.cell(c).vertices.iter().map(|v| vertex_nodes[v.idx()]));
        for e in mesh.cell(c).edges {
            members.extend(edge_chains[&e].iter().copied());
        }
        for f in mesh.cell(c).faces {
            members.extend(face_nodes[&f].iter().copied());
        }
        members.sort_unstable();
        members.dedup();
        wire_clique(&mut graph, &members, cw);
    }

    graph
}

fn wire_clique(graph: &mut WspGraph, members: &[NodeId], weight: f64) {
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            let dist = graph.node(members[i]).point.distance(graph.node(members[j]).point);
            graph.add_edge(members[i], members[j], noisy_float::prelude::n64(weight * dist));
        }
    }
}

/// The interval scheme restricted to the mesh boundary. Interior
/// edges stay a single vertex-to-vertex hop at `edge_weight(e) *
/// edge_length(e)`; interior faces contribute no Steiner points at all.
/// Meant for queries known to hug the surface, where the full interior
/// spanner is wasted density.
fn build_surface_only(mesh: &MeshStore, yardstick: f64, dedup_tolerance: f64) -> WspGraph {
    let mut graph = WspGraph::new();
    let mut registry = NodeRegistry::new(dedup_tolerance);

    let vertex_nodes: Vec<NodeId> = mesh
        .vertices()
        .map(|v| registry.get_or_insert(&mut graph, Anchor::Vertex(v), mesh.point(v)))
        .collect();

    let mut edge_chains: HashMap<EdgeHandle, Vec<NodeId>> = HashMap::new();
    for e in mesh.edge_handles() {
        if is_boundary_edge(mesh, e) {
            let chain = subdivide_edge(mesh, e, yardstick, &mut graph, &mut registry, &vertex_nodes);
            edge_chains.insert(e, chain);
        } else {
            let edge = mesh.edge(e);
            let a = vertex_nodes[edge.from.idx()];
            let b = vertex_nodes[edge.to.idx()];
            graph.add_edge(a, b, noisy_float::prelude::n64(mesh.edge_weight(e) * mesh.edge_length(e)));
        }
    }

    for f in mesh.face_handles() {
        if !is_boundary_face(mesh, f) {
            continue;
        }
        let fw = mesh.face_weight(f);
        let mut members: Vec<NodeId> = Vec::new();
        for e in mesh.face(f).edges {
            if let Some(chain) = edge_chains.get(&e) {
                members.extend(chain.iter().copied());
            } else {
                let edge = mesh.edge(e);
                members.push(vertex_nodes[edge.from.idx()]);
                members.push(vertex_nodes[edge.to.idx()]);
            }
        }
        members.sort_unstable();
        members.dedup();
        wire_clique(&mut graph, &members, fw);
    }

    graph
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::MeshBuilder;

    fn single_tet() -> MeshStore {
        let mut b = MeshBuilder::new();
        let v0 = b.add_vertex(DVec3::new(0.0, 0.0, 0.0));
        let v1 = b.add_vertex(DVec3::new(1.0, 0.0, 0.0));
        let v2 = b.add_vertex(DVec3::new(0.0, 1.0, 0.0));
        let v3 = b.add_vertex(DVec3::new(0.0, 0.0, 1.0));
        let c = b.add_cell([v0, v1, v2, v3], 2.0);
        let mut mesh = b.build();
        mesh.set_cell_weight(c, 2.0);
        crate::weights::derive_face_and_edge_weights(&mut mesh);
        mesh
    }

    #[test]
    fn barycentric_graph_is_connected_and_nonempty() {
        let mesh = single_tet();
        let graph = build_graph(&mesh, SteinerScheme::Barycentric, DEFAULT_DEDUP_TOLERANCE);
        assert!(graph.node_count() > 0);
        assert!(graph.edge_count() > 0);
    }

    #[test]
    fn spanner_interval_subdivides_edges() {
        let mesh = single_tet();
        let graph = build_graph(
            &mesh,
            SteinerScheme::SpannerInterval { stretch: 1.2, yardstick: 0.2 },
            DEFAULT_DEDUP_TOLERANCE,
        );
        // edge length 1.0, yardstick 0.2 -> 5 segments -> 4 interior nodes per edge,
        // plus 4 vertices, well above a bare vertex-only graph.
        assert!(graph.node_count() > mesh.n_vertices());
    }

    #[test]
    fn spanner_interval_with_zero_yardstick_adds_only_face_centroids() {
        let mesh = single_tet();
        let graph = build_graph(
            &mesh,
            SteinerScheme::SpannerInterval { stretch: 1.2, yardstick: 0.0 },
            DEFAULT_DEDUP_TOLERANCE,
        );
        // No interior edge nodes, one centroid node per face, nothing else.
        assert_eq!(graph.node_count(), mesh.n_vertices() + mesh.n_faces());
        assert!(graph.edge_count() > 0);
    }

    #[test]
    fn surface_only_preserves_vertex_count_floor() {
        let mesh = single_tet();
        let graph = build_graph(
            &mesh,
            SteinerScheme::SurfaceOnly { yardstick: 0.2 },
            DEFAULT_DEDUP_TOLERANCE,
        );
        assert!(graph.node_count() >= mesh.n_vertices());
    }

    #[test]
    fn point_in_triangle_accepts_centroid_and_rejects_far_point() {
        let tri = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        assert!(point_in_triangle_2d((0.2, 0.2), tri));
        assert!(!point_in_triangle_2d((5.0, 5.0), tri));
    }
}
