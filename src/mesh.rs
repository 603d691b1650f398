//! Indexed arena mesh store: vertices, edges, faces and tetrahedral cells of a
//! tetrahedralized volume, plus the bottom-up incidences needed to answer
//! "which cells touch this vertex/edge/face" without a linear scan.
//!
//! Mirrors the handle-based design of OpenVolumeMesh's `TopologyKernel`: small
//! integer handles into flat arenas, half-entities for the two sides of an
//! edge/face, and `incident_cell` returning `None` at the mesh boundary
//! instead of a sentinel object.

use glam::DVec3;

/// Sentinel used by all handle types for "no such entity".
const INVALID: u32 = u32::MAX;

macro_rules! handle {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub const INVALID: $name = $name(INVALID);

            pub fn new(idx: usize) -> Self {
                Self(idx as u32)
            }

            pub fn idx(self) -> usize {
                self.0 as usize
            }

            pub fn is_valid(self) -> bool {
                self.0 != INVALID
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

handle!(VertexHandle);
handle!(EdgeHandle);
handle!(FaceHandle);
handle!(CellHandle);

/// A directed side of an edge: `HalfEdgeHandle(2*e)` and `HalfEdgeHandle(2*e+1)`
/// are the two halves of `EdgeHandle(e)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HalfEdgeHandle(pub u32);

impl HalfEdgeHandle {
    pub fn edge(self) -> EdgeHandle {
        EdgeHandle(self.0 / 2)
    }
    pub fn side(self) -> usize {
        (self.0 % 2) as usize
    }
}

/// A directed side of a face: `HalfFaceHandle(2*f)` and `HalfFaceHandle(2*f+1)`
/// are the two halves of `FaceHandle(f)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HalfFaceHandle(pub u32);

impl HalfFaceHandle {
    pub fn face(self) -> FaceHandle {
        FaceHandle(self.0 / 2)
    }
    pub fn side(self) -> usize {
        (self.0 % 2) as usize
    }
}

#[derive(Clone, Debug)]
pub struct Edge {
    pub from: VertexHandle,
    pub to: VertexHandle,
}

#[derive(Clone, Debug)]
pub struct Face {
    pub vertices: [VertexHandle; 3],
    pub edges: [EdgeHandle; 3],
    /// incident cell for each half-face side; `None` at the mesh boundary.
    pub incident_cell: [Option<CellHandle>; 2],
}

#[derive(Clone, Debug)]
pub struct Cell {
    pub vertices: [VertexHandle; 4],
    pub edges: [EdgeHandle; 6],
    pub faces: [FaceHandle; 4],
}

/// Indexed arena holding the geometry, topology and per-feature weights of a
/// tetrahedralized volume. Built once via [`MeshBuilder`], then treated as
/// immutable by every downstream component.
#[derive(Clone, Debug, Default)]
pub struct MeshStore {
    points: Vec<DVec3>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    cells: Vec<Cell>,

    // bottom-up incidences
    vertex_halfedges: Vec<Vec<HalfEdgeHandle>>,
    vertex_cells: Vec<Vec<CellHandle>>,
    edge_halffaces: Vec<Vec<HalfFaceHandle>>,
    edge_cells: Vec<Vec<CellHandle>>,

    cell_weight: Vec<f64>,
    face_weight: Vec<f64>,
    edge_weight: Vec<f64>,
}

impl MeshStore {
    pub fn n_vertices(&self) -> usize {
        self.points.len()
    }
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn point(&self, v: VertexHandle) -> DVec3 {
        self.points[v.idx()]
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexHandle> {
        (0..self.points.len()).map(VertexHandle::new)
    }
    pub fn edge_handles(&self) -> impl Iterator<Item = EdgeHandle> {
        (0..self.edges.len()).map(EdgeHandle::new)
    }
    pub fn face_handles(&self) -> impl Iterator<Item = FaceHandle> {
        (0..self.faces.len()).map(FaceHandle::new)
    }
    pub fn cell_handles(&self) -> impl Iterator<Item = CellHandle> {
        (0..self.cells.len()).map(CellHandle::new)
    }

    pub fn edge(&self, e: EdgeHandle) -> &Edge {
        &self.edges[e.idx()]
    }
    pub fn edge_length(&self, e: EdgeHandle) -> f64 {
        let edge = self.edge(e);
        self.point(edge.from).distance(self.point(edge.to))
    }

    pub fn face(&self, f: FaceHandle) -> &Face {
        &self.faces[f.idx()]
    }
    pub fn face_centroid(&self, f: FaceHandle) -> DVec3 {
        let face = self.face(f);
        (self.point(face.vertices[0]) + self.point(face.vertices[1]) + self.point(face.vertices[2])) / 3.0
    }

    pub fn cell(&self, c: CellHandle) -> &Cell {
        &self.cells[c.idx()]
    }
    pub fn cell_centroid(&self, c: CellHandle) -> DVec3 {
        let cell = self.cell(c);
        cell.vertices.iter().map(|v| self.point(*v)).sum::<DVec3>() / 4.0
    }

    pub fn halfedge(&self, heh: HalfEdgeHandle) -> (VertexHandle, VertexHandle) {
        let e = self.edge(heh.edge());
        if heh.side() == 0 {
            (e.from, e.to)
        } else {
            (e.to, e.from)
        }
    }

    /// Half-edges leaving `v`.
    pub fn outgoing_halfedges(&self, v: VertexHandle) -> &[HalfEdgeHandle] {
        &self.vertex_halfedges[v.idx()]
    }

    /// Cells incident to vertex `v` (its "cell star").
    pub fn vertex_cells(&self, v: VertexHandle) -> &[CellHandle] {
        &self.vertex_cells[v.idx()]
    }

    /// Half-faces incident to edge `e`.
    pub fn edge_halffaces(&self, e: EdgeHandle) -> &[HalfFaceHandle] {
        &self.edge_halffaces[e.idx()]
    }

    /// Cells incident to edge `e` (the cells fanned around it).
    pub fn edge_cells(&self, e: EdgeHandle) -> &[CellHandle] {
        &self.edge_cells[e.idx()]
    }

    /// Cells incident to face `f` (at most two: the two half-face sides).
    pub fn face_cells(&self, f: FaceHandle) -> [Option<CellHandle>; 2] {
        self.face(f).incident_cell
    }

    pub fn cell_weight(&self, c: CellHandle) -> f64 {
        self.cell_weight[c.idx()]
    }
    pub fn set_cell_weight(&mut self, c: CellHandle, w: f64) {
        self.cell_weight[c.idx()] = w;
    }

    pub fn face_weight(&self, f: FaceHandle) -> f64 {
        self.face_weight[f.idx()]
    }
    pub fn set_face_weight(&mut self, f: FaceHandle, w: f64) {
        self.face_weight[f.idx()] = w;
    }

    pub fn edge_weight(&self, e: EdgeHandle) -> f64 {
        self.edge_weight[e.idx()]
    }
    pub fn set_edge_weight(&mut self, e: EdgeHandle, w: f64) {
        self.edge_weight[e.idx()] = w;
    }

    /// Logs aggregate arena sizes after a mesh load.
    pub fn log_memory_statistics(&self) {
        log::debug!(
            "mesh: {} verts, {} edges, {} faces, {} cells",
            self.n_vertices(),
            self.n_edges(),
            self.n_faces(),
            self.n_cells()
        );
        let total_vertex_halfedges: usize = self.vertex_halfedges.iter().map(Vec::len).sum();
        let total_edge_halffaces: usize = self.edge_halffaces.iter().map(Vec::len).sum();
        log::debug!(
            "mesh: total_outgoing_halfedges_per_vertex={} total_incident_halffaces_per_edge={}",
            total_vertex_halfedges,
            total_edge_halffaces
        );
    }
}

/// Builds a [`MeshStore`] from raw vertex points and 0-based tetrahedron
/// vertex-index quadruples, deriving edges and faces by canonicalized
/// dedup and all bottom-up incidences in one pass.
#[derive(Default)]
pub struct MeshBuilder {
    points: Vec<DVec3>,
    cell_vertices: Vec<[VertexHandle; 4]>,
    cell_weights: Vec<f64>,
}

/// The 4 triangular faces of a tetrahedron, as local vertex index triples,
/// ordered so each is opposite the vertex not listed.
const CELL_FACE_LOCAL_VERTICES: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];
/// The 6 edges of a tetrahedron, as local vertex index pairs.
const CELL_EDGE_LOCAL_VERTICES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, p: DVec3) -> VertexHandle {
        self.points.push(p);
        VertexHandle::new(self.points.len() - 1)
    }

    /// Adds a tetrahedron given 0-based vertex handles. `weight` defaults to
    /// 1.0 when the input file carries none.
    pub fn add_cell(&mut self, vertices: [VertexHandle; 4], weight: f64) -> CellHandle {
        self.cell_vertices.push(vertices);
        self.cell_weights.push(weight);
        CellHandle::new(self.cell_vertices.len() - 1)
    }

    pub fn build(self) -> MeshStore {
        use std::collections::HashMap;

        let n_verts = self.points.len();
        let n_cells = self.cell_vertices.len();

        let mut edges: Vec<Edge> = Vec::new();
        let mut edge_index: HashMap<(u32, u32), EdgeHandle> = HashMap::new();
        let mut faces: Vec<Face> = Vec::new();
        let mut face_index: HashMap<(u32, u32, u32), FaceHandle> = HashMap::new();

        let mut cell_edges: Vec<[EdgeHandle; 6]> = Vec::with_capacity(n_cells);
        let mut cell_faces: Vec<[FaceHandle; 4]> = Vec::with_capacity(n_cells);

        let mut intern_edge = |edges: &mut Vec<Edge>, a: VertexHandle, b: VertexHandle| -> EdgeHandle {
            let key = if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) };
            *edge_index.entry(key).or_insert_with(|| {
                edges.push(Edge { from: a, to: b });
                EdgeHandle::new(edges.len() - 1)
            })
        };

        for cv in &self.cell_vertices {
            let mut ce = [EdgeHandle::INVALID; 6];
            for (i, pair) in CELL_EDGE_LOCAL_VERTICES.iter().enumerate() {
                ce[i] = intern_edge(&mut edges, cv[pair[0]], cv[pair[1]]);
            }
            cell_edges.push(ce);
        }

        for (ci, cv) in self.cell_vertices.iter().enumerate() {
            let mut cf = [FaceHandle::INVALID; 4];
            for (i, tri) in CELL_FACE_LOCAL_VERTICES.iter().enumerate() {
                let (a, b, c) = (cv[tri[0]], cv[tri[1]], cv[tri[2]]);
                let mut sorted = [a.0, b.0, c.0];
                sorted.sort_unstable();
                let key = (sorted[0], sorted[1], sorted[2]);
                let fh = *face_index.entry(key).or_insert_with(|| {
                    let fe = [
                        intern_edge(&mut edges, a, b),
                        intern_edge(&mut edges, b, c),
                        intern_edge(&mut edges, c, a),
                    ];
                    faces.push(Face {
                        vertices: [a, b, c],
                        edges: fe,
                        incident_cell: [None, None],
                    });
                    FaceHandle::new(faces.len() - 1)
                });
                let face = &mut faces[fh.idx()];
                if face.incident_cell[0].is_none() {
                    face.incident_cell[0] = Some(CellHandle::new(ci));
                } else {
                    face.incident_cell[1] = Some(CellHandle::new(ci));
                }
                cf[i] = fh;
            }
            cell_faces.push(cf);
        }

        let cells: Vec<Cell> = (0..n_cells)
            .map(|ci| Cell {
                vertices: self.cell_vertices[ci],
                edges: cell_edges[ci],
                faces: cell_faces[ci],
            })
            .collect();

        let mut vertex_halfedges: Vec<Vec<HalfEdgeHandle>> = vec![Vec::new(); n_verts];
        for (ei, e) in edges.iter().enumerate() {
            vertex_halfedges[e.from.idx()].push(HalfEdgeHandle(2 * ei as u32));
            vertex_halfedges[e.to.idx()].push(HalfEdgeHandle(2 * ei as u32 + 1));
        }

        let mut vertex_cells: Vec<Vec<CellHandle>> = vec![Vec::new(); n_verts];
        let mut edge_cells: Vec<Vec<CellHandle>> = vec![Vec::new(); edges.len()];
        let mut edge_halffaces: Vec<Vec<HalfFaceHandle>> = vec![Vec::new(); edges.len()];

        for (ci, cell) in cells.iter().enumerate() {
            let ch = CellHandle::new(ci);
            for v in cell.vertices {
                let bucket = &mut vertex_cells[v.idx()];
                if !bucket.contains(&ch) {
                    bucket.push(ch);
                }
            }
            for e in cell.edges {
                let bucket = &mut edge_cells[e.idx()];
                if !bucket.contains(&ch) {
                    bucket.push(ch);
                }
            }
        }
        for (fi, face) in faces.iter().enumerate() {
            for side in 0..2 {
                if face.incident_cell[side].is_some() {
                    for e in face.edges {
                        edge_halffaces[e.idx()].push(HalfFaceHandle(2 * fi as u32 + side as u32));
                    }
                }
            }
        }

        let face_weight = vec![f64::INFINITY; faces.len()];
        let edge_weight = vec![f64::INFINITY; edges.len()];

        MeshStore {
            points: self.points,
            edges,
            faces,
            cells,
            vertex_halfedges,
            vertex_cells,
            edge_halffaces,
            edge_cells,
            cell_weight: self.cell_weights,
            face_weight,
            edge_weight,
        }
    }
}
