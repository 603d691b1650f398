//! Generates a regular cuboid test fixture directly as a `.node`/`.ele`
//! pair, without depending on an external `tetgen` binary. Each hexahedral
//! grid cell is split into 6 tetrahedra itself (the standard diagonal
//! decomposition tetgen itself produces for an axis-aligned box), and the
//! result is emitted straight to `.node`/`.ele` text.

use glam::DVec3;

/// `nx * ny * nz` unit hexahedral cells, each `cell_size` on a side,
/// starting at the origin.
pub struct CuboidSpec {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub cell_size: f64,
}

pub struct CuboidMesh {
    pub points: Vec<DVec3>,
    /// 0-based vertex index quadruples.
    pub tetrahedra: Vec<[usize; 4]>,
}

/// The 6-tetrahedron decomposition of a hexahedron, as local corner indices
/// `0..8` ordered `(x,y,z) in {0,1}^3` with `x` varying fastest. This is the
/// same diagonal split tetgen itself produces for an axis-aligned box.
const HEX_TO_TETS: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 7, 5],
    [0, 5, 7, 4],
    [0, 3, 7, 2],
    [0, 7, 2, 6],
    [0, 7, 6, 4],
];

pub fn generate(spec: &CuboidSpec) -> CuboidMesh {
    let (nx, ny, nz) = (spec.nx, spec.ny, spec.nz);
    let verts_x = nx + 1;
    let verts_y = ny + 1;
    let verts_z = nz + 1;

    let mut points = Vec::with_capacity(verts_x * verts_y * verts_z);
    let vertex_index = |i: usize, j: usize, k: usize| -> usize { (k * verts_y + j) * verts_x + i };

    for k in 0..verts_z {
        for j in 0..verts_y {
            for i in 0..verts_x {
                points.push(DVec3::new(
                    i as f64 * spec.cell_size,
                    j as f64 * spec.cell_size,
                    k as f64 * spec.cell_size,
                ));
            }
        }
    }

    let mut tetrahedra = Vec::with_capacity(nx * ny * nz * 6);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let corners = [
                    vertex_index(i, j, k),
                    vertex_index(i + 1, j, k),
                    vertex_index(i, j + 1, k),
                    vertex_index(i + 1, j + 1, k),
                    vertex_index(i, j, k + 1),
                    vertex_index(i + 1, j, k + 1),
                    vertex_index(i, j + 1, k + 1),
                    vertex_index(i + 1, j + 1, k + 1),
                ];
                for tet in &HEX_TO_TETS {
                    tetrahedra.push([corners[tet[0]], corners[tet[1]], corners[tet[2]], corners[tet[3]]]);
                }
            }
        }
    }

    CuboidMesh { points, tetrahedra }
}

/// Renders the `.node` file text for a generated cuboid (0-indexed, no
/// attributes or boundary markers).
pub fn render_node_file(mesh: &CuboidMesh) -> String {
    let mut out = format!("{} 3 0 0\n", mesh.points.len());
    for (i, p) in mesh.points.iter().enumerate() {
        out.push_str(&format!("{} {} {} {}\n", i, p.x, p.y, p.z));
    }
    out
}

/// Renders the `.ele` file text. With `weight` given, every cell carries
/// that constant weight as its single attribute (the `M 4 R` column); with
/// `None`, no attribute column is written and loaders default to 1.0.
pub fn render_ele_file(mesh: &CuboidMesh, weight: Option<f64>) -> String {
    let n_attrs = if weight.is_some() { 1 } else { 0 };
    let mut out = format!("{} 4 {}\n", mesh.tetrahedra.len(), n_attrs);
    for (i, tet) in mesh.tetrahedra.iter().enumerate() {
        match weight {
            Some(w) => out.push_str(&format!("{} {} {} {} {} {}\n", i, tet[0], tet[1], tet[2], tet[3], w)),
            None => out.push_str(&format!("{} {} {} {} {}\n", i, tet[0], tet[1], tet[2], tet[3])),
        }
    }
    out
}
