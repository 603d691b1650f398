//! Derives face and edge weights from cell weights, and the optional random
//! cell-weight generator used by the `use-random-cellweights` flag.
//!
//! Face weight is the min of the two incident cell weights (missing incident
//! cell contributes +infinity); edge weight is the min over every cell
//! incident to the edge.

use rand::Rng;

use crate::mesh::MeshStore;

/// `face_weight[f] = min(cell_weight[c0], cell_weight[c1])`, +inf for a
/// missing incident cell; `edge_weight[e] = min over cells incident to e`.
pub fn derive_face_and_edge_weights(mesh: &mut MeshStore) {
    for f in mesh.face_handles() {
        let [c0, c1] = mesh.face_cells(f);
        let w0 = c0.map_or(f64::INFINITY, |c| mesh.cell_weight(c));
        let w1 = c1.map_or(f64::INFINITY, |c| mesh.cell_weight(c));
        mesh.set_face_weight(f, w0.min(w1));
    }

    for e in mesh.edge_handles() {
        let w = mesh
            .edge_cells(e)
            .iter()
            .map(|c| mesh.cell_weight(*c))
            .fold(f64::INFINITY, f64::min);
        mesh.set_edge_weight(e, w);
    }
}

/// Overrides every cell weight with an independent draw from `Uniform(1,
/// 1000)`: the lower bound keeps weights away from zero while still allowing
/// a wide max/min ratio across the mesh.
pub fn set_random_cell_weights(mesh: &mut MeshStore, rng: &mut impl Rng) {
    for c in mesh.cell_handles() {
        mesh.set_cell_weight(c, rng.gen_range(1.0..1000.0));
    }
}
