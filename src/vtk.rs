//! Legacy ASCII VTK writers for five artifact kinds: the mesh itself, the
//! Steiner graph, the shortest-path tree, a single reconstructed path, and
//! the cells a path traverses. Common `POINTS`/`CELLS`/`CELL_TYPES`/`(CELL|
//! POINT)_DATA` section layout, VTK legacy cell type 10 for tetrahedra and 3
//! for lines, and a `-0` sentinel in place of an unreachable node's `+inf`
//! distance so downstream viewers don't choke on a literal `inf` token.

use std::io::{self, Write};

use crate::error::WspError;
use crate::graph::WspGraph;
use crate::mesh::{CellHandle, MeshStore};
use crate::result::QueryResult;
use crate::solver::ShortestPaths;

const VTK_HEADER: &str = "# vtk DataFile Version 2.0";
const CELL_TYPE_TETRA: u8 = 10;
const CELL_TYPE_LINE: u8 = 3;

fn write_header(w: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(w, "{}", VTK_HEADER)?;
    writeln!(w, "{}", title)?;
    writeln!(w, "ASCII")?;
    writeln!(w, "DATASET UNSTRUCTURED_GRID")
}

fn wrap(file_name: &str, result: io::Result<()>) -> Result<(), WspError> {
    result.map_err(|source| WspError::IoWrite { file: file_name.to_string(), source })
}

/// Writes the full tetrahedral mesh, cell-weight-colored ("mesh.vtk").
pub fn write_mesh_vtk(w: &mut impl Write, file_name: &str, mesh: &MeshStore) -> Result<(), WspError> {
    wrap(file_name, write_mesh_vtk_inner(w, mesh))
}

fn write_mesh_vtk_inner(w: &mut impl Write, mesh: &MeshStore) -> io::Result<()> {
    write_header(w, "tetrahedral mesh")?;

    writeln!(w, "POINTS {} double", mesh.n_vertices())?;
    for v in mesh.vertices() {
        let p = mesh.point(v);
        writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
    }

    writeln!(w, "CELLS {} {}", mesh.n_cells(), mesh.n_cells() * 5)?;
    for c in mesh.cell_handles() {
        let cell = mesh.cell(c);
        writeln!(
            w,
            "4 {} {} {} {}",
            cell.vertices[0].idx(),
            cell.vertices[1].idx(),
            cell.vertices[2].idx(),
            cell.vertices[3].idx()
        )?;
    }

    writeln!(w, "CELL_TYPES {}", mesh.n_cells())?;
    for _ in mesh.cell_handles() {
        writeln!(w, "{}", CELL_TYPE_TETRA)?;
    }

    writeln!(w, "CELL_DATA {}", mesh.n_cells())?;
    writeln!(w, "SCALARS weight float 1")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for c in mesh.cell_handles() {
        writeln!(w, "{}", mesh.cell_weight(c))?;
    }
    Ok(())
}

fn write_graph_points(w: &mut impl Write, graph: &WspGraph) -> io::Result<()> {
    writeln!(w, "POINTS {} double", graph.node_count())?;
    for (_, node) in graph.nodes() {
        writeln!(w, "{} {} {}", node.point.x, node.point.y, node.point.z)?;
    }
    Ok(())
}

/// Writes the Steiner graph itself, edge-weight-colored ("steiner_graph.vtk").
pub fn write_graph_vtk(w: &mut impl Write, file_name: &str, graph: &WspGraph) -> Result<(), WspError> {
    wrap(file_name, write_graph_vtk_inner(w, graph))
}

fn write_graph_vtk_inner(w: &mut impl Write, graph: &WspGraph) -> io::Result<()> {
    write_header(w, "steiner graph")?;
    write_graph_points(w, graph)?;

    let edges: Vec<(usize, usize, f64)> = (0..graph.node_count())
        .flat_map(|u| graph.neighbors(u).filter(move |&(v, _)| v > u).map(move |(v, w)| (u, v, w.raw())))
        .collect();

    writeln!(w, "CELLS {} {}", edges.len(), edges.len() * 3)?;
    for (u, v, _) in &edges {
        writeln!(w, "2 {} {}", u, v)?;
    }
    writeln!(w, "CELL_TYPES {}", edges.len())?;
    for _ in &edges {
        writeln!(w, "{}", CELL_TYPE_LINE)?;
    }

    writeln!(w, "CELL_DATA {}", edges.len())?;
    writeln!(w, "SCALARS edge_weight float 1")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for (_, _, weight) in &edges {
        writeln!(w, "{}", weight)?;
    }
    Ok(())
}

/// Writes every graph node plus, per node, a line to its shortest-path
/// predecessor and a `distance` point-scalar; `-0` stands in for an
/// unreachable node's infinite distance ("wsp_tree.vtk").
pub fn write_shortest_path_tree_vtk(
    w: &mut impl Write,
    file_name: &str,
    graph: &WspGraph,
    paths: &ShortestPaths,
    source: usize,
) -> Result<(), WspError> {
    wrap(file_name, write_tree_inner(w, graph, paths, source))
}

fn write_tree_inner(w: &mut impl Write, graph: &WspGraph, paths: &ShortestPaths, source: usize) -> io::Result<()> {
    write_header(w, "shortest path tree")?;

    writeln!(w, "POINTS {} double", graph.node_count())?;
    for (_, node) in graph.nodes() {
        writeln!(w, "{} {} {}", node.point.x, node.point.y, node.point.z)?;
    }

    let edges: Vec<(usize, usize)> = (0..graph.node_count())
        .filter(|&v| v != source && paths.dist[v].is_finite())
        .map(|v| (v, paths.pred[v]))
        .collect();

    writeln!(w, "CELLS {} {}", edges.len(), edges.len() * 3)?;
    for (u, v) in &edges {
        writeln!(w, "2 {} {}", u, v)?;
    }
    writeln!(w, "CELL_TYPES {}", edges.len())?;
    for _ in &edges {
        writeln!(w, "{}", CELL_TYPE_LINE)?;
    }

    writeln!(w, "POINT_DATA {}", graph.node_count())?;
    writeln!(w, "SCALARS distance float 1")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for v in 0..graph.node_count() {
        if paths.dist[v].is_finite() {
            writeln!(w, "{}", paths.dist[v].raw())?;
        } else {
            writeln!(w, "-0")?;
        }
    }
    Ok(())
}

/// Writes only the nodes/edges on one reconstructed path
/// ("wsp_path_s{s}_t{t}.vtk").
pub fn write_shortest_path_vtk(w: &mut impl Write, file_name: &str, graph: &WspGraph, result: &QueryResult) -> Result<(), WspError> {
    wrap(file_name, write_path_inner(w, graph, result))
}

fn write_path_inner(w: &mut impl Write, graph: &WspGraph, result: &QueryResult) -> io::Result<()> {
    write_header(w, "shortest path")?;
    write_graph_points(w, graph)?;

    let n_edges = result.path.len().saturating_sub(1);
    writeln!(w, "CELLS {} {}", n_edges, n_edges * 3)?;
    for pair in result.path.windows(2) {
        writeln!(w, "2 {} {}", pair[0], pair[1])?;
    }
    writeln!(w, "CELL_TYPES {}", n_edges)?;
    for _ in 0..n_edges {
        writeln!(w, "{}", CELL_TYPE_LINE)?;
    }
    Ok(())
}

/// Writes the subset of tetrahedral cells a path passes through, in the
/// same format as [`write_mesh_vtk`] ("wsp_path_cells_s{s}_t{t}.vtk").
pub fn write_path_cells_vtk(
    w: &mut impl Write,
    file_name: &str,
    mesh: &MeshStore,
    cells: &[CellHandle],
) -> Result<(), WspError> {
    wrap(file_name, write_path_cells_inner(w, mesh, cells))
}

fn write_path_cells_inner(w: &mut impl Write, mesh: &MeshStore, cells: &[CellHandle]) -> io::Result<()> {
    write_header(w, "shortest path traversed cells")?;

    writeln!(w, "POINTS {} double", mesh.n_vertices())?;
    for v in mesh.vertices() {
        let p = mesh.point(v);
        writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
    }

    writeln!(w, "CELLS {} {}", cells.len(), cells.len() * 5)?;
    for &c in cells {
        let cell = mesh.cell(c);
        writeln!(
            w,
            "4 {} {} {} {}",
            cell.vertices[0].idx(),
            cell.vertices[1].idx(),
            cell.vertices[2].idx(),
            cell.vertices[3].idx()
        )?;
    }

    writeln!(w, "CELL_TYPES {}", cells.len())?;
    for _ in cells {
        writeln!(w, "{}", CELL_TYPE_TETRA)?;
    }

    writeln!(w, "CELL_DATA {}", cells.len())?;
    writeln!(w, "SCALARS weight float 1")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for &c in cells {
        writeln!(w, "{}", mesh.cell_weight(c))?;
    }
    Ok(())
}
