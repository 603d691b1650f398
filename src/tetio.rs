//! Reads a tetgen-format `.node`/`.ele` file pair into a [`MeshStore`],
//! following tetgen's own documented column layout plus an optional
//! weight-attribute column.
//!
//! `.node`: `<count> <dim=3> <#attrs> <#boundary markers>` header, then one
//! line per vertex: `<index> <x> <y> <z> [attrs...] [marker]`.
//!
//! `.ele`: `<count> <nodes per tet=4> <#attrs>` header, then one line per
//! tetrahedron: `<index> <v0> <v1> <v2> <v3> [attrs...]`. When `#attrs >= 1`
//! the first attribute is the cell weight (the `M 4 R` region/weight
//! column); with `#attrs == 0` every cell defaults to weight 1.0.
//!
//! `#`-prefixed lines and blank lines are comments, skipped anywhere in
//! either file, matching tetgen's own convention.

use std::fs;
use std::path::Path;

use glam::DVec3;

use crate::error::WspError;
use crate::mesh::{MeshBuilder, MeshStore, VertexHandle};

fn read_lines(path: &Path) -> Result<Vec<String>, WspError> {
    let file_name = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|source| WspError::IoOpen { file: file_name, source })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn parse_field<T: std::str::FromStr>(file: &str, line_no: usize, field: &str) -> Result<T, WspError> {
    field.parse().map_err(|_| WspError::InputParse {
        file: file.to_string(),
        line: line_no,
        message: format!("could not parse field {:?}", field),
    })
}

struct NodeFile {
    points: Vec<DVec3>,
    index_base: i64,
}

fn parse_node_file(path: &Path) -> Result<NodeFile, WspError> {
    let file = path.display().to_string();
    let lines = read_lines(path)?;
    let mut iter = lines.iter().enumerate();

    let (header_no, header) = iter.next().ok_or_else(|| WspError::InputParse {
        file: file.clone(),
        line: 0,
        message: "empty .node file".to_string(),
    })?;
    let header_fields: Vec<&str> = header.split_whitespace().collect();
    if header_fields.len() < 4 {
        return Err(WspError::InputParse {
            file,
            line: header_no + 1,
            message: format!("expected 4 header fields, got {}", header_fields.len()),
        });
    }
    let count: usize = parse_field(&file, header_no + 1, header_fields[0])?;
    let dim: usize = parse_field(&file, header_no + 1, header_fields[1])?;
    if dim != 3 {
        return Err(WspError::InputParse {
            file,
            line: header_no + 1,
            message: format!("expected 3 dimensions, got {}", dim),
        });
    }

    let mut points = Vec::with_capacity(count);
    let mut index_base: Option<i64> = None;
    for (i, line) in iter.take(count) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(WspError::InputParse {
                file,
                line: i + 1,
                message: format!("expected at least 4 fields, got {}", fields.len()),
            });
        }
        let idx: i64 = parse_field(&file, i + 1, fields[0])?;
        if index_base.is_none() {
            index_base = Some(idx);
        }
        let x: f64 = parse_field(&file, i + 1, fields[1])?;
        let y: f64 = parse_field(&file, i + 1, fields[2])?;
        let z: f64 = parse_field(&file, i + 1, fields[3])?;
        points.push(DVec3::new(x, y, z));
    }

    if points.len() != count {
        return Err(WspError::InputParse {
            file,
            line: lines.len(),
            message: format!("header promised {} points, found {}", count, points.len()),
        });
    }

    Ok(NodeFile { points, index_base: index_base.unwrap_or(0) })
}

fn parse_ele_file(path: &Path, index_base: i64) -> Result<(Vec<[i64; 4]>, Vec<f64>), WspError> {
    let file = path.display().to_string();
    let lines = read_lines(path)?;
    let mut iter = lines.iter().enumerate();

    let (header_no, header) = iter.next().ok_or_else(|| WspError::InputParse {
        file: file.clone(),
        line: 0,
        message: "empty .ele file".to_string(),
    })?;
    let header_fields: Vec<&str> = header.split_whitespace().collect();
    if header_fields.len() < 3 {
        return Err(WspError::InputParse {
            file,
            line: header_no + 1,
            message: format!("expected 3 header fields, got {}", header_fields.len()),
        });
    }
    let count: usize = parse_field(&file, header_no + 1, header_fields[0])?;
    let nodes_per_tet: usize = parse_field(&file, header_no + 1, header_fields[1])?;
    if nodes_per_tet != 4 {
        return Err(WspError::InputParse {
            file,
            line: header_no + 1,
            message: format!("expected 4 nodes per tetrahedron, got {}", nodes_per_tet),
        });
    }
    // The third header field is usually a numeric attribute count, but
    // tetgen's own convention also allows the literal `R` to mark "one
    // region/weight column follows" without stating a count.
    let n_attrs: usize = if header_fields[2].eq_ignore_ascii_case("r") {
        1
    } else {
        parse_field(&file, header_no + 1, header_fields[2])?
    };

    let mut cells = Vec::with_capacity(count);
    let mut weights = Vec::with_capacity(count);
    for (i, line) in iter.take(count) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let min_fields = 5 + n_attrs;
        if fields.len() < min_fields {
            return Err(WspError::InputParse {
                file,
                line: i + 1,
                message: format!("expected at least {} fields, got {}", min_fields, fields.len()),
            });
        }
        let mut vs = [0i64; 4];
        for k in 0..4 {
            vs[k] = parse_field::<i64>(&file, i + 1, fields[1 + k])? - index_base;
        }
        cells.push(vs);
        let weight = if n_attrs >= 1 {
            parse_field::<f64>(&file, i + 1, fields[5])?
        } else {
            1.0
        };
        weights.push(weight);
    }

    if cells.len() != count {
        return Err(WspError::InputParse {
            file,
            line: lines.len(),
            message: format!("header promised {} tetrahedra, found {}", count, cells.len()),
        });
    }

    Ok((cells, weights))
}

/// Loads a `MeshStore` from a `.node`/`.ele` pair.
pub fn load_mesh(node_path: &Path, ele_path: &Path) -> Result<MeshStore, WspError> {
    let node_file = parse_node_file(node_path)?;
    let (cells, weights) = parse_ele_file(ele_path, node_file.index_base)?;

    let mut builder = MeshBuilder::new();
    let vertices: Vec<VertexHandle> = node_file.points.iter().map(|&p| builder.add_vertex(p)).collect();

    let ele_file = ele_path.display().to_string();
    for (i, (cell, weight)) in cells.into_iter().zip(weights).enumerate() {
        let mut vs = [VertexHandle::INVALID; 4];
        for k in 0..4 {
            let idx = cell[k];
            if idx < 0 || idx as usize >= vertices.len() {
                return Err(WspError::InputParse {
                    file: ele_file.clone(),
                    line: i + 2,
                    message: format!("vertex index {} out of range (0..{})", idx, vertices.len()),
                });
            }
            vs[k] = vertices[idx as usize];
        }
        builder.add_cell(vs, weight);
    }

    let mesh = builder.build();
    mesh.log_memory_statistics();
    Ok(mesh)
}
