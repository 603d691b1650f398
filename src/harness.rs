//! Query harness: a single labelled query, and the seeded-random batch mode
//! that drives many queries and histograms their approximation ratio.
//!
//! A batch draws a seeded RNG's uniform source/target vertex pairs, bins
//! their approximation ratios into a 10-bin histogram over `[1.0, 1.1]`, and
//! appends one row to an append-only `distances.csv`-style side file: each
//! row is `stretch, yardstick, |V|, |E|, dist_1, dist_2, ...`, one row per
//! *batch*, not per query. The row is built up in memory and handed to a
//! [`Sink`] the caller threads through explicitly — no global mutable
//! stream — once per batch.

use std::io::Write;

use rand::Rng;

use crate::error::WspError;
use crate::graph::{NodeId, WspGraph};
use crate::mesh::MeshStore;
use crate::result::{extract, QueryResult};
use crate::solver::dijkstra;

/// Number of histogram bins spanning `[1.0, 1.1]`.
pub const HISTOGRAM_BINS: usize = 10;
const HISTOGRAM_LO: f64 = 1.0;
const HISTOGRAM_HI: f64 = 1.1;

/// One `distances.csv` row's worth of data for a completed batch: the
/// configuration that produced the graph, the graph's size, and every
/// per-query distance in the order the queries ran.
pub struct BatchRow {
    pub stretch: f64,
    pub yardstick: f64,
    pub n_nodes: usize,
    pub n_edges: usize,
    pub distances: Vec<f64>,
}

/// Where a completed batch appends its one CSV row. Threaded explicitly
/// rather than held in a global.
pub trait Sink {
    fn append_row(&mut self, row: &BatchRow) -> Result<(), WspError>;
}

/// Appends `stretch, yardstick, |V|, |E|, dist_1, dist_2, ...` to a writer.
pub struct CsvSink<W: Write> {
    writer: W,
    file_name: String,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W, file_name: impl Into<String>) -> Self {
        Self { writer, file_name: file_name.into() }
    }
}

impl<W: Write> Sink for CsvSink<W> {
    fn append_row(&mut self, row: &BatchRow) -> Result<(), WspError> {
        write!(self.writer, "{}, {}, {}, {}, ", row.stretch, row.yardstick, row.n_nodes, row.n_edges)
            .map_err(|source| WspError::IoWrite { file: self.file_name.clone(), source })?;
        for d in &row.distances {
            write!(self.writer, "{}, ", d).map_err(|source| WspError::IoWrite { file: self.file_name.clone(), source })?;
        }
        writeln!(self.writer).map_err(|source| WspError::IoWrite { file: self.file_name.clone(), source })
    }
}

/// A sink that discards the row, for callers that only want the histogram.
pub struct NullSink;

impl Sink for NullSink {
    fn append_row(&mut self, _row: &BatchRow) -> Result<(), WspError> {
        Ok(())
    }
}

/// Runs a single source→target query and returns its [`QueryResult`].
pub fn single_query(
    mesh: &MeshStore,
    graph: &WspGraph,
    source: NodeId,
    target: NodeId,
) -> Result<QueryResult, WspError> {
    if source == target {
        return Err(WspError::InvalidQuery {
            message: format!("source and target are both node {}", source),
        });
    }
    if source >= graph.node_count() || target >= graph.node_count() {
        return Err(WspError::InvalidQuery {
            message: format!(
                "node id out of range: source={} target={} node_count={}",
                source,
                target,
                graph.node_count()
            ),
        });
    }
    let paths = dijkstra(graph, source);
    extract(mesh, graph, &paths, source, target)
}

/// An approximation ratio together with the (source, target) pair that
/// witnessed it, for the batch's min/max report.
#[derive(Clone, Copy, Debug)]
pub struct RatioWitness {
    pub ratio: f64,
    pub source: NodeId,
    pub target: NodeId,
}

pub struct BatchSummary {
    pub queries_run: usize,
    pub unreachable: usize,
    /// `histogram[i]` counts ratios in `[lo + i*w, lo + (i+1)*w)`, the last
    /// bin catching everything `>= HISTOGRAM_HI` too.
    pub histogram: [usize; HISTOGRAM_BINS],
    /// `None` only when every query in the batch was unreachable.
    pub min_ratio: Option<RatioWitness>,
    pub max_ratio: Option<RatioWitness>,
    pub avg_ratio: Option<f64>,
}

fn histogram_bin(ratio: f64) -> usize {
    if ratio < HISTOGRAM_LO {
        return 0;
    }
    let width = (HISTOGRAM_HI - HISTOGRAM_LO) / HISTOGRAM_BINS as f64;
    let bin = ((ratio - HISTOGRAM_LO) / width) as usize;
    bin.min(HISTOGRAM_BINS - 1)
}

/// Draws `count` random source/target pairs (source != target) from the
/// graph's mesh-vertex node ids, runs each query, accumulates the
/// approximation-ratio histogram, and appends one [`BatchRow`] to `sink`
/// once the whole batch is done. A query that raises
/// [`WspError::Unreachable`] is tallied, not propagated — a disconnected
/// pair is routine in a random batch, not a fatal condition — and
/// contributes `f64::INFINITY` to the row's distance list.
#[allow(clippy::too_many_arguments)]
pub fn random_batch(
    mesh: &MeshStore,
    graph: &WspGraph,
    stretch: f64,
    yardstick: f64,
    count: usize,
    rng: &mut impl Rng,
    sink: &mut impl Sink,
) -> Result<BatchSummary, WspError> {
    // Only original mesh-vertex nodes are drawn from, not the full Steiner
    // refinement, so ratios stay comparable across different
    // stretch/yardstick configurations.
    let candidates = graph.mesh_vertex_nodes();
    if candidates.len() < 2 {
        return Err(WspError::ConfigError {
            message: "fewer than 2 mesh-vertex nodes, no query pair is possible".to_string(),
        });
    }

    let mut histogram = [0usize; HISTOGRAM_BINS];
    let mut unreachable = 0usize;
    let mut distances = Vec::with_capacity(count);
    let mut min_ratio: Option<RatioWitness> = None;
    let mut max_ratio: Option<RatioWitness> = None;
    let mut ratio_sum = 0.0;
    let mut ratio_count = 0usize;

    for _ in 0..count {
        let source = candidates[rng.gen_range(0..candidates.len())];
        let mut target = candidates[rng.gen_range(0..candidates.len())];
        while target == source {
            target = candidates[rng.gen_range(0..candidates.len())];
        }

        match single_query(mesh, graph, source, target) {
            Ok(result) => {
                histogram[histogram_bin(result.approx_ratio)] += 1;
                distances.push(result.distance.raw());

                let witness = RatioWitness { ratio: result.approx_ratio, source, target };
                if min_ratio.map_or(true, |m| witness.ratio < m.ratio) {
                    min_ratio = Some(witness);
                }
                if max_ratio.map_or(true, |m| witness.ratio > m.ratio) {
                    max_ratio = Some(witness);
                }
                ratio_sum += result.approx_ratio;
                ratio_count += 1;
            }
            Err(WspError::Unreachable { .. }) => {
                unreachable += 1;
                distances.push(f64::INFINITY);
            }
            Err(other) => return Err(other),
        }
    }

    sink.append_row(&BatchRow {
        stretch,
        yardstick,
        n_nodes: graph.node_count(),
        n_edges: graph.edge_count(),
        distances,
    })?;

    let avg_ratio = if ratio_count > 0 { Some(ratio_sum / ratio_count as f64) } else { None };

    Ok(BatchSummary { queries_run: count, unreachable, histogram, min_ratio, max_ratio, avg_ratio })
}
