//! # tet-wsp
//!
//! CLI for weighted shortest paths through a tetrahedral subdivision: load a
//! `.node`/`.ele` mesh, build a Steiner-point spanner graph over it, and run
//! single or random-batch Dijkstra queries, with optional VTK visualization
//! dumps.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::ExitCode;

use clap::{crate_version, App, Arg, SubCommand};
use rand::{Rng, SeedableRng};

use tet_wsp::error::WspError;
use tet_wsp::meta::SolverConfig;
use tet_wsp::{cuboid, harness, result, solver, steiner, tetio, vtk, weights};

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));

    let matches = App::new("tet-wsp")
        .version(crate_version!())
        .about("Weighted shortest paths through a tetrahedral subdivision")
        .subcommand(
            SubCommand::with_name("solve")
                .about("Build the Steiner graph and run shortest-path queries")
                .arg(
                    Arg::with_name("input-mesh")
                        .takes_value(true)
                        .required(true)
                        .index(1)
                        .help("basename of the <base>.node / <base>.ele pair"),
                )
                .arg(
                    Arg::with_name("start_vertex")
                        .short("s")
                        .long("start_vertex")
                        .takes_value(true)
                        .default_value("-1")
                        .help("source vertex index; -1 picks at random"),
                )
                .arg(
                    Arg::with_name("termination_vertex")
                        .short("t")
                        .long("termination_vertex")
                        .takes_value(true)
                        .default_value("-1")
                        .help("target vertex index; -1 picks at random"),
                )
                .arg(
                    Arg::with_name("random_s_t_vertices")
                        .short("r")
                        .long("random_s_t_vertices")
                        .takes_value(true)
                        .default_value("0")
                        .help("number of random (s, t) query pairs to run in batch mode"),
                )
                .arg(
                    Arg::with_name("spanner_stretch")
                        .short("x")
                        .long("spanner_stretch")
                        .takes_value(true)
                        .default_value("0.0")
                        .help(">=0 selects the spanner interval scheme (stretch = 1+x); <0 selects surface-only"),
                )
                .arg(
                    Arg::with_name("yardstick")
                        .short("y")
                        .long("yardstick")
                        .takes_value(true)
                        .default_value("0.0")
                        .help("edge-subdivision interval; 0 disables Steiner subdivision"),
                )
                .arg(Arg::with_name("write_mesh_vtk").short("m").long("write_mesh_vtk").help("emit mesh.vtk"))
                .arg(
                    Arg::with_name("write_steiner_graph_vtk")
                        .short("g")
                        .long("write_steiner_graph_vtk")
                        .help("emit steiner_graph.vtk"),
                )
                .arg(
                    Arg::with_name("use-random-cellweights")
                        .short("u")
                        .long("use-random-cellweights")
                        .help("override input cell weights with uniform[1,1000) draws"),
                )
                .arg(
                    Arg::with_name("seed")
                        .long("seed")
                        .takes_value(true)
                        .default_value("0")
                        .help("RNG seed for random cell weights and random query pairs"),
                )
                .arg(
                    Arg::with_name("dedup-tolerance")
                        .long("dedup-tolerance")
                        .takes_value(true)
                        .default_value("0.00000001")
                        .help("absolute tolerance for Steiner point deduplication"),
                )
                .arg(
                    Arg::with_name("config")
                        .long("config")
                        .takes_value(true)
                        .help("load a SolverConfig from a YAML file instead of the flags above"),
                ),
        )
        .subcommand(
            SubCommand::with_name("build-cuboid")
                .about("Generate a hexahedral cuboid fixture as a .node/.ele pair")
                .arg(Arg::with_name("output").takes_value(true).required(true).index(1).help("output basename"))
                .arg(Arg::with_name("nx").long("nx").takes_value(true).default_value("4"))
                .arg(Arg::with_name("ny").long("ny").takes_value(true).default_value("4"))
                .arg(Arg::with_name("nz").long("nz").takes_value(true).default_value("4"))
                .arg(Arg::with_name("cell-size").long("cell-size").takes_value(true).default_value("1.0"))
                .arg(Arg::with_name("weight").long("weight").takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("mesh-vtk")
                .about("Load a mesh and dump mesh.vtk without building a Steiner graph")
                .arg(
                    Arg::with_name("input-mesh")
                        .takes_value(true)
                        .required(true)
                        .index(1)
                        .help("basename of the <base>.node / <base>.ele pair"),
                )
                .arg(
                    Arg::with_name("use-random-cellweights")
                        .short("u")
                        .long("use-random-cellweights")
                        .help("override input cell weights with uniform[1,1000) draws"),
                )
                .arg(
                    Arg::with_name("seed")
                        .long("seed")
                        .takes_value(true)
                        .default_value("0")
                        .help("RNG seed for random cell weights"),
                ),
        )
        .get_matches();

    let result = if let Some(matches) = matches.subcommand_matches("solve") {
        run_solve(matches)
    } else if let Some(matches) = matches.subcommand_matches("build-cuboid") {
        run_build_cuboid(matches)
    } else if let Some(matches) = matches.subcommand_matches("mesh-vtk") {
        run_mesh_vtk(matches)
    } else {
        Err(WspError::ConfigError { message: "no subcommand given; try `solve` or `build-cuboid`".to_string() })
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn parse_arg<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Result<T, WspError> {
    matches
        .value_of(name)
        .ok_or_else(|| WspError::ConfigError { message: format!("missing required flag --{}", name) })?
        .parse()
        .map_err(|_| WspError::ConfigError { message: format!("invalid value for --{}", name) })
}

fn run_solve(matches: &clap::ArgMatches) -> Result<(), WspError> {
    let base = matches.value_of("input-mesh").expect("required by clap");
    let node_path = Path::new(&format!("{}.node", base)).to_path_buf();
    let ele_path = Path::new(&format!("{}.ele", base)).to_path_buf();

    let config = match matches.value_of("config") {
        // Same `SolverConfig` a batch of CLI flags would build, loaded from a
        // YAML file instead so a configuration can be checked in and reused
        // across runs.
        Some(path) => {
            let file = File::open(path).map_err(|source| WspError::IoOpen { file: path.to_string(), source })?;
            serde_yaml::from_reader(file)
                .map_err(|e| WspError::ConfigError { message: format!("invalid config file {}: {}", path, e) })?
        }
        None => {
            let start_vertex: i64 = parse_arg(matches, "start_vertex")?;
            let termination_vertex: i64 = parse_arg(matches, "termination_vertex")?;
            SolverConfig {
                start_vertex: if start_vertex < 0 { None } else { Some(start_vertex as usize) },
                termination_vertex: if termination_vertex < 0 { None } else { Some(termination_vertex as usize) },
                random_s_t_vertices: parse_arg(matches, "random_s_t_vertices")?,
                spanner_stretch: parse_arg(matches, "spanner_stretch")?,
                yardstick: parse_arg(matches, "yardstick")?,
                write_mesh_vtk: matches.is_present("write_mesh_vtk"),
                write_steiner_graph_vtk: matches.is_present("write_steiner_graph_vtk"),
                use_random_cellweights: matches.is_present("use-random-cellweights"),
                seed: parse_arg(matches, "seed")?,
                dedup_tolerance: parse_arg(matches, "dedup-tolerance")?,
            }
        }
    };

    log::info!("loading mesh from {}", base);
    let mut mesh = tetio::load_mesh(&node_path, &ele_path)?;

    let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
    if config.use_random_cellweights {
        weights::set_random_cell_weights(&mut mesh, &mut rng);
    }
    weights::derive_face_and_edge_weights(&mut mesh);

    log::info!("building steiner graph");
    let scheme = config.steiner_scheme();
    let graph = steiner::build_graph(&mesh, scheme, config.dedup_tolerance);
    log::info!("graph has {} nodes, {} edges", graph.node_count(), graph.edge_count());

    if config.write_mesh_vtk {
        write_artifact("mesh.vtk", |w| vtk::write_mesh_vtk(w, "mesh.vtk", &mesh))?;
    }
    if config.write_steiner_graph_vtk {
        write_artifact("steiner_graph.vtk", |w| vtk::write_graph_vtk(w, "steiner_graph.vtk", &graph))?;
    }

    if config.random_s_t_vertices > 0 {
        let csv_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open("distances.csv")
            .map_err(|source| WspError::IoOpen { file: "distances.csv".to_string(), source })?;
        let mut sink = harness::CsvSink::new(csv_file, "distances.csv");
        let summary = harness::random_batch(
            &mesh,
            &graph,
            config.spanner_stretch,
            config.yardstick,
            config.random_s_t_vertices,
            &mut rng,
            &mut sink,
        )?;
        log::info!(
            "ran {} queries, {} unreachable, histogram={:?}",
            summary.queries_run,
            summary.unreachable,
            summary.histogram
        );
        match (summary.min_ratio, summary.max_ratio, summary.avg_ratio) {
            (Some(min), Some(max), Some(avg)) => log::info!(
                "approx ratio: min={:.6} (s={}, t={}), max={:.6} (s={}, t={}), avg={:.6}",
                min.ratio,
                min.source,
                min.target,
                max.ratio,
                max.source,
                max.target,
                avg
            ),
            _ => log::info!("approx ratio: no reachable query pairs in this batch"),
        }
        return Ok(());
    }

    // `-s`/`-t` are mesh-vertex indices, which line up 1:1 with the first
    // `mesh.n_vertices()` graph node ids (vertex nodes are added first); a
    // random pick is likewise restricted to mesh vertices so it picks a
    // valid vertex index.
    let vertex_nodes = graph.mesh_vertex_nodes();
    let source = config.start_vertex.unwrap_or_else(|| vertex_nodes[rng.gen_range(0..vertex_nodes.len())]);
    let target = config.termination_vertex.unwrap_or_else(|| vertex_nodes[rng.gen_range(0..vertex_nodes.len())]);

    if source == target {
        return Err(WspError::InvalidQuery { message: format!("source and target are both node {}", source) });
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

    // The tree is emitted regardless of reachability ("-0" stands in for the
    // unreachable nodes' distance); the path and traversed-cells artifacts
    // only make sense when a path actually exists.
    let paths = solver::dijkstra(&graph, source);
    write_artifact(&format!("wsp_tree_s{}.vtk", source), |w| {
        vtk::write_shortest_path_tree_vtk(w, "wsp_tree.vtk", &graph, &paths, source)
    })?;

    match result::extract(&mesh, &graph, &paths, source, target) {
        Ok(query) => {
            log::info!(
                "distance({}, {}) = {}, approx_ratio = {:.6}",
                source,
                target,
                query.distance.raw(),
                query.approx_ratio
            );
            write_artifact(&format!("wsp_path_s{}_t{}.vtk", source, target), |w| {
                vtk::write_shortest_path_vtk(w, "wsp_path.vtk", &graph, &query)
            })?;
            write_artifact(&format!("wsp_path_cells_s{}_t{}.vtk", source, target), |w| {
                vtk::write_path_cells_vtk(w, "wsp_path_cells.vtk", &mesh, &query.traversed_cells)
            })?;
            Ok(())
        }
        Err(WspError::Unreachable { source, target }) => {
            log::warn!("no path from {} to {}; tree.vtk written, path artifacts skipped", source, target);
            Ok(())
        }
        Err(other) => Err(other),
    }
}

fn write_artifact(file_name: &str, body: impl FnOnce(&mut File) -> Result<(), WspError>) -> Result<(), WspError> {
    let mut file = File::create(file_name).map_err(|source| WspError::IoOpen { file: file_name.to_string(), source })?;
    body(&mut file)
}

fn run_mesh_vtk(matches: &clap::ArgMatches) -> Result<(), WspError> {
    let base = matches.value_of("input-mesh").expect("required by clap");
    let node_path = Path::new(&format!("{}.node", base)).to_path_buf();
    let ele_path = Path::new(&format!("{}.ele", base)).to_path_buf();
    let seed: u64 = parse_arg(matches, "seed")?;

    let mut mesh = tetio::load_mesh(&node_path, &ele_path)?;
    if matches.is_present("use-random-cellweights") {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        weights::set_random_cell_weights(&mut mesh, &mut rng);
    }
    weights::derive_face_and_edge_weights(&mut mesh);

    write_artifact("mesh.vtk", |w| vtk::write_mesh_vtk(w, "mesh.vtk", &mesh))
}

fn run_build_cuboid(matches: &clap::ArgMatches) -> Result<(), WspError> {
    let output = matches.value_of("output").expect("required by clap");
    let nx: usize = parse_arg(matches, "nx")?;
    let ny: usize = parse_arg(matches, "ny")?;
    let nz: usize = parse_arg(matches, "nz")?;
    let cell_size: f64 = parse_arg(matches, "cell-size")?;
    let weight: Option<f64> = match matches.value_of("weight") {
        Some(s) => Some(s.parse().map_err(|_| WspError::ConfigError { message: "invalid --weight".to_string() })?),
        None => None,
    };

    let spec = cuboid::CuboidSpec { nx, ny, nz, cell_size };
    let generated = cuboid::generate(&spec);
    log::info!("generated cuboid: {} points, {} tetrahedra", generated.points.len(), generated.tetrahedra.len());

    let node_path = format!("{}.node", output);
    let ele_path = format!("{}.ele", output);
    std::fs::write(&node_path, cuboid::render_node_file(&generated))
        .map_err(|source| WspError::IoWrite { file: node_path, source })?;
    std::fs::write(&ele_path, cuboid::render_ele_file(&generated, weight))
        .map_err(|source| WspError::IoWrite { file: ele_path, source })?;

    Ok(())
}
