use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::{bail, Context as _, Result};
use astar_paths::{
    graphs::{
        adjacency_graph::{AdjacencyGraph, AdjacentEdge},
        VertexId,
    },
    utility::{get_progressbar, RouteProgressBar},
    AStarAlgorithm, AStarConfig, Cancellable, Params, SearchResult,
};
use clap::Parser;
use itertools::Itertools;
use log::{info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

/// Runs unidirectional and bidirectional A* on random pairs of a random
/// geometric graph, checks that both agree and reports their timings.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of vertices of the generated graph
    #[arg(short = 'v', long, default_value_t = 10_000)]
    number_of_vertices: u32,
    /// Random neighbours every vertex is connected to
    #[arg(short, long, default_value_t = 3)]
    edges_per_vertex: u32,
    /// Seed of the graph and of the queries
    #[arg(short, long, default_value_t = 0)]
    seed: u64,
    /// Number of queries to be run
    #[arg(short, long, default_value_t = 100)]
    number_of_queries: u32,
    /// Search configuration in JSON, defaults are used if missing
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Let the graph run bidirectional waves on two threads
    #[arg(short, long)]
    two_threads: bool,
    /// Length bound for reconnecting a detour to the found route
    #[arg(short, long, default_value_t = 100.0)]
    adjust_limit: f64,
    /// Show the progress of the first route build
    #[arg(long)]
    show_route_progress: bool,
    /// Path where the results shall be saved
    #[arg(short = 'r', long)]
    timing_results: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct QueryResult {
    source: VertexId,
    target: VertexId,
    result: SearchResult,
    distance: Option<f64>,
    unidirectional_seconds: f64,
    bidirectional_seconds: f64,
    adjust_result: Option<SearchResult>,
}

#[derive(Debug, Serialize)]
struct BenchmarkSummary<'a> {
    config: &'a AStarConfig,
    number_of_vertices: u32,
    number_of_edges: u32,
    queries: Vec<QueryResult>,
}

fn read_config(path: &Option<PathBuf>) -> Result<AStarConfig> {
    let Some(path) = path else {
        return Ok(AStarConfig::default());
    };
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("unable to open config {}", path.display()))?,
    );
    serde_json::from_reader(reader)
        .with_context(|| format!("unable to parse config {}", path.display()))
}

/// Edges the route was driven along, the first one leading to its start.
fn route_edges(graph: &AdjacencyGraph, path: &[VertexId]) -> Option<Vec<AdjacentEdge>> {
    let first = AdjacentEdge::new(*path.first()?, 0.0);
    let rest: Option<Vec<AdjacentEdge>> = path
        .iter()
        .tuple_windows()
        .map(|(&tail, &head)| {
            let weight = graph.path_weight(&[tail, head])?;
            Some(AdjacentEdge::new(head, weight))
        })
        .collect();
    let mut edges = vec![first];
    edges.extend(rest?);
    Some(edges)
}

/// Moves the route progress bar on for a vertex reached by the wave heading to
/// `heading_to`.
fn report_progress(
    graph: &AdjacencyGraph,
    route_progress: &Mutex<RouteProgressBar>,
    vertex: &VertexId,
    heading_to: &VertexId,
) {
    let (Some(current), Some(heading_to)) = (graph.position(*vertex), graph.position(*heading_to))
    else {
        return;
    };
    if let Ok(mut route_progress) = route_progress.lock() {
        route_progress.update(&current, &heading_to);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let config = read_config(&args.config)?;
    info!("using {}", serde_json::to_string(&config)?);

    let mut graph =
        AdjacencyGraph::random_geometric(args.number_of_vertices, args.edges_per_vertex, args.seed);
    graph.set_two_threads_ready(args.two_threads);
    info!(
        "generated graph with {} vertices and {} edges",
        graph.number_of_vertices(),
        graph.number_of_edges()
    );
    if graph.number_of_vertices() == 0 {
        bail!("the graph has no vertices");
    }

    let algorithm = AStarAlgorithm::with_config(config.clone());
    let cancellable = Cancellable::new();
    let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(1));

    let mut queries = Vec::new();
    let bar = get_progressbar("Running queries", args.number_of_queries as u64);
    for query in 0..args.number_of_queries {
        let source = rng.gen_range(0..args.number_of_vertices);
        let target = rng.gen_range(0..args.number_of_vertices);

        let params = Params::new(&graph, source, target, &cancellable);

        let start = Instant::now();
        let (result, route) = algorithm.find_path(&params);
        let unidirectional = start.elapsed();

        let route_progress = match (graph.position(source), graph.position(target)) {
            (Some(start), Some(finish)) if args.show_route_progress && query == 0 => Some(
                Mutex::new(RouteProgressBar::new("First route", start, finish)),
            ),
            _ => None,
        };
        let bidirectional_params = match &route_progress {
            Some(route_progress) => Params::new(&graph, source, target, &cancellable)
                .with_visitor(|vertex, heading_to, _| {
                    report_progress(&graph, route_progress, vertex, heading_to)
                }),
            None => Params::new(&graph, source, target, &cancellable),
        };

        let start = Instant::now();
        let (bidirectional_result, bidirectional_route) =
            algorithm.find_path_bidirectional(&bidirectional_params);
        let bidirectional = start.elapsed();

        if let Some(route_progress) = &route_progress {
            if let Ok(mut route_progress) = route_progress.lock() {
                route_progress.finish();
            }
        }

        if result != bidirectional_result {
            bail!(
                "{} -> {}: unidirectional returned {} but bidirectional {}",
                source,
                target,
                result,
                bidirectional_result
            );
        }
        if result == SearchResult::Ok {
            let tolerance = 1e-6 * route.distance.max(1.0);
            if (route.distance - bidirectional_route.distance).abs() > tolerance {
                bail!(
                    "{} -> {}: distances differ, {} vs {}",
                    source,
                    target,
                    route.distance,
                    bidirectional_route.distance
                );
            }
            let walked = graph.path_weight(&bidirectional_route.path);
            if walked.map_or(true, |walked| (walked - route.distance).abs() > tolerance) {
                warn!(
                    "{} -> {}: bidirectional path walks {:?} instead of {}",
                    source, target, walked, route.distance
                );
            }
        }

        let adjust_result = route_edges(&graph, &route.path)
            .filter(|edges| edges.len() > 2)
            .and_then(|edges| {
                // Pretend the traveller took a wrong turn at the second vertex.
                let detour = graph
                    .out_edges(route.path[1])
                    .iter()
                    .find(|edge| !route.path.contains(&edge.vertex))?
                    .vertex;
                let adjust_limit = args.adjust_limit;
                let params = Params::new(&graph, detour, target, &cancellable)
                    .with_prev_route(&edges)
                    .with_length_checker(move |weight, _| weight <= adjust_limit);
                Some(algorithm.adjust_route(&params).0)
            });

        queries.push(QueryResult {
            source,
            target,
            result,
            distance: (result == SearchResult::Ok).then_some(route.distance),
            unidirectional_seconds: unidirectional.as_secs_f64(),
            bidirectional_seconds: bidirectional.as_secs_f64(),
            adjust_result,
        });
        bar.inc(1);
    }
    bar.finish_and_clear();

    let average = |seconds: fn(&QueryResult) -> f64| {
        Duration::from_secs_f64(
            queries.iter().map(seconds).sum::<f64>() / queries.len().max(1) as f64,
        )
    };
    println!(
        "unidirectional {:?}, bidirectional {:?} per query over {} queries, {} routes found",
        average(|query| query.unidirectional_seconds),
        average(|query| query.bidirectional_seconds),
        queries.len(),
        queries
            .iter()
            .filter(|query| query.result == SearchResult::Ok)
            .count()
    );

    if let Some(timing_results) = &args.timing_results {
        println!("Writing timing results");
        let summary = BenchmarkSummary {
            config: &config,
            number_of_vertices: graph.number_of_vertices(),
            number_of_edges: graph.number_of_edges(),
            queries,
        };
        let writer = BufWriter::new(File::create(timing_results)?);
        serde_json::to_writer(writer, &summary)?;
    }

    Ok(())
}
