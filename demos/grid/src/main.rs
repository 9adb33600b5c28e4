//! grid — smallest end-to-end run of the CH route service.
//!
//! Builds and contracts a synthetic street grid, starts a dispatcher, and
//! fires a batch of shortest-path and round-trip requests at it from a few
//! client threads.  Set `RUST_LOG=debug` to see per-leg search statistics.

mod network;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;

use ch_core::{DispatcherConfig, NodeId};
use ch_dispatch::{AlgorithmSet, RequestDispatcher, RouteError, RouteRequest, SHORTEST_PATH, TRAVELING_SALESMAN};
use ch_search::{RequestPoints, DIST_TO_PREV};

use network::build_grid;

// ── Constants ─────────────────────────────────────────────────────────────────

const WIDTH:           usize = 24;
const HEIGHT:          usize = 16;
const CLIENTS:         usize = 4;
const REQUESTS_EACH:   usize = 12;
const WORKERS:         usize = 3;
const QUEUE_CAPACITY:  usize = 8;
const RESULT_TIMEOUT:  Duration = Duration::from_secs(5);

fn node(x: usize, y: usize) -> NodeId {
    NodeId((y * WIDTH + x) as u32)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    println!("=== grid — contraction hierarchy route service ===");
    println!("Grid: {WIDTH} x {HEIGHT}  |  Workers: {WORKERS}  |  Queue: {QUEUE_CAPACITY}");
    println!();

    // ── Graph ─────────────────────────────────────────────────────────────
    let t0 = Instant::now();
    let graph = Arc::new(build_grid(WIDTH, HEIGHT).context("building grid graph")?);
    println!(
        "Graph: {} nodes, {} edges (incl. shortcuts) in {:.1} ms",
        graph.node_count(),
        graph.edge_count(),
        t0.elapsed().as_secs_f64() * 1e3,
    );

    // ── Dispatcher ────────────────────────────────────────────────────────
    let config = DispatcherConfig {
        worker_threads: WORKERS,
        queue_capacity: QUEUE_CAPACITY,
        ..Default::default()
    };
    let dispatcher = RequestDispatcher::start(Arc::clone(&graph), AlgorithmSet::standard(), config)?;

    // ── One detailed request ──────────────────────────────────────────────
    let corners = [node(0, 0), node(WIDTH - 1, HEIGHT - 1), node(WIDTH - 1, 0)];
    let (request, handle) = RouteRequest::new(SHORTEST_PATH, RequestPoints::from_nodes(&graph, &corners));
    anyhow::ensure!(dispatcher.submit(request), "queue full on first request");
    let bundle = handle.await_result()?;

    println!();
    println!("{:<6} {:<12} {:>10} {:>8}", "Leg", "To", "Metres", "Points");
    println!("{}", "-".repeat(40));
    for (i, way) in bundle.ways.iter().enumerate() {
        let to = bundle.points.get(i + 1);
        println!(
            "{:<6} {:<12} {:>10} {:>8}",
            i,
            to.node.to_string(),
            to.constraint(DIST_TO_PREV).map_or_else(String::new, |d| d.to_string()),
            way.len(),
        );
    }
    println!("Total: {} m, travel time {:.0}", bundle.total_distance, bundle.total_time);

    // ── Round trip ────────────────────────────────────────────────────────
    let stops = [node(3, 2), node(20, 14), node(5, 12), node(18, 3), node(11, 8)];
    let (request, handle) = RouteRequest::new(TRAVELING_SALESMAN, RequestPoints::from_nodes(&graph, &stops));
    anyhow::ensure!(dispatcher.submit(request), "queue full on round trip");
    let bundle = handle.await_result()?;
    let order: Vec<String> = bundle.points.nodes().iter().map(|n| n.to_string()).collect();
    println!();
    println!("Round trip: {} -> back, {} m", order.join(" -> "), bundle.total_distance);

    // ── Load ──────────────────────────────────────────────────────────────
    let t1 = Instant::now();
    let (done, rejected) = thread::scope(|s| {
        let clients: Vec<_> = (0..CLIENTS)
            .map(|c| {
                let (dispatcher, graph) = (&dispatcher, &graph);
                s.spawn(move || {
                    let (mut done, mut rejected) = (0usize, 0usize);
                    for k in 0..REQUESTS_EACH {
                        let from = node((c * 7 + k * 5) % WIDTH, (c + k * 3) % HEIGHT);
                        let to = node((c * 11 + k * 2) % WIDTH, (c * 5 + k) % HEIGHT);
                        let (request, handle) =
                            RouteRequest::new(SHORTEST_PATH, RequestPoints::from_nodes(graph, &[from, to]));
                        dispatcher.submit(request);
                        match handle.await_result_timeout(RESULT_TIMEOUT) {
                            Ok(_) => done += 1,
                            Err(RouteError::CapacityExceeded { .. }) => rejected += 1,
                            Err(e) => eprintln!("client {c}: {e}"),
                        }
                    }
                    (done, rejected)
                })
            })
            .collect();
        clients
            .into_iter()
            .filter_map(|h| h.join().ok())
            .fold((0, 0), |(d, r), (cd, cr)| (d + cd, r + cr))
    });
    println!();
    println!(
        "Load: {done} routed, {rejected} rejected in {:.1} ms",
        t1.elapsed().as_secs_f64() * 1e3,
    );

    dispatcher.shutdown();
    info!("done");
    Ok(())
}
