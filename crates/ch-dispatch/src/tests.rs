//! Unit tests for ch-dispatch.

#[cfg(test)]
mod helpers {
    use std::mem;

    use crossbeam::channel::{self, Receiver, Sender};

    use ch_core::{DispatcherConfig, GeoPoint, NodeId};
    use ch_graph::{GraphRep, GraphRepBuilder};
    use ch_search::{RequestPoints, ShortestPathEngine};

    use crate::{Algorithm, RouteOutcome, RouteRequest, RouteResultBundle};

    /// Eight nodes on a 3 × 3 lattice, all rank 0.  Shortest 0 → 7 is 7
    /// (via 3).
    pub fn fixture() -> GraphRep {
        const NODES: [(i32, i32); 8] = [
            (10_000_000, 10_000_000),
            (20_000_000, 20_000_000),
            (20_000_000, 10_000_000),
            (10_000_000, 20_000_000),
            (30_000_000, 10_000_000),
            (30_000_000, 20_000_000),
            (20_000_000, 30_000_000),
            (10_000_000, 30_000_000),
        ];
        const ROADS: [(u32, u32, u32); 9] = [
            (0, 1, 4), (0, 2, 2), (0, 3, 3), (1, 6, 2), (2, 4, 3),
            (3, 7, 4), (4, 5, 4), (5, 7, 5), (6, 7, 3),
        ];
        let mut b = GraphRepBuilder::new();
        for (lat, lon) in NODES {
            b.add_node(GeoPoint::new(lat, lon), 0, 0);
        }
        for (from, to, length) in ROADS {
            b.add_road(NodeId(from), NodeId(to), length, 1.0);
        }
        b.build().unwrap()
    }

    pub fn points(graph: &GraphRep, nodes: &[u32]) -> RequestPoints {
        let nodes: Vec<NodeId> = nodes.iter().copied().map(NodeId).collect();
        RequestPoints::from_nodes(graph, &nodes)
    }

    pub fn config(workers: usize, capacity: usize) -> DispatcherConfig {
        DispatcherConfig {
            worker_threads: workers,
            queue_capacity: capacity,
            ..Default::default()
        }
    }

    /// Blocks the worker running it until the gate's sender is dropped.
    pub struct Gate {
        entered: Sender<()>,
        release: Receiver<()>,
    }

    /// `(algorithm, entered signals, release)`.
    pub fn gate() -> (Gate, Receiver<()>, Sender<()>) {
        let (entered, entered_rx) = channel::unbounded();
        let (release_tx, release) = channel::bounded(0);
        (Gate { entered, release }, entered_rx, release_tx)
    }

    impl Algorithm for Gate {
        fn compute(&self, _engine: &mut ShortestPathEngine, request: &mut RouteRequest) -> RouteOutcome {
            let _ = self.entered.send(());
            let _ = self.release.recv();
            Ok(RouteResultBundle::new(Vec::new(), 0, mem::take(&mut request.points)))
        }
    }

    /// Reports the name of the thread it runs on.
    pub struct ThreadName(pub Sender<String>);

    impl Algorithm for ThreadName {
        fn compute(&self, _engine: &mut ShortestPathEngine, request: &mut RouteRequest) -> RouteOutcome {
            let name = std::thread::current().name().unwrap_or_default().to_string();
            let _ = self.0.send(name);
            Ok(RouteResultBundle::new(Vec::new(), 0, mem::take(&mut request.points)))
        }
    }
}

// ── Algorithms end to end ─────────────────────────────────────────────────────

#[cfg(test)]
mod algorithms {
    use std::sync::Arc;

    use ch_core::{GeoPoint, NodeId};
    use ch_graph::GraphRepBuilder;
    use ch_search::{ConstraintValue, RequestPoint, RequestPoints, SearchError, DIST_TO_PREV};

    use crate::{AlgorithmSet, RequestDispatcher, RouteError, RouteRequest};

    use super::helpers::{config, fixture, points};

    fn dispatcher() -> (RequestDispatcher, Arc<ch_graph::GraphRep>) {
        let graph = Arc::new(fixture());
        let d = RequestDispatcher::start(Arc::clone(&graph), AlgorithmSet::standard(), config(2, 8)).unwrap();
        (d, graph)
    }

    #[test]
    fn standard_set() {
        assert_eq!(AlgorithmSet::standard().names(), vec!["sp", "tsp"]);
        assert!(AlgorithmSet::new().is_empty());
    }

    #[test]
    fn shortest_path_request() {
        let (d, graph) = dispatcher();
        let (request, handle) = RouteRequest::new("sp", points(&graph, &[0, 7]));
        assert!(d.submit(request));

        let bundle = handle.await_result().unwrap();
        assert_eq!(bundle.total_distance, 7);
        assert_eq!(bundle.total_time, 7.0);
        assert_eq!(bundle.ways.len(), 1);
        assert_eq!(bundle.ways[0].len(), 3);
        assert_eq!(bundle.points.get(1).constraint(DIST_TO_PREV), Some(ConstraintValue::Int(7)));
        assert!(bundle.matrix.is_none());
    }

    #[test]
    fn shortest_path_tour() {
        let (d, graph) = dispatcher();
        let (request, handle) = RouteRequest::new("sp", points(&graph, &[0, 6, 4]));
        assert!(d.submit(request.with_tour(true)));

        let bundle = handle.await_result().unwrap();
        assert_eq!(bundle.ways.len(), 3);
        assert_eq!(bundle.total_distance, 22);
    }

    #[test]
    fn traveling_salesman_request() {
        let (d, graph) = dispatcher();
        let (request, handle) = RouteRequest::new("tsp", points(&graph, &[0, 7, 2, 6]));
        assert!(d.submit(request));

        let bundle = handle.await_result().unwrap();
        // From 0: 2 (2), then 6 (8, vs 9 to 7), then 7 (3), back to 0 (7).
        assert_eq!(bundle.points.nodes(), vec![NodeId(0), NodeId(2), NodeId(6), NodeId(7)]);
        assert_eq!(bundle.ways.len(), 4);
        assert_eq!(bundle.total_distance, 20);

        let matrix = bundle.matrix.unwrap();
        assert!(matrix.is_symmetric());
        assert_eq!(matrix.get(0, 1), 7); // submitted order: 0 → 7
        assert_eq!(matrix.get(2, 3), 8); // 2 → 6
    }

    #[test]
    fn unknown_algorithm() {
        let (d, graph) = dispatcher();
        let (request, handle) = RouteRequest::new("nope", points(&graph, &[0, 1]));
        assert!(d.submit(request));
        assert_eq!(handle.await_result(), Err(RouteError::UnknownAlgorithm("nope".into())));
    }

    #[test]
    fn waypoint_outside_graph() {
        let (d, graph) = dispatcher();
        let mut pts = points(&graph, &[0]);
        pts.push(RequestPoint::new(NodeId(99), GeoPoint::default()));
        let (request, handle) = RouteRequest::new("sp", pts);
        assert!(d.submit(request));
        assert_eq!(
            handle.await_result(),
            Err(RouteError::InvalidNode { index: 1, node: NodeId(99), count: 8 })
        );
    }

    #[test]
    fn tour_failure_names_submitted_waypoint() {
        // a <-> b -> c: c is a dead end, so the closing leg back to a fails.
        let mut b = GraphRepBuilder::new();
        let a = b.add_node(GeoPoint::new(0, 0), 0, 0);
        let m = b.add_node(GeoPoint::new(0, 1), 0, 0);
        let c = b.add_node(GeoPoint::new(0, 2), 0, 0);
        b.add_road(a, m, 1, 1.0);
        b.add_edge(m, c, 1, 1.0);
        let graph = Arc::new(b.build().unwrap());
        let d = RequestDispatcher::start(Arc::clone(&graph), AlgorithmSet::standard(), config(1, 1)).unwrap();

        // Submitted [a, c, m]; visited a -> m -> c -> a.  The closing leg is
        // third in the tour but starts at submitted waypoint 1.
        let (request, handle) = RouteRequest::new("tsp", RequestPoints::from_nodes(&graph, &[a, c, m]));
        assert!(d.submit(request));
        assert_eq!(
            handle.await_result(),
            Err(RouteError::NoPath(SearchError::NoPathFound { leg: 1, from: c, to: a }))
        );
    }

    #[test]
    fn no_path_reported_with_leg() {
        let mut b = GraphRepBuilder::new();
        let x = b.add_node(GeoPoint::new(0, 0), 0, 0);
        let y = b.add_node(GeoPoint::new(0, 1), 0, 1);
        b.add_edge(y, x, 1, 1.0);
        let d = RequestDispatcher::start(Arc::new(b.build().unwrap()), AlgorithmSet::standard(), config(1, 1))
            .unwrap();

        let pts: RequestPoints = vec![RequestPoint::new(x, GeoPoint::default()), RequestPoint::new(y, GeoPoint::default())].into();
        let (request, handle) = RouteRequest::new("sp", pts);
        assert!(d.submit(request));
        assert_eq!(
            handle.await_result(),
            Err(RouteError::NoPath(SearchError::NoPathFound { leg: 0, from: x, to: y }))
        );
    }
}

// ── Queue, workers, shutdown ──────────────────────────────────────────────────

#[cfg(test)]
mod dispatcher {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use crossbeam::channel;

    use ch_core::{EngineConfig, NodeId};
    use ch_search::ShortestPathEngine;

    use crate::{AlgorithmSet, DispatchError, RequestDispatcher, RouteError, RouteRequest};

    use super::helpers::{config, fixture, gate, points, ThreadName};

    const WAIT: Duration = Duration::from_secs(10);

    #[test]
    fn invalid_config_rejected() {
        let result = RequestDispatcher::start(Arc::new(fixture()), AlgorithmSet::standard(), config(0, 4));
        assert!(matches!(result, Err(DispatchError::Config(_))));
        let result = RequestDispatcher::start(Arc::new(fixture()), AlgorithmSet::standard(), config(1, 0));
        assert!(matches!(result, Err(DispatchError::Config(_))));
    }

    #[test]
    fn full_queue_rejects_and_accepted_requests_complete() {
        let graph = Arc::new(fixture());
        let (gate, entered, release) = gate();
        let mut algorithms = AlgorithmSet::standard();
        algorithms.register("gate", gate);
        let d = RequestDispatcher::start(Arc::clone(&graph), algorithms, config(2, 3)).unwrap();
        assert_eq!(d.worker_count(), 2);
        assert_eq!(d.capacity(), 3);

        let mut handles = Vec::new();
        // Occupy both workers.
        for _ in 0..2 {
            let (request, handle) = RouteRequest::new("gate", points(&graph, &[0]));
            assert!(d.submit(request));
            handles.push(handle);
        }
        for _ in 0..2 {
            entered.recv_timeout(WAIT).unwrap();
        }
        // Fill the queue.
        for _ in 0..3 {
            let (request, handle) = RouteRequest::new("sp", points(&graph, &[0, 7]));
            assert!(d.submit(request));
            handles.push(handle);
        }
        assert_eq!(d.queued(), 3);

        let (request, rejected) = RouteRequest::new("sp", points(&graph, &[0, 7]));
        assert!(!d.submit(request));
        assert_eq!(rejected.await_result(), Err(RouteError::CapacityExceeded { capacity: 3 }));

        drop(release);
        for handle in handles {
            assert!(handle.await_result_timeout(WAIT).is_ok());
        }
        assert_eq!(d.queued(), 0);
    }

    #[test]
    fn shutdown_cancels_queued_requests() {
        let graph = Arc::new(fixture());
        let (gate, entered, release) = gate();
        let mut algorithms = AlgorithmSet::standard();
        algorithms.register("gate", gate);
        let d = RequestDispatcher::start(Arc::clone(&graph), algorithms, config(1, 4)).unwrap();

        let (request, running) = RouteRequest::new("gate", points(&graph, &[0]));
        assert!(d.submit(request));
        entered.recv_timeout(WAIT).unwrap();

        let queued: Vec<_> = (0..3)
            .map(|_| {
                let (request, handle) = RouteRequest::new("sp", points(&graph, &[0, 7]));
                assert!(d.submit(request));
                handle
            })
            .collect();

        // Joins the worker, so it blocks until the gate opens.
        let stopper = thread::spawn(move || d.shutdown());
        for handle in queued {
            assert_eq!(handle.await_result_timeout(WAIT), Err(RouteError::Cancelled));
        }
        drop(release);
        stopper.join().unwrap();
        assert!(running.await_result().is_ok(), "in-flight request finishes");
    }

    #[test]
    fn caller_timeout_does_not_cancel() {
        let graph = Arc::new(fixture());
        let (gate, entered, release) = gate();
        let mut algorithms = AlgorithmSet::new();
        algorithms.register("gate", gate);
        let d = RequestDispatcher::start(Arc::clone(&graph), algorithms, config(1, 1)).unwrap();

        let (request, handle) = RouteRequest::new("gate", points(&graph, &[3]));
        assert!(d.submit(request));
        entered.recv_timeout(WAIT).unwrap();

        assert!(handle.try_result().is_none());
        assert_eq!(handle.await_result_timeout(Duration::from_millis(20)), Err(RouteError::TimedOut));
        drop(release);
        let bundle = handle.await_result_timeout(WAIT).unwrap();
        assert_eq!(bundle.points.nodes(), vec![NodeId(3)]);
    }

    #[test]
    fn dropped_handle_does_not_stall_worker() {
        let graph = Arc::new(fixture());
        let d = RequestDispatcher::start(Arc::clone(&graph), AlgorithmSet::standard(), config(1, 4)).unwrap();
        let (request, handle) = RouteRequest::new("sp", points(&graph, &[0, 7]));
        drop(handle);
        assert!(d.submit(request));

        let (request, handle) = RouteRequest::new("sp", points(&graph, &[7, 0]));
        assert!(d.submit(request));
        assert_eq!(handle.await_result_timeout(WAIT).unwrap().total_distance, 7);
    }

    #[test]
    fn workers_named_from_prefix() {
        let graph = Arc::new(fixture());
        let (tx, rx) = channel::unbounded();
        let mut algorithms = AlgorithmSet::new();
        algorithms.register("name", ThreadName(tx));
        let mut cfg = config(1, 1);
        cfg.thread_name_prefix = "router".into();
        let d = RequestDispatcher::start(Arc::clone(&graph), algorithms, cfg).unwrap();

        let (request, handle) = RouteRequest::new("name", points(&graph, &[0]));
        assert!(d.submit(request));
        handle.await_result_timeout(WAIT).unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "router-0");
    }

    #[test]
    fn concurrent_submitters_match_single_engine() {
        let graph = Arc::new(fixture());
        let d = RequestDispatcher::start(Arc::clone(&graph), AlgorithmSet::standard(), config(3, 16)).unwrap();

        let results: Vec<(u32, u32, u64)> = thread::scope(|s| {
            let submitters: Vec<_> = (0..4u32)
                .map(|t| {
                    let (d, graph) = (&d, &graph);
                    s.spawn(move || {
                        (0..16u32)
                            .map(|k| {
                                let (from, to) = ((t + k) % 8, (t * 3 + k * 5) % 8);
                                let (request, handle) = RouteRequest::new("sp", points(graph, &[from, to]));
                                assert!(d.submit(request));
                                let bundle = handle.await_result().unwrap();
                                (from, to, bundle.total_distance)
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            submitters.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let mut engine = ShortestPathEngine::new(graph, EngineConfig::default());
        assert_eq!(results.len(), 64);
        for (from, to, distance) in results {
            let expected = engine.distance(NodeId(from), NodeId(to)).unwrap();
            assert_eq!(distance, expected as u64, "{from} -> {to}");
        }
    }
}
