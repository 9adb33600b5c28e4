//! Fixed worker pool behind a bounded request queue.
//!
//! ```text
//!  submit ──try_send──▶ [ bounded queue ] ──▶ worker 0 (engine + pool)
//!    │ full                                ──▶ worker 1 (engine + pool)
//!    ▼                                     ──▶ …
//!  CapacityExceeded             each worker: resolve algorithm → compute
//!                                            → reply on the request's channel
//! ```
//!
//! Workers share the graph and the algorithm set read-only.  Everything a
//! query writes lives in the worker's own engine, so workers never lock.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use crossbeam::select;
use log::{debug, info, trace, warn};

use ch_core::{DispatcherConfig, EngineConfig};
use ch_graph::GraphRep;
use ch_search::ShortestPathEngine;

use crate::{AlgorithmSet, DispatchResult, RouteError, RouteRequest};

/// Accepts route requests from any thread and runs them on a fixed pool of
/// worker threads.
///
/// `submit` never blocks: when the queue is full the request is rejected on
/// the spot.  Dropping the dispatcher has the same effect as
/// [`shutdown`](Self::shutdown).
pub struct RequestDispatcher {
    jobs:     Sender<RouteRequest>,
    /// Kept to drain requests still queued at shutdown.
    queue:    Receiver<RouteRequest>,
    /// Dropped to wake every idle worker at shutdown.
    shutdown: Option<Sender<()>>,
    workers:  Vec<JoinHandle<()>>,
    capacity: usize,
}

impl RequestDispatcher {
    /// Validate `config` and spawn `config.worker_threads` workers, each
    /// with its own engine over `graph`.
    pub fn start(graph: Arc<GraphRep>, algorithms: AlgorithmSet, config: DispatcherConfig) -> DispatchResult<Self> {
        config.validate()?;

        let (jobs, queue) = channel::bounded(config.queue_capacity);
        let (shutdown, stop) = channel::bounded::<()>(0);
        let algorithms = Arc::new(algorithms);

        let mut dispatcher = Self {
            jobs,
            queue: queue.clone(),
            shutdown: Some(shutdown),
            workers: Vec::with_capacity(config.worker_threads),
            capacity: config.queue_capacity,
        };

        for index in 0..config.worker_threads {
            let worker = Worker {
                index,
                graph:      Arc::clone(&graph),
                algorithms: Arc::clone(&algorithms),
                engine:     config.engine.clone(),
                queue:      queue.clone(),
                stop:       stop.clone(),
            };
            // On error the partially started dispatcher is dropped, which
            // stops the workers already running.
            let handle = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name_prefix))
                .spawn(move || worker.run())?;
            dispatcher.workers.push(handle);
        }

        info!(
            "dispatcher started: {} workers, queue capacity {}, {} nodes / {} edges, algorithms {:?}",
            config.worker_threads,
            config.queue_capacity,
            graph.node_count(),
            graph.edge_count(),
            algorithms.names(),
        );
        Ok(dispatcher)
    }

    /// Queue `request` for the next free worker.
    ///
    /// Returns `false` if the queue is full; the request's handle then
    /// resolves to [`RouteError::CapacityExceeded`].
    pub fn submit(&self, request: RouteRequest) -> bool {
        match self.jobs.try_send(request) {
            Ok(()) => {
                trace!("request queued ({} waiting)", self.jobs.len());
                true
            }
            Err(TrySendError::Full(request)) => {
                warn!("request rejected: queue full ({} waiting)", self.capacity);
                request.complete(Err(RouteError::CapacityExceeded { capacity: self.capacity }));
                false
            }
            Err(TrySendError::Disconnected(request)) => {
                request.complete(Err(RouteError::Cancelled));
                false
            }
        }
    }

    /// Requests waiting for a worker.
    pub fn queued(&self) -> usize {
        self.jobs.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting work, cancel queued requests, and wait for running
    /// requests to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(shutdown) = self.shutdown.take() else { return };
        drop(shutdown);

        let mut cancelled = 0usize;
        while let Ok(request) = self.queue.try_recv() {
            request.complete(Err(RouteError::Cancelled));
            cancelled += 1;
        }

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
        info!("dispatcher stopped ({cancelled} queued requests cancelled)");
    }
}

impl Drop for RequestDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

struct Worker {
    index:      usize,
    graph:      Arc<GraphRep>,
    algorithms: Arc<AlgorithmSet>,
    engine:     EngineConfig,
    queue:      Receiver<RouteRequest>,
    stop:       Receiver<()>,
}

impl Worker {
    fn run(self) {
        let mut engine = ShortestPathEngine::new(Arc::clone(&self.graph), self.engine.clone());
        debug!("worker {} ready", self.index);

        loop {
            select! {
                recv(self.queue) -> request => match request {
                    Ok(request) => self.handle(&mut engine, request),
                    Err(_) => break,
                },
                // Only ever disconnects; nothing is sent.
                recv(self.stop) -> _ => break,
            }
        }
        debug!("worker {} exiting", self.index);
    }

    fn handle(&self, engine: &mut ShortestPathEngine, mut request: RouteRequest) {
        let started = Instant::now();
        let outcome = match self.check_points(&request) {
            Err(e) => Err(e),
            Ok(()) => match self.algorithms.get(&request.algorithm) {
                Some(algorithm) => algorithm.compute(engine, &mut request),
                None => Err(RouteError::UnknownAlgorithm(request.algorithm.clone())),
            },
        };

        match &outcome {
            Ok(bundle) => trace!(
                "worker {}: {} over {} waypoints -> {} m in {:?}",
                self.index,
                request.algorithm,
                bundle.points.len(),
                bundle.total_distance,
                started.elapsed(),
            ),
            Err(e) => debug!("worker {}: {} failed: {e}", self.index, request.algorithm),
        }
        request.complete(outcome);
    }

    /// Waypoints must name nodes of this graph; the engine indexes by them.
    fn check_points(&self, request: &RouteRequest) -> Result<(), RouteError> {
        let count = self.graph.node_count();
        match request.points.iter().position(|p| p.node.index() >= count) {
            Some(index) => Err(RouteError::InvalidNode { index, node: request.points.node(index), count }),
            None => Ok(()),
        }
    }
}
