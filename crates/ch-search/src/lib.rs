//! `ch-search` — shortest-path search over a contraction hierarchy.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`engine`] | `ShortestPathEngine`, `SearchStats`                        |
//! | [`pool`]   | `ResourcePool`, `DistArray`: per-worker scratch buffers   |
//! | [`bitset`] | `BitSet` with touched-word reset                           |
//! | [`heap`]   | `MinHeap`: lazy-deletion binary heap                      |
//! | [`matrix`] | `DistanceMatrix`, nearest-neighbour tour order             |
//! | [`points`] | `RequestPoints`, `RequestPoint`, `ConstraintValue`         |
//! | [`way`]    | `Way`: one routed leg                                     |
//! | [`error`]  | `SearchError`, `SearchResult<T>`                           |
//!
//! # Search protocol
//!
//! ```text
//! for each leg (src, dest):
//!   ① bfs_mark               walk incoming edges back from dest, marking
//!                            every edge whose source ranks >= its target
//!   ② dijkstra_stop_at_dest  Dijkstra from src over up-edges ∪ marked
//!                            edges, stop when dest is popped
//!   ③ backtrack              follow predecessor edges, unpack shortcuts
//!                            with an explicit stack, emit coordinates
//! ```
//!
//! An engine is single-threaded: it owns one [`ResourcePool`] and must not
//! be shared.  Run one engine per worker thread over a shared
//! `Arc<GraphRep>`.

pub mod bitset;
pub mod engine;
pub mod error;
pub mod heap;
pub mod matrix;
pub mod points;
pub mod pool;
pub mod way;


pub use bitset::BitSet;
pub use engine::{SearchStats, ShortestPathEngine};
pub use error::{SearchError, SearchResult};
pub use heap::MinHeap;
pub use matrix::DistanceMatrix;
pub use points::{ConstraintValue, RequestPoint, RequestPoints, DIST_TO_PREV, TIME_TO_PREV};
pub use pool::{DistArray, ResourcePool};
pub use way::Way;
