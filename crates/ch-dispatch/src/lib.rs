//! `ch-dispatch` — concurrent request handling for the CH route service.
//!
//! # Crate layout
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`dispatcher`] | `RequestDispatcher`: bounded queue + worker threads   |
//! | [`request`]    | `RouteRequest`, `ResultHandle`, `RouteResultBundle`    |
//! | [`algorithm`]  | `Algorithm` trait, `ShortestPath`, `TravelingSalesman`, `AlgorithmSet` |
//! | [`error`]      | `RouteError` (per request), `DispatchError` (start-up) |
//!
//! # Example
//!
//! ```rust,ignore
//! let dispatcher = RequestDispatcher::start(graph, AlgorithmSet::standard(), config)?;
//! let (request, handle) = RouteRequest::new("sp", points);
//! if dispatcher.submit(request) {
//!     let bundle = handle.await_result()?;
//! }
//! ```

pub mod algorithm;
pub mod dispatcher;
pub mod error;
pub mod request;

#[cfg(test)]
mod tests;

pub use algorithm::{Algorithm, AlgorithmSet, ShortestPath, TravelingSalesman, SHORTEST_PATH, TRAVELING_SALESMAN};
pub use dispatcher::RequestDispatcher;
pub use error::{DispatchError, DispatchResult, RouteError};
pub use request::{ResultHandle, RouteOutcome, RouteRequest, RouteResultBundle};
