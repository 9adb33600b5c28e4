//! `ch-graph` — the ranked road graph produced by CH preprocessing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | [`graph`]   | `GraphRep` (CSR out/in edges, ranks, shortcuts), `GraphParts` |
//! | [`builder`] | `GraphRepBuilder`, `EdgeKey`                            |
//! | [`error`]   | `GraphError`, `GraphResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Sorts edges with Rayon in `GraphRepBuilder::build`.    |
//! | `serde`    | Derives `Serialize`/`Deserialize` on `GraphParts`.     |

pub mod builder;
pub mod error;
pub mod graph;

#[cfg(test)]
mod tests;

pub use builder::{EdgeKey, GraphRepBuilder};
pub use error::{GraphError, GraphResult};
pub use graph::{GraphParts, GraphRep};
