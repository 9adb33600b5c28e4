//! `ch-core` — foundational types for the `ch-route` workspace.
//!
//! Every other `ch-*` crate depends on this one.  It has no `ch-*`
//! dependencies and only `thiserror` (plus optional `serde`) externally.
//!
//! # What lives here
//!
//! | Module     | Contents                                              |
//! |------------|-------------------------------------------------------|
//! | [`ids`]    | `NodeId`, `EdgeId`                                    |
//! | [`geo`]    | `GeoPoint` (fixed-point lat/lon), haversine distance  |
//! | [`config`] | `EngineConfig`, `DispatcherConfig`                    |
//! | [`error`]  | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public plain types.  |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{DispatcherConfig, EngineConfig};
pub use error::{CoreError, CoreResult};
pub use geo::GeoPoint;
pub use ids::{EdgeId, NodeId};

/// Path length in metres as accumulated by the search.
///
/// Edge lengths and tentative distances share this type; additions saturate
/// at [`INFINITY`] so unreached nodes never wrap around.
pub type Dist = u32;

/// Distance of a node the search has not reached.
pub const INFINITY: Dist = Dist::MAX;
