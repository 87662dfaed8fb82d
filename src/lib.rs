//! bin-route-planner core
//!
//! Orders a collection agent's target bins, stitches road geometry across the
//! order, and keeps the resulting plan current as the agent moves.

pub mod cancel;
pub mod compose;
pub mod config;
pub mod distance;
pub mod error;
pub mod geo;
pub mod markers;
pub mod osrm;
pub mod plan;
pub mod polyline;
pub mod refresher;
pub mod registry;
pub mod tour;
pub mod tracker;
pub mod traits;

pub use distance::distance;
pub use geo::{Bin, GeoPoint, Waypoint};
pub use plan::{Plan, PlanMode};
pub use tour::{Tour, build_tour, nearest_bin};
