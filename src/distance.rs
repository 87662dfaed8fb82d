//! Planar distance between coordinates, plus a straight-line leg provider
//! (fallback when no road-routing service is reachable).
//!
//! Distance is the Euclidean norm over raw (latitude, longitude) degrees. It
//! ignores earth curvature and is only meaningful inside a single municipality,
//! but it keeps visitation order and nearest-bin answers reproducible.

use crate::error::LegFetchError;
use crate::geo::GeoPoint;
use crate::polyline::Polyline;
use crate::traits::RouteProvider;

/// Planar distance between two points, in degrees.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    (a.latitude - b.latitude).hypot(a.longitude - b.longitude)
}

/// Route provider that connects two waypoints with a straight segment.
///
/// Useful offline and in tests. The path ignores roads entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineProvider;

impl RouteProvider for StraightLineProvider {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Polyline, LegFetchError> {
        Ok(Polyline::new(vec![from, to]))
    }
}
