//! Polyline representation for route geometries.
//!
//! Geometry is stored as decoded (latitude, longitude) points. Providers that
//! answer in (longitude, latitude) order are normalized on the way in, so the
//! rest of the planner never sees the provider's ordering.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// An ordered road geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Builds a polyline from provider pairs in (longitude, latitude) order.
    pub fn from_lng_lat(coordinates: &[[f64; 2]]) -> Self {
        Self {
            points: coordinates.iter().copied().map(GeoPoint::from_lng_lat).collect(),
        }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    /// Appends another geometry after this one.
    pub fn extend(&mut self, other: &Polyline) {
        self.points.extend_from_slice(&other.points);
    }
}

impl FromIterator<GeoPoint> for Polyline {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
