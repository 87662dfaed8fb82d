//! Value types shared by every stage of the planner.
//!
//! All coordinates are degrees in (latitude, longitude) order. Providers that
//! speak (longitude, latitude) convert at their boundary.

use serde::{Deserialize, Serialize};

/// A coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a point from a provider pair in (longitude, latitude) order.
    pub const fn from_lng_lat(lng_lat: [f64; 2]) -> Self {
        Self::new(lng_lat[1], lng_lat[0])
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// A waste bin as published by the bin registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub bin_id: String,
    pub location: GeoPoint,
    pub current_fill_pct: Option<f64>,
    pub capacity_litres: Option<i64>,
}

impl Bin {
    pub fn new(bin_id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            bin_id: bin_id.into(),
            location,
            current_fill_pct: None,
            capacity_litres: None,
        }
    }

    pub fn with_fill(mut self, pct: f64) -> Self {
        self.current_fill_pct = Some(pct);
        self
    }

    pub fn with_capacity(mut self, litres: i64) -> Self {
        self.capacity_litres = Some(litres);
        self
    }
}

/// A stop in a tour. The agent's own position carries no bin id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: GeoPoint,
    pub bin_id: Option<String>,
}

impl Waypoint {
    pub fn agent(point: GeoPoint) -> Self {
        Self {
            point,
            bin_id: None,
        }
    }

    pub fn bin(bin: &Bin) -> Self {
        Self {
            point: bin.location,
            bin_id: Some(bin.bin_id.clone()),
        }
    }

    pub fn is_agent(&self) -> bool {
        self.bin_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lng_lat_pair_is_swapped() {
        let point = GeoPoint::from_lng_lat([91.2864, 23.8315]);
        assert_eq!(point.latitude, 23.8315);
        assert_eq!(point.longitude, 91.2864);
    }

    #[test]
    fn non_finite_points_are_detected() {
        assert!(GeoPoint::new(1.0, 2.0).is_finite());
        assert!(!GeoPoint::new(f64::NAN, 2.0).is_finite());
        assert!(!GeoPoint::new(1.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn agent_waypoint_has_no_bin() {
        let agent = Waypoint::agent(GeoPoint::new(0.0, 0.0));
        let bin = Waypoint::bin(&Bin::new("B-1", GeoPoint::new(1.0, 1.0)));
        assert!(agent.is_agent());
        assert!(!bin.is_agent());
        assert_eq!(bin.bin_id.as_deref(), Some("B-1"));
    }
}
