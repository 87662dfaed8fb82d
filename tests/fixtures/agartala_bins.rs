//! Bin sites around central Agartala.
//!
//! Coordinates are street-side points picked from OpenStreetMap so that legs
//! between them are routable.

use bin_route_planner::{Bin, GeoPoint};

/// A named bin site with an optional fill reading.
#[derive(Debug, Clone)]
pub struct BinSite {
    pub bin_id: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub fill_pct: Option<f64>,
}

impl BinSite {
    pub const fn new(bin_id: &'static str, lat: f64, lng: f64, fill_pct: Option<f64>) -> Self {
        Self {
            bin_id,
            lat,
            lng,
            fill_pct,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn to_bin(&self) -> Bin {
        Bin {
            bin_id: self.bin_id.to_string(),
            location: self.location(),
            current_fill_pct: self.fill_pct,
            capacity_litres: Some(240),
        }
    }
}

/// Municipal depot, used as the worker's starting position.
pub const DEPOT: GeoPoint = GeoPoint::new(23.8315, 91.2864);

pub const CENTRAL_BINS: &[BinSite] = &[
    BinSite::new("AGT-001", 23.8362, 91.2797, Some(86.0)),
    BinSite::new("AGT-002", 23.8298, 91.2768, Some(42.5)),
    BinSite::new("AGT-003", 23.8411, 91.2869, Some(63.0)),
    BinSite::new("AGT-004", 23.8250, 91.2910, None),
    BinSite::new("AGT-005", 23.8339, 91.2951, Some(91.0)),
    BinSite::new("AGT-006", 23.8445, 91.2745, Some(12.0)),
    BinSite::new("AGT-007", 23.8207, 91.2826, Some(55.5)),
    BinSite::new("AGT-008", 23.8380, 91.3012, Some(78.0)),
];

pub fn central_bins() -> Vec<Bin> {
    CENTRAL_BINS.iter().map(BinSite::to_bin).collect()
}

/// Three bins on one meridian; from the origin they are visited B, C, A.
pub fn meridian_bins() -> Vec<Bin> {
    vec![
        Bin::new("A", GeoPoint::new(0.0, 10.0)),
        Bin::new("B", GeoPoint::new(0.0, 1.0)),
        Bin::new("C", GeoPoint::new(0.0, 5.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_ids_unique() {
        let mut ids: Vec<&str> = CENTRAL_BINS.iter().map(|site| site.bin_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CENTRAL_BINS.len());
    }

    #[test]
    fn test_coordinates_in_agartala_area() {
        for site in CENTRAL_BINS {
            assert!(site.lat > 23.78 && site.lat < 23.90, "{} lat out of range", site.bin_id);
            assert!(site.lng > 91.24 && site.lng < 91.34, "{} lng out of range", site.bin_id);
        }
    }
}
