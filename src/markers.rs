//! Presentation adapter: turns a plan into map markers.
//!
//! Keeps styling decisions out of the planner core. Renderers map
//! [`MarkerKind`] to their own icons.

use serde::Serialize;

use crate::geo::{Bin, GeoPoint};
use crate::plan::Plan;
use crate::registry::Hotspot;

/// Fill level band used to color bin markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FillBand {
    /// Below 50 %.
    Low,
    /// 50 % to 79 %.
    Medium,
    /// 80 % and above.
    High,
}

impl FillBand {
    /// A bin with no reading counts as empty.
    pub fn for_fill(pct: Option<f64>) -> Self {
        let pct = pct.filter(|pct| pct.is_finite()).unwrap_or(0.0);
        if pct >= 80.0 {
            FillBand::High
        } else if pct >= 50.0 {
            FillBand::Medium
        } else {
            FillBand::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MarkerKind {
    Agent,
    Bin {
        bin_id: String,
        band: FillBand,
        nearest: bool,
        /// 1-based position in the tour, if the bin is visited.
        stop: Option<usize>,
    },
    Hotspot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub point: GeoPoint,
    pub kind: MarkerKind,
}

/// Markers for the agent, every bin of the plan, and any hotspots.
pub fn plan_markers(plan: &Plan, hotspots: &[Hotspot]) -> Vec<Marker> {
    let mut markers = Vec::with_capacity(1 + plan.bins.len() + hotspots.len());
    markers.push(Marker {
        point: plan.start(),
        kind: MarkerKind::Agent,
    });

    let order = plan.tour.bin_ids();
    markers.extend(plan.bins.iter().map(|bin| bin_marker(bin, plan, &order)));

    markers.extend(hotspots.iter().map(|hotspot| Marker {
        point: hotspot.location(),
        kind: MarkerKind::Hotspot,
    }));
    markers
}

fn bin_marker(bin: &Bin, plan: &Plan, order: &[&str]) -> Marker {
    Marker {
        point: bin.location,
        kind: MarkerKind::Bin {
            bin_id: bin.bin_id.clone(),
            band: FillBand::for_fill(bin.current_fill_pct),
            nearest: plan.nearest_bin.as_deref() == Some(bin.bin_id.as_str()),
            stop: order
                .iter()
                .position(|id| *id == bin.bin_id)
                .map(|index| index + 1),
        },
    }
}

/// South-west and north-east corners enclosing every point.
pub fn bounds<I>(points: I) -> Option<(GeoPoint, GeoPoint)>
where
    I: IntoIterator<Item = GeoPoint>,
{
    points
        .into_iter()
        .filter(GeoPoint::is_finite)
        .fold(None, |acc, point| {
            let (sw, ne) = acc.unwrap_or((point, point));
            Some((
                GeoPoint::new(sw.latitude.min(point.latitude), sw.longitude.min(point.longitude)),
                GeoPoint::new(ne.latitude.max(point.latitude), ne.longitude.max(point.longitude)),
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::distance::StraightLineProvider;
    use crate::plan::{PlanMode, PlanOptions, compute_plan};
    use crate::traits::SystemClock;

    #[test]
    fn test_fill_bands() {
        assert_eq!(FillBand::for_fill(None), FillBand::Low);
        assert_eq!(FillBand::for_fill(Some(49.9)), FillBand::Low);
        assert_eq!(FillBand::for_fill(Some(50.0)), FillBand::Medium);
        assert_eq!(FillBand::for_fill(Some(79.0)), FillBand::Medium);
        assert_eq!(FillBand::for_fill(Some(80.0)), FillBand::High);
        assert_eq!(FillBand::for_fill(Some(f64::NAN)), FillBand::Low);
    }

    #[test]
    fn test_bounds() {
        let corners = bounds(vec![
            GeoPoint::new(23.83, 91.28),
            GeoPoint::new(23.80, 91.30),
            GeoPoint::new(f64::NAN, 0.0),
            GeoPoint::new(23.85, 91.27),
        ]);
        assert_eq!(
            corners,
            Some((GeoPoint::new(23.80, 91.27), GeoPoint::new(23.85, 91.30)))
        );
        assert_eq!(bounds(Vec::new()), None);
    }

    #[test]
    fn test_nearest_bin_is_flagged() {
        let bins = vec![
            Bin::new("far", GeoPoint::new(0.0, 9.0)).with_fill(90.0),
            Bin::new("near", GeoPoint::new(0.0, 1.0)).with_fill(55.0),
        ];
        let plan = compute_plan(
            GeoPoint::new(0.0, 0.0),
            &bins,
            PlanOptions {
                mode: PlanMode::NearestBin,
                ..PlanOptions::default()
            },
            &StraightLineProvider,
            &CancelToken::new(),
            &SystemClock,
        )
        .expect("not cancelled");
        let hotspot = Hotspot {
            latitude: 0.5,
            longitude: 0.5,
            cluster_id: None,
            average_importance_score: None,
            num_bins_in_hotspot: None,
        };

        let markers = plan_markers(&plan, &[hotspot]);
        assert_eq!(markers.len(), 4);
        assert_eq!(markers[0].kind, MarkerKind::Agent);
        assert_eq!(
            markers[1].kind,
            MarkerKind::Bin {
                bin_id: "far".into(),
                band: FillBand::High,
                nearest: false,
                stop: None,
            }
        );
        assert_eq!(
            markers[2].kind,
            MarkerKind::Bin {
                bin_id: "near".into(),
                band: FillBand::Medium,
                nearest: true,
                stop: Some(1),
            }
        );
        assert_eq!(markers[3].kind, MarkerKind::Hotspot);
    }
}
