//! Stitches per-leg road geometry into one continuous route.
//!
//! Legs may be fetched concurrently, but the combined route always follows
//! tour order. A failed leg stays in the leg list without geometry and leaves
//! a gap in the combined route rather than failing the whole plan.

use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::cancel::CancelToken;
use crate::error::LegFetchError;
use crate::geo::{GeoPoint, Waypoint};
use crate::polyline::Polyline;
use crate::tour::Tour;
use crate::traits::RouteProvider;

/// How legs are requested from the routing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LegFetchMode {
    /// All legs in flight at once.
    #[default]
    Concurrent,
    /// One leg at a time, for rate-limited providers.
    Sequential,
}

/// One consecutive waypoint pair and its resolved geometry.
///
/// `geometry` is `None` when the provider call failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLeg {
    pub from: Waypoint,
    pub to: Waypoint,
    pub geometry: Option<Polyline>,
}

impl RouteLeg {
    pub fn is_resolved(&self) -> bool {
        self.geometry.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposedRoute {
    pub legs: Vec<RouteLeg>,
    pub combined: Vec<GeoPoint>,
}

impl ComposedRoute {
    pub fn failed_legs(&self) -> usize {
        self.legs.iter().filter(|leg| !leg.is_resolved()).count()
    }
}

/// Resolves every leg of `tour` and concatenates the successful geometries.
///
/// Legs not yet requested when `cancel` fires are skipped and reported as
/// abandoned.
pub fn compose_route<P>(
    tour: &Tour,
    provider: &P,
    mode: LegFetchMode,
    cancel: &CancelToken,
) -> ComposedRoute
where
    P: RouteProvider + Sync + ?Sized,
{
    let pairs: Vec<(&Waypoint, &Waypoint)> = tour.legs().collect();

    let results: Vec<Result<Polyline, LegFetchError>> = match mode {
        LegFetchMode::Concurrent => pairs
            .par_iter()
            .map(|(from, to)| fetch_leg(provider, from, to, cancel))
            .collect(),
        LegFetchMode::Sequential => pairs
            .iter()
            .map(|(from, to)| fetch_leg(provider, from, to, cancel))
            .collect(),
    };

    let mut combined = Polyline::default();
    let mut legs = Vec::with_capacity(pairs.len());
    for (index, ((from, to), result)) in pairs.into_iter().zip(results).enumerate() {
        let geometry = match result {
            Ok(geometry) => {
                combined.extend(&geometry);
                Some(geometry)
            }
            Err(LegFetchError::Cancelled) => None,
            Err(err) => {
                warn!(
                    leg = index,
                    from = ?from.bin_id,
                    to = ?to.bin_id,
                    error = %err,
                    "route leg unavailable, leaving a gap"
                );
                None
            }
        };
        legs.push(RouteLeg {
            from: from.clone(),
            to: to.clone(),
            geometry,
        });
    }

    ComposedRoute {
        legs,
        combined: combined.into_points(),
    }
}

fn fetch_leg<P>(
    provider: &P,
    from: &Waypoint,
    to: &Waypoint,
    cancel: &CancelToken,
) -> Result<Polyline, LegFetchError>
where
    P: RouteProvider + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(LegFetchError::Cancelled);
    }
    let geometry = provider.route(from.point, to.point)?;
    if geometry.is_empty() {
        return Err(LegFetchError::NoGeometry("empty geometry".to_string()));
    }
    Ok(geometry)
}
