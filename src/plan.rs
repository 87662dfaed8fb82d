//! One complete planning pass: order the bins, then resolve road geometry.

use std::collections::HashSet;
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::compose::{LegFetchMode, RouteLeg, compose_route};
use crate::error::PlanCondition;
use crate::geo::{Bin, GeoPoint};
use crate::tour::{Tour, build_tour, nearest_bin};
use crate::traits::{Clock, RouteProvider};

/// What a plan answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PlanMode {
    /// Visit every target bin (worker route).
    #[default]
    Tour,
    /// Route only to the closest bin (end-user map).
    NearestBin,
}

/// Which registry bins become targets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSelection {
    #[default]
    All,
    /// Only bins with these ids; unknown ids are ignored.
    Assigned(Vec<String>),
}

impl TargetSelection {
    pub fn select(&self, bins: &[Bin]) -> Vec<Bin> {
        match self {
            TargetSelection::All => bins.to_vec(),
            TargetSelection::Assigned(ids) => {
                let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
                bins.iter()
                    .filter(|bin| wanted.contains(bin.bin_id.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions {
    pub mode: PlanMode,
    pub fetch_mode: LegFetchMode,
}

/// Immutable snapshot of a computed route. Replaced wholesale, never edited.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Monotonic recomputation counter; 0 for one-shot plans.
    pub generation: u64,
    pub tour: Tour,
    pub legs: Vec<RouteLeg>,
    pub combined_route: Vec<GeoPoint>,
    /// Set in [`PlanMode::NearestBin`].
    pub nearest_bin: Option<String>,
    /// The bins the plan was computed against.
    pub bins: Vec<Bin>,
    pub generated_at: SystemTime,
}

impl Plan {
    pub fn start(&self) -> GeoPoint {
        self.tour.start().point
    }

    /// Degraded-result condition to show alongside the plan, if any.
    pub fn condition(&self) -> Option<PlanCondition> {
        if self.tour.is_trivial() {
            Some(PlanCondition::EmptyTargetSet)
        } else if self.combined_route.is_empty() {
            Some(PlanCondition::NoRouteFound)
        } else {
            None
        }
    }
}

/// Builds a plan from `start` over `bins`.
///
/// Returns `None` when `cancel` fired while legs were being fetched; partial
/// results are discarded.
pub fn compute_plan<P>(
    start: GeoPoint,
    bins: &[Bin],
    options: PlanOptions,
    provider: &P,
    cancel: &CancelToken,
    clock: &dyn Clock,
) -> Option<Plan>
where
    P: RouteProvider + Sync + ?Sized,
{
    let (tour, nearest) = match options.mode {
        PlanMode::Tour => (build_tour(start, bins), None),
        PlanMode::NearestBin => match nearest_bin(start, bins) {
            Some(bin) => (
                build_tour(start, std::slice::from_ref(bin)),
                Some(bin.bin_id.clone()),
            ),
            None => (build_tour(start, &[]), None),
        },
    };
    debug!(stops = tour.len() - 1, mode = ?options.mode, "tour built");

    let route = compose_route(&tour, provider, options.fetch_mode, cancel);
    if cancel.is_cancelled() {
        return None;
    }

    Some(Plan {
        generation: 0,
        tour,
        legs: route.legs,
        combined_route: route.combined,
        nearest_bin: nearest,
        bins: bins.to_vec(),
        generated_at: clock.now(),
    })
}
