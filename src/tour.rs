//! Greedy nearest-neighbor visitation order.
//!
//! Starting at the agent's position, always move to the closest remaining bin.
//! No backtracking and no return to the start.
//!
//! # Complexity
//!
//! O(n²) in the number of targets. A worker's daily list is small (typically
//! under 50 bins), so the quadratic scan is not a concern.
//!
//! # Ties
//!
//! When two remaining bins are at exactly the same distance from the current
//! position, the one listed earlier in the input wins.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::distance::distance;
use crate::geo::{Bin, GeoPoint, Waypoint};

/// Ordered visitation sequence: the agent's start, then every target once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tour {
    waypoints: Vec<Waypoint>,
}

impl Tour {
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn start(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    /// Target stops in visitation order, without the start.
    pub fn stops(&self) -> &[Waypoint] {
        &self.waypoints[1..]
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// True when the tour holds only the start point.
    pub fn is_trivial(&self) -> bool {
        self.waypoints.len() == 1
    }

    /// Bin ids in visitation order.
    pub fn bin_ids(&self) -> Vec<&str> {
        self.stops()
            .iter()
            .filter_map(|waypoint| waypoint.bin_id.as_deref())
            .collect()
    }

    /// Consecutive waypoint pairs.
    pub fn legs(&self) -> impl Iterator<Item = (&Waypoint, &Waypoint)> {
        self.waypoints.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}

/// Orders `targets` by repeatedly visiting the nearest remaining bin.
///
/// Bins repeating an earlier `bin_id` are ignored so that every bin appears
/// exactly once. Bins without a finite location cannot be reached and are
/// left out.
pub fn build_tour(start: GeoPoint, targets: &[Bin]) -> Tour {
    let mut seen = HashSet::new();
    let mut remaining: Vec<&Bin> = Vec::with_capacity(targets.len());
    for bin in targets {
        if !bin.location.is_finite() {
            debug!(bin_id = %bin.bin_id, "bin without a finite location ignored");
        } else if seen.insert(bin.bin_id.as_str()) {
            remaining.push(bin);
        } else {
            debug!(bin_id = %bin.bin_id, "duplicate bin in target set ignored");
        }
    }

    let mut waypoints = Vec::with_capacity(remaining.len() + 1);
    waypoints.push(Waypoint::agent(start));

    let mut current = start;
    while let Some(index) = nearest_index(current, &remaining) {
        let next = remaining.remove(index);
        waypoints.push(Waypoint::bin(next));
        current = next.location;
    }

    Tour { waypoints }
}

/// The bin closest to `start`, or `None` when no bin has a finite location.
///
/// Matches the first stop `build_tour` would choose over the same bins.
pub fn nearest_bin(start: GeoPoint, bins: &[Bin]) -> Option<&Bin> {
    let candidates: Vec<&Bin> = bins.iter().filter(|bin| bin.location.is_finite()).collect();
    nearest_index(start, &candidates).map(|index| candidates[index])
}

fn nearest_index(from: GeoPoint, candidates: &[&Bin]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, bin) in candidates.iter().enumerate() {
        let d = distance(from, bin.location);
        // Strict comparison keeps the earliest candidate on ties.
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((index, d));
        }
    }
    best.map(|(index, _)| index)
}
