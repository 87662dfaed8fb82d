//! Seams between the planner core and its external collaborators.
//!
//! Concrete hosts implement them for their own routing service, bin registry
//! and positioning hardware.

use std::time::{Duration, SystemTime};

use crate::error::{LegFetchError, LocationError, RegistryError};
use crate::geo::{Bin, GeoPoint};
use crate::polyline::Polyline;

/// Provides drivable geometry between two points.
///
/// Implementations must bound every call with a finite timeout; a call that
/// gives up resolves to an error and the leg is dropped from the route.
pub trait RouteProvider {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Polyline, LegFetchError>;
}

/// Provides the current snapshot of the bin registry.
pub trait BinSource {
    fn fetch_bins(&self) -> Result<Vec<Bin>, RegistryError>;
}

/// A raw position fix reported by the host device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub point: GeoPoint,
    /// Reported horizontal accuracy in metres, if known.
    pub accuracy_m: Option<f64>,
    /// When the fix was taken, if the device reports it.
    pub timestamp: Option<SystemTime>,
}

impl PositionFix {
    pub fn at(point: GeoPoint) -> Self {
        Self {
            point,
            accuracy_m: None,
            timestamp: None,
        }
    }
}

/// Continuous positioning capability of the host device.
pub trait PositionSource: Send {
    /// Waits up to `wait` for the next fix.
    ///
    /// `Ok(None)` means nothing arrived yet. An error ends the watch.
    fn next_fix(&mut self, wait: Duration) -> Result<Option<PositionFix>, LocationError>;

    /// Releases the underlying subscription. Called once when the watch ends.
    fn close(&mut self) {}
}

/// Wall clock used for plan timestamps and fix staleness.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
