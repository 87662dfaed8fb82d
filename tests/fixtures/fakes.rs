//! Fake collaborators for driving the planner without network or devices.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use bin_route_planner::error::{LegFetchError, RegistryError};
use bin_route_planner::polyline::Polyline;
use bin_route_planner::traits::{BinSource, Clock, RouteProvider};
use bin_route_planner::{Bin, GeoPoint};

/// Route provider answering `[from, midpoint, to]`, with scripted delays and
/// failures keyed by leg endpoint.
#[derive(Default)]
pub struct FakeRouter {
    delays_to: Vec<(GeoPoint, Duration)>,
    delays_from: Vec<(GeoPoint, Duration)>,
    failing_to: Vec<GeoPoint>,
    calls: AtomicUsize,
    completed: Mutex<Vec<GeoPoint>>,
}

impl FakeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay_to(mut self, point: GeoPoint, delay: Duration) -> Self {
        self.delays_to.push((point, delay));
        self
    }

    pub fn delay_from(mut self, point: GeoPoint, delay: Duration) -> Self {
        self.delays_from.push((point, delay));
        self
    }

    pub fn fail_to(mut self, point: GeoPoint) -> Self {
        self.failing_to.push(point);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Destinations in the order their legs finished.
    pub fn completion_order(&self) -> Vec<GeoPoint> {
        self.completed.lock().unwrap().clone()
    }

    pub fn midpoint(from: GeoPoint, to: GeoPoint) -> GeoPoint {
        GeoPoint::new(
            (from.latitude + to.latitude) / 2.0,
            (from.longitude + to.longitude) / 2.0,
        )
    }
}

impl RouteProvider for FakeRouter {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Polyline, LegFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .delays_to
            .iter()
            .filter(|(point, _)| *point == to)
            .chain(self.delays_from.iter().filter(|(point, _)| *point == from))
            .map(|(_, delay)| *delay)
            .max();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        self.completed.lock().unwrap().push(to);

        if self.failing_to.contains(&to) {
            return Err(LegFetchError::Status(503));
        }
        Ok(Polyline::new(vec![from, Self::midpoint(from, to), to]))
    }
}

/// Bin registry whose contents tests can swap while a refresher runs.
#[derive(Clone, Default)]
pub struct FakeBins {
    bins: Arc<Mutex<Vec<Bin>>>,
    failing: Arc<AtomicBool>,
    fetches: Arc<AtomicUsize>,
}

impl FakeBins {
    pub fn new(bins: Vec<Bin>) -> Self {
        Self {
            bins: Arc::new(Mutex::new(bins)),
            ..Self::default()
        }
    }

    pub fn set(&self, bins: Vec<Bin>) {
        *self.bins.lock().unwrap() = bins;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl BinSource for FakeBins {
    fn fetch_bins(&self) -> Result<Vec<Bin>, RegistryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RegistryError::Status(502));
        }
        Ok(self.bins.lock().unwrap().clone())
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    pub fn at(start: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }
}

/// Polls `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
