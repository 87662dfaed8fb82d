//! Keeps the latest [`Plan`] current as the agent moves and bins change.
//!
//! Three long-lived threads cooperate:
//!
//! - the position tracker, publishing fixes;
//! - the bin poller, pulling a registry snapshot every `bin_refresh_interval`
//!   and on demand;
//! - the coordinator, which merges both event streams and starts a
//!   recomputation thread whenever the position or the target set changes.
//!
//! Recomputations may overlap. Each carries a generation number taken when it
//! starts, and [`PlanCell`] only accepts a plan newer than the one already
//! published, so a slow, older recomputation can never overwrite a fresher
//! plan. Stopping the refresher releases the tracker and poller before it
//! returns; recomputations still fetching legs are abandoned and their
//! results dropped. No plan is published once `stop` has returned.
//!
//! Each recomputation runs on its own detached OS thread and fetches its legs
//! through the global rayon pool, so a single slow leg can hold that thread
//! for up to the OSRM timeout. With `min_recompute_interval` unset every
//! position fix starts one. Hosts with a fast GPS feed or a slow route
//! provider should set it (`MIN_RECOMPUTE_MS`) to bound the number of
//! recomputations in flight.

use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, after, bounded, never, select, unbounded};
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::error::{LocationError, PlannerError};
use crate::geo::{Bin, GeoPoint};
use crate::plan::{Plan, PlanOptions, TargetSelection, compute_plan};
use crate::tracker::{PositionEvent, PositionTracker, WatchOptions};
use crate::traits::{BinSource, Clock, PositionSource, RouteProvider};

/// Default period of the bin snapshot refresh.
pub const DEFAULT_BIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub bin_refresh_interval: Duration,
    /// When set, triggers closer together than this collapse into one
    /// deferred recomputation.
    pub min_recompute_interval: Option<Duration>,
    pub plan: PlanOptions,
    pub targets: TargetSelection,
    pub watch: WatchOptions,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            bin_refresh_interval: DEFAULT_BIN_REFRESH_INTERVAL,
            min_recompute_interval: None,
            plan: PlanOptions::default(),
            targets: TargetSelection::default(),
            watch: WatchOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PlanEvent {
    Published(Arc<Plan>),
    LocationUnavailable(LocationError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefresherStatus {
    AwaitingPosition,
    Tracking,
    /// Recomputation is halted until a new refresher is started.
    LocationUnavailable(LocationError),
    Stopped,
}

/// Holds the published plan. Readers get the whole snapshot or nothing.
#[derive(Debug, Default)]
pub struct PlanCell {
    inner: Mutex<Published>,
}

#[derive(Debug, Default)]
struct Published {
    generation: u64,
    plan: Option<Arc<Plan>>,
}

impl PlanCell {
    pub fn latest(&self) -> Option<Arc<Plan>> {
        self.lock().plan.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Publishes `plan` unless `cancel` has fired or a plan from a later
    /// recomputation is already out. Returns the published snapshot.
    ///
    /// The cancellation check happens under the cell's lock, so once a
    /// canceller has passed [`PlanCell::barrier`] nothing more is published.
    pub fn publish(&self, plan: Plan, cancel: &CancelToken) -> Option<Arc<Plan>> {
        let mut published = self.lock();
        if cancel.is_cancelled() {
            debug!(generation = plan.generation, "discarding plan after cancellation");
            return None;
        }
        if plan.generation <= published.generation {
            debug!(
                generation = plan.generation,
                current = published.generation,
                "discarding stale plan"
            );
            return None;
        }
        let plan = Arc::new(plan);
        published.generation = plan.generation;
        published.plan = Some(Arc::clone(&plan));
        Some(plan)
    }

    /// Waits for any publication in progress to finish.
    pub fn barrier(&self) {
        drop(self.lock());
    }

    fn lock(&self) -> MutexGuard<'_, Published> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
struct Shared {
    plan: PlanCell,
    status: Mutex<RefresherStatus>,
    started: AtomicU64,
}

impl Shared {
    fn set_status(&self, status: RefresherStatus) {
        let mut guard = self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = status;
    }

    fn status(&self) -> RefresherStatus {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Read-only view on a refresher's latest plan, shareable across threads.
#[derive(Debug, Clone)]
pub struct PlanReader {
    shared: Arc<Shared>,
}

impl PlanReader {
    pub fn latest(&self) -> Option<Arc<Plan>> {
        self.shared.plan.latest()
    }
}

pub struct PlanRefresher {
    shared: Arc<Shared>,
    cancel: CancelToken,
    events: Receiver<PlanEvent>,
    refresh_tx: Option<Sender<()>>,
    stop_tx: Option<Sender<()>>,
    coordinator: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl PlanRefresher {
    pub fn start<S, B, P>(
        source: S,
        bins: B,
        provider: P,
        options: RefreshOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PlannerError>
    where
        S: PositionSource + 'static,
        B: BinSource + Send + 'static,
        P: RouteProvider + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared {
            plan: PlanCell::default(),
            status: Mutex::new(RefresherStatus::AwaitingPosition),
            started: AtomicU64::new(0),
        });
        let cancel = CancelToken::new();
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let (refresh_tx, refresh_rx) = unbounded::<()>();
        let (snapshot_tx, snapshot_rx) = unbounded::<Vec<Bin>>();
        let (events_tx, events) = unbounded::<PlanEvent>();

        let tracker = PositionTracker::spawn(source, options.watch.clone(), Arc::clone(&clock))?;

        let poller = {
            let stop_rx = stop_rx.clone();
            let cancel = cancel.clone();
            let interval = options.bin_refresh_interval;
            thread::Builder::new()
                .name("bin-poller".into())
                .spawn(move || poll_bins(bins, interval, snapshot_tx, refresh_rx, stop_rx, cancel))
                .map_err(|err| PlannerError::Spawn("bin-poller", err))?
        };

        let coordinator = {
            let coordinator = Coordinator {
                shared: Arc::clone(&shared),
                provider: Arc::new(provider),
                clock,
                options,
                cancel: cancel.clone(),
                events_tx,
                position: None,
                targets: None,
                generation: 0,
                last_started: None,
                pending: false,
                halted: false,
            };
            thread::Builder::new()
                .name("plan-coordinator".into())
                .spawn(move || coordinator.run(tracker, snapshot_rx, stop_rx))
                .map_err(|err| PlannerError::Spawn("plan-coordinator", err))?
        };

        Ok(Self {
            shared,
            cancel,
            events,
            refresh_tx: Some(refresh_tx),
            stop_tx: Some(stop_tx),
            coordinator: Some(coordinator),
            poller: Some(poller),
        })
    }

    pub fn latest_plan(&self) -> Option<Arc<Plan>> {
        self.shared.plan.latest()
    }

    pub fn reader(&self) -> PlanReader {
        PlanReader {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn status(&self) -> RefresherStatus {
        self.shared.status()
    }

    /// Published plans and location loss, in publication order.
    pub fn events(&self) -> Receiver<PlanEvent> {
        self.events.clone()
    }

    /// Number of recomputations started so far.
    pub fn recomputations_started(&self) -> u64 {
        self.shared.started.load(Ordering::SeqCst)
    }

    /// Pulls a bin snapshot now instead of waiting for the next interval.
    pub fn refresh_bins(&self) {
        if let Some(tx) = &self.refresh_tx {
            let _ = tx.send(());
        }
    }

    /// Stops tracking and polling. In-flight recomputations are abandoned.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.shared.plan.barrier();
        self.stop_tx.take();
        self.refresh_tx.take();
        for handle in [self.coordinator.take(), self.poller.take()].into_iter().flatten() {
            if handle.join().is_err() {
                error!("plan refresher thread panicked");
            }
        }
        self.shared.set_status(RefresherStatus::Stopped);
    }
}

impl Drop for PlanRefresher {
    fn drop(&mut self) {
        if self.coordinator.is_some() || self.poller.is_some() {
            self.stop();
        }
    }
}

fn poll_bins<B: BinSource>(
    bins: B,
    interval: Duration,
    snapshot_tx: Sender<Vec<Bin>>,
    refresh_rx: Receiver<()>,
    stop_rx: Receiver<()>,
    cancel: CancelToken,
) {
    loop {
        match bins.fetch_bins() {
            Ok(snapshot) => {
                if cancel.is_cancelled() || snapshot_tx.send(snapshot).is_err() {
                    break;
                }
            }
            // The previous snapshot stays in use until a refresh succeeds.
            Err(err) => warn!(error = %err, "bin refresh failed"),
        }

        select! {
            recv(stop_rx) -> _ => break,
            recv(refresh_rx) -> msg => {
                if msg.is_err() {
                    break;
                }
            }
            default(interval) => {}
        }
    }
    debug!("bin poller stopped");
}

struct Coordinator<P> {
    shared: Arc<Shared>,
    provider: Arc<P>,
    clock: Arc<dyn Clock>,
    options: RefreshOptions,
    cancel: CancelToken,
    events_tx: Sender<PlanEvent>,
    position: Option<GeoPoint>,
    targets: Option<Arc<Vec<Bin>>>,
    generation: u64,
    last_started: Option<Instant>,
    pending: bool,
    halted: bool,
}

impl<P> Coordinator<P>
where
    P: RouteProvider + Send + Sync + 'static,
{
    fn run(mut self, mut tracker: PositionTracker, snapshots: Receiver<Vec<Bin>>, stop_rx: Receiver<()>) {
        let mut positions = tracker.events().clone();
        let mut snapshots = snapshots;
        info!("plan refresher started");

        loop {
            let deferred = match self.deferred_delay() {
                Some(delay) => after(delay),
                None => never(),
            };
            let mut positions_closed = false;
            let mut snapshots_closed = false;

            select! {
                recv(stop_rx) -> _ => break,
                recv(positions) -> event => match event {
                    Ok(PositionEvent::Fix(point)) => self.on_position(point),
                    Ok(PositionEvent::Unavailable(err)) => self.on_location_lost(err),
                    Err(_) => positions_closed = true,
                },
                recv(snapshots) -> snapshot => match snapshot {
                    Ok(bins) => self.on_snapshot(bins),
                    Err(_) => snapshots_closed = true,
                },
                recv(deferred) -> _ => {
                    self.pending = false;
                    self.recompute();
                }
            }

            // Closed channels would otherwise be ready forever.
            if positions_closed {
                positions = never();
            }
            if snapshots_closed {
                snapshots = never();
            }
        }

        tracker.stop();
        info!("plan refresher stopped");
    }

    fn on_position(&mut self, point: GeoPoint) {
        if self.halted {
            return;
        }
        if self.position.is_none() {
            self.shared.set_status(RefresherStatus::Tracking);
        }
        self.position = Some(point);
        self.request_recompute();
    }

    fn on_location_lost(&mut self, err: LocationError) {
        warn!(error = %err, "halting plan recomputation");
        self.halted = true;
        self.pending = false;
        self.shared
            .set_status(RefresherStatus::LocationUnavailable(err.clone()));
        let _ = self.events_tx.send(PlanEvent::LocationUnavailable(err));
    }

    fn on_snapshot(&mut self, bins: Vec<Bin>) {
        let selected = self.options.targets.select(&bins);
        let unchanged = self
            .targets
            .as_ref()
            .is_some_and(|current| current.as_slice() == selected.as_slice());
        if unchanged {
            debug!("bin snapshot unchanged");
            return;
        }
        debug!(targets = selected.len(), "bin snapshot changed");
        self.targets = Some(Arc::new(selected));
        self.request_recompute();
    }

    fn deferred_delay(&self) -> Option<Duration> {
        if !self.pending {
            return None;
        }
        let min = self.options.min_recompute_interval?;
        let since = self.last_started?.elapsed();
        Some(min.saturating_sub(since))
    }

    fn request_recompute(&mut self) {
        if self.halted || self.position.is_none() || self.targets.is_none() {
            return;
        }
        if let (Some(min), Some(last)) = (self.options.min_recompute_interval, self.last_started) {
            if last.elapsed() < min {
                self.pending = true;
                return;
            }
        }
        self.pending = false;
        self.recompute();
    }

    fn recompute(&mut self) {
        let (Some(start), Some(targets)) = (self.position, self.targets.clone()) else {
            return;
        };
        if self.halted || self.cancel.is_cancelled() {
            return;
        }

        self.generation += 1;
        self.last_started = Some(Instant::now());
        self.shared.started.fetch_add(1, Ordering::SeqCst);

        let generation = self.generation;
        let provider = Arc::clone(&self.provider);
        let clock = Arc::clone(&self.clock);
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        let events_tx = self.events_tx.clone();
        let options = self.options.plan;

        let spawned = thread::Builder::new()
            .name("plan-recompute".into())
            .spawn(move || {
                let Some(mut plan) =
                    compute_plan(start, &targets, options, provider.as_ref(), &cancel, clock.as_ref())
                else {
                    debug!(generation, "recomputation abandoned");
                    return;
                };
                plan.generation = generation;
                if let Some(plan) = shared.plan.publish(plan, &cancel) {
                    info!(
                        generation,
                        stops = plan.tour.len() - 1,
                        route_points = plan.combined_route.len(),
                        "plan published"
                    );
                    let _ = events_tx.send(PlanEvent::Published(plan));
                }
            });

        // Detached: stopping the refresher abandons in-flight recomputations.
        if let Err(err) = spawned {
            error!(generation, error = %err, "failed to spawn recomputation");
        }
    }
}
