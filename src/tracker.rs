//! Live position tracking.
//!
//! A background thread pulls fixes from a [`PositionSource`], drops stale or
//! imprecise ones, and republishes the rest as [`PositionEvent`]s. Positioning
//! failure is reported exactly once and ends the watch. Stopping the tracker
//! joins the thread and closes the source before returning.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use tracing::{debug, error, info};

use crate::cancel::CancelToken;
use crate::error::{LocationError, PlannerError};
use crate::geo::GeoPoint;
use crate::traits::{Clock, PositionFix, PositionSource};

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Fixes reporting a worse accuracy (metres) are dropped.
    pub max_accuracy_m: Option<f64>,
    /// How far before the watch started a cached fix may date.
    pub maximum_age: Duration,
    /// Give up when no fix is accepted within this window.
    pub acquire_timeout: Duration,
    /// Longest single wait on the source; bounds cancellation latency.
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            max_accuracy_m: None,
            maximum_age: Duration::ZERO,
            acquire_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(GeoPoint),
    Unavailable(LocationError),
}

/// Handle on a running watch. Dropping it stops the watch.
pub struct PositionTracker {
    events: Receiver<PositionEvent>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl PositionTracker {
    pub fn spawn<S>(
        source: S,
        options: WatchOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PlannerError>
    where
        S: PositionSource + 'static,
    {
        let (tx, events) = unbounded();
        let cancel = CancelToken::new();
        let thread_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("position-tracker".into())
            .spawn(move || watch_loop(source, options, clock, thread_cancel, tx))
            .map_err(|err| PlannerError::Spawn("position-tracker", err))?;

        Ok(Self {
            events,
            cancel,
            handle: Some(handle),
        })
    }

    pub fn events(&self) -> &Receiver<PositionEvent> {
        &self.events
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels the watch and waits for the source to be released.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("position tracker thread panicked");
            }
        }
    }
}

impl Drop for PositionTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_loop<S: PositionSource>(
    mut source: S,
    options: WatchOptions,
    clock: Arc<dyn Clock>,
    cancel: CancelToken,
    tx: Sender<PositionEvent>,
) {
    let started = clock.now();
    let mut filter = FixFilter::new(started, &options);
    let mut acquired = false;
    info!("position watch started");

    while !cancel.is_cancelled() {
        match source.next_fix(options.poll_interval) {
            Ok(Some(fix)) => {
                if cancel.is_cancelled() {
                    break;
                }
                if filter.accept(&fix) {
                    acquired = true;
                    if tx.send(PositionEvent::Fix(fix.point)).is_err() {
                        break;
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                error!(error = %err, "positioning unavailable");
                let _ = tx.send(PositionEvent::Unavailable(err));
                break;
            }
        }

        if !acquired && elapsed_since(clock.as_ref(), started) >= options.acquire_timeout {
            error!("no position fix acquired before timeout");
            let _ = tx.send(PositionEvent::Unavailable(LocationError::Timeout));
            break;
        }
    }

    source.close();
    info!("position watch ended");
}

fn elapsed_since(clock: &dyn Clock, start: SystemTime) -> Duration {
    clock.now().duration_since(start).unwrap_or_default()
}

/// Staleness and accuracy gate applied to every raw fix.
#[derive(Debug)]
struct FixFilter {
    oldest_allowed: SystemTime,
    max_accuracy_m: Option<f64>,
    last_accepted: Option<SystemTime>,
}

impl FixFilter {
    fn new(started: SystemTime, options: &WatchOptions) -> Self {
        Self {
            oldest_allowed: started
                .checked_sub(options.maximum_age)
                .unwrap_or(SystemTime::UNIX_EPOCH),
            max_accuracy_m: options.max_accuracy_m,
            last_accepted: None,
        }
    }

    fn accept(&mut self, fix: &PositionFix) -> bool {
        if !fix.point.is_finite() {
            debug!("dropping fix with non-finite coordinates");
            return false;
        }
        if let (Some(limit), Some(accuracy)) = (self.max_accuracy_m, fix.accuracy_m) {
            if accuracy > limit {
                debug!(accuracy, limit, "dropping imprecise fix");
                return false;
            }
        }
        if let Some(taken) = fix.timestamp {
            if taken < self.oldest_allowed {
                debug!("dropping cached fix older than maximum age");
                return false;
            }
            if self.last_accepted.is_some_and(|last| taken <= last) {
                debug!("dropping out-of-order fix");
                return false;
            }
            self.last_accepted = Some(taken);
        }
        true
    }
}

/// Sending half of a [`ChannelPositionSource`]; host adapters push device
/// fixes or errors through it.
pub type PositionFeed = Sender<Result<PositionFix, LocationError>>;

/// Position source fed over a channel by a host adapter.
///
/// Dropping every [`PositionFeed`] ends the watch as unavailable.
pub struct ChannelPositionSource {
    rx: Receiver<Result<PositionFix, LocationError>>,
}

impl ChannelPositionSource {
    pub fn new() -> (PositionFeed, Self) {
        let (tx, rx) = unbounded();
        (tx, Self { rx })
    }
}

impl PositionSource for ChannelPositionSource {
    fn next_fix(&mut self, wait: Duration) -> Result<Option<PositionFix>, LocationError> {
        match self.rx.recv_timeout(wait) {
            Ok(Ok(fix)) => Ok(Some(fix)),
            Ok(Err(err)) => Err(err),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LocationError::PositionUnavailable(
                "position feed closed".to_string(),
            )),
        }
    }
}
