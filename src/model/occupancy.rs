//! TTL-bounded memoization of the window-occupancy probe.
//!
//! Only the first query (or the first after [`OccupancyCache::invalidate`])
//! probes synchronously. Afterwards a stale or re-shaped query returns the
//! previous answer immediately and schedules a refresh on the worker; the
//! worker posts a [`RefreshOutcome`] back to the owner, which applies it with
//! [`OccupancyCache::apply`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, debug_span, trace, warn};

use crate::actor;
use crate::sys::clock::Clock;
use crate::sys::probe::{OccupancyProbe, ProbeError};
use crate::sys::screen::SpaceId;
use crate::sys::worker::{CancelToken, Spawn};

pub const DEFAULT_TTL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyRecord {
    pub queried_ids: Vec<SpaceId>,
    pub result: BTreeSet<SpaceId>,
    pub captured_at: Instant,
}

#[derive(Debug)]
pub struct RefreshOutcome {
    pub generation: u64,
    pub ids: Vec<SpaceId>,
    pub result: Result<BTreeSet<SpaceId>, ProbeError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshApplied {
    Changed,
    Unchanged,
    /// The probe failed; the previous record is kept and will be retried.
    Failed,
    /// Superseded by a newer refresh or an invalidation.
    Discarded,
}

impl RefreshApplied {
    pub fn needs_icon_refresh(self) -> bool {
        matches!(self, RefreshApplied::Changed | RefreshApplied::Unchanged)
    }
}

#[derive(Debug)]
struct PendingRefresh {
    generation: u64,
    ids: Vec<SpaceId>,
}

pub struct OccupancyCache {
    probe: Arc<dyn OccupancyProbe>,
    spawner: Arc<dyn Spawn>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    record: Option<OccupancyRecord>,
    pending: Option<PendingRefresh>,
    generation: Arc<AtomicU64>,
    completed_tx: actor::Sender<RefreshOutcome>,
}

impl OccupancyCache {
    pub fn new(
        probe: Arc<dyn OccupancyProbe>,
        spawner: Arc<dyn Spawn>,
        clock: Arc<dyn Clock>,
        completed_tx: actor::Sender<RefreshOutcome>,
    ) -> Self {
        OccupancyCache {
            probe,
            spawner,
            clock,
            ttl: DEFAULT_TTL,
            record: None,
            pending: None,
            generation: Arc::new(AtomicU64::new(0)),
            completed_tx,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn set_ttl(&mut self, ttl: Duration) { self.ttl = ttl; }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn record(&self) -> Option<&OccupancyRecord> { self.record.as_ref() }

    pub fn is_populated(&self) -> bool { self.record.is_some() }

    pub fn has_pending_refresh(&self) -> bool { self.pending.is_some() }

    /// Returns the spaces among `ids` known to hold windows. Until a probe has
    /// succeeded every id counts as occupied, so nothing gets hidden on a
    /// guess.
    pub fn occupied_spaces(&mut self, ids: &[SpaceId]) -> BTreeSet<SpaceId> {
        let ids = normalize(ids);
        let now = self.clock.now();

        let Some(record) = &self.record else {
            return self.bootstrap(ids, now);
        };

        let age = now.saturating_duration_since(record.captured_at);
        if record.queried_ids == ids && age < self.ttl {
            return record.result.clone();
        }

        let result = record.result.clone();
        let covered = self.pending.as_ref().is_some_and(|p| p.ids == ids);
        if covered {
            trace!(?ids, "refresh already in flight");
        } else {
            debug!(?ids, ?age, "occupancy stale; scheduling refresh");
            self.schedule_refresh(&ids);
        }
        result
    }

    /// Starts a background probe of `ids`, cancelling any refresh already in
    /// flight.
    pub fn schedule_refresh(&mut self, ids: &[SpaceId]) {
        let ids = normalize(ids);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let cancel = CancelToken::new(self.generation.clone(), generation);
        self.pending = Some(PendingRefresh { generation, ids: ids.clone() });

        let probe = self.probe.clone();
        let tx = self.completed_tx.clone();
        let span = debug_span!("occupancy_refresh", generation);
        self.spawner.spawn(Box::new(move || {
            let _enter = span.enter();
            if cancel.is_cancelled() {
                trace!("cancelled before probing");
                return;
            }
            let result = probe.scan(&ids);
            if cancel.is_cancelled() {
                trace!("cancelled while probing");
                return;
            }
            if tx.send(RefreshOutcome { generation, ids, result }).is_err() {
                debug!("owner went away before refresh completed");
            }
        }));
    }

    /// Forgets everything. Any refresh in flight is cancelled and its result
    /// will be discarded.
    pub fn invalidate(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.pending = None;
        self.record = None;
    }

    pub fn apply(&mut self, outcome: RefreshOutcome) -> RefreshApplied {
        let current = self.generation.load(Ordering::Acquire);
        let live = outcome.generation == current
            && self.pending.as_ref().is_some_and(|p| p.generation == outcome.generation);
        if !live {
            debug!(outcome.generation, current, "discarding superseded occupancy refresh");
            return RefreshApplied::Discarded;
        }
        self.pending = None;

        match outcome.result {
            Ok(result) => {
                let changed = self.record.as_ref().is_none_or(|r| r.result != result);
                trace!(?result, changed, "applying occupancy refresh");
                self.record = Some(OccupancyRecord {
                    queried_ids: outcome.ids,
                    result,
                    captured_at: self.clock.now(),
                });
                if changed { RefreshApplied::Changed } else { RefreshApplied::Unchanged }
            }
            Err(err) => {
                warn!(%err, "occupancy probe failed; keeping previous result");
                RefreshApplied::Failed
            }
        }
    }

    fn bootstrap(&mut self, ids: Vec<SpaceId>, now: Instant) -> BTreeSet<SpaceId> {
        debug!(?ids, "probing occupancy synchronously");
        match self.probe.scan(&ids) {
            Ok(result) => {
                self.record = Some(OccupancyRecord {
                    queried_ids: ids,
                    result: result.clone(),
                    captured_at: now,
                });
                result
            }
            Err(err) => {
                warn!(%err, "initial occupancy probe failed; treating every space as occupied");
                ids.into_iter().collect()
            }
        }
    }
}

fn normalize(ids: &[SpaceId]) -> Vec<SpaceId> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
