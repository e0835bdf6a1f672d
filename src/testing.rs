//! Deterministic stand-ins for the external collaborators.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::sys::clock::Clock;
use crate::sys::probe::{OccupancyProbe, ProbeError};
use crate::sys::render::{BlockRenderer, Bitmap, IconRenderer, RenderError, RenderRequest};
use crate::sys::screen::{DisplaySpaceInfo, SpaceEntry, SpaceId, Topology};
use crate::sys::worker::{Job, Spawn};

pub fn ids(raw: &[u64]) -> Vec<SpaceId> { raw.iter().copied().map(SpaceId::new).collect() }

pub fn set(raw: &[u64]) -> BTreeSet<SpaceId> { raw.iter().copied().map(SpaceId::new).collect() }

/// Display "A" with spaces 1, 2 (fullscreen), 3; display "B" with 10, 11.
pub fn two_display_topology(current: u64) -> Topology {
    let current_display = if current >= 10 { "B" } else { "A" };
    Topology {
        current_space_id: SpaceId::new(current),
        current_space_index: 1,
        current_display_id: current_display.into(),
        displays: vec![
            DisplaySpaceInfo {
                display_id: "A".into(),
                entries: vec![
                    SpaceEntry::regular(1, 1),
                    SpaceEntry::fullscreen(2),
                    SpaceEntry::regular(3, 2),
                ],
                global_start_index: 1,
            },
            DisplaySpaceInfo {
                display_id: "B".into(),
                entries: vec![SpaceEntry::regular(10, 1), SpaceEntry::regular(11, 2)],
                global_start_index: 3,
            },
        ],
    }
}

pub struct ManualClock(Mutex<Instant>);

impl ManualClock {
    pub fn new() -> Self { ManualClock(Mutex::new(Instant::now())) }

    pub fn advance(&self, by: Duration) { *self.0.lock() += by; }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant { *self.0.lock() }
}

/// Queues jobs until the test runs them, in whatever order it chooses.
#[derive(Default)]
pub struct ManualSpawner(Mutex<VecDeque<Job>>);

impl ManualSpawner {
    pub fn queued(&self) -> usize { self.0.lock().len() }

    pub fn take_next(&self) -> Option<Job> { self.0.lock().pop_front() }

    pub fn run_next(&self) -> bool { Self::run(self.take_next()) }

    /// Runs the most recently queued job first.
    pub fn run_last(&self) -> bool {
        let job = self.0.lock().pop_back();
        Self::run(job)
    }

    pub fn run_all(&self) { while self.run_next() {} }

    fn run(job: Option<Job>) -> bool {
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}

impl Spawn for ManualSpawner {
    fn spawn(&self, job: Job) { self.0.lock().push_back(job); }
}

/// Answers with a settable set, intersected with the queried ids.
pub struct ScriptedProbe {
    result: Mutex<BTreeSet<SpaceId>>,
    calls: AtomicUsize,
    fail_next: AtomicBool,
    during_scan: Mutex<Option<Job>>,
}

impl ScriptedProbe {
    pub fn new(result: BTreeSet<SpaceId>) -> Self {
        ScriptedProbe {
            result: Mutex::new(result),
            calls: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
            during_scan: Mutex::new(None),
        }
    }

    pub fn set_result(&self, result: BTreeSet<SpaceId>) { *self.result.lock() = result; }

    pub fn fail_next(&self) { self.fail_next.store(true, Ordering::SeqCst); }

    /// Runs `hook` inside the next scan, after it has started.
    pub fn during_next_scan(&self, hook: impl FnOnce() + Send + 'static) {
        *self.during_scan.lock() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl OccupancyProbe for ScriptedProbe {
    fn scan(&self, ids: &[SpaceId]) -> Result<BTreeSet<SpaceId>, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hook = self.during_scan.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ProbeError::WindowListUnavailable("scripted failure".into()));
        }
        let result = self.result.lock();
        Ok(ids.iter().filter(|id| result.contains(id)).copied().collect())
    }
}

/// Wraps [`BlockRenderer`], counting calls and optionally failing on one glyph.
#[derive(Default)]
pub struct CountingRenderer {
    calls: AtomicUsize,
    requests: Mutex<Vec<RenderRequest>>,
    fail_on: Mutex<Option<String>>,
}

impl CountingRenderer {
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    pub fn fail_on(&self, glyph: &str) { *self.fail_on.lock() = Some(glyph.to_string()); }

    pub fn take_requests(&self) -> Vec<RenderRequest> { std::mem::take(&mut *self.requests.lock()) }
}

impl IconRenderer for CountingRenderer {
    fn render(&self, request: &RenderRequest) -> Result<Bitmap, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        if self.fail_on.lock().as_deref() == Some(request.glyph.text()) {
            return Err(RenderError::UnsupportedGlyph {
                glyph: request.glyph.text().to_string(),
                font: request.font.family.clone(),
            });
        }
        BlockRenderer.render(request)
    }
}
