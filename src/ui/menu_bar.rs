use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use super::compose;
use super::icon_cache::IconCache;
use super::preview::PreviewOverlay;
use crate::layout_engine::{Slot, SlotMetrics, StatusBarLayout};
use crate::model::occupancy::{OccupancyCache, RefreshApplied, RefreshOutcome};
use crate::model::snapshot::Snapshotter;
use crate::model::style::PreviewState;
use crate::sys::render::{Bitmap, IconRenderer};

/// The status-bar indicator: draws the icon on demand and answers clicks
/// against whatever it drew last.
pub struct MenuIcon {
    snapshotter: Snapshotter,
    renderer: Arc<dyn IconRenderer>,
    occupancy: OccupancyCache,
    metrics: SlotMetrics,
    cache: IconCache,
    preview: PreviewOverlay,
    drawn: Option<Arc<StatusBarLayout>>,
}

impl MenuIcon {
    pub fn new(
        snapshotter: Snapshotter,
        renderer: Arc<dyn IconRenderer>,
        occupancy: OccupancyCache,
        metrics: SlotMetrics,
    ) -> Self {
        MenuIcon {
            snapshotter,
            renderer,
            occupancy,
            metrics,
            cache: IconCache::new(),
            preview: PreviewOverlay::default(),
            drawn: None,
        }
    }

    /// Returns the icon for the current state. While nothing relevant has
    /// changed this hands back the previous bitmap without redrawing.
    pub fn get_icon(&mut self) -> Bitmap {
        let snapshot = self.snapshotter.capture(&mut self.occupancy, self.metrics);

        if let Some(preview) = self.preview.active() {
            let (bitmap, layout) = compose::draw(&snapshot, Some(preview), &*self.renderer);
            self.drawn = Some(Arc::new(layout));
            return bitmap;
        }

        let renderer = &*self.renderer;
        let entry = self.cache.get_or_draw(snapshot, |s| compose::draw(s, None, renderer));
        self.drawn = Some(entry.layout.clone());
        entry.bitmap.clone()
    }

    /// Shows `state` layered over the persisted style and returns the
    /// resulting icon. The cached icon is left untouched.
    pub fn begin_preview(&mut self, state: PreviewState) -> Bitmap {
        self.preview.begin(state);
        self.get_icon()
    }

    pub fn end_preview(&mut self) -> bool { self.preview.end() }

    pub fn is_previewing(&self) -> bool { self.preview.is_active() }

    /// The slot under `x` in the most recently drawn icon.
    pub fn slot_at(&self, x: f64) -> Option<&Slot> { self.drawn.as_ref()?.slot_at(x) }

    pub fn layout(&self) -> Option<&StatusBarLayout> { self.drawn.as_deref() }

    pub fn invalidate(&mut self) { self.cache.invalidate(); }

    /// The active space or the space list changed; occupancy is re-probed on
    /// the next draw.
    pub fn space_changed(&mut self) {
        debug!("space changed; dropping occupancy and icon");
        self.occupancy.invalidate();
        self.cache.invalidate();
    }

    #[instrument(level = "debug", skip(self, outcome), fields(generation = outcome.generation))]
    pub fn apply_refresh(&mut self, outcome: RefreshOutcome) -> RefreshApplied {
        let applied = self.occupancy.apply(outcome);
        if applied == RefreshApplied::Changed {
            self.cache.invalidate();
        }
        applied
    }

    pub fn set_metrics(&mut self, metrics: SlotMetrics) { self.metrics = metrics; }

    pub fn set_occupancy_ttl(&mut self, ttl: Duration) { self.occupancy.set_ttl(ttl); }

    pub fn occupancy(&self) -> &OccupancyCache { &self.occupancy }

    pub fn cache(&self) -> &IconCache { &self.cache }
}
