use std::collections::BTreeSet;
use std::sync::Arc;

use static_assertions::assert_impl_all;
use tracing::trace;

use super::occupancy::OccupancyCache;
use super::preferences::{PreferenceStore, Preferences};
use crate::layout_engine::{LayoutMode, SlotMetrics, StatusBarLayout, compute_layout};
use crate::sys::appearance::Appearance;
use crate::sys::screen::{SpaceId, Topology, TopologyProvider};

/// Every input that can change the drawn icon or its layout.
///
/// Two equal snapshots must draw identical pixels; drawing code reads nothing
/// that is not in here.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub topology: Topology,
    pub preferences: Preferences,
    pub dark_mode: bool,
    pub metrics: SlotMetrics,
    /// Empty unless the layout can hide empty spaces.
    pub occupied: BTreeSet<SpaceId>,
}

assert_impl_all!(RenderSnapshot: Send, Sync, Clone);

impl RenderSnapshot {
    pub fn mode(&self) -> LayoutMode { LayoutMode::from_toggles(&self.preferences.toggles) }

    pub fn layout(&self) -> StatusBarLayout {
        compute_layout(
            self.mode(),
            &self.topology,
            &self.preferences.toggles,
            &self.occupied,
            &self.metrics,
        )
    }
}

/// Reads the collaborators and folds them into a [`RenderSnapshot`].
#[derive(Clone)]
pub struct Snapshotter {
    topology: Arc<dyn TopologyProvider>,
    preferences: Arc<dyn PreferenceStore>,
    appearance: Arc<dyn Appearance>,
}

impl Snapshotter {
    pub fn new(
        topology: Arc<dyn TopologyProvider>,
        preferences: Arc<dyn PreferenceStore>,
        appearance: Arc<dyn Appearance>,
    ) -> Self {
        Snapshotter { topology, preferences, appearance }
    }

    pub fn capture(&self, occupancy: &mut OccupancyCache, metrics: SlotMetrics) -> RenderSnapshot {
        let topology = self.topology.current_topology();
        let preferences = self.preferences.current();
        let mode = LayoutMode::from_toggles(&preferences.toggles);

        let occupied = if mode.needs_occupancy(&preferences.toggles) {
            occupancy.occupied_spaces(&topology.space_ids(mode.spans_displays()))
        } else {
            BTreeSet::new()
        };
        trace!(?mode, current = %topology.current_space_id, occupied = occupied.len(), "captured render snapshot");

        RenderSnapshot {
            topology,
            preferences,
            dark_mode: self.appearance.is_dark_mode(),
            metrics,
            occupied,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::actor;
    use crate::model::preferences::SharedPreferences;
    use crate::sys::appearance::FixedAppearance;
    use crate::sys::screen::StaticTopology;
    use crate::testing::{ManualClock, ManualSpawner, ScriptedProbe, set, two_display_topology};

    struct Fixture {
        snapshotter: Snapshotter,
        prefs: SharedPreferences,
        probe: Arc<ScriptedProbe>,
        occupancy: OccupancyCache,
    }

    fn fixture() -> Fixture {
        let (tx, _rx) = actor::channel();
        let prefs = SharedPreferences::default();
        let probe = Arc::new(ScriptedProbe::new(set(&[1, 10])));
        let occupancy = OccupancyCache::new(
            probe.clone(),
            Arc::new(ManualSpawner::default()),
            Arc::new(ManualClock::new()),
            tx,
        )
        .with_ttl(Duration::from_millis(200));
        let snapshotter = Snapshotter::new(
            Arc::new(StaticTopology::new(two_display_topology(1))),
            Arc::new(prefs.clone()),
            Arc::new(FixedAppearance::new(true)),
        );
        Fixture { snapshotter, prefs, probe, occupancy }
    }

    #[test]
    fn skips_probe_when_occupancy_cannot_matter() {
        let mut f = fixture();
        let snap = f.snapshotter.capture(&mut f.occupancy, SlotMetrics::default());
        assert!(snap.occupied.is_empty());
        assert_eq!(f.probe.calls(), 0);

        f.prefs.update(|p| p.toggles.hide_empty = true);
        f.snapshotter.capture(&mut f.occupancy, SlotMetrics::default());
        assert_eq!(f.probe.calls(), 0);
    }

    #[test]
    fn queries_ids_for_the_layout_scope() {
        let mut f = fixture();
        f.prefs.update(|p| {
            p.toggles.hide_empty = true;
            p.toggles.show_all_spaces = true;
        });
        let snap = f.snapshotter.capture(&mut f.occupancy, SlotMetrics::default());
        assert_eq!(snap.occupied, set(&[1]));

        f.occupancy.invalidate();
        f.prefs.update(|p| p.toggles.show_all_displays = true);
        let snap = f.snapshotter.capture(&mut f.occupancy, SlotMetrics::default());
        assert_eq!(snap.occupied, set(&[1, 10]));
        assert_eq!(snap.mode(), LayoutMode::CrossDisplay);
    }

    #[test]
    fn equal_inputs_give_equal_snapshots() {
        let mut f = fixture();
        let a = f.snapshotter.capture(&mut f.occupancy, SlotMetrics::default());
        let b = f.snapshotter.capture(&mut f.occupancy, SlotMetrics::default());
        assert_eq!(a, b);

        f.prefs.update(|p| p.toggles.dim_inactive = true);
        let c = f.snapshotter.capture(&mut f.occupancy, SlotMetrics::default());
        assert_ne!(a, c);

        let wider = SlotMetrics {
            icon_size: 24.0,
            ..SlotMetrics::default()
        };
        let d = f.snapshotter.capture(&mut f.occupancy, wider);
        assert_ne!(c, d);
    }
}
