use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::LayoutMode;
use crate::model::preferences::GlobalToggles;
use crate::sys::screen::{DisplaySpaceInfo, SpaceEntry, SpaceId, Topology};

pub const FULLSCREEN_LABEL: &str = "F";
pub const FALLBACK_LABEL: &str = "?";

/// Unscaled slot geometry, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotMetrics {
    pub icon_size: f64,
    pub separator_width: f64,
}

impl Default for SlotMetrics {
    fn default() -> Self {
        SlotMetrics {
            icon_size: 22.0,
            separator_width: 8.0,
        }
    }
}

impl SlotMetrics {
    pub fn icon_width(&self, scale: f64) -> f64 { (self.icon_size * scale).round().max(1.0) }

    pub fn icon_height(&self, scale: f64) -> f64 { self.icon_width(scale) }

    pub fn separator_width(&self, scale: f64) -> f64 {
        (self.separator_width * scale).round().max(1.0)
    }
}

/// What a click on a slot asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SlotTarget {
    /// Switch to the space with this global ordinal.
    SwitchTo { index: usize },
    /// Bring forward the app occupying this fullscreen space.
    ActivateApp { space_id: SpaceId },
    Separator,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub start_x: f64,
    pub width: f64,
    pub label: String,
    pub target: SlotTarget,
    pub space_id: Option<SpaceId>,
    pub display_id: Option<String>,
    /// Local ordinal used to look up this slot's preferences.
    pub local_index: Option<usize>,
    pub is_current: bool,
}

impl Slot {
    pub fn target_space_index(&self) -> Option<usize> {
        match self.target {
            SlotTarget::SwitchTo { index } => Some(index),
            _ => None,
        }
    }

    pub fn is_separator(&self) -> bool { self.target == SlotTarget::Separator }

    pub fn contains(&self, x: f64) -> bool { x >= self.start_x && x < self.start_x + self.width }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusBarLayout {
    pub slots: Vec<Slot>,
}

impl StatusBarLayout {
    pub fn slot_at(&self, x: f64) -> Option<&Slot> { self.slots.iter().find(|s| s.contains(x)) }

    pub fn total_width(&self) -> f64 { self.slots.last().map(|s| s.start_x + s.width).unwrap_or(0.0) }

    pub fn current_slot(&self) -> Option<&Slot> { self.slots.iter().find(|s| s.is_current) }

    pub fn labels(&self) -> Vec<&str> { self.slots.iter().map(|s| s.label.as_str()).collect() }
}

struct Builder<'a> {
    topology: &'a Topology,
    toggles: &'a GlobalToggles,
    metrics: &'a SlotMetrics,
    next_x: f64,
    slots: Vec<Slot>,
}

impl<'a> Builder<'a> {
    fn push(&mut self, width: f64, slot: impl FnOnce(f64, f64) -> Slot) {
        self.slots.push(slot(self.next_x, width));
        self.next_x += width;
    }

    fn push_space(&mut self, display: &DisplaySpaceInfo, entry: &SpaceEntry) {
        let (label, target) = if entry.is_fullscreen {
            (FULLSCREEN_LABEL.to_string(), SlotTarget::ActivateApp { space_id: entry.id })
        } else {
            match (entry.ordinal(), display.global_ordinal(entry)) {
                (Some(local), Some(global)) => {
                    let shown = if self.toggles.local_numbering { local } else { global };
                    (shown.to_string(), SlotTarget::SwitchTo { index: global })
                }
                _ => (FALLBACK_LABEL.to_string(), SlotTarget::None),
            }
        };
        let is_current = entry.id == self.topology.current_space_id;
        let width = self.metrics.icon_width(self.toggles.size_scale);
        self.push(width, |start_x, width| Slot {
            start_x,
            width,
            label,
            target,
            space_id: Some(entry.id),
            display_id: Some(display.display_id.clone()),
            local_index: entry.ordinal(),
            is_current,
        });
    }

    fn push_separator(&mut self) {
        let width = self.metrics.separator_width(self.toggles.size_scale);
        self.push(width, |start_x, width| Slot {
            start_x,
            width,
            label: String::new(),
            target: SlotTarget::Separator,
            space_id: None,
            display_id: None,
            local_index: None,
            is_current: false,
        });
    }

    fn push_fallback(&mut self) {
        let width = self.metrics.icon_width(self.toggles.size_scale);
        self.push(width, |start_x, width| Slot {
            start_x,
            width,
            label: FALLBACK_LABEL.to_string(),
            target: SlotTarget::None,
            space_id: None,
            display_id: None,
            local_index: None,
            is_current: true,
        });
    }

    fn is_visible(&self, entry: &SpaceEntry, occupied: &BTreeSet<SpaceId>) -> bool {
        if entry.id == self.topology.current_space_id {
            return true;
        }
        if entry.is_fullscreen && self.toggles.hide_fullscreen {
            return false;
        }
        !(self.toggles.hide_empty && !occupied.contains(&entry.id))
    }
}

/// Lays out the indicator's slots left to right starting at x = 0.
///
/// The active space is always present. An empty or inconsistent topology
/// yields a single fallback slot with no click target.
pub fn compute_layout(
    mode: LayoutMode,
    topology: &Topology,
    toggles: &GlobalToggles,
    occupied: &BTreeSet<SpaceId>,
    metrics: &SlotMetrics,
) -> StatusBarLayout {
    let mut b = Builder {
        topology,
        toggles,
        metrics,
        next_x: 0.0,
        slots: Vec::new(),
    };

    match mode {
        LayoutMode::Single => {
            if let Some((display, entry)) = topology.current_entry() {
                b.push_space(display, entry);
            }
        }
        LayoutMode::Combined => {
            if let Some(display) = topology.current_display() {
                let visible: Vec<&SpaceEntry> =
                    display.entries.iter().filter(|e| b.is_visible(e, occupied)).collect();
                for entry in visible {
                    b.push_space(display, entry);
                }
            }
        }
        LayoutMode::CrossDisplay => {
            for display in &topology.displays {
                let visible: Vec<&SpaceEntry> =
                    display.entries.iter().filter(|e| b.is_visible(e, occupied)).collect();
                if visible.is_empty() {
                    continue;
                }
                if !b.slots.is_empty() {
                    b.push_separator();
                }
                for entry in visible {
                    b.push_space(display, entry);
                }
            }
        }
    }

    if !b.slots.iter().any(|s| s.is_current) {
        trace!(?mode, current = ?topology.current_space_id, "active space missing from topology");
        if b.slots.is_empty() {
            b.push_fallback();
        }
    }

    StatusBarLayout { slots: b.slots }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn display(id: &str, start: usize, entries: Vec<SpaceEntry>) -> DisplaySpaceInfo {
        DisplaySpaceInfo {
            display_id: id.into(),
            entries,
            global_start_index: start,
        }
    }

    fn single_display(current: u64) -> Topology {
        Topology {
            current_space_id: SpaceId::new(current),
            current_space_index: 1,
            current_display_id: "A".into(),
            displays: vec![display("A", 1, vec![
                SpaceEntry::regular(1, 1),
                SpaceEntry::fullscreen(2),
                SpaceEntry::regular(3, 2),
            ])],
        }
    }

    fn two_displays(current: u64) -> Topology {
        Topology {
            current_space_id: SpaceId::new(current),
            current_space_index: 1,
            current_display_id: if current >= 10 { "B" } else { "A" }.into(),
            displays: vec![
                display("A", 1, vec![SpaceEntry::regular(1, 1), SpaceEntry::regular(2, 2)]),
                display("B", 3, vec![
                    SpaceEntry::regular(10, 1),
                    SpaceEntry::fullscreen(11),
                    SpaceEntry::regular(12, 2),
                ]),
            ],
        }
    }

    fn layout(mode: LayoutMode, topology: &Topology, toggles: &GlobalToggles) -> StatusBarLayout {
        compute_layout(mode, topology, toggles, &BTreeSet::new(), &SlotMetrics::default())
    }

    fn combined() -> GlobalToggles {
        GlobalToggles {
            show_all_spaces: true,
            ..Default::default()
        }
    }

    #[test]
    fn numbers_regular_spaces_and_marks_fullscreen() {
        let out = layout(LayoutMode::Combined, &single_display(1), &combined());
        assert_eq!(out.labels(), vec!["1", "F", "2"]);
        assert_eq!(out.slots[1].target_space_index(), None);
        assert_eq!(out.slots[1].target, SlotTarget::ActivateApp { space_id: SpaceId::new(2) });
        assert_eq!(out.slots[2].target_space_index(), Some(2));
    }

    #[test]
    fn local_numbering_restarts_per_display() {
        let topology = two_displays(1);
        let mut toggles = GlobalToggles::default();
        let global = layout(LayoutMode::CrossDisplay, &topology, &toggles);
        assert_eq!(global.labels(), vec!["1", "2", "", "3", "F", "4"]);

        toggles.local_numbering = true;
        let local = layout(LayoutMode::CrossDisplay, &topology, &toggles);
        assert_eq!(local.labels(), vec!["1", "2", "", "1", "F", "2"]);
        // click targets stay global
        assert_eq!(local.slots[5].target_space_index(), Some(4));
    }

    #[test]
    fn single_mode_shows_only_current() {
        let out = layout(LayoutMode::Single, &two_displays(12), &GlobalToggles::default());
        assert_eq!(out.labels(), vec!["4"]);
        assert!(out.slots[0].is_current);
        assert_eq!(out.slots[0].start_x, 0.0);
    }

    #[test]
    fn combined_mode_is_limited_to_current_display() {
        let out = layout(LayoutMode::Combined, &two_displays(10), &combined());
        assert_eq!(out.labels(), vec!["3", "F", "4"]);
        assert!(out.slots.iter().all(|s| s.display_id.as_deref() == Some("B")));
    }

    #[test]
    fn separator_only_between_non_empty_groups() {
        let topology = two_displays(1);
        let toggles = GlobalToggles {
            hide_empty: true,
            ..Default::default()
        };
        // display B has nothing occupied and is dropped entirely
        let occupied = BTreeSet::from([SpaceId::new(2)]);
        let out = compute_layout(
            LayoutMode::CrossDisplay,
            &topology,
            &toggles,
            &occupied,
            &SlotMetrics::default(),
        );
        assert_eq!(out.labels(), vec!["1", "2"]);
        assert!(out.slots.iter().all(|s| !s.is_separator()));

        let out = layout(LayoutMode::CrossDisplay, &topology, &GlobalToggles::default());
        let separators: Vec<_> = out.slots.iter().filter(|s| s.is_separator()).collect();
        assert_eq!(separators.len(), 1);
        assert_eq!(separators[0].width, 8.0);
        assert_eq!(separators[0].start_x, 44.0);
        assert_eq!(out.slots[3].start_x, 52.0);
    }

    #[test]
    fn active_space_survives_every_filter_combination() {
        for hide_empty in [false, true] {
            for hide_fullscreen in [false, true] {
                for mode in [LayoutMode::Single, LayoutMode::Combined, LayoutMode::CrossDisplay] {
                    for current in [1, 2, 3] {
                        let toggles = GlobalToggles {
                            hide_empty,
                            hide_fullscreen,
                            ..Default::default()
                        };
                        let out = layout(mode, &single_display(current), &toggles);
                        let current_slots: Vec<_> = out
                            .slots
                            .iter()
                            .filter(|s| s.space_id == Some(SpaceId::new(current)))
                            .collect();
                        assert_eq!(
                            current_slots.len(),
                            1,
                            "mode={mode:?} hide_empty={hide_empty} hide_fullscreen={hide_fullscreen} current={current}"
                        );
                        assert!(current_slots[0].is_current);
                    }
                }
            }
        }
    }

    #[test]
    fn hide_fullscreen_drops_inactive_fullscreen_spaces() {
        let toggles = GlobalToggles {
            hide_fullscreen: true,
            ..combined()
        };
        let out = layout(LayoutMode::Combined, &single_display(1), &toggles);
        assert_eq!(out.labels(), vec!["1", "2"]);
        assert_eq!(out.slots[1].start_x, 22.0);
    }

    #[test]
    fn hit_testing_uses_half_open_ranges() {
        let topology = Topology {
            current_space_id: SpaceId::new(1),
            current_space_index: 1,
            current_display_id: "A".into(),
            displays: vec![display("A", 1, vec![
                SpaceEntry::regular(1, 1),
                SpaceEntry::regular(2, 2),
                SpaceEntry::regular(3, 3),
            ])],
        };
        let out = layout(LayoutMode::Combined, &topology, &combined());
        assert_eq!(out.slots.iter().map(|s| s.width).collect::<Vec<_>>(), vec![22.0; 3]);
        assert_eq!(out.slot_at(10.0).map(|s| s.label.as_str()), Some("1"));
        assert_eq!(out.slot_at(22.0).map(|s| s.label.as_str()), Some("2"));
        assert_eq!(out.slot_at(44.0).map(|s| s.label.as_str()), Some("3"));
        assert!(out.slot_at(66.0).is_none());
        assert!(out.slot_at(-1.0).is_none());
        assert_eq!(out.total_width(), 66.0);
    }

    #[test]
    fn empty_topology_degrades_to_fallback_slot() {
        for mode in [LayoutMode::Single, LayoutMode::Combined, LayoutMode::CrossDisplay] {
            let out = layout(mode, &Topology::default(), &combined());
            assert_eq!(out.labels(), vec![FALLBACK_LABEL]);
            assert_eq!(out.slots[0].target, SlotTarget::None);
        }
    }

    #[test]
    fn size_scale_widens_slots() {
        let toggles = GlobalToggles {
            size_scale: 1.5,
            ..combined()
        };
        let out = layout(LayoutMode::Combined, &single_display(1), &toggles);
        assert_eq!(out.slots[0].width, 33.0);
        assert_eq!(out.slots[2].start_x, 66.0);
    }
}
