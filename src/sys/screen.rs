use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SpaceId(u64);

impl SpaceId {
    pub fn new(id: u64) -> SpaceId { SpaceId(id) }

    pub fn get(&self) -> u64 { self.0 }
}

impl From<SpaceId> for u64 {
    fn from(id: SpaceId) -> u64 { id.get() }
}

impl std::fmt::Display for SpaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
}

/// One space as reported by the window manager.
///
/// `id` is stable for the lifetime of the space; `label` and `regular_index`
/// are recomputed whenever spaces are added or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceEntry {
    pub id: SpaceId,
    #[serde(default)]
    pub label: String,
    /// 1-based position among the non-fullscreen spaces of the display.
    #[serde(default)]
    pub regular_index: Option<usize>,
    #[serde(default)]
    pub is_fullscreen: bool,
}

impl SpaceEntry {
    pub fn regular(id: u64, regular_index: usize) -> Self {
        SpaceEntry {
            id: SpaceId::new(id),
            label: regular_index.to_string(),
            regular_index: Some(regular_index),
            is_fullscreen: false,
        }
    }

    pub fn fullscreen(id: u64) -> Self {
        SpaceEntry {
            id: SpaceId::new(id),
            label: String::new(),
            regular_index: None,
            is_fullscreen: true,
        }
    }

    /// The ordinal used for numbering, or `None` for spaces that are never
    /// numbered (fullscreen, or spaces the scanner could not place).
    pub fn ordinal(&self) -> Option<usize> {
        if self.is_fullscreen { None } else { self.regular_index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySpaceInfo {
    pub display_id: String,
    #[serde(default)]
    pub entries: Vec<SpaceEntry>,
    /// Global ordinal of the first regular space on this display.
    #[serde(default = "default_global_start")]
    pub global_start_index: usize,
}

fn default_global_start() -> usize { 1 }

impl DisplaySpaceInfo {
    pub fn global_ordinal(&self, entry: &SpaceEntry) -> Option<usize> {
        entry.ordinal().map(|idx| self.global_start_index + idx.saturating_sub(1))
    }

    pub fn contains(&self, id: SpaceId) -> bool { self.entries.iter().any(|e| e.id == id) }
}

/// Everything the topology scanner reports in a single read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Topology {
    pub current_space_id: SpaceId,
    #[serde(default)]
    pub current_space_index: usize,
    pub current_display_id: String,
    #[serde(default, rename = "display")]
    pub displays: Vec<DisplaySpaceInfo>,
}

impl Topology {
    pub fn current_display(&self) -> Option<&DisplaySpaceInfo> {
        self.displays
            .iter()
            .find(|d| d.display_id == self.current_display_id)
            .or_else(|| self.displays.iter().find(|d| d.contains(self.current_space_id)))
    }

    pub fn current_entry(&self) -> Option<(&DisplaySpaceInfo, &SpaceEntry)> {
        let display = self.current_display()?;
        let entry = display.entries.iter().find(|e| e.id == self.current_space_id)?;
        Some((display, entry))
    }

    /// Space ids in topology order, limited to the current display unless
    /// `all_displays` is set.
    pub fn space_ids(&self, all_displays: bool) -> Vec<SpaceId> {
        let ids: Vec<SpaceId> = if all_displays {
            self.displays.iter().flat_map(|d| d.entries.iter().map(|e| e.id)).collect()
        } else {
            self.current_display()
                .map(|d| d.entries.iter().map(|e| e.id).collect())
                .unwrap_or_default()
        };
        trace!(?ids, all_displays, "collected space ids");
        ids
    }
}

/// Source of the current space layout. Implementations must be cheap enough
/// to call on every render request.
pub trait TopologyProvider: Send + Sync {
    fn current_topology(&self) -> Topology;
}

/// A provider that always reports the same topology; useful for the CLI and for
/// hosts that push topology changes themselves.
#[derive(Debug, Default)]
pub struct StaticTopology(parking_lot::RwLock<Topology>);

impl StaticTopology {
    pub fn new(topology: Topology) -> Self { StaticTopology(parking_lot::RwLock::new(topology)) }

    pub fn replace(&self, topology: Topology) { *self.0.write() = topology; }
}

impl TopologyProvider for StaticTopology {
    fn current_topology(&self) -> Topology { self.0.read().clone() }
}
