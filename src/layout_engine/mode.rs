use serde::{Deserialize, Serialize};

use crate::model::preferences::GlobalToggles;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Only the active space.
    #[default]
    Single,
    /// Every visible space on the active display.
    Combined,
    /// Every visible space on every display, grouped by display.
    CrossDisplay,
}

impl LayoutMode {
    /// Cross-display wins when both show-all toggles are set.
    pub fn from_toggles(toggles: &GlobalToggles) -> Self {
        if toggles.show_all_displays {
            LayoutMode::CrossDisplay
        } else if toggles.show_all_spaces {
            LayoutMode::Combined
        } else {
            LayoutMode::Single
        }
    }

    pub fn is_multi_space(self) -> bool { !matches!(self, LayoutMode::Single) }

    pub fn spans_displays(self) -> bool { matches!(self, LayoutMode::CrossDisplay) }

    /// Occupancy only influences the output when empty spaces can be hidden.
    pub fn needs_occupancy(self, toggles: &GlobalToggles) -> bool {
        self.is_multi_space() && toggles.hide_empty
    }
}
