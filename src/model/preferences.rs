use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::style::{FontSpec, IconStyle, Rgba, SkinTone, SpaceColors};

/// Switches that apply to the whole indicator rather than to one space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalToggles {
    pub dim_inactive: bool,
    pub hide_empty: bool,
    pub hide_fullscreen: bool,
    pub show_all_spaces: bool,
    pub show_all_displays: bool,
    /// When false, displays share preferences by local space index.
    pub unique_icons_per_display: bool,
    pub local_numbering: bool,
    pub size_scale: f64,
}

impl Default for GlobalToggles {
    fn default() -> Self {
        GlobalToggles {
            dim_inactive: false,
            hide_empty: false,
            hide_fullscreen: false,
            show_all_spaces: false,
            show_all_displays: false,
            unique_icons_per_display: false,
            local_numbering: false,
            size_scale: 1.0,
        }
    }
}

/// Persisted overrides for one space. Unset fields resolve to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacePreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<IconStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_tone: Option<SkinTone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<SpaceColors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSpec>,
}

/// Identifies whose preferences a slot uses. `display` is `None` for
/// preferences shared across displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpaceKey {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceOverride {
    #[serde(flatten)]
    pub key: SpaceKey,
    #[serde(flatten)]
    pub prefs: SpacePreferences,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator_color: Option<Rgba>,
    pub toggles: GlobalToggles,
    #[serde(rename = "space")]
    pub spaces: Vec<SpaceOverride>,
}

impl Preferences {
    /// The key a space at local `index` on `display` reads its preferences
    /// from under the current sharing mode.
    pub fn key_for(&self, index: usize, display: &str) -> SpaceKey {
        SpaceKey {
            index,
            display: self.toggles.unique_icons_per_display.then(|| display.to_string()),
        }
    }

    pub fn resolve(&self, index: usize, display: &str) -> SpacePreferences {
        let key = self.key_for(index, display);
        self.get(&key).cloned().unwrap_or_default()
    }

    pub fn get(&self, key: &SpaceKey) -> Option<&SpacePreferences> {
        self.spaces.iter().find(|o| &o.key == key).map(|o| &o.prefs)
    }

    pub fn set(&mut self, key: SpaceKey, prefs: SpacePreferences) {
        match self.spaces.iter_mut().find(|o| o.key == key) {
            Some(existing) => existing.prefs = prefs,
            None => self.spaces.push(SpaceOverride { key, prefs }),
        }
    }

    pub fn remove(&mut self, key: &SpaceKey) { self.spaces.retain(|o| &o.key != key); }
}

/// Read access to the user's persisted preferences.
pub trait PreferenceStore: Send + Sync {
    fn current(&self) -> Preferences;
}

/// In-memory store shared between the host (which writes) and the indicator
/// (which reads on every render).
#[derive(Debug, Clone, Default)]
pub struct SharedPreferences(Arc<RwLock<Preferences>>);

impl SharedPreferences {
    pub fn new(prefs: Preferences) -> Self { SharedPreferences(Arc::new(RwLock::new(prefs))) }

    pub fn replace(&self, prefs: Preferences) { *self.0.write() = prefs; }

    pub fn update(&self, f: impl FnOnce(&mut Preferences)) { f(&mut self.0.write()); }
}

impl PreferenceStore for SharedPreferences {
    fn current(&self) -> Preferences { self.0.read().clone() }
}
