pub mod occupancy;
pub mod preferences;
pub mod snapshot;
pub mod style;

pub use occupancy::{OccupancyCache, RefreshApplied, RefreshOutcome};
pub use preferences::{GlobalToggles, PreferenceStore, Preferences, SharedPreferences};
pub use snapshot::{RenderSnapshot, Snapshotter};
