use std::collections::BTreeSet;

use thiserror::Error;

use super::screen::SpaceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("window list unavailable: {0}")]
    WindowListUnavailable(String),
}

/// Determines which spaces currently hold at least one window.
///
/// `scan` blocks and is expensive (tens of milliseconds on a busy system). An
/// empty set is a valid answer and means no windows were found.
pub trait OccupancyProbe: Send + Sync {
    fn scan(&self, ids: &[SpaceId]) -> Result<BTreeSet<SpaceId>, ProbeError>;
}

/// Reports a fixed set of occupied spaces, filtered to the queried ids.
#[derive(Debug, Default)]
pub struct FixedOccupancy(pub BTreeSet<SpaceId>);

impl OccupancyProbe for FixedOccupancy {
    fn scan(&self, ids: &[SpaceId]) -> Result<BTreeSet<SpaceId>, ProbeError> {
        Ok(ids.iter().filter(|id| self.0.contains(id)).copied().collect())
    }
}
