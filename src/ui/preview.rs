use tracing::debug;

use crate::layout_engine::Slot;
use crate::model::style::PreviewState;

/// Transient style overrides shown while a style choice is hovered. Nothing
/// here is ever persisted.
#[derive(Debug, Default)]
pub struct PreviewOverlay {
    state: Option<PreviewState>,
}

impl PreviewOverlay {
    pub fn begin(&mut self, state: PreviewState) {
        debug!(?state, "preview started");
        self.state = Some(state);
    }

    /// Returns whether a preview was active.
    pub fn end(&mut self) -> bool {
        let was_active = self.state.take().is_some();
        if was_active {
            debug!("preview ended");
        }
        was_active
    }

    pub fn active(&self) -> Option<&PreviewState> { self.state.as_ref() }

    pub fn is_active(&self) -> bool { self.state.is_some() }
}

/// Whether a preview targeting the active space should restyle `slot`.
///
/// The active slot always qualifies. When preferences are shared across
/// displays, so does every slot with the same local index, since those slots
/// would read the same persisted entry.
pub fn applies_to(slot: &Slot, current: Option<&Slot>, shared_across_displays: bool) -> bool {
    let Some(current) = current else { return false };
    if slot.is_separator() {
        return false;
    }
    if slot.space_id == current.space_id && slot.display_id == current.display_id {
        return true;
    }
    shared_across_displays && slot.local_index.is_some() && slot.local_index == current.local_index
}
