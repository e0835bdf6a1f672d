mod mode;
mod slots;

pub use mode::LayoutMode;
pub use slots::{
    FALLBACK_LABEL, FULLSCREEN_LABEL, Slot, SlotMetrics, SlotTarget, StatusBarLayout,
    compute_layout,
};
