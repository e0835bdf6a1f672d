use std::sync::Arc;

use tracing::trace;

use crate::layout_engine::StatusBarLayout;
use crate::model::snapshot::RenderSnapshot;
use crate::sys::render::Bitmap;

#[derive(Debug, Clone)]
pub struct CachedIcon {
    pub key: RenderSnapshot,
    pub bitmap: Bitmap,
    pub layout: Arc<StatusBarLayout>,
}

/// Holds the most recently drawn icon. Only one entry is ever kept; a new
/// snapshot replaces it.
#[derive(Debug, Default)]
pub struct IconCache {
    entry: Option<CachedIcon>,
    hits: u64,
    misses: u64,
}

impl IconCache {
    pub fn new() -> Self { Self::default() }

    /// Returns the cached icon if `key` matches it, otherwise draws a new one
    /// with `draw` and keeps it.
    pub fn get_or_draw(
        &mut self,
        key: RenderSnapshot,
        draw: impl FnOnce(&RenderSnapshot) -> (Bitmap, StatusBarLayout),
    ) -> &CachedIcon {
        let entry = match self.entry.take() {
            Some(entry) if entry.key == key => {
                self.hits += 1;
                entry
            }
            _ => {
                self.misses += 1;
                trace!(misses = self.misses, "icon cache miss");
                let (bitmap, layout) = draw(&key);
                CachedIcon {
                    key,
                    bitmap,
                    layout: Arc::new(layout),
                }
            }
        };
        self.entry.insert(entry)
    }

    pub fn current(&self) -> Option<&CachedIcon> { self.entry.as_ref() }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            trace!("icon cache invalidated");
        }
    }

    pub fn hits(&self) -> u64 { self.hits }

    pub fn misses(&self) -> u64 { self.misses }
}
