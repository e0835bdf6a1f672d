//! Turns a [`RenderSnapshot`] into the status-bar bitmap by asking the
//! renderer for one glyph per slot and laying them side by side.

use tracing::warn;

use super::preview;
use crate::layout_engine::{Slot, StatusBarLayout};
use crate::model::preferences::SpacePreferences;
use crate::model::snapshot::RenderSnapshot;
use crate::model::style::{PreviewState, StyleDefaults, resolve};
use crate::sys::render::{Bitmap, Canvas, IconRenderer, RenderRequest, fallback_glyph};

pub fn draw(
    snapshot: &RenderSnapshot,
    preview: Option<&PreviewState>,
    renderer: &dyn IconRenderer,
) -> (Bitmap, StatusBarLayout) {
    let layout = snapshot.layout();
    let prefs = &snapshot.preferences;
    let toggles = &prefs.toggles;
    let defaults = StyleDefaults::for_appearance(snapshot.dark_mode);
    let scale = toggles.size_scale;
    let height = snapshot.metrics.icon_height(scale) as u32;
    let current = layout.current_slot();
    let shared = !toggles.unique_icons_per_display;

    let mut canvas = Canvas::new(layout.total_width() as u32, height);
    for slot in &layout.slots {
        let x = slot.start_x as u32;
        let width = slot.width as u32;

        if slot.is_separator() {
            let color = preview
                .and_then(|p| p.separator_color)
                .or(prefs.separator_color)
                .unwrap_or(defaults.separator);
            canvas.fill_rect(x + width / 2, 0, 1, height, color);
            continue;
        }

        let slot_preview = preview.filter(|_| preview::applies_to(slot, current, shared));
        let mut style = resolve(&persisted_for(snapshot, slot), slot_preview, &defaults);
        if slot.local_index.is_none() {
            // fullscreen and fallback slots always show their fixed label
            style.symbol = None;
        }
        let colors = if toggles.dim_inactive && !slot.is_current {
            style.colors.dimmed()
        } else {
            style.colors
        };

        let request = RenderRequest {
            glyph: style.glyph(&slot.label),
            style: style.style,
            colors,
            font: style.font.clone(),
            scale,
            width,
            height,
        };
        let bitmap = match renderer.render(&request) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                warn!(%err, label = %slot.label, "glyph render failed; using fallback");
                fallback_glyph(width, height, &colors)
            }
        };
        canvas.blit(&bitmap, x, width);
    }

    (canvas.finish(), layout)
}

fn persisted_for(snapshot: &RenderSnapshot, slot: &Slot) -> SpacePreferences {
    match (slot.local_index, &slot.display_id) {
        (Some(index), Some(display)) => snapshot.preferences.resolve(index, display),
        _ => SpacePreferences::default(),
    }
}
