//! The drawing boundary: fully resolved glyph parameters in, RGBA bitmap out.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;
use thiserror::Error;

use crate::model::style::{FontSpec, IconStyle, ResolvedColors, Rgba};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("cannot draw {glyph:?} with font {font}")]
    UnsupportedGlyph { glyph: String, font: String },
    #[error("zero-sized canvas requested")]
    EmptyCanvas,
}

/// Immutable RGBA8 image. Clones share the pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("hash", &format_args!("{:016x}", self.content_hash()))
            .finish()
    }
}

impl Bitmap {
    /// Returns `None` when `pixels` does not hold exactly `width * height` RGBA
    /// pixels.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Bitmap { width, height, pixels: pixels.into() })
    }

    pub fn solid(width: u32, height: u32, color: Rgba) -> Self {
        let mut canvas = Canvas::new(width, height);
        canvas.fill_rect(0, 0, width, height, color);
        canvas.finish()
    }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    pub fn pixels(&self) -> &[u8] { &self.pixels }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = ((y * self.width + x) * 4) as usize;
        let p = &self.pixels[at..at + 4];
        Some(Rgba::new(p[0], p[1], p[2], p[3]))
    }

    /// True when both bitmaps share one pixel buffer.
    pub fn shares_pixels(&self, other: &Bitmap) -> bool { Arc::ptr_eq(&self.pixels, &other.pixels) }

    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.width.hash(&mut hasher);
        self.height.hash(&mut hasher);
        self.pixels.hash(&mut hasher);
        hasher.finish()
    }
}

/// Mutable RGBA8 surface used to assemble bitmaps.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Canvas {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn put(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let at = ((y * self.width + x) * 4) as usize;
        self.pixels[at..at + 4].copy_from_slice(&color.to_array());
    }

    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba) {
        for yy in y..y.saturating_add(height).min(self.height) {
            for xx in x..x.saturating_add(width).min(self.width) {
                self.put(xx, yy, color);
            }
        }
    }

    pub fn stroke_rect(&mut self, color: Rgba) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (w, h) = (self.width, self.height);
        self.fill_rect(0, 0, w, 1, color);
        self.fill_rect(0, h - 1, w, 1, color);
        self.fill_rect(0, 0, 1, h, color);
        self.fill_rect(w - 1, 0, 1, h, color);
    }

    /// Copies `src` with its left edge at `x`, clipped to `max_width` columns
    /// and to the canvas bounds.
    pub fn blit(&mut self, src: &Bitmap, x: u32, max_width: u32) {
        let cols = src.width.min(max_width).min(self.width.saturating_sub(x));
        let rows = src.height.min(self.height);
        if cols == 0 {
            return;
        }
        for row in 0..rows {
            let src_at = (row * src.width * 4) as usize;
            let dst_at = ((row * self.width + x) * 4) as usize;
            let len = (cols * 4) as usize;
            self.pixels[dst_at..dst_at + len].copy_from_slice(&src.pixels[src_at..src_at + len]);
        }
    }

    pub fn finish(self) -> Bitmap {
        Bitmap {
            width: self.width,
            height: self.height,
            pixels: self.pixels.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Glyph {
    Label(String),
    Symbol(String),
}

impl Glyph {
    pub fn text(&self) -> &str {
        match self {
            Glyph::Label(s) | Glyph::Symbol(s) => s,
        }
    }
}

/// One fully resolved drawing request. `width` and `height` are the slot size
/// the bitmap will be composited into.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub glyph: Glyph,
    pub style: IconStyle,
    pub colors: ResolvedColors,
    pub font: FontSpec,
    pub scale: f64,
    pub width: u32,
    pub height: u32,
}

pub trait IconRenderer: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<Bitmap, RenderError>;
}

/// Deterministic glyph used whenever the renderer fails, so the indicator
/// always shows something.
pub fn fallback_glyph(width: u32, height: u32, colors: &ResolvedColors) -> Bitmap {
    let mut canvas = Canvas::new(width, height);
    canvas.stroke_rect(colors.foreground);
    if width > 4 && height > 4 {
        canvas.fill_rect(width / 2 - 1, height / 4, 2, height / 2, colors.foreground);
    }
    canvas.finish()
}

/// Minimal renderer: a style-dependent frame, with each character of the glyph
/// drawn as a column encoding its code point.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockRenderer;

impl IconRenderer for BlockRenderer {
    fn render(&self, request: &RenderRequest) -> Result<Bitmap, RenderError> {
        let (w, h) = (request.width, request.height);
        if w == 0 || h == 0 {
            return Err(RenderError::EmptyCanvas);
        }
        let colors = &request.colors;
        let mut canvas = Canvas::new(w, h);
        if request.style.is_filled() {
            canvas.fill_rect(0, 0, w, h, colors.background);
        }
        if request.style.is_outline() || request.style == IconStyle::Stroke {
            canvas.stroke_rect(colors.foreground);
        }

        let text = request.glyph.text();
        let chars = text.chars().count() as u32;
        let start = (w / 2).saturating_sub(chars);
        for (i, ch) in text.chars().enumerate() {
            let x = start + 2 * i as u32;
            for bit in 0..h.saturating_sub(2).min(21) {
                if (ch as u32 >> bit) & 1 == 1 {
                    canvas.put(x, bit + 1, colors.foreground);
                }
            }
        }
        Ok(canvas.finish())
    }
}
