use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

use super::preferences::SpacePreferences;
use crate::sys::render::Glyph;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {input:?}: expected #RRGGBB or #RRGGBBAA")]
pub struct ColorParseError {
    input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self { Rgba { r, g, b, a } }

    pub fn to_array(self) -> [u8; 4] { [self.r, self.g, self.b, self.a] }

    pub fn with_alpha(self, a: u8) -> Self { Rgba { a, ..self } }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError { input: s.to_string() };
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> String { color.to_string() }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IconStyle {
    #[default]
    Square,
    SquareOutline,
    Circle,
    CircleOutline,
    Triangle,
    TriangleOutline,
    Pentagon,
    PentagonOutline,
    Hexagon,
    HexagonOutline,
    Stroke,
    Transparent,
}

impl IconStyle {
    pub fn is_outline(self) -> bool {
        use IconStyle::*;
        matches!(
            self,
            SquareOutline | CircleOutline | TriangleOutline | PentagonOutline | HexagonOutline
        )
    }

    pub fn is_filled(self) -> bool {
        !self.is_outline() && !matches!(self, IconStyle::Stroke | IconStyle::Transparent)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkinTone {
    #[default]
    Default,
    Light,
    MediumLight,
    Medium,
    MediumDark,
    Dark,
}

impl SkinTone {
    const MODIFIERS: [char; 5] = ['\u{1F3FB}', '\u{1F3FC}', '\u{1F3FD}', '\u{1F3FE}', '\u{1F3FF}'];

    pub fn modifier(self) -> Option<char> {
        match self {
            SkinTone::Default => None,
            SkinTone::Light => Some(Self::MODIFIERS[0]),
            SkinTone::MediumLight => Some(Self::MODIFIERS[1]),
            SkinTone::Medium => Some(Self::MODIFIERS[2]),
            SkinTone::MediumDark => Some(Self::MODIFIERS[3]),
            SkinTone::Dark => Some(Self::MODIFIERS[4]),
        }
    }

    /// Replaces any skin-tone modifier in `symbol` with this tone's modifier,
    /// placed directly after the first character.
    pub fn apply(self, symbol: &str) -> String {
        let mut chars = symbol.chars().filter(|c| !Self::MODIFIERS.contains(c));
        let mut out = String::with_capacity(symbol.len() + 4);
        if let Some(first) = chars.next() {
            out.push(first);
            if let Some(m) = self.modifier() {
                out.push(m);
            }
        }
        out.extend(chars);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: u16,
}

impl Default for FontSpec {
    fn default() -> Self {
        FontSpec {
            family: "system".to_string(),
            size: 14,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpaceColors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Rgba>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedColors {
    pub foreground: Rgba,
    pub background: Rgba,
}

impl ResolvedColors {
    /// Inactive slots keep their hue but drop to 40% of their opacity.
    pub fn dimmed(self) -> Self {
        let dim = |c: Rgba| c.with_alpha((u16::from(c.a) * 2 / 5) as u8);
        ResolvedColors {
            foreground: dim(self.foreground),
            background: dim(self.background),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDefaults {
    pub colors: ResolvedColors,
    pub separator: Rgba,
    pub style: IconStyle,
    pub font: FontSpec,
}

impl StyleDefaults {
    pub fn for_appearance(dark_mode: bool) -> Self {
        let (colors, separator) = if dark_mode {
            (
                ResolvedColors { foreground: Rgba::BLACK, background: Rgba::WHITE },
                Rgba::WHITE.with_alpha(128),
            )
        } else {
            (
                ResolvedColors { foreground: Rgba::WHITE, background: Rgba::BLACK },
                Rgba::BLACK.with_alpha(128),
            )
        };
        StyleDefaults {
            colors,
            separator,
            style: IconStyle::default(),
            font: FontSpec::default(),
        }
    }
}

/// Transient overrides applied while the user hovers a style choice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewState {
    pub style: Option<IconStyle>,
    pub symbol: Option<String>,
    pub foreground: Option<Rgba>,
    pub background: Option<Rgba>,
    pub separator_color: Option<Rgba>,
    /// Render as if no symbol were set, even when one is persisted.
    pub clear_symbol: bool,
    pub skin_tone: Option<SkinTone>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStyle {
    pub style: IconStyle,
    pub colors: ResolvedColors,
    pub font: FontSpec,
    pub symbol: Option<String>,
    pub skin_tone: SkinTone,
}

impl ResolvedStyle {
    pub fn glyph(&self, label: &str) -> Glyph {
        match &self.symbol {
            Some(symbol) => Glyph::Symbol(self.skin_tone.apply(symbol)),
            None => Glyph::Label(label.to_string()),
        }
    }
}

/// Layers preview overrides over persisted preferences over defaults.
///
/// Every field is replaced wholesale by the first layer that sets it, except
/// colors, which resolve per channel.
pub fn resolve(
    persisted: &SpacePreferences,
    preview: Option<&PreviewState>,
    defaults: &StyleDefaults,
) -> ResolvedStyle {
    let persisted_colors = persisted.colors.unwrap_or_default();
    let foreground = preview
        .and_then(|p| p.foreground)
        .or(persisted_colors.foreground)
        .unwrap_or(defaults.colors.foreground);
    let background = preview
        .and_then(|p| p.background)
        .or(persisted_colors.background)
        .unwrap_or(defaults.colors.background);

    let symbol = match preview {
        Some(p) if p.clear_symbol => None,
        Some(PreviewState { symbol: Some(symbol), .. }) => Some(symbol.clone()),
        _ => persisted.symbol.clone(),
    };

    ResolvedStyle {
        style: preview.and_then(|p| p.style).or(persisted.style).unwrap_or(defaults.style),
        colors: ResolvedColors { foreground, background },
        font: persisted.font.clone().unwrap_or_else(|| defaults.font.clone()),
        symbol: symbol.filter(|s| !s.is_empty()),
        skin_tone: preview.and_then(|p| p.skin_tone).or(persisted.skin_tone).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn red() -> Rgba { Rgba::new(255, 0, 0, 255) }

    #[test]
    fn parses_and_prints_hex_colors() {
        assert_eq!("#ff0000".parse::<Rgba>().unwrap(), red());
        assert_eq!("#00ff0080".parse::<Rgba>().unwrap(), Rgba::new(0, 255, 0, 128));
        assert_eq!(red().to_string(), "#ff0000");
        assert_eq!(Rgba::new(1, 2, 3, 4).to_string(), "#01020304");
        assert!("ff0000".parse::<Rgba>().is_err());
        assert!("#ff00".parse::<Rgba>().is_err());
        assert!("#gg0000".parse::<Rgba>().is_err());
    }

    #[test]
    fn style_names_round_trip_through_strum() {
        for style in IconStyle::iter() {
            assert_eq!(style.to_string().parse::<IconStyle>().unwrap(), style);
        }
        assert_eq!("circle_outline".parse::<IconStyle>().unwrap(), IconStyle::CircleOutline);
    }

    #[test]
    fn skin_tone_replaces_existing_modifier() {
        let waving = "\u{1F44B}";
        assert_eq!(SkinTone::Dark.apply(waving), "\u{1F44B}\u{1F3FF}");
        assert_eq!(SkinTone::Light.apply("\u{1F44B}\u{1F3FF}"), "\u{1F44B}\u{1F3FB}");
        assert_eq!(SkinTone::Default.apply("\u{1F44B}\u{1F3FF}"), waving);
        assert_eq!(SkinTone::Medium.apply(""), "");
    }

    #[test]
    fn missing_preferences_fall_back_to_defaults() {
        let defaults = StyleDefaults::for_appearance(true);
        let resolved = resolve(&SpacePreferences::default(), None, &defaults);
        assert_eq!(resolved, ResolvedStyle {
            style: IconStyle::Square,
            colors: defaults.colors,
            font: FontSpec::default(),
            symbol: None,
            skin_tone: SkinTone::Default,
        });
        assert_ne!(
            StyleDefaults::for_appearance(false).colors,
            StyleDefaults::for_appearance(true).colors
        );
    }

    #[test]
    fn preview_colors_merge_per_channel() {
        let defaults = StyleDefaults::for_appearance(false);
        let persisted = SpacePreferences {
            colors: Some(SpaceColors { foreground: Some(red()), background: None }),
            ..Default::default()
        };
        let preview = PreviewState {
            background: Some(Rgba::new(0, 0, 255, 255)),
            ..Default::default()
        };
        let resolved = resolve(&persisted, Some(&preview), &defaults);
        assert_eq!(resolved.colors.foreground, red());
        assert_eq!(resolved.colors.background, Rgba::new(0, 0, 255, 255));

        let resolved = resolve(&SpacePreferences::default(), Some(&preview), &defaults);
        assert_eq!(resolved.colors.foreground, defaults.colors.foreground);
    }

    #[test]
    fn preview_replaces_style_and_can_clear_symbol() {
        let defaults = StyleDefaults::for_appearance(false);
        let persisted = SpacePreferences {
            style: Some(IconStyle::Triangle),
            symbol: Some("\u{2605}".into()),
            ..Default::default()
        };

        let preview = PreviewState { style: Some(IconStyle::Circle), ..Default::default() };
        let resolved = resolve(&persisted, Some(&preview), &defaults);
        assert_eq!(resolved.style, IconStyle::Circle);
        assert_eq!(resolved.glyph("3"), Glyph::Symbol("\u{2605}".into()));

        let preview = PreviewState { clear_symbol: true, ..preview };
        let resolved = resolve(&persisted, Some(&preview), &defaults);
        assert_eq!(resolved.glyph("3"), Glyph::Label("3".into()));

        let preview = PreviewState {
            symbol: Some("\u{1F44B}".into()),
            skin_tone: Some(SkinTone::Medium),
            ..Default::default()
        };
        let resolved = resolve(&persisted, Some(&preview), &defaults);
        assert_eq!(resolved.style, IconStyle::Triangle);
        assert_eq!(resolved.glyph("3"), Glyph::Symbol("\u{1F44B}\u{1F3FD}".into()));
    }

    #[test]
    fn dimming_scales_alpha_only() {
        let colors = ResolvedColors { foreground: red(), background: Rgba::new(0, 0, 0, 100) };
        let dimmed = colors.dimmed();
        assert_eq!(dimmed.foreground, Rgba::new(255, 0, 0, 102));
        assert_eq!(dimmed.background, Rgba::new(0, 0, 0, 40));
    }
}
