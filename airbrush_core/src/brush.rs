//! Brush styles and the preset carousel.
//!
//! [`BrushState`] holds the style new segments are painted with, plus an
//! ordered list of named presets.  Manual edits are written through to the
//! active preset, so switching away and back keeps them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BrushConfig;
use crate::{Error, Result};

// ════════════════════════════════════════════════════════════════════════════
// Color
// ════════════════════════════════════════════════════════════════════════════

/// Opaque RGB color; opacity lives in [`BrushStyle::alpha`].
///
/// Serialized as a `#rrggbb` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Accepts `#rgb` and `#rrggbb` (leading `#` optional).
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| bad());
        match hex.len() {
            6 => Ok(Color::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Color::rgb(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(bad()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Color> for String {
    fn from(c: Color) -> String { c.to_string() }
}

// ════════════════════════════════════════════════════════════════════════════
// LineCap / Composite
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Round,
    Butt,
    Square,
}

/// How a segment's pixels combine with what is already on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Composite {
    /// Paint over.
    SourceOver,
    /// Remove existing paint where the brush covers (erase to transparent).
    DestinationOut,
    /// Darken by multiplying with existing paint.
    Multiply,
    /// Lighten by inverse-multiplying with existing paint.
    Screen,
}

impl Composite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Composite::SourceOver     => "source-over",
            Composite::DestinationOut => "destination-out",
            Composite::Multiply       => "multiply",
            Composite::Screen         => "screen",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BrushStyle
// ════════════════════════════════════════════════════════════════════════════

/// Shortest non-zero dash length, in pixels.
pub const MIN_DASH: f32 = 0.5;

/// Paint parameters, copied by value into every segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrushStyle {
    pub color:     Color,
    pub width:     f32,
    pub cap:       LineCap,
    /// Alternating on/off lengths in pixels; empty = solid.
    pub dash:      Vec<f32>,
    pub alpha:     f32,
    pub composite: Composite,
}

impl BrushStyle {
    /// Whether this style removes paint instead of adding it.
    pub fn is_destructive(&self) -> bool {
        self.composite == Composite::DestinationOut
    }

    /// Every dash length is finite and either zero or at least [`MIN_DASH`].
    pub fn dash_is_valid(&self) -> bool {
        self.dash.iter().all(|&d| d.is_finite() && (d == 0.0 || d >= MIN_DASH))
    }
}

impl Default for BrushStyle {
    fn default() -> Self {
        BrushStyle {
            color:     Color::BLACK,
            width:     5.0,
            cap:       LineCap::Round,
            dash:      Vec::new(),
            alpha:     1.0,
            composite: Composite::SourceOver,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Presets
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct BrushPreset {
    pub name:  &'static str,
    pub style: BrushStyle,
}

fn preset(
    name: &'static str,
    color: Color,
    width: f32,
    cap: LineCap,
    dash: &[f32],
    alpha: f32,
    composite: Composite,
) -> BrushPreset {
    BrushPreset {
        name,
        style: BrushStyle { color, width, cap, dash: dash.to_vec(), alpha, composite },
    }
}

/// The stock presets, in fist-cycle order.
pub fn builtin_presets() -> Vec<BrushPreset> {
    use Composite::*;
    use LineCap::*;
    vec![
        preset("pen",         Color::BLACK,                  5.0,  Round, &[],          1.0,  SourceOver),
        preset("marker",      Color::rgb(0x19, 0x76, 0xd2), 12.0,  Round, &[],          0.9,  SourceOver),
        preset("highlighter", Color::rgb(0xff, 0xeb, 0x3b), 22.0,  Butt,  &[],          0.35, Multiply),
        preset("dashed",      Color::BLACK,                  5.0,  Butt,  &[12.0, 8.0], 1.0,  SourceOver),
        preset("dotted",      Color::BLACK,                  6.0,  Round, &[2.0, 6.0],  1.0,  SourceOver),
        preset("eraser",      Color::WHITE,                 24.0,  Round, &[],          1.0,  DestinationOut),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// BrushState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct BrushState {
    presets:     Vec<BrushPreset>,
    active:      usize,
    current:     BrushStyle,
    min_width:   f32,
    max_width:   f32,
    sensitivity: f32,
}

impl BrushState {
    /// Built-in presets, starting on `cfg.initial_preset`.
    pub fn new(cfg: &BrushConfig) -> Result<Self> {
        Self::with_presets(builtin_presets(), cfg)
    }

    pub fn with_presets(presets: Vec<BrushPreset>, cfg: &BrushConfig) -> Result<Self> {
        let active = presets
            .iter()
            .position(|p| p.name == cfg.initial_preset)
            .ok_or_else(|| Error::UnknownPreset(cfg.initial_preset.clone()))?;
        let current = presets[active].style.clone();
        Ok(BrushState {
            presets,
            active,
            current,
            min_width:   cfg.min_width,
            max_width:   cfg.max_width,
            sensitivity: cfg.drag_sensitivity,
        })
    }

    pub fn current(&self) -> &BrushStyle { &self.current }
    pub fn presets(&self) -> &[BrushPreset] { &self.presets }
    pub fn active_index(&self) -> usize { self.active }
    pub fn active_name(&self) -> &'static str { self.presets[self.active].name }

    /// Switch to the named preset, replacing the whole current style.
    pub fn apply_preset(&mut self, name: &str) -> Result<()> {
        let idx = self
            .presets
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))?;
        self.apply_index(idx);
        Ok(())
    }

    fn apply_index(&mut self, idx: usize) {
        self.active = idx;
        self.current = self.presets[idx].style.clone();
        info!(preset = self.active_name(), "brush preset applied");
    }

    /// Advance to the next preset, wrapping around.  Returns its name.
    pub fn cycle(&mut self) -> &'static str {
        let next = (self.active + 1) % self.presets.len();
        self.apply_index(next);
        self.active_name()
    }

    /// Resize from a modifier drag: `width + delta_y * sensitivity`, clamped.
    pub fn apply_drag(&mut self, delta_y: f32) -> f32 {
        let width = self.current.width + delta_y * self.sensitivity;
        self.set_width(width);
        debug!(width = self.current.width, delta_y, "brush width dragged");
        self.current.width
    }

    // ── manual edits, remembered on the active preset ─────────────────────

    pub fn set_width(&mut self, width: f32) {
        let width = if width.is_nan() { self.current.width } else { width };
        let width = width.clamp(self.min_width, self.max_width);
        self.edit(|s| s.width = width);
    }

    pub fn set_color(&mut self, color: Color) {
        self.edit(|s| s.color = color);
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        let alpha = if alpha.is_nan() { self.current.alpha } else { alpha.clamp(0.0, 1.0) };
        self.edit(|s| s.alpha = alpha);
    }

    pub fn set_cap(&mut self, cap: LineCap) {
        self.edit(|s| s.cap = cap);
    }

    /// Negative or non-finite lengths are dropped and tiny ones raised to
    /// [`MIN_DASH`]; an all-zero pattern becomes solid.
    pub fn set_dash(&mut self, dash: Vec<f32>) {
        let mut dash: Vec<f32> = dash
            .into_iter()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| if d > 0.0 { d.max(MIN_DASH) } else { d })
            .collect();
        if dash.iter().all(|&d| d == 0.0) {
            dash.clear();
        }
        self.edit(|s| s.dash = dash);
    }

    fn edit(&mut self, f: impl FnOnce(&mut BrushStyle)) {
        f(&mut self.current);
        self.presets[self.active].style = self.current.clone();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
