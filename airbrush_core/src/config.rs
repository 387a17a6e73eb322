//! Tunable constants for the gesture engine.
//!
//! Every section has serde defaults, so a TOML file only needs the keys it
//! changes:
//!
//! ```toml
//! [pinch]
//! debounce_frames = 3
//!
//! [hands]
//! dominant = "left"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::brush::builtin_presets;
use crate::geometry::{CanvasTransform, Hand};
use crate::{Error, Result};

// ════════════════════════════════════════════════════════════════════════════
// EngineConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub smoothing: SmoothingConfig,
    pub pinch:     PinchConfig,
    pub fist:      FistConfig,
    pub brush:     BrushConfig,
    pub canvas:    CanvasConfig,
    pub hands:     HandsConfig,
}

/// EMA weight on the previous smoothed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub keep: f32,
}

/// Pinch hysteresis (normalized thumb–index distance) and debounce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    /// Close when distance drops below this.
    pub on_threshold:    f32,
    /// Open when distance reaches this.
    pub off_threshold:   f32,
    /// Consecutive qualifying frames before a transition commits.
    pub debounce_frames: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FistConfig {
    /// Consecutive fist frames needed before opening counts as a cycle.
    pub dwell_frames: u32,
    /// Folded fingers (of 4) that make a fist.
    pub min_folded:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Width change per unit of normalized vertical drag.
    pub drag_sensitivity: f32,
    pub min_width:        f32,
    pub max_width:        f32,
    pub initial_preset:   String,
}

/// Logical canvas size in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width:  u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandsConfig {
    /// The physical hand that draws; the other one is the modifier.
    pub dominant: Hand,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { keep: 0.7 }
    }
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            on_threshold:    0.05,
            off_threshold:   0.07,
            debounce_frames: 2,
        }
    }
}

impl Default for FistConfig {
    fn default() -> Self {
        Self { dwell_frames: 2, min_folded: 3 }
    }
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 5.0,
            min_width:        1.0,
            max_width:        100.0,
            initial_preset:   "pen".to_string(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self { width: 640, height: 480 }
    }
}

impl Default for HandsConfig {
    fn default() -> Self {
        Self { dominant: Hand::Right }
    }
}

impl CanvasConfig {
    pub fn transform(&self) -> CanvasTransform {
        CanvasTransform::new(self.width as f32, self.height as f32)
    }
}

impl EngineConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.smoothing.keep) {
            return Err(Error::Config(format!(
                "smoothing.keep must be in [0, 1], got {}", self.smoothing.keep
            )));
        }

        let p = &self.pinch;
        if !(p.on_threshold > 0.0 && p.on_threshold < p.off_threshold) {
            return Err(Error::Config(format!(
                "pinch thresholds must satisfy 0 < on < off, got on={} off={}",
                p.on_threshold, p.off_threshold
            )));
        }
        if p.debounce_frames == 0 {
            return Err(Error::Config("pinch.debounce_frames must be >= 1".to_string()));
        }

        if self.fist.dwell_frames == 0 {
            return Err(Error::Config("fist.dwell_frames must be >= 1".to_string()));
        }
        if !(1..=4).contains(&self.fist.min_folded) {
            return Err(Error::Config(format!(
                "fist.min_folded must be in 1..=4, got {}", self.fist.min_folded
            )));
        }

        let b = &self.brush;
        if !(b.min_width > 0.0 && b.min_width <= b.max_width) {
            return Err(Error::Config(format!(
                "brush widths must satisfy 0 < min <= max, got min={} max={}",
                b.min_width, b.max_width
            )));
        }
        if !b.drag_sensitivity.is_finite() {
            return Err(Error::Config("brush.drag_sensitivity must be finite".to_string()));
        }
        if !builtin_presets().iter().any(|p| p.name == b.initial_preset) {
            return Err(Error::UnknownPreset(b.initial_preset.clone()));
        }

        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(Error::Config(format!(
                "canvas must be non-empty, got {}x{}", self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.pinch.on_threshold, 0.05);
        assert_eq!(cfg.pinch.off_threshold, 0.07);
        assert_eq!(cfg.brush.drag_sensitivity, 5.0);
        assert_eq!(cfg.hands.dominant, Hand::Right);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut cfg = EngineConfig::default();
        cfg.pinch.on_threshold = 0.08;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
        cfg.pinch.on_threshold = 0.07;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_keep_out_of_range() {
        let mut cfg = EngineConfig::default();
        cfg.smoothing.keep = 1.2;
        assert!(cfg.validate().is_err());
        cfg.smoothing.keep = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unknown_initial_preset() {
        let mut cfg = EngineConfig::default();
        cfg.brush.initial_preset = "crayon".to_string();
        assert!(matches!(cfg.validate(), Err(Error::UnknownPreset(name)) if name == "crayon"));
    }

    #[test]
    fn rejects_zero_debounce() {
        let mut cfg = EngineConfig::default();
        cfg.pinch.debounce_frames = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = EngineConfig::from_toml(
            "[pinch]\ndebounce_frames = 3\n\n[hands]\ndominant = \"left\"\n",
        ).unwrap();
        assert_eq!(cfg.pinch.debounce_frames, 3);
        assert_eq!(cfg.pinch.on_threshold, 0.05);
        assert_eq!(cfg.hands.dominant, Hand::Left);
        assert_eq!(cfg.canvas.width, 640);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(EngineConfig::from_toml("[pinch\n"), Err(Error::Toml(_))));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("airbrush.toml");
        let mut cfg = EngineConfig::default();
        cfg.smoothing.keep = 0.6;
        cfg.canvas.width = 1280;
        cfg.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }
}
