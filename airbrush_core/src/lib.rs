//! # airbrush_core
//!
//! Gesture recognition and stroke management for drawing in the air with a
//! webcam hand tracker.  A landmark detector (external) yields up to two
//! hands per video frame; this crate turns that noisy stream into discrete
//! drawing events and an undoable document of line segments.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hand | Action |
//! |---|---|---|
//! | Pinch (thumb tip to index tip) | Drawing | Pen down; moving while pinched draws segments |
//! | Release pinch | Drawing | Pen up; the segments drawn since pen down become one undoable stroke |
//! | Pinch + vertical drag | Modifier | Grow (drag up) or shrink (drag down) the brush width |
//! | Close fist, then open | Modifier | Cycle to the next brush preset |
//!
//! The Drawing hand is the user's dominant hand (right by default, see
//! [`config::HandsConfig`]).
//!
//! ## Pipeline
//!
//! ```text
//! HandObservation ─▶ smoothing ─▶ gesture ─▶ stroke / brush ─▶ history ─▶ RenderSink
//! ```
//!
//! Everything is driven through [`Engine::dispatch`], one [`Command`] at a
//! time.  Detector frames and UI edits share the same [`CommandQueue`] so a
//! manual edit can never interleave with half a frame.
//!
//! ## Quick start
//!
//! ```rust
//! use airbrush_core::{Command, Engine, EngineConfig, Frame, NullSink};
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! let mut sink = NullSink;
//! engine.dispatch(Command::Frame(Frame::default()), &mut sink);
//! assert!(engine.history().segments().is_empty());
//! ```

pub mod geometry;
pub mod smoothing;
pub mod gesture;
pub mod brush;
pub mod stroke;
pub mod history;
pub mod config;
pub mod engine;

pub use brush::{BrushPreset, BrushState, BrushStyle, Color, Composite, LineCap};
pub use config::EngineConfig;
pub use engine::{Command, CommandQueue, Engine, NullSink, OverlaySnapshot, RenderSink};
pub use geometry::{CanvasTransform, DetectorLabel, Frame, Hand, HandObservation, HandRole, Point};
pub use gesture::GestureEvent;
pub use history::{Document, History, StrokeGroup};
pub use stroke::Segment;

/// Result type alias for fallible core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by configuration, persistence, and name lookups.
///
/// Gesture, stroke, and history operations are total and never return one.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown brush preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid color {0:?}: expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
