//! Segments and the builder that produces them from pinch events.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::brush::BrushStyle;
use crate::geometry::Point;

/// One straight line primitive, created once and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p1:    Point,
    pub p2:    Point,
    pub style: BrushStyle,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.p1.distance(self.p2)
    }
}

/// Turns pen-down / move / pen-up into segments.
///
/// A lone pen-down has no length, so nothing is emitted until the first
/// move.
#[derive(Clone, Debug, Default)]
pub struct StrokeBuilder {
    anchor: Option<Point>,
}

impl StrokeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool { self.anchor.is_some() }

    pub fn begin(&mut self, at: Point) {
        self.anchor = Some(at);
    }

    /// Emit the segment `from → to` painted with a snapshot of `style`.
    ///
    /// A move without a preceding [`begin`](Self::begin) is dropped.
    pub fn extend(&mut self, from: Point, to: Point, style: &BrushStyle) -> Option<Segment> {
        if self.anchor.is_none() {
            warn!(?from, ?to, "pinch move without a pen-down, ignored");
            return None;
        }
        self.anchor = Some(to);
        Some(Segment { p1: from, p2: to, style: style.clone() })
    }

    pub fn finish(&mut self) {
        self.anchor = None;
    }
}
