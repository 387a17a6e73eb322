//! First-order exponential moving average over landmark positions.

use crate::geometry::Point;

/// Blend `raw` into `previous`, keeping `keep` of the old value.
///
/// With no previous value the raw sample is returned unchanged (cold start).
pub fn smooth(previous: Option<Point>, raw: Point, keep: f32) -> Point {
    match previous {
        None       => raw,
        Some(prev) => {
            let apply = 1.0 - keep;
            Point::new(
                prev.x * keep + raw.x * apply,
                prev.y * keep + raw.y * apply,
            )
        }
    }
}

/// [`smooth`] with its own memory of the last output.
#[derive(Clone, Debug)]
pub struct EmaFilter {
    keep:     f32,
    previous: Option<Point>,
}

impl EmaFilter {
    pub fn new(keep: f32) -> Self {
        EmaFilter { keep, previous: None }
    }

    /// Feed one raw sample and return the smoothed value.
    pub fn update(&mut self, raw: Point) -> Point {
        let out = smooth(self.previous, raw, self.keep);
        self.previous = Some(out);
        out
    }

    /// Forget history; the next sample passes through unsmoothed.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn previous(&self) -> Option<Point> { self.previous }
}
