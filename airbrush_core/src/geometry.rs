//! Points, hand observations, and the detector → canvas mapping.
//!
//! The detector works in normalized image space: `x` and `y` in `[0, 1]`
//! with the origin at the top-left of the (unmirrored) camera image.  The
//! canvas is mirrored horizontally so the drawing follows the user's hand
//! like a mirror would.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks the detector reports per hand.
pub const LANDMARK_COUNT: usize = 21;

pub const THUMB_TIP:  usize = 4;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP:   usize = 14;
pub const RING_TIP:   usize = 16;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_TIP:  usize = 20;

/// `(tip, pip)` pairs for the four non-thumb fingers, index first.
pub const FINGER_JOINTS: [(usize, usize); 4] = [
    (INDEX_TIP,  INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP,   RING_PIP),
    (PINKY_TIP,  PINKY_PIP),
];

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// A 2-D point, either in normalized detector space or in canvas pixels
/// depending on context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

/// The left/right label attached by the detector.
///
/// The detector labels hands as they appear in the raw front-camera image,
/// which is the mirror image of the user: its `Left` is the user's right hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorLabel {
    Left,
    Right,
}

/// One of the user's physical hands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

/// What a tracked hand is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandRole {
    /// Pinch to draw.
    Drawing,
    /// Pinch-drag to resize the brush, fist to cycle presets.
    Modifier,
}

impl DetectorLabel {
    /// The user's physical hand behind this label (front-camera mirroring).
    pub const fn physical_hand(self) -> Hand {
        match self {
            DetectorLabel::Left  => Hand::Right,
            DetectorLabel::Right => Hand::Left,
        }
    }
}

impl Hand {
    /// The label the detector gives this hand.
    pub const fn detector_label(self) -> DetectorLabel {
        match self {
            Hand::Right => DetectorLabel::Left,
            Hand::Left  => DetectorLabel::Right,
        }
    }

    pub const fn other(self) -> Hand {
        match self {
            Hand::Left  => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }

    /// Role of this hand when `dominant` is the drawing hand.
    pub fn role(self, dominant: Hand) -> HandRole {
        if self == dominant { HandRole::Drawing } else { HandRole::Modifier }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation / Frame
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand: 21 normalized landmarks plus the detector's label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub landmarks: [Point; LANDMARK_COUNT],
    pub label:     DetectorLabel,
}

impl HandObservation {
    pub fn new(landmarks: [Point; LANDMARK_COUNT], label: DetectorLabel) -> Self {
        HandObservation { landmarks, label }
    }

    pub fn index_tip(&self) -> Point { self.landmarks[INDEX_TIP] }
    pub fn thumb_tip(&self) -> Point { self.landmarks[THUMB_TIP] }
}

/// Everything the detector reported for one video frame (0–2 hands).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub hands: Vec<HandObservation>,
}

impl Frame {
    pub fn new(hands: Vec<HandObservation>) -> Self {
        Frame { hands }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CanvasTransform
// ════════════════════════════════════════════════════════════════════════════

/// Maps normalized detector coordinates onto the mirrored logical canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasTransform {
    pub width:  f32,
    pub height: f32,
}

impl CanvasTransform {
    pub fn new(width: f32, height: f32) -> Self {
        CanvasTransform { width, height }
    }

    /// `x' = width - x*width`, `y' = y*height`.
    pub fn to_canvas(&self, p: Point) -> Point {
        Point::new(self.width - p.x * self.width, p.y * self.height)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
