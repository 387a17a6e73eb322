//! Gesture recognition: per-hand state machines over smoothed landmarks.
//!
//! Each tracked hand owns a [`HandTracker`].  Every frame the tracker is
//! either fed an observation ([`HandTracker::observe`]) or told the hand is
//! gone ([`HandTracker::lose`]); it appends the [`GestureEvent`]s that frame
//! produced.
//!
//! # Algorithm
//!
//! * **Pinch** ([`PinchMachine`]): distance between smoothed thumb and index
//!   tips, with hysteresis (close below `on`, open at or above `off`) and a
//!   debounce of N consecutive qualifying frames.
//! * **Fist** ([`FistMachine`], modifier only): a finger is folded when its
//!   tip is below its PIP joint; enough folded fingers make a fist.  Opening
//!   after at least `dwell` fist frames fires one cycle.
//! * **Width drag** ([`WidthDrag`], modifier only): the index-tip y at pinch
//!   start is the anchor; each pinched frame reports `anchor - y`, cumulative
//!   from the anchor.
//!
//! Pinch and fist run side by side on the modifier hand, pinch first.

use tracing::debug;

use crate::config::{EngineConfig, FistConfig, PinchConfig};
use crate::geometry::{CanvasTransform, HandObservation, HandRole, Point, FINGER_JOINTS};
use crate::smoothing::EmaFilter;

// ════════════════════════════════════════════════════════════════════════════
// GestureEvent
// ════════════════════════════════════════════════════════════════════════════

/// A discrete gesture produced by one frame of tracking.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureEvent {
    /// Drawing hand closed its pinch at `at` (canvas space).
    PinchStart { at: Point },
    /// Drawing hand moved while pinched (canvas space).
    PinchMove { from: Point, to: Point },
    /// Drawing hand released its pinch, or left the frame.
    PinchEnd,
    /// Modifier hand dragged while pinched; normalized, positive = upward.
    PinchDragDelta { delta_y: f32 },
    /// Modifier hand opened after holding a fist.
    FistCycle,
}

// ════════════════════════════════════════════════════════════════════════════
// PinchMachine
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchState { Open, Closed }

/// What one distance sample did to the pinch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchStep {
    /// Open and staying open (possibly counting toward a close).
    Idle,
    /// Committed Open → Closed this frame.
    Started,
    /// Closed, distance still inside the closed band.
    Held,
    /// Closed, distance past `off` but not yet for long enough.
    Releasing,
    /// Committed Closed → Open this frame.
    Ended,
}

/// Hysteresis + debounce over the thumb–index distance.
#[derive(Clone, Debug)]
pub struct PinchMachine {
    on:       f32,
    off:      f32,
    debounce: u32,
    state:    PinchState,
    streak:   u32,
}

impl PinchMachine {
    pub fn new(cfg: &PinchConfig) -> Self {
        PinchMachine {
            on:       cfg.on_threshold,
            off:      cfg.off_threshold,
            debounce: cfg.debounce_frames.max(1),
            state:    PinchState::Open,
            streak:   0,
        }
    }

    pub fn state(&self) -> PinchState { self.state }
    pub fn is_closed(&self) -> bool { self.state == PinchState::Closed }

    /// Feed one normalized distance.
    pub fn update(&mut self, distance: f32) -> PinchStep {
        let wants_flip = match self.state {
            PinchState::Open   => distance < self.on,
            PinchState::Closed => distance >= self.off,
        };

        if !wants_flip {
            self.streak = 0;
            return match self.state {
                PinchState::Open   => PinchStep::Idle,
                PinchState::Closed => PinchStep::Held,
            };
        }

        self.streak += 1;
        if self.streak < self.debounce {
            return match self.state {
                PinchState::Open   => PinchStep::Idle,
                PinchState::Closed => PinchStep::Releasing,
            };
        }

        self.streak = 0;
        match self.state {
            PinchState::Open => {
                self.state = PinchState::Closed;
                PinchStep::Started
            }
            PinchState::Closed => {
                self.state = PinchState::Open;
                PinchStep::Ended
            }
        }
    }

    /// Drop straight to `Open` without debounce.  Returns whether a pinch
    /// was active.
    pub fn force_open(&mut self) -> bool {
        let was_closed = self.is_closed();
        self.state = PinchState::Open;
        self.streak = 0;
        was_closed
    }
}

/// Thumb-tip to index-tip distance.
pub fn pinch_distance(thumb: Point, index: Point) -> f32 {
    thumb.distance(index)
}

// ════════════════════════════════════════════════════════════════════════════
// FistMachine
// ════════════════════════════════════════════════════════════════════════════

/// True when at least `min_folded` fingers have their tip below the PIP
/// joint (larger y, detector origin top-left).  Uses raw landmarks.
pub fn is_fist(obs: &HandObservation, min_folded: usize) -> bool {
    let folded = FINGER_JOINTS
        .iter()
        .filter(|&&(tip, pip)| obs.landmarks[tip].y > obs.landmarks[pip].y)
        .count();
    folded >= min_folded
}

/// Close/open detector with a minimum dwell before the open counts.
#[derive(Clone, Debug)]
pub struct FistMachine {
    dwell:        u32,
    closed:       bool,
    closed_count: u32,
}

impl FistMachine {
    pub fn new(cfg: &FistConfig) -> Self {
        FistMachine { dwell: cfg.dwell_frames, closed: false, closed_count: 0 }
    }

    pub fn is_closed(&self) -> bool { self.closed }
    pub fn closed_count(&self) -> u32 { self.closed_count }

    /// Feed one frame's fist classification; returns `true` when a cycle
    /// fires.
    pub fn update(&mut self, fist: bool) -> bool {
        match (self.closed, fist) {
            (false, true) => {
                self.closed = true;
                self.closed_count = 1;
                false
            }
            (false, false) => false,
            (true, true) => {
                self.closed_count += 1;
                false
            }
            (true, false) => {
                let fired = self.closed_count >= self.dwell;
                if !fired {
                    debug!(frames = self.closed_count, "fist too short, ignored");
                }
                self.reset();
                fired
            }
        }
    }

    pub fn reset(&mut self) {
        self.closed = false;
        self.closed_count = 0;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// WidthDrag
// ════════════════════════════════════════════════════════════════════════════

/// Anchor for drag-to-resize, held for the duration of one pinch.
#[derive(Clone, Debug, Default)]
pub struct WidthDrag {
    anchor_y: Option<f32>,
}

impl WidthDrag {
    pub fn begin(&mut self, y: f32) {
        self.anchor_y = Some(y);
    }

    /// Cumulative `anchor - y`, or `None` outside a pinch.
    pub fn delta(&self, y: f32) -> Option<f32> {
        self.anchor_y.map(|anchor| anchor - y)
    }

    pub fn end(&mut self) {
        self.anchor_y = None;
    }

    pub fn anchor(&self) -> Option<f32> { self.anchor_y }
}

// ════════════════════════════════════════════════════════════════════════════
// HandTracker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
struct ModifierState {
    fist:       FistMachine,
    min_folded: usize,
    drag:       WidthDrag,
}

/// All per-hand tracking state for one role.
#[derive(Clone, Debug)]
pub struct HandTracker {
    role:     HandRole,
    index:    EmaFilter,
    thumb:    EmaFilter,
    pinch:    PinchMachine,
    /// Canvas point of the last pen-down or move, while pinched.
    last:     Option<Point>,
    /// Canvas point of the smoothed index tip, while the hand is visible.
    pointer:  Option<Point>,
    modifier: Option<ModifierState>,
}

impl HandTracker {
    pub fn new(role: HandRole, cfg: &EngineConfig) -> Self {
        let modifier = match role {
            HandRole::Drawing  => None,
            HandRole::Modifier => Some(ModifierState {
                fist:       FistMachine::new(&cfg.fist),
                min_folded: cfg.fist.min_folded,
                drag:       WidthDrag::default(),
            }),
        };
        HandTracker {
            role,
            index:   EmaFilter::new(cfg.smoothing.keep),
            thumb:   EmaFilter::new(cfg.smoothing.keep),
            pinch:   PinchMachine::new(&cfg.pinch),
            last:    None,
            pointer: None,
            modifier,
        }
    }

    pub fn role(&self) -> HandRole { self.role }
    pub fn pointer(&self) -> Option<Point> { self.pointer }
    pub fn is_pinching(&self) -> bool { self.pinch.is_closed() }

    /// Process one observation of this hand.
    pub fn observe(
        &mut self,
        obs:    &HandObservation,
        canvas: &CanvasTransform,
        out:    &mut Vec<GestureEvent>,
    ) {
        let index = self.index.update(obs.index_tip());
        let thumb = self.thumb.update(obs.thumb_tip());
        let point = canvas.to_canvas(index);
        self.pointer = Some(point);

        let step = self.pinch.update(pinch_distance(thumb, index));

        match self.modifier.as_mut() {
            None => match step {
                PinchStep::Started => {
                    debug!(x = point.x, y = point.y, "pinch start");
                    self.last = Some(point);
                    out.push(GestureEvent::PinchStart { at: point });
                }
                PinchStep::Held => {
                    if let Some(from) = self.last.replace(point) {
                        out.push(GestureEvent::PinchMove { from, to: point });
                    }
                }
                PinchStep::Ended => {
                    debug!("pinch end");
                    self.last = None;
                    out.push(GestureEvent::PinchEnd);
                }
                PinchStep::Idle | PinchStep::Releasing => {}
            },
            Some(m) => {
                match step {
                    PinchStep::Started => {
                        debug!(anchor_y = index.y, "width drag start");
                        m.drag.begin(index.y);
                    }
                    PinchStep::Held => {
                        if let Some(delta_y) = m.drag.delta(index.y) {
                            out.push(GestureEvent::PinchDragDelta { delta_y });
                        }
                    }
                    PinchStep::Ended => m.drag.end(),
                    PinchStep::Idle | PinchStep::Releasing => {}
                }

                if m.fist.update(is_fist(obs, m.min_folded)) {
                    debug!("fist cycle");
                    out.push(GestureEvent::FistCycle);
                }
            }
        }
    }

    /// The hand was not detected this frame: reset to baseline at once and
    /// close any open pinch.
    pub fn lose(&mut self, out: &mut Vec<GestureEvent>) {
        let was_pinching = self.pinch.force_open();
        self.index.reset();
        self.thumb.reset();
        self.last = None;
        self.pointer = None;

        match self.modifier.as_mut() {
            None => {
                if was_pinching {
                    debug!(role = ?self.role, "hand lost mid-pinch");
                    out.push(GestureEvent::PinchEnd);
                }
            }
            Some(m) => {
                m.drag.end();
                m.fist.reset();
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
