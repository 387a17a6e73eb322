//! The single owner of all gesture, brush, and document state.
//!
//! [`Engine`] is driven one [`Command`] at a time.  Detector frames and UI
//! edits are both commands, so funnelling them through one
//! [`CommandQueue`] keeps them on a single timeline: a preset click can
//! land between two frames, never inside one.
//!
//! Rendering is push-based through [`RenderSink`]; the overlay pointer is
//! pulled as an [`OverlaySnapshot`] copy.

use std::sync::mpsc::{self, Receiver, Sender, TryIter};

use tracing::{debug, info, warn};

use crate::brush::{BrushState, BrushStyle, Color, LineCap};
use crate::config::EngineConfig;
use crate::geometry::{CanvasTransform, Frame, Hand, HandObservation, HandRole, Point};
use crate::gesture::{GestureEvent, HandTracker};
use crate::history::History;
use crate::stroke::{Segment, StrokeBuilder};
use crate::Result;

// ════════════════════════════════════════════════════════════════════════════
// RenderSink: the rendering collaborator
// ════════════════════════════════════════════════════════════════════════════

/// Receives document changes as they happen.
pub trait RenderSink {
    /// A segment was appended; paint it on top of what is there.
    fn segment_appended(&mut self, segment: &Segment);

    /// The document is empty; wipe the surface.
    fn surface_cleared(&mut self);

    /// Segments were removed; redraw from scratch.
    fn repaint(&mut self, segments: &[Segment]) {
        self.surface_cleared();
        for s in segments {
            self.segment_appended(s);
        }
    }
}

/// Discards all render notifications (headless use, tests).
pub struct NullSink;

impl RenderSink for NullSink {
    fn segment_appended(&mut self, _segment: &Segment) {}
    fn surface_cleared(&mut self) {}
}

// ════════════════════════════════════════════════════════════════════════════
// Command / CommandQueue
// ════════════════════════════════════════════════════════════════════════════

/// Everything that can change engine state.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// One detector callback.
    Frame(Frame),
    Undo,
    Redo,
    Clear,
    ApplyPreset(String),
    CyclePreset,
    SetColor(Color),
    SetWidth(f32),
    SetAlpha(f32),
    SetCap(LineCap),
    SetDash(Vec<f32>),
}

/// FIFO of commands from any number of producers, drained by the engine's
/// owner.
pub struct CommandQueue {
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        CommandQueue { tx, rx }
    }

    /// A producer handle; clone freely across threads.
    pub fn sender(&self) -> Sender<Command> {
        self.tx.clone()
    }

    /// Commands queued so far, in arrival order, without blocking.
    pub fn pending(&self) -> TryIter<'_, Command> {
        self.rx.try_iter()
    }

    /// Dispatch every queued command.  Returns how many ran.
    pub fn drain_into(&self, engine: &mut Engine, sink: &mut dyn RenderSink) -> usize {
        let mut n = 0;
        for cmd in self.pending() {
            engine.dispatch(cmd, sink);
            n += 1;
        }
        n
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// OverlaySnapshot
// ════════════════════════════════════════════════════════════════════════════

/// What the pointer overlay needs, copied out after each command.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlaySnapshot {
    /// Drawing hand index tip in canvas space, if visible.
    pub pointer: Option<Point>,
    pub style:   BrushStyle,
    pub preset:  &'static str,
    pub drawing: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Engine
// ════════════════════════════════════════════════════════════════════════════

pub struct Engine {
    canvas:   CanvasTransform,
    dominant: Hand,
    drawing:  HandTracker,
    modifier: HandTracker,
    brush:    BrushState,
    builder:  StrokeBuilder,
    history:  History,
    events:   Vec<GestureEvent>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_history(config, History::new())
    }

    /// Start from an existing (e.g. loaded) document.
    pub fn with_history(config: EngineConfig, history: History) -> Result<Self> {
        config.validate()?;
        Ok(Engine {
            canvas:   config.canvas.transform(),
            dominant: config.hands.dominant,
            drawing:  HandTracker::new(HandRole::Drawing, &config),
            modifier: HandTracker::new(HandRole::Modifier, &config),
            brush:    BrushState::new(&config.brush)?,
            builder:  StrokeBuilder::new(),
            history,
            events:   Vec::new(),
        })
    }

    pub fn history(&self) -> &History { &self.history }
    pub fn brush(&self) -> &BrushState { &self.brush }

    /// Gesture events produced by the most recent frame.
    pub fn last_events(&self) -> &[GestureEvent] { &self.events }

    pub fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            pointer: self.drawing.pointer(),
            style:   self.brush.current().clone(),
            preset:  self.brush.active_name(),
            drawing: self.builder.is_active(),
        }
    }

    // ── command dispatch ──────────────────────────────────────────────────

    pub fn dispatch(&mut self, cmd: Command, sink: &mut dyn RenderSink) {
        match cmd {
            Command::Frame(frame) => { self.handle_frame(&frame, sink); }
            Command::Undo => {
                if self.history.undo().is_some() {
                    sink.repaint(self.history.segments());
                }
            }
            Command::Redo => {
                if let Some(restored) = self.history.redo() {
                    for s in restored {
                        sink.segment_appended(s);
                    }
                }
            }
            Command::Clear => {
                self.history.clear();
                sink.surface_cleared();
            }
            Command::ApplyPreset(name) => {
                if let Err(e) = self.brush.apply_preset(&name) {
                    warn!(error = %e, "preset not applied");
                }
            }
            Command::CyclePreset  => { self.brush.cycle(); }
            Command::SetColor(c)  => self.brush.set_color(c),
            Command::SetWidth(w)  => self.brush.set_width(w),
            Command::SetAlpha(a)  => self.brush.set_alpha(a),
            Command::SetCap(cap)  => self.brush.set_cap(cap),
            Command::SetDash(d)   => self.brush.set_dash(d),
        }
    }

    /// Run one detector frame through smoothing, classification, and the
    /// stroke/brush/history updates it triggers.  Returns the gesture
    /// events it produced.
    pub fn handle_frame(&mut self, frame: &Frame, sink: &mut dyn RenderSink) -> &[GestureEvent] {
        let (drawing_obs, modifier_obs) = self.assign_roles(frame);

        let mut events = std::mem::take(&mut self.events);
        events.clear();

        match drawing_obs {
            Some(obs) => self.drawing.observe(obs, &self.canvas, &mut events),
            None      => self.drawing.lose(&mut events),
        }
        let drawing_end = events.len();
        match modifier_obs {
            Some(obs) => self.modifier.observe(obs, &self.canvas, &mut events),
            None      => self.modifier.lose(&mut events),
        }

        for (i, event) in events.iter().enumerate() {
            let role = if i < drawing_end { HandRole::Drawing } else { HandRole::Modifier };
            self.apply(role, event, sink);
        }

        self.events = events;
        &self.events
    }

    /// First observation per role wins; at most two hands are looked at.
    fn assign_roles<'f>(
        &self,
        frame: &'f Frame,
    ) -> (Option<&'f HandObservation>, Option<&'f HandObservation>) {
        let mut drawing  = None;
        let mut modifier = None;
        for obs in frame.hands.iter().take(2) {
            let slot = match obs.label.physical_hand().role(self.dominant) {
                HandRole::Drawing  => &mut drawing,
                HandRole::Modifier => &mut modifier,
            };
            if slot.is_some() {
                debug!(label = ?obs.label, "duplicate hand for role, ignored");
            } else {
                *slot = Some(obs);
            }
        }
        (drawing, modifier)
    }

    fn apply(&mut self, role: HandRole, event: &GestureEvent, sink: &mut dyn RenderSink) {
        match (role, event) {
            (HandRole::Drawing, GestureEvent::PinchStart { at }) => {
                self.builder.begin(*at);
                self.history.begin_stroke();
            }
            (HandRole::Drawing, GestureEvent::PinchMove { from, to }) => {
                if let Some(seg) = self.builder.extend(*from, *to, self.brush.current()) {
                    sink.segment_appended(self.history.push_segment(seg));
                }
            }
            (HandRole::Drawing, GestureEvent::PinchEnd) => {
                self.builder.finish();
                if let Some(n) = self.history.end_stroke() {
                    debug!(segments = n, strokes = self.history.undo_depth(), "stroke recorded");
                }
            }
            (HandRole::Modifier, GestureEvent::PinchDragDelta { delta_y }) => {
                self.brush.apply_drag(*delta_y);
            }
            (HandRole::Modifier, GestureEvent::FistCycle) => {
                let name = self.brush.cycle();
                info!(preset = name, "fist cycled brush");
            }
            (role, event) => {
                warn!(?role, ?event, "gesture event for the wrong hand role, ignored");
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{DetectorLabel, FINGER_JOINTS, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP};

    /// Records every notification for inspection.
    #[derive(Default)]
    struct Recorder {
        appended: usize,
        cleared:  usize,
        repaints: usize,
        surface:  Vec<Segment>,
    }

    impl RenderSink for Recorder {
        fn segment_appended(&mut self, segment: &Segment) {
            self.appended += 1;
            self.surface.push(segment.clone());
        }
        fn surface_cleared(&mut self) {
            self.cleared += 1;
            self.surface.clear();
        }
        fn repaint(&mut self, segments: &[Segment]) {
            self.repaints += 1;
            self.surface = segments.to_vec();
        }
    }

    fn obs(label: DetectorLabel, x: f32, y: f32, pinch: f32) -> HandObservation {
        let mut lm = [Point::new(x, y); LANDMARK_COUNT];
        for &(tip, pip) in FINGER_JOINTS.iter() {
            lm[tip] = Point::new(x, y - 0.1);
            lm[pip] = Point::new(x, y);
        }
        lm[INDEX_TIP] = Point::new(x, y);
        lm[THUMB_TIP] = Point::new(x + pinch, y);
        HandObservation::new(lm, label)
    }

    fn draw(x: f32, pinch: f32) -> Command {
        Command::Frame(Frame::new(vec![obs(DetectorLabel::Left, x, 0.5, pinch)]))
    }

    fn engine() -> Engine {
        let mut cfg = EngineConfig::default();
        cfg.smoothing.keep = 0.0;
        Engine::new(cfg).unwrap()
    }

    /// Pen down, `moves` moves, pen up.
    fn stroke(e: &mut Engine, sink: &mut dyn RenderSink, moves: usize) {
        e.dispatch(draw(0.5, 0.01), sink);
        e.dispatch(draw(0.5, 0.01), sink);
        for i in 0..moves {
            e.dispatch(draw(0.5 - 0.01 * (i + 1) as f32, 0.01), sink);
        }
        e.dispatch(draw(0.3, 0.2), sink);
        e.dispatch(draw(0.3, 0.2), sink);
    }

    #[test]
    fn stroke_appends_and_notifies() {
        let mut e = engine();
        let mut r = Recorder::default();
        stroke(&mut e, &mut r, 4);
        assert_eq!(e.history().segments().len(), 4);
        assert_eq!(e.history().undo_depth(), 1);
        assert_eq!(r.appended, 4);
        assert_eq!(r.surface, e.history().segments());
    }

    #[test]
    fn undo_repaints_and_redo_appends() {
        let mut e = engine();
        let mut r = Recorder::default();
        stroke(&mut e, &mut r, 2);
        stroke(&mut e, &mut r, 3);
        e.dispatch(Command::Undo, &mut r);
        assert_eq!(r.repaints, 1);
        assert_eq!(r.surface.len(), 2);
        e.dispatch(Command::Redo, &mut r);
        assert_eq!(r.surface, e.history().segments());
        assert_eq!(r.surface.len(), 5);
    }

    #[test]
    fn noop_undo_does_not_repaint() {
        let mut e = engine();
        let mut r = Recorder::default();
        e.dispatch(Command::Undo, &mut r);
        e.dispatch(Command::Redo, &mut r);
        assert_eq!(r.repaints, 0);
        assert_eq!(r.appended, 0);
    }

    #[test]
    fn clear_notifies_sink() {
        let mut e = engine();
        let mut r = Recorder::default();
        stroke(&mut e, &mut r, 2);
        e.dispatch(Command::Clear, &mut r);
        assert_eq!(r.cleared, 1);
        assert!(r.surface.is_empty());
        assert!(e.history().segments().is_empty());
    }

    #[test]
    fn segments_keep_style_at_creation() {
        let mut e = engine();
        let mut sink = NullSink;
        stroke(&mut e, &mut sink, 1);
        e.dispatch(Command::SetWidth(30.0), &mut sink);
        stroke(&mut e, &mut sink, 1);
        let widths: Vec<f32> = e.history().segments().iter().map(|s| s.style.width).collect();
        assert_eq!(widths, vec![5.0, 30.0]);
    }

    #[test]
    fn hand_loss_closes_stroke() {
        let mut e = engine();
        let mut sink = NullSink;
        e.dispatch(draw(0.5, 0.01), &mut sink);
        e.dispatch(draw(0.5, 0.01), &mut sink);
        e.dispatch(draw(0.4, 0.01), &mut sink);
        assert!(e.snapshot().drawing);

        e.dispatch(Command::Frame(Frame::default()), &mut sink);
        assert_eq!(e.last_events(), &[GestureEvent::PinchEnd]);
        assert!(!e.snapshot().drawing);
        assert_eq!(e.snapshot().pointer, None);
        assert_eq!(e.history().undo_depth(), 1);
        assert!(!e.history().is_stroke_open());
    }

    #[test]
    fn modifier_hand_never_draws() {
        let mut e = engine();
        let mut sink = NullSink;
        for x in [0.5, 0.5, 0.4, 0.3] {
            let f = Frame::new(vec![obs(DetectorLabel::Right, x, 0.5, 0.01)]);
            e.dispatch(Command::Frame(f), &mut sink);
        }
        assert!(e.history().segments().is_empty());
        assert_eq!(e.snapshot().pointer, None);
    }

    #[test]
    fn modifier_drag_resizes_brush() {
        let mut e = engine();
        let mut sink = NullSink;
        for y in [0.5, 0.5, 0.4] {
            let f = Frame::new(vec![obs(DetectorLabel::Right, 0.5, y, 0.01)]);
            e.dispatch(Command::Frame(f), &mut sink);
        }
        assert!((e.brush().current().width - 5.5).abs() < 1e-4);
    }

    #[test]
    fn left_handed_config_swaps_roles() {
        let mut cfg = EngineConfig::default();
        cfg.smoothing.keep = 0.0;
        cfg.hands.dominant = Hand::Left;
        let mut e = Engine::new(cfg).unwrap();
        let mut sink = NullSink;
        for x in [0.5, 0.5, 0.4] {
            let f = Frame::new(vec![obs(DetectorLabel::Right, x, 0.5, 0.01)]);
            e.dispatch(Command::Frame(f), &mut sink);
        }
        assert_eq!(e.history().segments().len(), 1);
    }

    #[test]
    fn duplicate_role_uses_first_observation() {
        let mut e = engine();
        let mut sink = NullSink;
        let f = Frame::new(vec![
            obs(DetectorLabel::Left, 0.25, 0.5, 0.3),
            obs(DetectorLabel::Left, 0.75, 0.5, 0.3),
        ]);
        e.dispatch(Command::Frame(f), &mut sink);
        assert_eq!(e.snapshot().pointer, Some(Point::new(480.0, 240.0)));
    }

    #[test]
    fn unknown_preset_command_is_ignored() {
        let mut e = engine();
        e.dispatch(Command::ApplyPreset("crayon".into()), &mut NullSink);
        assert_eq!(e.snapshot().preset, "pen");
        e.dispatch(Command::ApplyPreset("eraser".into()), &mut NullSink);
        assert!(e.snapshot().style.is_destructive());
    }

    #[test]
    fn queue_preserves_arrival_order() {
        let mut e = engine();
        let q = CommandQueue::new();
        let tx = q.sender();
        tx.send(Command::SetWidth(20.0)).unwrap();
        tx.send(Command::CyclePreset).unwrap();
        tx.send(Command::SetWidth(40.0)).unwrap();
        let ran = q.drain_into(&mut e, &mut NullSink);
        assert_eq!(ran, 3);
        assert_eq!(e.snapshot().preset, "marker");
        assert_eq!(e.brush().current().width, 40.0);
        e.dispatch(Command::ApplyPreset("pen".into()), &mut NullSink);
        assert_eq!(e.brush().current().width, 20.0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.pinch.off_threshold = 0.01;
        assert!(Engine::new(cfg).is_err());
    }
}
