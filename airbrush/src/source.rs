//! Hand-observation sources: keyboard/mouse simulation and recorded replay.
//!
//! A source runs on its own thread and pushes [`Command::Frame`]s into the
//! engine's command queue.  The engine doesn't know whether frames came from
//! a real detector, the simulator, or a recording.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use airbrush_core::geometry::{FINGER_JOINTS, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP};
use airbrush_core::{Command, Frame, Hand, HandObservation, Point};
use tracing::{debug, warn};

// ════════════════════════════════════════════════════════════════════════════
// HandSource trait: unified interface for sim and replay
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver detector frames into the command queue.
pub trait HandSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<Command>);
}

/// Spawn a hand source on its own thread, feeding `tx`.
pub fn spawn_hand_source<S: HandSource>(source: S, tx: Sender<Command>) -> JoinHandle<()> {
    thread::spawn(move || Box::new(source).run(tx))
}

// ════════════════════════════════════════════════════════════════════════════
// Synthetic landmarks
// ════════════════════════════════════════════════════════════════════════════

/// Thumb–index gap for a synthetic open hand / pinch (normalized).
const OPEN_GAP:   f32 = 0.12;
const PINCH_GAP:  f32 = 0.01;
/// Vertical distance between a fingertip and its PIP joint.
const FINGER_LEN: f32 = 0.06;

/// Build a 21-landmark hand whose index tip sits at `index` (detector space).
pub fn synth_hand(hand: Hand, index: Point, pinched: bool, fist: bool) -> HandObservation {
    let mut lm = [index; LANDMARK_COUNT];
    for (i, &(tip, pip)) in FINGER_JOINTS.iter().enumerate() {
        let x = index.x + 0.03 * i as f32;
        // Folded fingers hang below their PIP joint (larger y).
        let (tip_y, pip_y) = if fist {
            (index.y + FINGER_LEN, index.y)
        } else {
            (index.y, index.y + FINGER_LEN)
        };
        lm[tip] = Point::new(x, tip_y);
        lm[pip] = Point::new(x, pip_y);
    }
    let tip = lm[INDEX_TIP];
    let gap = if pinched { PINCH_GAP } else { OPEN_GAP };
    lm[THUMB_TIP] = Point::new(tip.x - gap, tip.y);
    HandObservation::new(lm, hand.detector_label())
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource: mouse/keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Mouse position on the canvas, `0..=1` on both axes (screen space,
    /// not mirrored).
    Pointer { x: f32, y: f32 },
    DrawPinch(bool),
    ModifierPinch(bool),
    ModifierFist(bool),
    /// Move the drawing hand into or out of the camera's view.
    ToggleDrawingHand,
    /// One video frame elapsed; emit a detector frame.
    Tick,
    Quit,
}

/// Gesture source driven by [`SimInput`] events from the visualizer window.
///
/// The mouse is the drawing hand's index tip; the modifier hand parks on
/// the left edge of the canvas and follows the mouse vertically while its
/// pinch is held.
pub struct SimHandSource {
    pub rx:       Receiver<SimInput>,
    pub dominant: Hand,
}

/// Current pose of both synthetic hands.
#[derive(Clone, Debug)]
pub struct SimHands {
    pub dominant:        Hand,
    pub pointer:         Point,
    pub drawing_visible: bool,
    pub draw_pinch:      bool,
    pub modifier_y:      f32,
    pub modifier_pinch:  bool,
    pub modifier_fist:   bool,
}

impl SimHands {
    pub fn new(dominant: Hand) -> Self {
        SimHands {
            dominant,
            pointer:         Point::new(0.5, 0.5),
            drawing_visible: true,
            draw_pinch:      false,
            modifier_y:      0.5,
            modifier_pinch:  false,
            modifier_fist:   false,
        }
    }

    /// Apply one input.  Returns a frame on `Tick`.
    pub fn apply(&mut self, input: SimInput) -> Option<Frame> {
        match input {
            SimInput::Pointer { x, y } => {
                self.pointer = Point::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
                if self.modifier_pinch {
                    self.modifier_y = self.pointer.y;
                }
            }
            SimInput::DrawPinch(on)     => self.draw_pinch = on,
            SimInput::ModifierPinch(on) => {
                self.modifier_pinch = on;
                if on { self.modifier_y = self.pointer.y; }
            }
            SimInput::ModifierFist(on)  => self.modifier_fist = on,
            SimInput::ToggleDrawingHand => {
                self.drawing_visible = !self.drawing_visible;
                debug!(visible = self.drawing_visible, "sim drawing hand toggled");
            }
            SimInput::Tick => return Some(self.frame()),
            SimInput::Quit => {}
        }
        None
    }

    /// Detector view of the current pose.  Screen x is mirrored back into
    /// camera space.
    pub fn frame(&self) -> Frame {
        let mut hands = Vec::with_capacity(2);
        if self.drawing_visible {
            let index = Point::new(1.0 - self.pointer.x, self.pointer.y);
            hands.push(synth_hand(self.dominant, index, self.draw_pinch, false));
        }
        let index = Point::new(0.9, self.modifier_y);
        hands.push(synth_hand(
            self.dominant.other(),
            index,
            self.modifier_pinch,
            self.modifier_fist,
        ));
        Frame::new(hands)
    }
}

impl HandSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<Command>) {
        let mut hands = SimHands::new(self.dominant);
        for input in self.rx.iter() {
            if input == SimInput::Quit { return; }
            if let Some(frame) = hands.apply(input) {
                if tx.send(Command::Frame(frame)).is_err() { return; }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Recordings: one JSON frame per line
// ════════════════════════════════════════════════════════════════════════════

/// Read a JSON-lines recording.  Blank lines are skipped.
pub fn read_recording(path: &Path) -> anyhow::Result<Vec<Frame>> {
    let reader = BufReader::new(File::open(path)?);
    let mut frames = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let frame: Frame = serde_json::from_str(&line)
            .map_err(|e| anyhow::anyhow!("{}:{}: {}", path.display(), n + 1, e))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Appends frames to a JSON-lines recording.
pub struct FrameRecorder {
    out: BufWriter<File>,
}

impl FrameRecorder {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        Ok(FrameRecorder { out: BufWriter::new(File::create(path)?) })
    }

    pub fn write(&mut self, frame: &Frame) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, frame)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Plays a recording back at a fixed frame interval.
pub struct ReplaySource {
    pub frames:   Vec<Frame>,
    pub interval: Duration,
}

impl HandSource for ReplaySource {
    fn run(self: Box<Self>, tx: Sender<Command>) {
        for frame in self.frames {
            if tx.send(Command::Frame(frame)).is_err() {
                warn!("replay stopped: command queue closed");
                return;
            }
            if !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
