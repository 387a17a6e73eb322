//! End-to-end scenarios: detector frames in, gesture events and document
//! state out.

use airbrush_core::geometry::{FINGER_JOINTS, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP};
use airbrush_core::{
    Command, DetectorLabel, Engine, EngineConfig, Frame, GestureEvent, HandObservation,
    NullSink, Point,
};

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

const W: f32 = 640.0;

/// Engine with smoothing disabled so raw landmarks are what gets classified.
fn raw_engine() -> Engine {
    let mut cfg = EngineConfig::default();
    cfg.smoothing.keep = 0.0;
    Engine::new(cfg).unwrap()
}

/// An open-fingered hand whose index tip lands on canvas x = `canvas_x`
/// (y = 240) with thumb–index distance `d`.
fn hand_at(label: DetectorLabel, canvas_x: f32, d: f32) -> HandObservation {
    let x = (W - canvas_x) / W;
    let y = 0.5;
    let mut lm = [Point::new(x, y); LANDMARK_COUNT];
    for &(tip, pip) in FINGER_JOINTS.iter() {
        lm[tip] = Point::new(x, y - 0.08);
        lm[pip] = Point::new(x, y);
    }
    lm[INDEX_TIP] = Point::new(x, y);
    lm[THUMB_TIP] = Point::new(x, y + d);
    HandObservation::new(lm, label)
}

/// A closed fist on the modifier side (detector label "Right").
fn fist() -> HandObservation {
    let mut lm = [Point::new(0.5, 0.5); LANDMARK_COUNT];
    for &(tip, pip) in FINGER_JOINTS.iter() {
        lm[tip] = Point::new(0.5, 0.62);
        lm[pip] = Point::new(0.5, 0.55);
    }
    lm[THUMB_TIP] = Point::new(0.7, 0.5);
    HandObservation::new(lm, DetectorLabel::Right)
}

fn open_modifier() -> HandObservation {
    hand_at(DetectorLabel::Right, 100.0, 0.3)
}

fn frame(hands: Vec<HandObservation>) -> Command {
    Command::Frame(Frame::new(hands))
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
}

// ════════════════════════════════════════════════════════════════════════════
// Scenarios
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn hysteresis_scenario_produces_one_segment() {
    let mut engine = raw_engine();
    let distances = [0.10, 0.04, 0.04, 0.03, 0.08, 0.08];
    let mut per_frame: Vec<Vec<GestureEvent>> = Vec::new();

    for (i, &d) in distances.iter().enumerate() {
        let x = 100.0 + i as f32;
        let f = Frame::new(vec![hand_at(DetectorLabel::Left, x, d)]);
        per_frame.push(engine.handle_frame(&f, &mut NullSink).to_vec());
    }

    assert!(per_frame[0].is_empty());
    assert!(per_frame[1].is_empty());
    match per_frame[2].as_slice() {
        [GestureEvent::PinchStart { at }] => assert!(close(*at, Point::new(102.0, 240.0))),
        other => panic!("frame 3: {:?}", other),
    }
    match per_frame[3].as_slice() {
        [GestureEvent::PinchMove { from, to }] => {
            assert!(close(*from, Point::new(102.0, 240.0)));
            assert!(close(*to,   Point::new(103.0, 240.0)));
        }
        other => panic!("frame 4: {:?}", other),
    }
    assert!(per_frame[4].is_empty());
    assert_eq!(per_frame[5], vec![GestureEvent::PinchEnd]);

    let history = engine.history();
    assert_eq!(history.undo_depth(), 1);
    assert_eq!(history.document().undo_stack[0].len(), 1);
    assert_eq!(history.segments().len(), 1);
}

#[test]
fn between_thresholds_holds_the_pinch() {
    let mut engine = raw_engine();
    let mut events = Vec::new();
    for d in [0.04, 0.04, 0.06, 0.06] {
        let f = Frame::new(vec![hand_at(DetectorLabel::Left, 200.0, d)]);
        events.extend_from_slice(engine.handle_frame(&f, &mut NullSink));
    }
    let starts = events.iter().filter(|e| matches!(e, GestureEvent::PinchStart { .. })).count();
    let ends   = events.iter().filter(|e| matches!(e, GestureEvent::PinchEnd)).count();
    assert_eq!(starts, 1);
    assert_eq!(ends, 0);
    assert!(engine.snapshot().drawing);

    events.clear();
    for d in [0.075, 0.075] {
        let f = Frame::new(vec![hand_at(DetectorLabel::Left, 200.0, d)]);
        events.extend_from_slice(engine.handle_frame(&f, &mut NullSink));
    }
    assert_eq!(events, vec![GestureEvent::PinchEnd]);
}

#[test]
fn n_moves_make_a_group_of_n() {
    let mut engine = raw_engine();
    let mut sink = NullSink;
    for n in [1usize, 3, 7] {
        let before = engine.history().segments().len();
        engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, 50.0, 0.01)]), &mut sink);
        engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, 50.0, 0.01)]), &mut sink);
        for i in 0..n {
            let x = 50.0 + 5.0 * (i + 1) as f32;
            engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, x, 0.01)]), &mut sink);
        }
        engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, 0.0, 0.3)]), &mut sink);
        engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, 0.0, 0.3)]), &mut sink);

        let history = engine.history();
        assert_eq!(history.segments().len(), before + n);
        assert_eq!(history.document().undo_stack.last().unwrap().len(), n);
    }
}

#[test]
fn tap_without_movement_records_no_stroke() {
    let mut engine = raw_engine();
    let mut sink = NullSink;
    for d in [0.01, 0.01, 0.3, 0.3] {
        engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, 80.0, d)]), &mut sink);
    }
    assert_eq!(engine.history().undo_depth(), 0);
    assert!(engine.history().segments().is_empty());
}

#[test]
fn new_stroke_after_undo_empties_redo() {
    let mut engine = raw_engine();
    let mut sink = NullSink;
    let mut stroke = |engine: &mut Engine| {
        for (x, d) in [(10.0, 0.01), (10.0, 0.01), (20.0, 0.01), (20.0, 0.3), (20.0, 0.3)] {
            engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, x, d)]), &mut sink);
        }
    };
    stroke(&mut engine);
    stroke(&mut engine);
    engine.dispatch(Command::Undo, &mut NullSink);
    assert_eq!(engine.history().redo_depth(), 1);
    stroke(&mut engine);
    assert_eq!(engine.history().redo_depth(), 0);
    assert_eq!(engine.history().undo_depth(), 2);
}

#[test]
fn clear_three_strokes_then_redo_is_noop() {
    let mut engine = raw_engine();
    let mut sink = NullSink;
    for _ in 0..3 {
        for (x, d) in [(10.0, 0.01), (10.0, 0.01), (30.0, 0.01), (30.0, 0.3), (30.0, 0.3)] {
            engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, x, d)]), &mut sink);
        }
    }
    assert_eq!(engine.history().undo_depth(), 3);

    engine.dispatch(Command::Clear, &mut sink);
    let doc = engine.history().document();
    assert!(doc.segments.is_empty());
    assert!(doc.undo_stack.is_empty());
    assert!(doc.redo_stack.is_empty());

    engine.dispatch(Command::Redo, &mut sink);
    assert!(engine.history().segments().is_empty());
}

#[test]
fn open_fist_fist_open_cycles_once() {
    let mut engine = raw_engine();
    let mut sink = NullSink;
    let start = engine.brush().active_index();
    let count = engine.brush().presets().len();

    let mut cycles = 0;
    for hand in [open_modifier(), fist(), fist(), open_modifier()] {
        engine.dispatch(frame(vec![hand]), &mut sink);
        cycles += engine
            .last_events()
            .iter()
            .filter(|e| matches!(e, GestureEvent::FistCycle))
            .count();
    }
    assert_eq!(cycles, 1);
    assert_eq!(engine.brush().active_index(), (start + 1) % count);
}

#[test]
fn both_hands_draw_and_cycle_in_one_frame() {
    let mut engine = raw_engine();
    let mut sink = NullSink;
    let draw = |x: f32| hand_at(DetectorLabel::Left, x, 0.01);

    engine.dispatch(frame(vec![draw(10.0), open_modifier()]), &mut sink);
    engine.dispatch(frame(vec![fist(), draw(10.0)]), &mut sink);
    engine.dispatch(frame(vec![draw(20.0), fist()]), &mut sink);
    // Preset switches on this frame; the move is processed first so it is
    // still painted with the pen.
    engine.dispatch(frame(vec![draw(30.0), open_modifier()]), &mut sink);

    let widths: Vec<f32> = engine.history().segments().iter().map(|s| s.style.width).collect();
    assert_eq!(widths, vec![5.0, 5.0]);
    assert_eq!(engine.snapshot().preset, "marker");
}

#[test]
fn hand_leaving_frame_seals_stroke_and_resets() {
    let mut engine = raw_engine();
    let mut sink = NullSink;
    for x in [10.0, 10.0, 20.0, 30.0] {
        engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, x, 0.01)]), &mut sink);
    }
    engine.dispatch(frame(vec![]), &mut sink);
    assert_eq!(engine.history().undo_depth(), 1);
    assert_eq!(engine.history().segments().len(), 2);

    // Coming back already pinched still needs a full debounce.
    engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, 40.0, 0.01)]), &mut sink);
    assert!(engine.last_events().is_empty());
    engine.dispatch(frame(vec![hand_at(DetectorLabel::Left, 40.0, 0.01)]), &mut sink);
    assert!(matches!(engine.last_events(), [GestureEvent::PinchStart { .. }]));
}
