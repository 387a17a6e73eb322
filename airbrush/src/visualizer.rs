//! Software-rendered window using `minifb`.
//!
//! The window is the canvas: background, stroke layer, then the pointer
//! disc on top.  Status goes in the title bar so nothing is painted over
//! the drawing.
//!
//! Input is split two ways.  Mouse and gesture keys become [`SimInput`]s for
//! the simulated hand source; editing keys become [`Command`]s pushed
//! straight onto the engine's queue.

use std::sync::mpsc::Sender;

use airbrush_core::brush::builtin_presets;
use airbrush_core::{Color, Command, OverlaySnapshot};
use anyhow::Context;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Scale, Window, WindowOptions};

use crate::raster::{draw_pointer, Surface};
use crate::source::SimInput;

const TARGET_FPS: usize = 60;

const PRESET_KEYS: [Key; 6] = [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5, Key::Key6];

/// Map a config scale factor onto minifb's fixed set.
pub fn window_scale(scale: u8) -> Scale {
    match scale {
        2 => Scale::X2,
        4 => Scale::X4,
        8 => Scale::X8,
        _ => Scale::X1,
    }
}

/// Held-button state from the previous poll, so only edges are sent.
#[derive(Default)]
struct Held {
    draw:  bool,
    pinch: bool,
    fist:  bool,
}

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    width:  usize,
    height: usize,
    title:  String,
    held:   Held,
    sim_tx: Sender<SimInput>,
    cmd_tx: Sender<Command>,
}

impl Visualizer {
    pub fn new(
        width:  usize,
        height: usize,
        scale:  u8,
        sim_tx: Sender<SimInput>,
        cmd_tx: Sender<Command>,
    ) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "airbrush",
            width,
            height,
            WindowOptions { scale: window_scale(scale), ..WindowOptions::default() },
        )
        .context("opening window")?;
        window.set_target_fps(TARGET_FPS);

        Ok(Visualizer {
            window,
            buf: vec![0; width * height],
            width,
            height,
            title: String::new(),
            held: Held::default(),
            sim_tx,
            cmd_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll mouse and keyboard, forward them, and advance the simulated
    /// camera by one frame.  Returns false when the user asked to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }

        // ── editing commands ──────────────────────────────────────────────
        let mut commands = Vec::new();
        if one_shot(Key::U) { commands.push(Command::Undo); }
        if one_shot(Key::R) { commands.push(Command::Redo); }
        if one_shot(Key::C) { commands.push(Command::Clear); }
        for (key, preset) in PRESET_KEYS.iter().zip(builtin_presets()) {
            if one_shot(*key) {
                commands.push(Command::ApplyPreset(preset.name.to_string()));
            }
        }
        let toggle = one_shot(Key::H);
        for cmd in commands {
            let _ = self.cmd_tx.send(cmd);
        }

        // ── simulated hands ───────────────────────────────────────────────
        let mut inputs = Vec::new();
        if toggle { inputs.push(SimInput::ToggleDrawingHand); }
        if let Some((x, y)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            inputs.push(SimInput::Pointer {
                x: x / self.width as f32,
                y: y / self.height as f32,
            });
        }
        let draw  = self.window.get_mouse_down(MouseButton::Left);
        let pinch = self.window.is_key_down(Key::Space);
        let fist  = self.window.is_key_down(Key::F);
        if draw  != self.held.draw  { inputs.push(SimInput::DrawPinch(draw)); }
        if pinch != self.held.pinch { inputs.push(SimInput::ModifierPinch(pinch)); }
        if fist  != self.held.fist  { inputs.push(SimInput::ModifierFist(fist)); }
        self.held = Held { draw, pinch, fist };
        inputs.push(SimInput::Tick);

        for input in inputs {
            let _ = self.sim_tx.send(input);
        }
        true
    }

    /// Present the surface plus overlay and update the title if it changed.
    pub fn render(
        &mut self,
        surface:      &Surface,
        background:   Option<Color>,
        overlay:      &OverlaySnapshot,
        show_pointer: bool,
        status:       &str,
    ) -> anyhow::Result<()> {
        surface.present(background, &mut self.buf);

        if show_pointer {
            if let Some(at) = overlay.pointer {
                let fill = (!overlay.style.is_destructive()).then_some(overlay.style.color);
                draw_pointer(&mut self.buf, self.width, self.height, at, fill);
            }
        }

        if status != self.title {
            self.window.set_title(status);
            self.title = status.to_string();
        }

        self.window
            .update_with_buffer(&self.buf, self.width, self.height)
            .context("presenting frame")?;
        Ok(())
    }
}
