//! Top-level application: configuration, the engine owner, and the loops.
//!
//! [`App`] owns the [`Engine`], the raster [`Surface`] it renders into, and
//! the [`CommandQueue`] every producer writes to.  The interactive loop and
//! headless replay both come down to "push commands, then [`App::pump`]".

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use airbrush_core::{
    Color, Command, CommandQueue, Engine, EngineConfig, Error, History, Result,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::export;
use crate::raster::Surface;
use crate::source::{
    read_recording, spawn_hand_source, FrameRecorder, ReplaySource, SimHandSource, SimInput,
};
use crate::visualizer::Visualizer;

/// Pace of an on-screen replay, roughly camera rate.
const REPLAY_INTERVAL: Duration = Duration::from_millis(33);

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// What the canvas shows under the strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// Opaque white paper.
    #[default]
    Canvas,
    /// Nothing; exports keep alpha, the window shows a checkerboard.
    Transparent,
}

impl Background {
    pub fn color(self) -> Option<Color> {
        match self {
            Background::Canvas      => Some(Color::WHITE),
            Background::Transparent => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Integer pixel scale: 1, 2, 4 or 8.
    pub scale:        u8,
    pub background:   Background,
    pub show_pointer: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { scale: 1, background: Background::Canvas, show_pointer: true }
    }
}

/// Configuration for the full application: the engine plus the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub window: WindowConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        if ![1, 2, 4, 8].contains(&self.window.scale) {
            return Err(Error::Config(format!(
                "window.scale must be 1, 2, 4 or 8, got {}", self.window.scale
            )));
        }
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::from_toml(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), "loaded config");
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

// ════════════════════════════════════════════════════════════════════════════
// App
// ════════════════════════════════════════════════════════════════════════════

pub struct App {
    engine:     Engine,
    surface:    Surface,
    queue:      CommandQueue,
    recorder:   Option<FrameRecorder>,
    background: Option<Color>,
}

impl App {
    /// Build the engine around `history` and paint what it already holds.
    pub fn new(cfg: &AppConfig, history: History) -> Result<Self> {
        cfg.validate()?;
        let canvas = &cfg.engine.canvas;
        let mut surface = Surface::new(canvas.width as usize, canvas.height as usize);
        let engine = Engine::with_history(cfg.engine.clone(), history)?;
        for seg in engine.history().segments() {
            surface.draw_segment(seg);
        }
        Ok(App {
            engine,
            surface,
            queue: CommandQueue::new(),
            recorder: None,
            background: cfg.window.background.color(),
        })
    }

    /// Also write every frame that passes through to `recorder`.
    pub fn with_recorder(mut self, recorder: FrameRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn sender(&self) -> Sender<Command> { self.queue.sender() }
    pub fn engine(&self) -> &Engine { &self.engine }
    pub fn surface(&self) -> &Surface { &self.surface }
    pub fn background(&self) -> Option<Color> { self.background }
    pub fn is_recording(&self) -> bool { self.recorder.is_some() }

    /// Dispatch everything queued so far.  Returns how many commands ran.
    ///
    /// A recorder that fails to write is dropped; the commands still run.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        for cmd in self.queue.pending() {
            if let Command::Frame(frame) = &cmd {
                if let Some(rec) = self.recorder.as_mut() {
                    if let Err(e) = rec.write(frame) {
                        warn!(error = %e, "frame recording failed, recording stopped");
                        self.recorder = None;
                    }
                }
            }
            self.engine.dispatch(cmd, &mut self.surface);
            n += 1;
        }
        n
    }

    /// One-line summary for the title bar.
    pub fn status(&self) -> String {
        let snap = self.engine.snapshot();
        let history = self.engine.history();
        let mut s = format!(
            "airbrush | {} {:.0}px {} | strokes {} | redo {}",
            snap.preset,
            snap.style.width,
            snap.style.composite.as_str(),
            history.undo_depth(),
            history.redo_depth(),
        );
        if snap.drawing {
            s.push_str(" | drawing");
        }
        s
    }

    /// Flush and close the recorder, if any.
    pub fn finish(&mut self) {
        if let Some(mut rec) = self.recorder.take() {
            if let Err(e) = rec.flush() {
                warn!(error = %e, "flushing frame recording failed");
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the interactive loop
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub record: Option<PathBuf>,
    pub replay: Option<PathBuf>,
    pub load:   Option<PathBuf>,
    pub save:   Option<PathBuf>,
}

fn load_history(path: Option<&Path>) -> anyhow::Result<History> {
    match path {
        Some(p) => History::load(p).with_context(|| format!("loading {}", p.display())),
        None    => Ok(History::new()),
    }
}

/// Spawn the replay source when `replay` is given, the mouse simulation
/// otherwise.  In replay nothing reads `sim_rx`, so it is dropped and the
/// visualizer's sends fail instead of queueing.
fn start_source(
    cfg:    &AppConfig,
    replay: Option<&Path>,
    sim_rx: Receiver<SimInput>,
    tx:     Sender<Command>,
) -> anyhow::Result<JoinHandle<()>> {
    match replay {
        Some(path) => {
            drop(sim_rx);
            let frames = read_recording(path)?;
            info!(frames = frames.len(), path = %path.display(), "replaying");
            Ok(spawn_hand_source(ReplaySource { frames, interval: REPLAY_INTERVAL }, tx))
        }
        None => Ok(spawn_hand_source(
            SimHandSource { rx: sim_rx, dominant: cfg.engine.hands.dominant },
            tx,
        )),
    }
}

/// Open the window and run until it closes.
///
/// Frames come from the mouse simulation by default, or from a recording
/// with `opts.replay`.  Either way they reach the engine through the same
/// queue as the keyboard commands.
pub fn run(cfg: AppConfig, opts: RunOptions) -> anyhow::Result<()> {
    let mut app = App::new(&cfg, load_history(opts.load.as_deref())?)?;
    if let Some(path) = &opts.record {
        app = app.with_recorder(FrameRecorder::create(path)?);
        info!(path = %path.display(), "recording frames");
    }

    // ── hand source ───────────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel();
    let source = start_source(&cfg, opts.replay.as_deref(), sim_rx, app.sender())?;

    // ── window ────────────────────────────────────────────────────────────
    let canvas = &cfg.engine.canvas;
    let mut vis = Visualizer::new(
        canvas.width as usize,
        canvas.height as usize,
        cfg.window.scale,
        sim_tx,
        app.sender(),
    )?;

    // ── main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        if !vis.poll_input() { break; }
        app.pump();
        vis.render(
            app.surface(),
            app.background(),
            &app.engine().snapshot(),
            cfg.window.show_pointer,
            &app.status(),
        )?;
    }

    // Closing the window drops the sim sender, which ends the sim thread.
    drop(vis);
    if opts.replay.is_none() && source.join().is_err() {
        warn!("hand source thread panicked");
    }
    app.finish();

    if let Some(path) = &opts.save {
        app.engine().history().save(path)?;
        info!(path = %path.display(), "document saved");
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// replay(): headless
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone)]
pub struct ReplayOutputs {
    pub png:  Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub doc:  Option<PathBuf>,
}

/// Push every recorded frame through the engine, then write the outputs.
pub fn replay(cfg: &AppConfig, frames: &Path, out: &ReplayOutputs) -> anyhow::Result<App> {
    let frames = read_recording(frames)?;
    let count = frames.len();
    let mut app = App::new(cfg, History::new())?;

    let source = spawn_hand_source(ReplaySource { frames, interval: Duration::ZERO }, app.sender());
    if source.join().is_err() {
        anyhow::bail!("replay source thread panicked");
    }
    let ran = app.pump();
    info!(frames = count, commands = ran, strokes = app.engine().history().undo_depth(), "replay done");

    if let Some(path) = &out.png {
        export::write_png(app.surface(), app.background(), path)?;
    }
    if let Some(path) = &out.json {
        export::write_segments_json(app.engine().history().segments(), path)?;
    }
    if let Some(path) = &out.doc {
        app.engine().history().save(path)?;
        info!(path = %path.display(), "document saved");
    }
    Ok(app)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
