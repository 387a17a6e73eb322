//! # airbrush
//!
//! Interactive shell around [`airbrush_core`]: a software-rendered canvas
//! window, hand-observation sources, and PNG/JSON export.
//!
//! ## Hand sources
//!
//! * **Simulation** (default): the mouse stands in for the detector.  The
//!   pointer is the Drawing hand's index tip; buttons and keys close the
//!   synthetic pinch or fist, producing full 21-landmark frames that go
//!   through the same smoothing and classification as camera input.
//! * **Replay**: a JSON-lines recording of frames (see `run --record`),
//!   played back on screen or headlessly with `airbrush replay`.
//!
//! ### Simulation controls
//!
//! | Input | Gesture / action |
//! |---|---|
//! | Mouse | Drawing hand index tip |
//! | Left button (hold) | Drawing pinch: draw |
//! | `Space` (hold) + mouse up/down | Modifier pinch-drag: resize brush |
//! | `F` (hold, release) | Modifier fist: cycle preset |
//! | `H` | Drawing hand enters / leaves the frame |
//! | `U` / `R` / `C` | Undo / redo / clear |
//! | `1`–`6` | pen, marker, highlighter, dashed, dotted, eraser |
//! | `Q` / `Escape` | Quit |

pub mod cli;
pub mod source;
pub mod raster;
pub mod visualizer;
pub mod export;
pub mod app;
