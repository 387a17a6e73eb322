//! Software rasterizer for stroke segments.
//!
//! [`Surface`] is a transparent accumulation layer in premultiplied RGBA.
//! Each segment is rasterized into a coverage mask first (dash pieces and
//! caps take the max, so overlapping pieces don't double-blend) and then
//! blended once with the segment's composite mode.  The background is only
//! applied when flattening for display or export, which is what lets the
//! eraser reveal it.

use airbrush_core::brush::MIN_DASH;
use airbrush_core::{Color, Composite, LineCap, Point, RenderSink, Segment};

/// Pointer overlay radius in canvas pixels.
pub const POINTER_RADIUS: f32 = 8.0;

const CHECKER_LIGHT: f32 = 0.93;
const CHECKER_DARK:  f32 = 0.80;
const CHECKER_CELL:  usize = 8;

/// Premultiplied RGBA, each channel in `0..=1`.
pub type Pixel = [f32; 4];

// ════════════════════════════════════════════════════════════════════════════
// Surface
// ════════════════════════════════════════════════════════════════════════════

pub struct Surface {
    width:  usize,
    height: usize,
    px:     Vec<Pixel>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Surface { width, height, px: vec![[0.0; 4]; width * height] }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn pixel(&self, x: usize, y: usize) -> Pixel {
        self.px[y * self.width + x]
    }

    pub fn clear(&mut self) {
        self.px.fill([0.0; 4]);
    }

    /// Rasterize one segment onto the surface.
    pub fn draw_segment(&mut self, seg: &Segment) {
        let style = &seg.style;
        let radius = style.width.max(0.0) / 2.0;
        if radius <= 0.0 || style.alpha <= 0.0 {
            return;
        }
        let pieces = dash_pieces(seg.p1, seg.p2, &style.dash);
        if pieces.is_empty() {
            return;
        }

        // Bounding box of everything the pieces can touch.
        let reach = radius * std::f32::consts::SQRT_2 + 1.0;
        let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (a, b) in &pieces {
            x0 = x0.min(a.x.min(b.x));
            y0 = y0.min(a.y.min(b.y));
            x1 = x1.max(a.x.max(b.x));
            y1 = y1.max(a.y.max(b.y));
        }
        let Some((bx0, by0, bx1, by1)) = self.clip(x0 - reach, y0 - reach, x1 + reach, y1 + reach)
        else {
            return;
        };

        let color = unit_rgb(style.color);
        let alpha = style.alpha.clamp(0.0, 1.0);
        for y in by0..by1 {
            for x in bx0..bx1 {
                let c = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                let cov = pieces
                    .iter()
                    .map(|&(a, b)| coverage(c, a, b, radius, style.cap))
                    .fold(0.0_f32, f32::max);
                if cov > 0.0 {
                    let i = y * self.width + x;
                    self.px[i] = blend(self.px[i], color, cov * alpha, style.composite);
                }
            }
        }
    }

    /// Integer pixel box `[x0, x1) × [y0, y1)` inside the surface, or `None`
    /// when the float box misses it entirely.
    fn clip(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(usize, usize, usize, usize)> {
        let cx0 = x0.floor().max(0.0) as usize;
        let cy0 = y0.floor().max(0.0) as usize;
        let cx1 = (x1.ceil().max(0.0) as usize).min(self.width);
        let cy1 = (y1.ceil().max(0.0) as usize).min(self.height);
        (cx0 < cx1 && cy0 < cy1).then_some((cx0, cy0, cx1, cy1))
    }

    // ── flattening ────────────────────────────────────────────────────────

    /// Straight-alpha RGBA8, composited over `background` when given.
    pub fn to_rgba8(&self, background: Option<Color>) -> Vec<[u8; 4]> {
        self.px
            .iter()
            .map(|p| match background {
                Some(bg) => {
                    let [r, g, b] = over(*p, unit_rgb(bg));
                    [to_u8(r), to_u8(g), to_u8(b), 255]
                }
                None if p[3] <= 0.0 => [0, 0, 0, 0],
                None => [
                    to_u8(p[0] / p[3]),
                    to_u8(p[1] / p[3]),
                    to_u8(p[2] / p[3]),
                    to_u8(p[3]),
                ],
            })
            .collect()
    }

    /// Opaque `0RGB` pixels for the window.  A transparent background is
    /// shown as a checkerboard.
    pub fn present(&self, background: Option<Color>, out: &mut [u32]) {
        for (i, (p, dst)) in self.px.iter().zip(out.iter_mut()).enumerate() {
            let bg = match background {
                Some(c) => unit_rgb(c),
                None => {
                    let (x, y) = (i % self.width, i / self.width);
                    let v = if (x / CHECKER_CELL + y / CHECKER_CELL) % 2 == 0 {
                        CHECKER_LIGHT
                    } else {
                        CHECKER_DARK
                    };
                    [v, v, v]
                }
            };
            *dst = pack(over(*p, bg));
        }
    }
}

impl RenderSink for Surface {
    fn segment_appended(&mut self, segment: &Segment) {
        self.draw_segment(segment);
    }

    fn surface_cleared(&mut self) {
        self.clear();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pointer overlay
// ════════════════════════════════════════════════════════════════════════════

/// Paint the pointer disc (brush colour, black ring) into a presented frame.
/// `fill` is `None` for the eraser, which only gets the ring.
pub fn draw_pointer(out: &mut [u32], width: usize, height: usize, at: Point, fill: Option<Color>) {
    let r = POINTER_RADIUS;
    let x0 = (at.x - r - 1.0).floor().max(0.0) as usize;
    let y0 = (at.y - r - 1.0).floor().max(0.0) as usize;
    let x1 = ((at.x + r + 1.0).ceil().max(0.0) as usize).min(width);
    let y1 = ((at.y + r + 1.0).ceil().max(0.0) as usize).min(height);
    for y in y0..y1 {
        for x in x0..x1 {
            let d = Point::new(x as f32 + 0.5, y as f32 + 0.5).distance(at);
            let i = y * width + x;
            if (d - r).abs() <= 1.0 {
                out[i] = 0x000000;
            } else if d < r {
                if let Some(c) = fill {
                    out[i] = (c.r as u32) << 16 | (c.g as u32) << 8 | c.b as u32;
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Geometry
// ════════════════════════════════════════════════════════════════════════════

/// Split `a → b` into the "on" pieces of a dash pattern.  The pattern
/// restarts at `a`.  An empty pattern, or one too short to step along the
/// segment, yields the whole segment.
pub fn dash_pieces(a: Point, b: Point, dash: &[f32]) -> Vec<(Point, Point)> {
    let total: f32 = dash.iter().sum();
    let len = a.distance(b);
    if dash.is_empty() || total.is_nan() || total < MIN_DASH || len <= 0.0 {
        return vec![(a, b)];
    }
    let (ux, uy) = ((b.x - a.x) / len, (b.y - a.y) / len);
    let at = |t: f32| {
        if t >= len { b } else { Point::new(a.x + ux * t, a.y + uy * t) }
    };

    let mut pieces = Vec::new();
    let mut t = 0.0;
    let mut on = true;
    for &step in dash.iter().cycle() {
        if t >= len {
            break;
        }
        let end = (t + step).min(len);
        if step > 0.0 && end <= t {
            // Too small to move `t` at this magnitude; draw the rest solid.
            pieces.push((at(t), b));
            break;
        }
        if on && step > 0.0 {
            pieces.push((at(t), at(end)));
        }
        t = end;
        on = !on;
    }
    pieces
}

/// Anti-aliased coverage of pixel centre `p` by a thick line `a → b`.
fn coverage(p: Point, a: Point, b: Point, radius: f32, cap: LineCap) -> f32 {
    let len = a.distance(b);
    let (ux, uy) = if len > 1e-6 {
        ((b.x - a.x) / len, (b.y - a.y) / len)
    } else {
        (1.0, 0.0)
    };
    let (dx, dy) = (p.x - a.x, p.y - a.y);
    let along  = dx * ux + dy * uy;
    let across = (dx * uy - dy * ux).abs();

    let edge = |d: f32| (d + 0.5).clamp(0.0, 1.0);
    match cap {
        LineCap::Round => {
            let t = along.clamp(0.0, len);
            let nearest = Point::new(a.x + ux * t, a.y + uy * t);
            edge(radius - p.distance(nearest))
        }
        LineCap::Butt => {
            if len <= 1e-6 {
                return 0.0;
            }
            edge(radius - across) * edge(along.min(len - along))
        }
        LineCap::Square => {
            edge(radius - across) * edge((along + radius).min(len + radius - along))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Compositing
// ════════════════════════════════════════════════════════════════════════════

/// Blend straight colour `c` at opacity `a` onto premultiplied `dst`.
fn blend(dst: Pixel, c: [f32; 3], a: f32, mode: Composite) -> Pixel {
    let da = dst[3];
    let s = [c[0] * a, c[1] * a, c[2] * a];
    let mut out = [0.0; 4];
    match mode {
        Composite::SourceOver => {
            for k in 0..3 {
                out[k] = s[k] + dst[k] * (1.0 - a);
            }
            out[3] = a + da * (1.0 - a);
        }
        Composite::DestinationOut => {
            for k in 0..4 {
                out[k] = dst[k] * (1.0 - a);
            }
        }
        Composite::Multiply => {
            for k in 0..3 {
                out[k] = s[k] * (1.0 - da) + dst[k] * (1.0 - a) + s[k] * dst[k];
            }
            out[3] = a + da - a * da;
        }
        Composite::Screen => {
            for k in 0..3 {
                out[k] = s[k] + dst[k] - s[k] * dst[k];
            }
            out[3] = a + da - a * da;
        }
    }
    out
}

fn over(p: Pixel, bg: [f32; 3]) -> [f32; 3] {
    [
        p[0] + bg[0] * (1.0 - p[3]),
        p[1] + bg[1] * (1.0 - p[3]),
        p[2] + bg[2] * (1.0 - p[3]),
    ]
}

fn unit_rgb(c: Color) -> [f32; 3] {
    [c.r as f32 / 255.0, c.g as f32 / 255.0, c.b as f32 / 255.0]
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn pack([r, g, b]: [f32; 3]) -> u32 {
    (to_u8(r) as u32) << 16 | (to_u8(g) as u32) << 8 | to_u8(b) as u32
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
