//! Writing a drawing out: PNG of the flattened surface, JSON of segments.

use std::path::Path;

use airbrush_core::{Color, Segment};
use anyhow::Context;
use image::{Rgba, RgbaImage};
use tracing::info;

use crate::raster::Surface;

/// Flatten `surface` over `background` (or keep transparency) and save as PNG.
pub fn write_png(surface: &Surface, background: Option<Color>, path: &Path) -> anyhow::Result<()> {
    let width = surface.width();
    let pixels = surface.to_rgba8(background);
    let img = RgbaImage::from_fn(width as u32, surface.height() as u32, |x, y| {
        Rgba(pixels[y as usize * width + x as usize])
    });
    img.save(path)
        .with_context(|| format!("writing PNG to {}", path.display()))?;
    info!(path = %path.display(), "PNG exported");
    Ok(())
}

/// Save the ordered segment list as pretty JSON.
pub fn write_segments_json(segments: &[Segment], path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(segments)?;
    std::fs::write(path, json)
        .with_context(|| format!("writing segments to {}", path.display()))?;
    info!(path = %path.display(), segments = segments.len(), "segments exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use airbrush_core::{BrushStyle, Point, RenderSink};
    use tempfile::TempDir;

    fn stroke() -> Segment {
        Segment {
            p1:    Point::new(2.0, 8.0),
            p2:    Point::new(14.0, 8.0),
            style: BrushStyle::default(),
        }
    }

    #[test]
    fn png_has_canvas_size_and_background() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");
        let mut surface = Surface::new(16, 12);
        surface.segment_appended(&stroke());
        write_png(&surface, Some(Color::WHITE), &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (16, 12));
        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(img.get_pixel(8, 8), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn transparent_png_keeps_alpha() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clear.png");
        write_png(&Surface::new(4, 4), None, &path).unwrap();
        let img = image::open(&path).unwrap().to_rgba8();
        assert!(img.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn segments_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("segments.json");
        let segs = vec![stroke(), stroke()];
        write_segments_json(&segs, &path).unwrap();
        let back: Vec<Segment> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, segs);
    }
}
