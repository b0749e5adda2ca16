//! Software renderer writing one PNG per animation tick.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use super::Renderer;
use crate::error::Result;
use crate::params::RenderConfig;

const BACKGROUND: Rgba<u8> = Rgba([15, 23, 42, 255]);
const MID_LINE: Rgba<u8> = Rgba([148, 163, 184, 64]);
const SQUARE: Rgba<u8> = Rgba([249, 115, 22, 255]);
const COMPOSITE: Rgba<u8> = Rgba([56, 189, 248, 255]);
const COMPOSITE_FADED: Rgba<u8> = Rgba([56, 189, 248, 64]);
const CELL_BORDER: Rgba<u8> = Rgba([30, 41, 59, 255]);

/// Pixel rectangle inside the frame
#[derive(Debug, Clone, Copy)]
struct Rect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Rect {
    fn center_y(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.0
    }
}

/// Draws the composite over the ideal square, plus a grid of partial previews
pub struct PngFrameRenderer {
    frame: RgbaImage,
    reference: Vec<f32>,
    composite_area: Rect,
    preview_cells: Vec<Rect>,
    frames_dir: PathBuf,
    frame_number: usize,
}

impl PngFrameRenderer {
    /// Create a renderer saving frames into `frames_dir` (created if missing)
    pub fn new(
        config: &RenderConfig,
        reference: &[f32],
        partial_count: usize,
        frames_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let frames_dir = frames_dir.as_ref().to_path_buf();
        fs::create_dir_all(&frames_dir)?;

        let width = config.width.max(1);
        let height = config.height.max(1);
        let composite_height = config.composite_height();
        let composite_area = Rect {
            x: 0,
            y: 0,
            width,
            height: composite_height,
        };

        let columns = config.preview_columns.max(1);
        let rows = (partial_count as u32).div_ceil(columns).max(1);
        let cell_width = (width / columns).max(1);
        let cell_height = ((height - composite_height) / rows).max(1);
        let preview_cells = (0..partial_count as u32)
            .map(|i| Rect {
                x: (i % columns) * cell_width,
                y: composite_height + (i / columns) * cell_height,
                width: cell_width,
                height: cell_height,
            })
            .collect();

        let mut frame = RgbaImage::new(width, height);
        clear(&mut frame, composite_area);

        Ok(Self {
            frame,
            reference: reference.to_vec(),
            composite_area,
            preview_cells,
            frames_dir,
            frame_number: 0,
        })
    }

    /// Frames saved so far
    pub fn frames_written(&self) -> usize {
        self.frame_number
    }

    /// The frame as drawn so far
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    fn frame_path(&self, frame_number: usize) -> PathBuf {
        self.frames_dir.join(format!("frame_{:05}.png", frame_number))
    }
}

impl Renderer for PngFrameRenderer {
    fn render_composite(&mut self, samples: &[f32], max_magnitude: f32) {
        let area = self.composite_area;
        clear(&mut self.frame, area);
        dashed_mid_line(&mut self.frame, area);

        let height = area.height as f32;
        let available = height / 2.0 - height * 0.1;
        let vertical_scale = available / max_magnitude.max(1.0);

        plot(&mut self.frame, area, &self.reference, vertical_scale, SQUARE, 2);
        plot(&mut self.frame, area, samples, vertical_scale, COMPOSITE, 3);
    }

    fn render_partial_preview(&mut self, harmonic_index: usize, samples: &[f32], enabled: bool) {
        let Some(&cell) = self.preview_cells.get(harmonic_index) else {
            log::trace!("No preview cell for harmonic index {}", harmonic_index);
            return;
        };
        clear(&mut self.frame, cell);
        outline(&mut self.frame, cell, CELL_BORDER);
        dashed_mid_line(&mut self.frame, cell);

        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if peak == 0.0 {
            return;
        }
        let vertical_scale = cell.height as f32 * 0.4 / peak.max(1.0);
        let color = if enabled { COMPOSITE } else { COMPOSITE_FADED };
        plot(&mut self.frame, cell, samples, vertical_scale, color, 1);
    }

    fn present(&mut self) -> Result<()> {
        let path = self.frame_path(self.frame_number);
        self.frame.save(&path)?;
        log::trace!("Saved {}", path.display());
        self.frame_number += 1;
        Ok(())
    }
}

fn clear(frame: &mut RgbaImage, area: Rect) {
    for y in area.y..(area.y + area.height).min(frame.height()) {
        for x in area.x..(area.x + area.width).min(frame.width()) {
            frame.put_pixel(x, y, BACKGROUND);
        }
    }
}

fn outline(frame: &mut RgbaImage, area: Rect, color: Rgba<u8>) {
    let right = (area.x + area.width).saturating_sub(1) as f32;
    let bottom = (area.y + area.height).saturating_sub(1) as f32;
    let (left, top) = (area.x as f32, area.y as f32);
    line(frame, (left, top), (right, top), color, 1);
    line(frame, (left, bottom), (right, bottom), color, 1);
    line(frame, (left, top), (left, bottom), color, 1);
    line(frame, (right, top), (right, bottom), color, 1);
}

/// Dashed horizontal line through the vertical center: 4px on, 6px off
fn dashed_mid_line(frame: &mut RgbaImage, area: Rect) {
    let y = area.center_y();
    let mut x = area.x;
    let end = area.x + area.width;
    while x < end {
        let dash_end = (x + 4).min(end);
        line(frame, (x as f32, y), (dash_end as f32, y), MID_LINE, 1);
        x += 10;
    }
}

/// Polyline of `samples` stretched across the full width of `area`
fn plot(
    frame: &mut RgbaImage,
    area: Rect,
    samples: &[f32],
    vertical_scale: f32,
    color: Rgba<u8>,
    thickness: u32,
) {
    if samples.len() < 2 {
        return;
    }
    let center = area.center_y();
    let last = (samples.len() - 1) as f32;
    let point = |i: usize, value: f32| {
        let x = area.x as f32 + i as f32 / last * area.width.saturating_sub(1) as f32;
        let y = center - value * vertical_scale;
        (x, y)
    };

    for (i, pair) in samples.windows(2).enumerate() {
        line(
            frame,
            point(i, pair[0]),
            point(i + 1, pair[1]),
            color,
            thickness,
        );
    }
}

/// DDA line with a vertical brush of `thickness` pixels, alpha blended and clipped to the frame
fn line(frame: &mut RgbaImage, from: (f32, f32), to: (f32, f32), color: Rgba<u8>, thickness: u32) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
    let half = thickness as i64 / 2;

    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = (from.0 + dx * t).round() as i64;
        let y = (from.1 + dy * t).round() as i64;
        for offset in -half..=(thickness as i64 - 1 - half) {
            blend(frame, x, y + offset, color);
        }
    }
}

fn blend(frame: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= frame.width() as i64 || y >= frame.height() as i64 {
        return;
    }
    let pixel = frame.get_pixel_mut(x as u32, y as u32);
    let alpha = color[3] as u32;
    for channel in 0..3 {
        let src = color[channel] as u32;
        let dst = pixel[channel] as u32;
        pixel[channel] = ((src * alpha + dst * (255 - alpha)) / 255) as u8;
    }
    pixel[3] = 255;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::ideal_square_reference;
    use image::GenericImageView;

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 160,
            height: 120,
            composite_fraction: 0.5,
            preview_columns: 4,
        }
    }

    #[test]
    fn test_present_writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames = dir.path().join("frames");
        let reference = ideal_square_reference(64);
        let mut renderer = PngFrameRenderer::new(&small_config(), &reference, 8, &frames).unwrap();

        for _ in 0..2 {
            renderer.render_composite(&reference, 1.0);
            renderer.present().unwrap();
        }

        assert_eq!(renderer.frames_written(), 2);
        assert!(frames.join("frame_00000.png").exists());
        let saved = image::open(frames.join("frame_00001.png")).unwrap();
        assert_eq!(saved.width(), 160);
        assert_eq!(saved.height(), 120);
    }

    #[test]
    fn test_composite_is_drawn_in_blue() {
        let dir = tempfile::tempdir().unwrap();
        let reference = ideal_square_reference(64);
        let mut renderer = PngFrameRenderer::new(&small_config(), &reference, 8, dir.path()).unwrap();

        let silent = vec![0.0f32; 64];
        renderer.render_composite(&silent, 0.0);
        // A flat composite sits on the vertical center of the composite area
        let center = renderer.composite_area.center_y().round() as u32;
        assert_eq!(*renderer.frame().get_pixel(80, center), COMPOSITE);
    }

    #[test]
    fn test_silent_preview_has_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let reference = ideal_square_reference(64);
        let mut renderer = PngFrameRenderer::new(&small_config(), &reference, 8, dir.path()).unwrap();

        renderer.render_partial_preview(5, &[0.0; 64], false);
        let cell = renderer.preview_cells[5];
        let has_blue = (cell.y..cell.y + cell.height)
            .flat_map(|y| (cell.x..cell.x + cell.width).map(move |x| (x, y)))
            .any(|(x, y)| *renderer.frame().get_pixel(x, y) == COMPOSITE);
        assert!(!has_blue);

        // Out of range indices are ignored
        renderer.render_partial_preview(99, &[0.5; 64], true);
    }
}
