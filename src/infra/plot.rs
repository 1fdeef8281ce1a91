// ============================================================
// Layer 6 — Loss Curve Plot
// ============================================================
// Renders average train / validation loss per epoch as a PNG:
//
//   train       purple line, dot markers
//   validation  red line, cross markers
//   x-axis      one tick per epoch, long tick every 5 epochs
//
// Output file: graphs/<model_name>_epoch_loss.png

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_cross_mut, draw_filled_circle_mut, draw_line_segment_mut},
    rect::Rect,
};
use std::path::{Path, PathBuf};

use crate::ml::trainer::LossHistory;

const WIDTH:  u32 = 640;
const HEIGHT: u32 = 480;
const MARGIN: f32 = 48.0;
const TICK_SPACING: usize = 5;

const WHITE:  Rgb<u8> = Rgb([255, 255, 255]);
const BLACK:  Rgb<u8> = Rgb([0, 0, 0]);
const GREY:   Rgb<u8> = Rgb([200, 200, 200]);
const PURPLE: Rgb<u8> = Rgb([128, 0, 128]);
const RED:    Rgb<u8> = Rgb([220, 20, 20]);

/// Maps (epoch, loss) into pixel space.
struct Frame {
    epochs: usize,
    min:    f64,
    max:    f64,
}

impl Frame {
    fn new(history: &LossHistory) -> Self {
        let values = history.train.iter().chain(&history.val).copied().filter(|v| v.is_finite());
        let (mut min, mut max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !min.is_finite() {
            min = 0.0;
            max = 1.0;
        }
        if (max - min).abs() < 1e-12 {
            max = min + 1.0;
        }
        Self { epochs: history.epochs().max(1), min, max }
    }

    fn x(&self, epoch: usize) -> f32 {
        let span = (WIDTH as f32) - 2.0 * MARGIN;
        if self.epochs <= 1 {
            return MARGIN + span / 2.0;
        }
        MARGIN + span * (epoch - 1) as f32 / (self.epochs - 1) as f32
    }

    fn y(&self, loss: f64) -> f32 {
        let span = (HEIGHT as f32) - 2.0 * MARGIN;
        let t = ((loss - self.min) / (self.max - self.min)) as f32;
        (HEIGHT as f32) - MARGIN - span * t
    }
}

/// Draw the curves into an image without touching the filesystem.
pub fn render_loss(history: &LossHistory) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(WIDTH, HEIGHT, WHITE);
    let frame = Frame::new(history);

    let left   = MARGIN;
    let right  = WIDTH as f32 - MARGIN;
    let top    = MARGIN;
    let bottom = HEIGHT as f32 - MARGIN;

    let plot_area = Rect::at(left as i32, top as i32)
        .of_size((right - left) as u32, (bottom - top) as u32);
    imageproc::drawing::draw_hollow_rect_mut(&mut canvas, plot_area, GREY);
    draw_line_segment_mut(&mut canvas, (left, bottom), (right, bottom), BLACK);
    draw_line_segment_mut(&mut canvas, (left, top), (left, bottom), BLACK);

    for epoch in 1..=frame.epochs {
        let x   = frame.x(epoch);
        let len = if epoch % TICK_SPACING == 0 || epoch == 1 { 8.0 } else { 3.0 };
        draw_line_segment_mut(&mut canvas, (x, bottom), (x, bottom + len), BLACK);
    }

    draw_curve(&mut canvas, &frame, &history.train, PURPLE, Marker::Dot);
    draw_curve(&mut canvas, &frame, &history.val, RED, Marker::Cross);
    canvas
}

#[derive(Clone, Copy)]
enum Marker {
    Dot,
    Cross,
}

fn draw_curve(canvas: &mut RgbImage, frame: &Frame, losses: &[f64], color: Rgb<u8>, marker: Marker) {
    let points: Vec<(f32, f32)> = losses
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (frame.x(i + 1), frame.y(v)))
        .collect();

    for pair in points.windows(2) {
        draw_line_segment_mut(canvas, pair[0], pair[1], color);
    }
    for &(x, y) in &points {
        match marker {
            Marker::Dot   => draw_filled_circle_mut(canvas, (x as i32, y as i32), 3, color),
            Marker::Cross => draw_cross_mut(canvas, color, x as i32, y as i32),
        }
    }
}

/// Render and save to `<dir>/<model_name>_epoch_loss.png`.
pub fn plot_loss(history: &LossHistory, dir: impl AsRef<Path>, model_name: &str) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{model_name}_epoch_loss.png"));

    render_loss(history)
        .save(&path)
        .with_context(|| format!("Cannot write loss plot '{}'", path.display()))?;

    tracing::info!("Loss curves written to '{}'", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> LossHistory {
        LossHistory { train: vec![0.9, 0.6, 0.4, 0.3], val: vec![0.8, 0.65, 0.5, 0.55] }
    }

    #[test]
    fn test_render_draws_both_series() {
        let img = render_loss(&history());
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
        assert!(img.pixels().any(|p| *p == PURPLE));
        assert!(img.pixels().any(|p| *p == RED));
    }

    #[test]
    fn test_flat_or_single_epoch_history_renders() {
        let img = render_loss(&LossHistory { train: vec![0.5], val: vec![0.5] });
        assert!(img.pixels().any(|p| *p == RED));
    }

    #[test]
    fn test_plot_writes_png() {
        let dir  = tempfile::tempdir().unwrap();
        let path = plot_loss(&history(), dir.path(), "BiLSTMNetwork").unwrap();
        assert!(path.ends_with("BiLSTMNetwork_epoch_loss.png"));
        assert!(path.exists());
    }
}
