//! Diagnostic overlays rendered onto a fresh copy of the input.

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut,
};
use imageproc::point::Point;
use nalgebra::Point2;

use crate::{AnnotateConfig, Measurement};

const MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const LABEL_COLOR: Rgb<u8> = Rgb([0, 200, 100]);

/// DejaVu Sans Mono, see `assets/LICENSE-DejaVu.txt`.
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

const MARKER_THICKNESS: f32 = 5.0;
const BOX_THICKNESS: f32 = 2.0;
const CENTER_RADIUS: i32 = 5;

/// The caption font compiled into the crate.
pub fn bundled_font() -> Option<FontArc> {
    FontArc::try_from_slice(BUNDLED_FONT).ok()
}

/// Draws the marker outline, object boxes, centroids and width/height
/// captions.
#[derive(Clone)]
pub struct Annotator {
    font: Option<FontArc>,
    unit: String,
    font_scale: f32,
}

impl Annotator {
    /// Captions use the bundled font.
    pub fn new(cfg: &AnnotateConfig) -> Self {
        let font = bundled_font();
        if font.is_none() {
            log::warn!("bundled caption font failed to parse; captions disabled");
        }
        Self {
            font,
            unit: cfg.unit.clone(),
            font_scale: cfg.font_scale,
        }
    }

    /// Caption with `font` instead of the bundled one.
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    #[inline]
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render overlays onto a copy of `base`; `base` itself is untouched.
    pub fn render(
        &self,
        base: &RgbImage,
        marker: &[Point2<f32>; 4],
        measurements: &[Measurement],
    ) -> RgbImage {
        let mut canvas = base.clone();
        let outline: Vec<(f32, f32)> = marker.iter().map(|p| (p.x, p.y)).collect();
        draw_closed_polyline(&mut canvas, &outline, MARKER_THICKNESS, MARKER_COLOR);

        for m in measurements {
            let b = &m.pixel_box;
            let (cx, cy) = (b.center.x as f32, b.center.y as f32);
            let center = (cx as i32, cy as i32);
            draw_filled_circle_mut(&mut canvas, center, CENTER_RADIUS, CENTER_COLOR);

            let corners: Vec<(f32, f32)> = b
                .corners()
                .iter()
                .map(|p| (p.x as f32, p.y as f32))
                .collect();
            draw_closed_polyline(&mut canvas, &corners, BOX_THICKNESS, BOX_COLOR);

            if let Some(font) = &self.font {
                let scale = PxScale::from(self.font_scale);
                // captions sit above their anchor, like a text baseline
                let x = (cx - 100.0) as i32;
                let top = |anchor: f32| (anchor - self.font_scale) as i32;
                let width = format!("Width {:.1} {}", m.size.width, self.unit);
                let height = format!("Height {:.1} {}", m.size.height, self.unit);
                draw_text_mut(&mut canvas, LABEL_COLOR, x, top(cy - 20.0), scale, font, &width);
                draw_text_mut(&mut canvas, LABEL_COLOR, x, top(cy + 15.0), scale, font, &height);
            }
        }
        canvas
    }
}

/// Closed polyline with the given stroke width.
fn draw_closed_polyline(
    canvas: &mut RgbImage,
    pts: &[(f32, f32)],
    thickness: f32,
    color: Rgb<u8>,
) {
    let n = pts.len();
    for i in 0..n {
        draw_thick_segment(canvas, pts[i], pts[(i + 1) % n], thickness, color);
    }
}

fn draw_thick_segment(
    canvas: &mut RgbImage,
    a: (f32, f32),
    b: (f32, f32),
    thickness: f32,
    color: Rgb<u8>,
) {
    if thickness <= 1.0 {
        draw_line_segment_mut(canvas, a, b, color);
        return;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);
    let half = thickness / 2.0;
    if len > f32::EPSILON {
        let (nx, ny) = (-dy / len * half, dx / len * half);
        let quad = [
            Point::new((a.0 + nx).round() as i32, (a.1 + ny).round() as i32),
            Point::new((b.0 + nx).round() as i32, (b.1 + ny).round() as i32),
            Point::new((b.0 - nx).round() as i32, (b.1 - ny).round() as i32),
            Point::new((a.0 - nx).round() as i32, (a.1 - ny).round() as i32),
        ];
        draw_polygon_mut(canvas, &quad, color);
    }
    // round joints
    let r = half.round() as i32;
    draw_filled_circle_mut(canvas, (a.0.round() as i32, a.1.round() as i32), r, color);
}
