//! Foreground segmentation: adaptive threshold, marker masking, external
//! contours above a minimum area.

use image::{GrayImage, Luma};
use marker_measure_core::{
    adaptive_threshold_mean_inv, external_contours, point_in_convex_polygon, Contour,
};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{MarkerExclusion, SegmentConfig};

/// Binary object mask (255 = foreground) with the marker handled per
/// `cfg.marker_exclusion`.
pub fn segment_mask(
    gray: &GrayImage,
    cfg: &SegmentConfig,
    marker: Option<&[Point2<f32>; 4]>,
) -> GrayImage {
    let mut mask = adaptive_threshold_mean_inv(gray, cfg.threshold_window, cfg.threshold_offset);
    if let (MarkerExclusion::MaskMarker { margin_frac }, Some(corners)) =
        (cfg.marker_exclusion, marker)
    {
        clear_quad(&mut mask, corners, margin_frac);
    }
    mask
}

/// External contours of the object mask whose enclosed area is at least
/// `cfg.min_contour_area`, in tracing order.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(gray, cfg, marker),
        fields(width = gray.width(), height = gray.height())
    )
)]
pub fn segment(
    gray: &GrayImage,
    cfg: &SegmentConfig,
    marker: Option<&[Point2<f32>; 4]>,
) -> Vec<Contour> {
    let mask = segment_mask(gray, cfg, marker);
    let all = external_contours(&mask);
    let total = all.len();
    let kept: Vec<Contour> = all
        .into_iter()
        .filter(|c| c.area() >= cfg.min_contour_area)
        .collect();
    log::debug!(
        "{} of {total} external contours above {} px²",
        kept.len(),
        cfg.min_contour_area
    );
    kept
}

fn clear_quad(mask: &mut GrayImage, corners: &[Point2<f32>; 4], margin_frac: f64) {
    let quad = corners.map(|p| Point2::new(p.x as f64, p.y as f64));
    let c = quad.iter().fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords) / 4.0;
    let scale = 1.0 + margin_frac;
    let grown: Vec<Point2<f64>> = quad
        .iter()
        .map(|p| Point2::from(c + (p.coords - c) * scale))
        .collect();

    let (w, h) = mask.dimensions();
    let clamp = |v: f64, hi: u32| v.clamp(0.0, (hi - 1) as f64);
    let x0 = clamp(grown.iter().map(|p| p.x).fold(f64::INFINITY, f64::min).floor(), w) as u32;
    let x1 = clamp(grown.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max).ceil(), w) as u32;
    let y0 = clamp(grown.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor(), h) as u32;
    let y1 = clamp(grown.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max).ceil(), h) as u32;

    for y in y0..=y1 {
        for x in x0..=x1 {
            if point_in_convex_polygon(Point2::new(x as f64, y as f64), &grown) {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
    }
}
