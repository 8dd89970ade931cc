//! Quadrilateral candidate search.
//!
//! The image is binarized at several adaptive-threshold window sizes, the
//! outer boundary of every dark region is traced and simplified, and convex
//! four-sided outlines of a plausible size are kept.

use image::GrayImage;
use imageproc::geometry::{approximate_polygon_dp, contour_area, oriented_contour_area};
use imageproc::point::Point;
use marker_measure_core::{adaptive_threshold_mean_inv, is_convex, outer_contours, Contour};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of the quad candidate search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadSearchConfig {
    /// Adaptive threshold window sizes; every window is scanned.
    pub threshold_windows: Vec<u32>,
    /// Adaptive threshold offset.
    pub threshold_offset: f64,
    /// Minimum contour perimeter relative to the larger image side.
    pub min_perimeter_rate: f64,
    /// Maximum contour perimeter relative to the larger image side.
    pub max_perimeter_rate: f64,
    /// Polygon simplification tolerance relative to the contour perimeter.
    pub polygon_accuracy_rate: f64,
    /// Minimum quad side relative to the quad perimeter.
    pub min_corner_distance_rate: f64,
    /// Two quads whose corners differ on average by less than this fraction
    /// of the smaller perimeter are the same candidate.
    pub duplicate_distance_rate: f64,
}

impl Default for QuadSearchConfig {
    fn default() -> Self {
        Self {
            threshold_windows: vec![3, 13, 23],
            threshold_offset: 7.0,
            min_perimeter_rate: 0.03,
            max_perimeter_rate: 4.0,
            polygon_accuracy_rate: 0.03,
            min_corner_distance_rate: 0.05,
            duplicate_distance_rate: 0.05,
        }
    }
}

/// A convex four-sided outline, corners clockwise on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadCandidate {
    pub corners: [Point2<f64>; 4],
    pub perimeter: f64,
    pub area: f64,
}

impl QuadCandidate {
    /// Build from four vertices in either winding.
    ///
    /// The corners are reordered clockwise on screen, starting from the
    /// corner nearest the image origin (smallest `x + y`, then smallest `y`).
    pub fn from_vertices(mut corners: [Point2<f64>; 4]) -> Self {
        if oriented_contour_area(&as_points(&corners)) < 0.0 {
            corners.reverse();
        }
        let start = (0..4)
            .min_by(|&a, &b| {
                let (pa, pb) = (corners[a], corners[b]);
                (pa.x + pa.y)
                    .total_cmp(&(pb.x + pb.y))
                    .then(pa.y.total_cmp(&pb.y))
            })
            .unwrap_or(0);
        corners.rotate_left(start);

        let perimeter = (0..4)
            .map(|i| (corners[(i + 1) % 4] - corners[i]).norm())
            .sum();
        Self {
            corners,
            perimeter,
            area: contour_area(&as_points(&corners)),
        }
    }

    pub fn centroid(&self) -> Point2<f64> {
        let sum = self.corners.iter().fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
        Point2::from(sum / 4.0)
    }

    pub fn corners_f32(&self) -> [Point2<f32>; 4] {
        self.corners.map(|p| Point2::new(p.x as f32, p.y as f32))
    }

    /// Mean corner distance to `other` under the best cyclic alignment.
    fn corner_distance(&self, other: &Self) -> f64 {
        (0..4)
            .map(|shift| {
                (0..4)
                    .map(|i| (self.corners[i] - other.corners[(i + shift) % 4]).norm())
                    .sum::<f64>()
                    / 4.0
            })
            .fold(f64::INFINITY, f64::min)
    }
}

fn as_points(corners: &[Point2<f64>; 4]) -> [Point<f64>; 4] {
    corners.map(|p| Point::new(p.x, p.y))
}

fn quad_from_contour(contour: &Contour, cfg: &QuadSearchConfig) -> Option<QuadCandidate> {
    let epsilon = cfg.polygon_accuracy_rate * contour.perimeter();
    if contour.points.len() < 4 || epsilon.is_nan() || epsilon <= 0.0 {
        return None;
    }
    let approx: Vec<Point2<f64>> = approximate_polygon_dp(&contour.points, epsilon, true)
        .into_iter()
        .map(|p| Point2::new(p.x as f64, p.y as f64))
        .collect();
    if approx.len() != 4 || !is_convex(&approx) {
        return None;
    }
    let quad = QuadCandidate::from_vertices([approx[0], approx[1], approx[2], approx[3]]);

    let min_side = (0..4)
        .map(|i| (quad.corners[(i + 1) % 4] - quad.corners[i]).norm())
        .fold(f64::INFINITY, f64::min);
    if min_side < cfg.min_corner_distance_rate * quad.perimeter {
        return None;
    }
    Some(quad)
}

/// Find convex quad outlines of dark regions in `gray`.
///
/// Candidates are returned in discovery order (window order, then raster
/// order of the contours). Near-duplicates keep the larger outline.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(gray, cfg)))]
pub fn find_quad_candidates(gray: &GrayImage, cfg: &QuadSearchConfig) -> Vec<QuadCandidate> {
    let max_dim = gray.width().max(gray.height()) as f64;
    let min_perimeter = cfg.min_perimeter_rate * max_dim;
    let max_perimeter = cfg.max_perimeter_rate * max_dim;

    let mut out: Vec<QuadCandidate> = Vec::new();
    for &window in &cfg.threshold_windows {
        let mask = adaptive_threshold_mean_inv(gray, window, cfg.threshold_offset);
        let contours = outer_contours(&mask);
        log::trace!("window {window}: {} outer contours", contours.len());

        for contour in contours {
            // boundary pixel count approximates the perimeter cheaply
            let n = contour.points.len() as f64;
            if n < min_perimeter || n > max_perimeter {
                continue;
            }
            let Some(quad) = quad_from_contour(&contour, cfg) else {
                continue;
            };
            push_unique(&mut out, quad, cfg.duplicate_distance_rate);
        }
    }
    out
}

fn push_unique(out: &mut Vec<QuadCandidate>, quad: QuadCandidate, rate: f64) {
    for existing in out.iter_mut() {
        let tol = rate * existing.perimeter.min(quad.perimeter);
        if existing.corner_distance(&quad) < tol {
            if quad.perimeter > existing.perimeter {
                *existing = quad;
            }
            return;
        }
    }
    out.push(quad);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn vertices_are_ordered_clockwise_from_top_left() {
        let ccw = [p(10.0, 50.0), p(50.0, 50.0), p(50.0, 10.0), p(10.0, 10.0)];
        let q = QuadCandidate::from_vertices(ccw);
        assert_eq!(
            q.corners,
            [p(10.0, 10.0), p(50.0, 10.0), p(50.0, 50.0), p(10.0, 50.0)]
        );
        assert_eq!(q.perimeter, 160.0);
        assert_eq!(q.area, 1600.0);
    }

    #[test]
    fn finds_one_quad_per_dark_square() {
        let mut img = GrayImage::from_pixel(200, 160, Luma([230]));
        for y in 40..100 {
            for x in 30..90 {
                img.put_pixel(x, y, Luma([20]));
            }
        }
        // a dark disc is not a quad
        for y in 0..160i32 {
            for x in 0..200i32 {
                if (x - 150).pow(2) + (y - 80).pow(2) <= 25 * 25 {
                    img.put_pixel(x as u32, y as u32, Luma([20]));
                }
            }
        }

        let quads = find_quad_candidates(&img, &QuadSearchConfig::default());
        assert_eq!(quads.len(), 1, "{quads:?}");
        assert_eq!(
            quads[0].corners,
            [p(30.0, 40.0), p(89.0, 40.0), p(89.0, 99.0), p(30.0, 99.0)]
        );
    }
}
