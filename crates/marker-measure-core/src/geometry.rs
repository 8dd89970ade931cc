//! Convexity tests and minimum-area rectangle fitting.
//!
//! Shoelace areas, arc lengths, convex hulls and Douglas–Peucker
//! simplification come from [`imageproc::geometry`]. The rectangle fit here
//! stays in `f64`: `imageproc::geometry::min_area_rect` needs `T: Ord` and
//! rounds the box corners to integers, which would lose the sub-pixel
//! extents the measurement reports.

use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

#[inline]
fn cross(o: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

#[inline]
pub(crate) fn to_point2(p: Point<i32>) -> Point2<f64> {
    Point2::new(p.x as f64, p.y as f64)
}

/// True when every turn of the closed polygon has the same sign.
pub fn is_convex(pts: &[Point2<f64>]) -> bool {
    let n = pts.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..n {
        let c = cross(pts[i], pts[(i + 1) % n], pts[(i + 2) % n]);
        if c.abs() < 1e-12 {
            continue;
        }
        if sign == 0.0 {
            sign = c.signum();
        } else if c.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Inclusive point-in-polygon test for convex polygons of either winding.
pub fn point_in_convex_polygon(p: Point2<f64>, poly: &[Point2<f64>]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..n {
        let c = cross(poly[i], poly[(i + 1) % n], p);
        if c == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = c.signum();
        } else if c.signum() != sign {
            return false;
        }
    }
    true
}

/// Oriented rectangle fitted to a point set.
///
/// `width` is the extent along the box axis whose direction lies within
/// (-45°, 45°] of the image x-axis and `height` is the extent along the
/// perpendicular axis. `angle_deg` is the signed rotation of the width
/// axis from the image x-axis (clockwise on screen for positive values).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2<f64>,
    pub width: f64,
    pub height: f64,
    pub angle_deg: f64,
}

impl RotatedRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Corner points, clockwise on screen starting from the top-left of the
    /// unrotated box.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let a = self.angle_deg.to_radians();
        let u = Vector2::new(a.cos(), a.sin()) * (0.5 * self.width);
        let v = Vector2::new(-a.sin(), a.cos()) * (0.5 * self.height);
        let c = self.center;
        [c - u - v, c + u - v, c + u + v, c - u + v]
    }
}

/// Normalize an edge direction into the (-45°, 45°] width-axis convention.
fn width_axis_angle(dir: Vector2<f64>) -> f64 {
    let raw = dir.y.atan2(dir.x);
    let mut a = raw - FRAC_PI_2 * (raw / FRAC_PI_2).round();
    if a <= -FRAC_PI_4 + 1e-12 {
        a += FRAC_PI_2;
    }
    a
}

/// Minimum-area enclosing rectangle of an integer point set.
///
/// Every convex hull edge is tried as a box side (the rotating-calipers
/// candidate set); the first minimal box in hull order wins. Returns `None`
/// for an empty input.
pub fn min_area_rect(points: &[Point<i32>]) -> Option<RotatedRect> {
    // the hull's angular sort needs distinct points
    let mut pts = points.to_vec();
    pts.sort_by_key(|p| (p.y, p.x));
    pts.dedup();
    let hull: Vec<Point2<f64>> = convex_hull(pts).into_iter().map(to_point2).collect();

    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: hull[0],
                width: 0.0,
                height: 0.0,
                angle_deg: 0.0,
            })
        }
        _ => {}
    }

    let n = hull.len();
    let mut best: Option<(f64, RotatedRect)> = None;
    for i in 0..n {
        let edge = hull[(i + 1) % n] - hull[i];
        if edge.norm() < 1e-12 {
            continue;
        }
        let a = width_axis_angle(edge);
        let u = Vector2::new(a.cos(), a.sin());
        let v = Vector2::new(-a.sin(), a.cos());

        let (mut u_min, mut u_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &hull {
            let pu = p.coords.dot(&u);
            let pv = p.coords.dot(&v);
            u_min = u_min.min(pu);
            u_max = u_max.max(pu);
            v_min = v_min.min(pv);
            v_max = v_max.max(pv);
        }

        let width = u_max - u_min;
        let height = v_max - v_min;
        let area = width * height;
        if best.as_ref().is_some_and(|(b, _)| area >= *b - 1e-9) {
            continue;
        }

        let center = u * (0.5 * (u_min + u_max)) + v * (0.5 * (v_min + v_max));
        best = Some((
            area,
            RotatedRect {
                center: Point2::from(center),
                width,
                height,
                angle_deg: a.to_degrees(),
            },
        ));
    }

    best.map(|(_, r)| r)
}
