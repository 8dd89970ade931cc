//! Boundary tracing over binary masks.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{arc_length, contour_area};
use imageproc::point::Point;
use nalgebra::{Point2, Vector2};

use crate::geometry::to_point2;

/// Closed boundary of one connected foreground region.
///
/// Points are the boundary pixel coordinates in tracing order.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    /// Area enclosed by the boundary polygon through the pixel centres.
    pub fn area(&self) -> f64 {
        contour_area(&self.points)
    }

    /// Length of the closed boundary polygon.
    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }

    /// Mean of the boundary points.
    pub fn centroid(&self) -> Option<Point2<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let sum = self
            .points
            .iter()
            .fold(Vector2::zeros(), |acc, &p| acc + to_point2(p).coords);
        Some(Point2::from(sum / n))
    }
}

fn trace(mask: &GrayImage, top_level_only: bool) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer))
        .filter(|c| !top_level_only || c.parent.is_none())
        .map(|c| Contour { points: c.points })
        .collect()
}

/// Outermost boundaries of the foreground regions of `mask` (non-zero = on).
///
/// Holes and regions nested inside holes are not reported. Contours come in
/// raster order of their first pixel: top-to-bottom, then left-to-right.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    trace(mask, true)
}

/// Outer boundaries of every foreground region, including regions nested
/// inside the holes of other regions.
pub fn outer_contours(mask: &GrayImage) -> Vec<Contour> {
    trace(mask, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32, v: u8) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([v]));
            }
        }
    }

    #[test]
    fn ring_reports_only_its_outer_boundary() {
        let mut mask = GrayImage::new(60, 60);
        fill(&mut mask, 10, 10, 40, 40, 255);
        fill(&mut mask, 20, 20, 20, 20, 0);
        // island inside the hole
        fill(&mut mask, 27, 27, 6, 6, 255);

        let external = external_contours(&mask);
        assert_eq!(external.len(), 1);
        assert_eq!(external[0].area(), 39.0 * 39.0);

        let outer = outer_contours(&mask);
        assert_eq!(outer.len(), 2);
        assert_eq!(outer[1].area(), 25.0);
    }

    #[test]
    fn contours_follow_raster_order() {
        let mut mask = GrayImage::new(100, 100);
        fill(&mut mask, 60, 5, 10, 10, 255);
        fill(&mut mask, 5, 40, 10, 10, 255);
        fill(&mut mask, 40, 40, 10, 10, 255);

        let cs = external_contours(&mask);
        assert_eq!(cs.len(), 3);
        let firsts: Vec<(i32, i32)> = cs
            .iter()
            .map(|c| {
                let top = c.points.iter().min_by_key(|p| (p.y, p.x)).expect("points");
                (top.x, top.y)
            })
            .collect();
        assert_eq!(firsts, vec![(60, 5), (5, 40), (40, 40)]);
        assert_eq!(cs[0].perimeter(), 36.0);

        let c = cs[0].centroid().expect("centroid");
        assert!((c.x - 64.5).abs() < 1e-9 && (c.y - 9.5).abs() < 1e-9);
    }
}
