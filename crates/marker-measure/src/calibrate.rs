//! Marker perimeter to pixels-per-unit conversion.

use imageproc::geometry::{arc_length, contour_area};
use imageproc::point::Point;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::CalibrationError;

/// Pixels per physical unit, derived once per image from the marker.
///
/// Always finite and strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleRatio(f64);

impl ScaleRatio {
    #[inline]
    pub fn pixels_per_unit(self) -> f64 {
        self.0
    }

    /// Convert a pixel length to physical units.
    #[inline]
    pub fn to_physical(self, px: f64) -> f64 {
        px / self.0
    }
}

/// Outlines enclosing less than this fraction of `perimeter²` are flat.
const MIN_AREA_RATIO: f64 = 1e-6;

fn outline(corners: &[Point2<f32>; 4]) -> [Point<f32>; 4] {
    corners.map(|p| Point::new(p.x, p.y))
}

/// Closed perimeter of the marker outline in pixels.
pub fn marker_perimeter(corners: &[Point2<f32>; 4]) -> f64 {
    arc_length(&outline(corners), true)
}

/// Ratio of the marker's pixel perimeter to its physical perimeter.
///
/// Fails for outlines with no extent or no enclosed area (coincident or
/// collinear corners).
pub fn calibrate(
    corners: &[Point2<f32>; 4],
    physical_perimeter: f64,
) -> Result<ScaleRatio, CalibrationError> {
    let perimeter = marker_perimeter(corners);
    let area = contour_area(&outline(corners));
    let ratio = perimeter / physical_perimeter;
    let flat = !(area.is_finite() && area >= MIN_AREA_RATIO * perimeter * perimeter);
    if !perimeter.is_finite() || perimeter <= 0.0 || flat || !ratio.is_finite() || ratio <= 0.0 {
        return Err(CalibrationError::DegenerateMarker { perimeter });
    }
    log::debug!("marker perimeter {perimeter:.2} px -> {ratio:.4} px/unit");
    Ok(ScaleRatio(ratio))
}
