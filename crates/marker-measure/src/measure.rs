//! Oriented-box measurement and extremal selection.

use marker_measure_core::{min_area_rect, Contour, RotatedRect};
use serde::{Deserialize, Serialize};

use crate::{ScaleRatio, SelectError};

/// Physical width and height of one object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSize {
    pub width: f64,
    pub height: f64,
}

/// One measured object: its pixel-space box and physical size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Minimum-area rectangle around the contour, in pixels.
    pub pixel_box: RotatedRect,
    /// Enclosed contour area in px².
    pub contour_area: f64,
    pub size: PhysicalSize,
}

/// Fit the minimum-area rectangle to `contour` and convert it to physical
/// units. Returns `None` for an empty contour.
pub fn measure_contour(contour: &Contour, scale: ScaleRatio) -> Option<Measurement> {
    let pixel_box = min_area_rect(&contour.points)?;
    Some(Measurement {
        contour_area: contour.area(),
        size: PhysicalSize {
            width: scale.to_physical(pixel_box.width),
            height: scale.to_physical(pixel_box.height),
        },
        pixel_box,
    })
}

/// Index of the tallest measurement; the first of equal maxima wins.
pub fn select_tallest(measurements: &[Measurement]) -> Result<usize, SelectError> {
    let mut best: Option<(usize, f64)> = None;
    for (i, m) in measurements.iter().enumerate() {
        if best.is_none_or(|(_, h)| m.size.height > h) {
            best = Some((i, m.size.height));
        }
    }
    best.map(|(i, _)| i).ok_or(SelectError::EmptyObjectSet)
}
