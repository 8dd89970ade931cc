//! Core image and geometry utilities for marker-based measurement.
//!
//! This crate is intentionally small. It knows nothing about markers or
//! physical units: it binarizes images, traces region boundaries and fits
//! rotated rectangles to point sets. Polygon measures (area, arc length,
//! hulls, simplification) are taken from `imageproc::geometry`.

mod contour;
mod geometry;
mod homography;
mod logger;
mod threshold;
mod view;

pub use contour::{external_contours, outer_contours, Contour};
pub use geometry::{is_convex, min_area_rect, point_in_convex_polygon, RotatedRect};
pub use homography::{homography_from_4pt, Homography};
pub use threshold::{
    adaptive_threshold_mean_inv, otsu_threshold_from_samples, MASK_ON, MAX_THRESHOLD_WINDOW,
};
pub use view::{sample_mean_3x3, GrayImageView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init, init_with_level, parse_level, LogSettings};
