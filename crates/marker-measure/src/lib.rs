//! Measure the physical size of objects in a photo using a square fiducial
//! marker of known size as the scale reference.
//!
//! One invocation runs a single linear pass:
//! - locate the marker and take its outline perimeter in pixels,
//! - derive pixels-per-unit from the marker's physical perimeter,
//! - binarize the image with an adaptive mean threshold and trace the
//!   external contours of dark objects above a minimum area,
//! - fit a minimum-area rotated rectangle to each contour and convert it to
//!   physical units,
//! - pick the tallest object and optionally render an annotated copy.
//!
//! ## Quickstart
//!
//! ```no_run
//! use marker_measure::{load_image, MeasureConfig, MeasurementPipeline};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = load_image("photo.jpg")?;
//! let pipeline = MeasurementPipeline::new(MeasureConfig::default())?;
//! let result = pipeline.run(&image)?;
//! let tallest = result.selected_measurement();
//! println!("{:.1} x {:.1}", tallest.size.width, tallest.size.height);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `marker_measure::core`: thresholding, contours and planar geometry.
//! - `marker_measure::aruco`: marker dictionaries, decoding and the locator.
//! - this crate: the pipeline stages, configuration, annotation and I/O.

pub use marker_measure_aruco as aruco;
pub use marker_measure_core as core;

mod annotate;
mod buffer;
mod calibrate;
mod config;
mod error;
mod io;
mod measure;
mod pipeline;
mod segment;

pub use annotate::Annotator;
pub use buffer::PixelBuffer;
pub use calibrate::{calibrate, marker_perimeter, ScaleRatio};
pub use config::{AnnotateConfig, MarkerExclusion, MeasureConfig, SegmentConfig};
pub use error::{CalibrationError, InvalidImageError, MeasureIoError, PipelineError, SelectError};
pub use io::{
    decode_image, load_font, load_image, DirectorySink, MeasurementReport, MeasurementSink,
    ObjectReport,
};
pub use measure::{measure_contour, select_tallest, Measurement, PhysicalSize};
pub use pipeline::{measure, MeasurementPipeline, MeasurementResult};
pub use segment::{segment, segment_mask};
