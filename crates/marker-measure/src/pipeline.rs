//! End-to-end measurement: locate -> calibrate -> segment -> measure -> select.

use image::RgbImage;
use marker_measure_aruco::{MarkerDetection, MarkerLocator};
use log::{debug, info};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    calibrate, measure_contour, segment, select_tallest, Annotator, MeasureConfig, Measurement,
    MeasurementSink, MeasureIoError, PhysicalSize, PipelineError, PixelBuffer, ScaleRatio,
};

/// Output of one successful invocation.
#[derive(Clone, Debug)]
pub struct MeasurementResult {
    pub marker: MarkerDetection,
    pub scale: ScaleRatio,
    /// One entry per object contour, in contour discovery order.
    pub measurements: Vec<Measurement>,
    /// Index of the tallest measurement.
    pub selected: usize,
    pub annotated: Option<RgbImage>,
}

impl MeasurementResult {
    pub fn selected_measurement(&self) -> &Measurement {
        &self.measurements[self.selected]
    }

    pub fn sizes(&self) -> Vec<PhysicalSize> {
        self.measurements.iter().map(|m| m.size).collect()
    }

    /// Hand the annotated image and sizes to a sink.
    pub fn deliver(&self, sink: &mut dyn MeasurementSink) -> Result<(), MeasureIoError> {
        sink.accept(self.annotated.as_ref(), &self.sizes(), self.selected)
    }
}

/// Reusable pipeline for one configuration.
///
/// Holds no per-image state; `run` may be called concurrently from several
/// threads on independent images.
#[derive(Clone)]
pub struct MeasurementPipeline {
    cfg: MeasureConfig,
    locator: MarkerLocator,
    annotator: Annotator,
}

impl MeasurementPipeline {
    /// Validate `cfg` and prepare the marker locator.
    pub fn new(cfg: MeasureConfig) -> Result<Self, PipelineError> {
        cfg.validate()?;
        let locator =
            MarkerLocator::new(cfg.marker.clone()).map_err(|e| PipelineError::InvalidConfig {
                reason: e.to_string(),
            })?;
        let annotator = Annotator::new(&cfg.annotate);
        Ok(Self {
            cfg,
            locator,
            annotator,
        })
    }

    /// Replace the overlay renderer (e.g. one with a caption font).
    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    #[inline]
    pub fn config(&self) -> &MeasureConfig {
        &self.cfg
    }

    /// Measure every object in `image`.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image),
            fields(width = image.width(), height = image.height())
        )
    )]
    pub fn run(&self, image: &PixelBuffer) -> Result<MeasurementResult, PipelineError> {
        let gray = image.to_gray();

        let marker = self.locator.locate(&gray)?;
        debug!("marker {:?} at {:?}", marker.id, marker.corners);

        let scale = calibrate(&marker.corners, self.cfg.marker_physical_perimeter)?;

        let contours = segment(&gray, &self.cfg.segment, Some(&marker.corners));
        let measurements: Vec<Measurement> = contours
            .iter()
            .filter_map(|c| measure_contour(c, scale))
            .collect();
        let selected = select_tallest(&measurements)?;

        let tallest = &measurements[selected].size;
        info!(
            "{} objects at {:.3} px/unit; tallest #{selected}: {:.1} x {:.1}",
            measurements.len(),
            scale.pixels_per_unit(),
            tallest.width,
            tallest.height
        );

        let annotated = self
            .cfg
            .annotate
            .enabled
            .then(|| {
                self.annotator
                    .render(&image.to_rgb(), &marker.corners, &measurements)
            });

        Ok(MeasurementResult {
            marker,
            scale,
            measurements,
            selected,
            annotated,
        })
    }
}

/// One-shot helper: build a pipeline for `cfg` and run it on `image`.
pub fn measure(
    image: &PixelBuffer,
    cfg: &MeasureConfig,
) -> Result<MeasurementResult, PipelineError> {
    MeasurementPipeline::new(cfg.clone())?.run(image)
}
