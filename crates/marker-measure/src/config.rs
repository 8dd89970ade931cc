//! Pipeline configuration with documented defaults and JSON I/O.

use std::fs;
use std::path::Path;

use marker_measure_aruco::LocateConfig;
use marker_measure_core::MAX_THRESHOLD_WINDOW;
use serde::{Deserialize, Serialize};

use crate::{MeasureIoError, PipelineError};

/// How the marker's own region is kept out of the measured object set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerExclusion {
    /// Segment the raw mask; a large enough marker is measured like any object.
    None,
    /// Clear the mask inside the marker quad before contour tracing. The quad
    /// is scaled by `1 + margin_frac` about its centroid first.
    MaskMarker { margin_frac: f64 },
}

impl Default for MarkerExclusion {
    fn default() -> Self {
        Self::MaskMarker { margin_frac: 0.1 }
    }
}

/// Foreground segmentation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Adaptive threshold window (odd, at least 3).
    pub threshold_window: u32,
    /// A pixel is foreground when it is darker than its local mean by at
    /// least this much.
    pub threshold_offset: f64,
    /// Inclusive minimum enclosed contour area in px².
    pub min_contour_area: f64,
    pub marker_exclusion: MarkerExclusion,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            threshold_window: 19,
            threshold_offset: 5.0,
            min_contour_area: 3000.0,
            marker_exclusion: MarkerExclusion::default(),
        }
    }
}

/// Overlay rendering options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    /// Produce an annotated copy of the input.
    pub enabled: bool,
    /// Unit label used in the width/height captions.
    pub unit: String,
    /// Caption height in pixels.
    pub font_scale: f32,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            unit: "cm".to_string(),
            font_scale: 24.0,
        }
    }
}

/// Everything one pipeline invocation needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub marker: LocateConfig,
    /// Full physical perimeter of the marker outline (4 × side length).
    pub marker_physical_perimeter: f64,
    pub segment: SegmentConfig,
    pub annotate: AnnotateConfig,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            marker: LocateConfig::default(),
            marker_physical_perimeter: 20.0,
            segment: SegmentConfig::default(),
            annotate: AnnotateConfig::default(),
        }
    }
}

fn invalid(reason: impl Into<String>) -> PipelineError {
    PipelineError::InvalidConfig {
        reason: reason.into(),
    }
}

fn check_window(name: &str, window: u32) -> Result<(), PipelineError> {
    if window < 3 || window % 2 == 0 || window > MAX_THRESHOLD_WINDOW {
        return Err(invalid(format!(
            "{name} must be odd and in 3..={MAX_THRESHOLD_WINDOW} (got {window})"
        )));
    }
    Ok(())
}

impl MeasureConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let p = self.marker_physical_perimeter;
        if !p.is_finite() || p <= 0.0 {
            return Err(invalid(format!("marker_physical_perimeter must be positive (got {p})")));
        }

        self.marker
            .dictionary
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        let search = &self.marker.search;
        if search.threshold_windows.is_empty() {
            return Err(invalid("marker.search.threshold_windows is empty"));
        }
        for &w in &search.threshold_windows {
            check_window("marker.search.threshold_windows", w)?;
        }
        if search.min_perimeter_rate >= search.max_perimeter_rate {
            return Err(invalid("marker perimeter rates must satisfy min < max"));
        }
        let accuracy = search.polygon_accuracy_rate;
        if !accuracy.is_finite() || accuracy <= 0.0 {
            return Err(invalid(format!(
                "marker.search.polygon_accuracy_rate must be positive (got {accuracy})"
            )));
        }

        check_window("segment.threshold_window", self.segment.threshold_window)?;
        let area = self.segment.min_contour_area;
        if !area.is_finite() || area < 0.0 {
            return Err(invalid(format!("segment.min_contour_area must be >= 0 (got {area})")));
        }
        if let MarkerExclusion::MaskMarker { margin_frac } = self.segment.marker_exclusion {
            if !margin_frac.is_finite() || margin_frac < 0.0 {
                return Err(invalid(format!("margin_frac must be >= 0 (got {margin_frac})")));
            }
        }
        Ok(())
    }

    /// Load a JSON config from disk. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, MeasureIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), MeasureIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
