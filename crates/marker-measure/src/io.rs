//! Image decoding, JSON reports and result sinks.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use image::{ImageReader, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{MeasureIoError, MeasurementResult, PhysicalSize, PixelBuffer};

/// Decode an encoded image (PNG, JPEG, ...) held in memory.
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer, MeasureIoError> {
    let img = image::load_from_memory(bytes)?;
    Ok(PixelBuffer::from_dynamic(img)?)
}

/// Read and decode an image file; the format is guessed from its content.
pub fn load_image(path: impl AsRef<Path>) -> Result<PixelBuffer, MeasureIoError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(PixelBuffer::from_dynamic(img)?)
}

/// Load a TrueType/OpenType font for captions.
pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc, MeasureIoError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    FontArc::try_from_vec(bytes).map_err(|_| MeasureIoError::Font {
        path: path.to_path_buf(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReport {
    pub width: f64,
    pub height: f64,
    pub center: [f64; 2],
    pub angle_deg: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

/// JSON summary of one measurement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub image_path: Option<String>,
    pub unit: String,
    pub marker_id: Option<u32>,
    pub marker_corners: [[f32; 2]; 4],
    pub pixels_per_unit: f64,
    pub objects: Vec<ObjectReport>,
    pub list_width: Vec<f64>,
    pub list_height: Vec<f64>,
    pub selected_index: usize,
    pub selected_height: f64,
}

impl MeasurementReport {
    pub fn from_result(result: &MeasurementResult, image_path: Option<&Path>, unit: &str) -> Self {
        let objects: Vec<ObjectReport> = result
            .measurements
            .iter()
            .map(|m| ObjectReport {
                width: m.size.width,
                height: m.size.height,
                center: [m.pixel_box.center.x, m.pixel_box.center.y],
                angle_deg: m.pixel_box.angle_deg,
                pixel_width: m.pixel_box.width,
                pixel_height: m.pixel_box.height,
            })
            .collect();

        Self {
            image_path: image_path.map(|p| p.display().to_string()),
            unit: unit.to_string(),
            marker_id: result.marker.id,
            marker_corners: result.marker.corners.map(|p| [p.x, p.y]),
            pixels_per_unit: result.scale.pixels_per_unit(),
            list_width: objects.iter().map(|o| o.width).collect(),
            list_height: objects.iter().map(|o| o.height).collect(),
            selected_index: result.selected,
            selected_height: result.selected_measurement().size.height,
            objects,
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, MeasureIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), MeasureIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Consumer of finished measurements (storage, transport, ...).
pub trait MeasurementSink {
    fn accept(
        &mut self,
        annotated: Option<&RgbImage>,
        sizes: &[PhysicalSize],
        selected: usize,
    ) -> Result<(), MeasureIoError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SinkSummary {
    list_width: Vec<f64>,
    list_height: Vec<f64>,
    selected_index: usize,
    selected_height: Option<f64>,
}

/// Writes `Result-<stem>.png` and `Result-<stem>.json` into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    stem: String,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    pub fn image_path(&self) -> PathBuf {
        self.dir.join(format!("Result-{}.png", self.stem))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(format!("Result-{}.json", self.stem))
    }
}

impl MeasurementSink for DirectorySink {
    fn accept(
        &mut self,
        annotated: Option<&RgbImage>,
        sizes: &[PhysicalSize],
        selected: usize,
    ) -> Result<(), MeasureIoError> {
        fs::create_dir_all(&self.dir)?;
        if let Some(img) = annotated {
            img.save(self.image_path())?;
        }
        let summary = SinkSummary {
            list_width: sizes.iter().map(|s| s.width).collect(),
            list_height: sizes.iter().map(|s| s.height).collect(),
            selected_index: selected,
            selected_height: sizes.get(selected).map(|s| s.height),
        };
        fs::write(self.summary_path(), serde_json::to_string_pretty(&summary)?)?;
        log::info!("wrote results to {}", self.dir.display());
        Ok(())
    }
}
