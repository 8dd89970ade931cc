//! Marker locator: quad candidates -> decoded markers -> one selected marker.

use image::GrayImage;
use log::{debug, warn};
use marker_measure_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::candidates::{find_quad_candidates, QuadCandidate, QuadSearchConfig};
use crate::decode::{decode_quad, MarkerObservation, ScanDecodeConfig};
use crate::{DictionaryError, LocateError, MarkerDictionary, Matcher};

/// What to do when more than one marker decodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleMarkerPolicy {
    /// Keep the largest marker by area; ties go to the lowest id, then to the
    /// top-most, left-most centroid.
    #[default]
    Largest,
    /// Fail with [`LocateError::AmbiguousMarker`].
    Reject,
}

/// Marker locator configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateConfig {
    pub dictionary: MarkerDictionary,
    /// Bit errors tolerated when matching a code table.
    pub max_hamming: u8,
    pub search: QuadSearchConfig,
    pub scan: ScanDecodeConfig,
    pub multiple_markers: MultipleMarkerPolicy,
}

/// One decoded marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    /// Dictionary id; `None` for [`MarkerDictionary::AnyCode`].
    pub id: Option<u32>,
    /// Outline corners, clockwise on screen. With a code table `corners[0]`
    /// is the marker's own top-left corner.
    pub corners: [Point2<f32>; 4],
    /// Inner bits as read from the corner nearest the image origin.
    pub code: u64,
    pub hamming: u8,
    pub border_score: f32,
    /// Enclosed area of the outline in pixels².
    pub area: f64,
}

impl MarkerDetection {
    pub fn centroid(&self) -> Point2<f32> {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2::new(sx / 4.0, sy / 4.0)
    }

    /// Sum of the four side lengths in pixels.
    pub fn perimeter(&self) -> f64 {
        (0..4)
            .map(|i| (self.corners[(i + 1) % 4] - self.corners[i]).norm() as f64)
            .sum()
    }
}

#[derive(Clone, Debug)]
enum CodeCheck {
    Any { marker_size: usize },
    Table(Matcher),
}

/// Reusable marker locator for one configuration.
#[derive(Clone, Debug)]
pub struct MarkerLocator {
    cfg: LocateConfig,
    check: CodeCheck,
}

impl MarkerLocator {
    pub fn new(cfg: LocateConfig) -> Result<Self, DictionaryError> {
        cfg.dictionary.validate()?;
        let check = match &cfg.dictionary {
            MarkerDictionary::AnyCode { marker_size } => CodeCheck::Any {
                marker_size: *marker_size,
            },
            MarkerDictionary::Codes(dict) => CodeCheck::Table(Matcher::new(dict, cfg.max_hamming)?),
        };
        Ok(Self { cfg, check })
    }

    #[inline]
    pub fn config(&self) -> &LocateConfig {
        &self.cfg
    }

    fn marker_size(&self) -> usize {
        match &self.check {
            CodeCheck::Any { marker_size } => *marker_size,
            CodeCheck::Table(m) => m.marker_size(),
        }
    }

    /// Every marker in the image, in candidate discovery order.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip(self, gray),
            fields(width = gray.width(), height = gray.height())
        )
    )]
    pub fn locate_all(&self, gray: &GrayImage) -> Vec<MarkerDetection> {
        let view = GrayImageView::from(gray);
        let candidates = find_quad_candidates(gray, &self.cfg.search);
        debug!("{} quad candidates", candidates.len());

        candidates
            .iter()
            .filter_map(|quad| {
                let corners = quad.corners_f32();
                let obs = decode_quad(&view, &corners, self.marker_size(), &self.cfg.scan)?;
                self.accept(quad, corners, obs)
            })
            .collect()
    }

    fn accept(
        &self,
        quad: &QuadCandidate,
        mut corners: [Point2<f32>; 4],
        obs: MarkerObservation,
    ) -> Option<MarkerDetection> {
        match &self.check {
            CodeCheck::Any { marker_size } => {
                let bits = marker_size * marker_size;
                let full = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
                // a solid square is not a marker
                if obs.code == 0 || obs.code == full {
                    return None;
                }
                Some(MarkerDetection {
                    id: None,
                    corners,
                    code: obs.code,
                    hamming: 0,
                    border_score: obs.border_score,
                    area: quad.area,
                })
            }
            CodeCheck::Table(matcher) => {
                let m = matcher.match_code(obs.code)?;
                // the dictionary's top-left sits at our corner `rotation`
                corners.rotate_left(m.rotation as usize);
                Some(MarkerDetection {
                    id: Some(m.id),
                    corners,
                    code: obs.code,
                    hamming: m.hamming,
                    border_score: obs.border_score,
                    area: quad.area,
                })
            }
        }
    }

    /// Locate exactly one marker under the configured multiple-marker policy.
    pub fn locate(&self, gray: &GrayImage) -> Result<MarkerDetection, LocateError> {
        let mut markers = self.locate_all(gray);
        match markers.len() {
            0 => Err(LocateError::MarkerNotFound),
            1 => Ok(markers.remove(0)),
            count => match self.cfg.multiple_markers {
                MultipleMarkerPolicy::Reject => Err(LocateError::AmbiguousMarker { count }),
                MultipleMarkerPolicy::Largest => {
                    warn!("{count} markers found, keeping the largest");
                    markers.sort_by(compare_for_selection);
                    Ok(markers.remove(0))
                }
            },
        }
    }
}

fn compare_for_selection(a: &MarkerDetection, b: &MarkerDetection) -> std::cmp::Ordering {
    let (ca, cb) = (a.centroid(), b.centroid());
    b.area
        .total_cmp(&a.area)
        .then(a.id.unwrap_or(u32::MAX).cmp(&b.id.unwrap_or(u32::MAX)))
        .then(ca.y.total_cmp(&cb.y))
        .then(ca.x.total_cmp(&cb.x))
}

/// One-shot helper: build a locator and locate a single marker.
pub fn locate_marker(gray: &GrayImage, cfg: &LocateConfig) -> Result<MarkerDetection, LocateError> {
    MarkerLocator::new(cfg.clone())?.locate(gray)
}

/// One-shot helper returning every decoded marker.
pub fn locate_all(
    gray: &GrayImage,
    cfg: &LocateConfig,
) -> Result<Vec<MarkerDetection>, DictionaryError> {
    Ok(MarkerLocator::new(cfg.clone())?.locate_all(gray))
}
