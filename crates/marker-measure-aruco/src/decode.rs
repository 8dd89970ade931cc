//! Bit-grid decoding of one marker quad.

use marker_measure_core::{homography_from_4pt, otsu_threshold_from_samples, sample_mean_3x3};
use marker_measure_core::{GrayImageView, Homography};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Decoder configuration for reading a marker's bit grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanDecodeConfig {
    /// Marker border width in cells (ArUco markers use 1).
    pub border_bits: usize,
    /// Require border-black ratio >= this.
    pub min_border_score: f32,
    /// Also accept white-bordered (inverted) markers.
    pub detect_inverted: bool,
}

impl Default for ScanDecodeConfig {
    fn default() -> Self {
        Self {
            border_bits: 1,
            min_border_score: 0.85,
            detect_inverted: false,
        }
    }
}

/// Raw bits read from a quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerObservation {
    /// Inner bits, row-major, black = 1, read with `corners[0]` as top-left.
    pub code: u64,
    /// Fraction of border cells that read black.
    pub border_score: f32,
    /// Whether polarity was inverted to satisfy the border.
    pub inverted: bool,
}

/// Smallest cell pitch that still fits a 3x3 sampling window.
const MIN_CELL_PX: f32 = 3.0;
const THRESH_SUBDIV: usize = 3;
/// Cell samples spanning fewer grey levels than this cannot hold a border.
const MIN_CONTRAST: u8 = 10;

/// Cell-centre and threshold sample positions in the canonical square `[0, s]²`.
struct SampleGrid {
    cells: usize,
    points: Vec<Point2<f32>>, // row-major: cy * cells + cx
    threshold_points: Vec<Point2<f32>>,
}

impl SampleGrid {
    fn new(cfg: &ScanDecodeConfig, bits: usize, side: f32) -> Option<Self> {
        if bits == 0 || bits * bits > 64 {
            return None;
        }
        let cells = bits + 2 * cfg.border_bits;

        let step = side / cells as f32;
        if !step.is_finite() || step < MIN_CELL_PX {
            return None;
        }
        let points = grid_points(0.0, step, cells);

        let sub = cells * THRESH_SUBDIV;
        let threshold_points = grid_points(0.0, side / sub as f32, sub);

        Some(Self {
            cells,
            points,
            threshold_points,
        })
    }
}

fn grid_points(start: f32, step: f32, n: usize) -> Vec<Point2<f32>> {
    (0..n)
        .flat_map(|cy| {
            (0..n).map(move |cx| {
                Point2::new(
                    start + (cx as f32 + 0.5) * step,
                    start + (cy as f32 + 0.5) * step,
                )
            })
        })
        .collect()
}

fn mean_side(corners: &[Point2<f32>; 4]) -> f32 {
    (0..4)
        .map(|i| (corners[(i + 1) % 4] - corners[i]).norm())
        .sum::<f32>()
        / 4.0
}

/// Read the bit grid of the marker whose outline is `corners`.
///
/// `corners` must run clockwise on screen; `corners[0]` is treated as the
/// top-left of the grid. Returns `None` when the quad is too small, leaves
/// the image, or its border does not read as black.
pub fn decode_quad(
    image: &GrayImageView<'_>,
    corners: &[Point2<f32>; 4],
    marker_size: usize,
    cfg: &ScanDecodeConfig,
) -> Option<MarkerObservation> {
    let side = mean_side(corners);
    let grid = SampleGrid::new(cfg, marker_size, side)?;
    let square = [
        Point2::new(0.0, 0.0),
        Point2::new(side, 0.0),
        Point2::new(side, side),
        Point2::new(0.0, side),
    ];
    let h = homography_from_4pt(&square, corners)?;

    let samples = sample_through(image, &h, &grid.points)?;
    // threshold samples may partially fall off the image
    let thr_samples: Vec<u8> = grid
        .threshold_points
        .iter()
        .filter_map(|p| {
            let q = h.apply(*p);
            sample_mean_3x3(image, q.x, q.y)
        })
        .collect();

    decode_samples(&samples, &thr_samples, grid.cells, marker_size, cfg)
}

fn sample_through(
    image: &GrayImageView<'_>,
    h: &Homography,
    points: &[Point2<f32>],
) -> Option<Vec<u8>> {
    points
        .iter()
        .map(|p| {
            let q = h.apply(*p);
            sample_mean_3x3(image, q.x, q.y)
        })
        .collect()
}

fn decode_samples(
    samples: &[u8],
    thr_samples: &[u8],
    cells: usize,
    bits: usize,
    cfg: &ScanDecodeConfig,
) -> Option<MarkerObservation> {
    if samples.len() != cells * cells {
        return None;
    }
    let lo = samples.iter().copied().min()?;
    let hi = samples.iter().copied().max()?;
    if hi - lo < MIN_CONTRAST {
        return None;
    }

    // the Otsu level is the top of the dark class
    let thr = if thr_samples.is_empty() {
        otsu_threshold_from_samples(samples)
    } else {
        otsu_threshold_from_samples(thr_samples)
    };

    let border = cfg.border_bits;
    let use_border = border > 0;
    let polarities: &[bool] = if cfg.detect_inverted {
        &[false, true]
    } else {
        &[false]
    };

    let mut best: Option<MarkerObservation> = None;
    for &inverted in polarities {
        let mut border_ok = 0u32;
        let mut border_total = 0u32;
        let mut code: u64 = 0;

        for cy in 0..cells {
            for cx in 0..cells {
                let is_black = (samples[cy * cells + cx] <= thr) != inverted;

                let is_border = use_border
                    && (cx < border
                        || cy < border
                        || cx + border >= cells
                        || cy + border >= cells);
                if is_border {
                    border_total += 1;
                    border_ok += is_black as u32;
                } else if is_black {
                    code |= 1u64 << ((cy - border) * bits + (cx - border));
                }
            }
        }

        let border_score = if use_border {
            border_ok as f32 / border_total.max(1) as f32
        } else {
            1.0
        };
        if border_score < cfg.min_border_score {
            continue;
        }
        if best.is_none_or(|b| border_score > b.border_score) {
            best = Some(MarkerObservation {
                code,
                border_score,
                inverted,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_measure_core::GrayImageView;

    /// Render a marker (border 1) of `bits × bits` at `cell_px` per cell with a
    /// white margin of `margin` pixels.
    fn render(code: u64, bits: usize, cell_px: usize, margin: usize) -> (Vec<u8>, usize) {
        let cells = bits + 2;
        let side = cells * cell_px + 2 * margin;
        let mut data = vec![255u8; side * side];
        for cy in 0..cells {
            for cx in 0..cells {
                let is_border = cx == 0 || cy == 0 || cx + 1 == cells || cy + 1 == cells;
                let black = is_border || (code >> ((cy - 1) * bits + (cx - 1))) & 1 == 1;
                if !black {
                    continue;
                }
                for yy in 0..cell_px {
                    for xx in 0..cell_px {
                        let x = margin + cx * cell_px + xx;
                        let y = margin + cy * cell_px + yy;
                        data[y * side + x] = 0;
                    }
                }
            }
        }
        (data, side)
    }

    fn outline(margin: usize, px: usize) -> [Point2<f32>; 4] {
        let a = margin as f32;
        let b = (margin + px - 1) as f32;
        [
            Point2::new(a, a),
            Point2::new(b, a),
            Point2::new(b, b),
            Point2::new(a, b),
        ]
    }

    #[test]
    fn reads_code_from_axis_aligned_marker() {
        let code = 0x1A2_B3C4;
        let (data, side) = render(code, 5, 12, 10);
        let view = GrayImageView {
            width: side,
            height: side,
            data: &data,
        };

        let obs = decode_quad(&view, &outline(10, 7 * 12), 5, &ScanDecodeConfig::default())
            .expect("decode");
        assert_eq!(obs.code, code);
        assert_eq!(obs.border_score, 1.0);
        assert!(!obs.inverted);
    }

    #[test]
    fn starting_corner_rotates_the_read_code() {
        let code = 0x05E_6F70;
        let (data, side) = render(code, 5, 12, 10);
        let view = GrayImageView {
            width: side,
            height: side,
            data: &data,
        };

        let mut corners = outline(10, 7 * 12);
        corners.rotate_left(1);
        let obs = decode_quad(&view, &corners, 5, &ScanDecodeConfig::default()).expect("decode");
        // reading from the old top-right corner sees the grid turned counter-clockwise
        assert_eq!(crate::rotate_code_u64(obs.code, 5, 1), code);
    }

    #[test]
    fn white_square_has_no_border() {
        let data = vec![255u8; 120 * 120];
        let view = GrayImageView {
            width: 120,
            height: 120,
            data: &data,
        };
        assert!(decode_quad(&view, &outline(10, 90), 5, &ScanDecodeConfig::default()).is_none());
    }

    #[test]
    fn two_level_samples_split_at_the_dark_class() {
        // border black, inner code alternating
        let cells = 7;
        let mut samples = vec![255u8; cells * cells];
        for cy in 0..cells {
            for cx in 0..cells {
                let border = cx == 0 || cy == 0 || cx + 1 == cells || cy + 1 == cells;
                if border || (cx + cy) % 2 == 0 {
                    samples[cy * cells + cx] = 0;
                }
            }
        }
        // threshold samples with a plateau of intermediate edge values
        let mut thr = vec![0u8; 200];
        thr.extend([40, 128, 200]);
        thr.extend(std::iter::repeat(255u8).take(200));

        let obs = decode_samples(&samples, &thr, cells, 5, &ScanDecodeConfig::default())
            .expect("decode");
        assert_eq!(obs.border_score, 1.0);
        assert_eq!(obs.code & 1, 1);
        assert_eq!((obs.code >> 1) & 1, 0);
    }
}
