//! Binarization: local-mean adaptive thresholding and Otsu levels.

use image::{GrayImage, Luma};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Mask value for foreground pixels.
pub const MASK_ON: u8 = 255;

/// Largest adaptive threshold window; larger windows are clamped to it.
pub const MAX_THRESHOLD_WINDOW: u32 = 32_767;

/// Sum of `row[clamp(i + k)]` for `k` in `-r..=r`, for every `i`.
///
/// Out-of-range taps replicate the edge sample.
fn replicate_box_sums(row: &[u64], r: usize, out: &mut [u64]) {
    let n = row.len();
    let at = |i: isize| row[i.clamp(0, n as isize - 1) as usize];

    // window centred on 0: r + 1 copies of row[0], then row[1..=r] with the
    // tail replicating the last sample
    let inside = r.min(n - 1);
    let mut acc = (r as u64 + 1) * row[0]
        + row[1..=inside].iter().sum::<u64>()
        + (r - inside) as u64 * row[n - 1];
    let r = r as isize;
    out[0] = acc;
    for i in 1..n as isize {
        acc += at(i + r);
        acc -= at(i - r - 1);
        out[i as usize] = acc;
    }
}

/// Inverted adaptive threshold against the local mean.
///
/// A pixel becomes foreground ([`MASK_ON`]) when it is darker than the mean
/// of its `window × window` neighbourhood by at least `floor(offset)`, i.e.
/// `src - round(mean) <= -floor(offset)`. Image borders replicate the edge
/// pixels. An even `window` behaves like `window + 1`; windows above
/// [`MAX_THRESHOLD_WINDOW`] are clamped.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "trace", skip(src), fields(width = src.width(), height = src.height()))
)]
pub fn adaptive_threshold_mean_inv(src: &GrayImage, window: u32, offset: f64) -> GrayImage {
    let (w, h) = src.dimensions();
    let mut mask = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return mask;
    }

    let (wu, hu) = (w as usize, h as usize);
    let r = (window.clamp(3, MAX_THRESHOLD_WINDOW) / 2) as usize;
    let area = ((2 * r + 1) * (2 * r + 1)) as u64;
    let delta = offset.floor() as i32;

    // horizontal pass
    let mut horiz = vec![0u64; wu * hu];
    let mut row = vec![0u64; wu];
    for y in 0..hu {
        for (x, v) in row.iter_mut().enumerate() {
            *v = src.get_pixel(x as u32, y as u32)[0] as u64;
        }
        replicate_box_sums(&row, r, &mut horiz[y * wu..(y + 1) * wu]);
    }

    // vertical pass, column by column
    let mut col = vec![0u64; hu];
    let mut sums = vec![0u64; hu];
    for x in 0..wu {
        for (y, v) in col.iter_mut().enumerate() {
            *v = horiz[y * wu + x];
        }
        replicate_box_sums(&col, r, &mut sums);
        for (y, &sum) in sums.iter().enumerate() {
            let mean = ((sum + area / 2) / area) as i32;
            let v = src.get_pixel(x as u32, y as u32)[0] as i32;
            if v - mean <= -delta {
                mask.put_pixel(x as u32, y as u32, Luma([MASK_ON]));
            }
        }
    }

    mask
}

/// Compute Otsu threshold from a set of sample intensities.
///
/// Values `<= t` form the dark class.
pub fn otsu_threshold_from_samples(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 127;
    }

    let (min_v, max_v) = samples
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min_v == max_v {
        return min_v;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    if hist.iter().filter(|&&h| h > 0).count() <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}
