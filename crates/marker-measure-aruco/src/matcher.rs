//! Dictionary matching and rotation helpers.

use crate::{Dictionary, DictionaryError};

/// A dictionary match for an observed marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Rotation `0..=3` such that: `observed_code == rotate(dict_code, rotation)`.
    pub rotation: u8,
    /// Hamming distance between observed and dictionary code (after rotation).
    pub hamming: u8,
}

/// Brute-force matcher over all ids and the four rotations of each code.
#[derive(Clone, Debug)]
pub struct Matcher {
    marker_size: usize,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// Build a matcher; `max_hamming` is clamped to the dictionary's
    /// `max_correction_bits`.
    pub fn new(dict: &Dictionary, max_hamming: u8) -> Result<Self, DictionaryError> {
        dict.validate()?;
        let n = dict.marker_size;
        let rotated = dict
            .codes
            .iter()
            .map(|&base| [0, 1, 2, 3].map(|rot| rotate_code_u64(base, n, rot)))
            .collect();

        Ok(Self {
            marker_size: n,
            max_hamming: max_hamming.min(dict.max_correction_bits),
            rotated,
        })
    }

    #[inline]
    pub fn marker_size(&self) -> usize {
        self.marker_size
    }

    /// Maximum Hamming distance allowed for matches.
    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Find the best match within `max_hamming`; ties keep the lowest id and rotation.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        let mut best: Option<Match> = None;

        for (id, rots) in self.rotated.iter().enumerate() {
            for (rot, &cand) in rots.iter().enumerate() {
                let h = (observed ^ cand).count_ones() as u8;
                if h > self.max_hamming {
                    continue;
                }
                if best.is_some_and(|prev| h >= prev.hamming) {
                    continue;
                }
                best = Some(Match {
                    id: id as u32,
                    rotation: rot as u8,
                    hamming: h,
                });
                if h == 0 {
                    return best;
                }
            }
        }

        best
    }
}

/// Rotate a code stored in row-major bits: `idx = y * N + x`.
///
/// One step turns the bit grid 90° clockwise as seen on screen.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    let rot = rot & 3;
    if rot == 0 {
        return code;
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match rot {
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            let bit = (code >> (sy * n + sx)) & 1;
            out |= bit << (y * n + x);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dict() -> Dictionary {
        Dictionary {
            name: "TEST_5X5_3".to_string(),
            marker_size: 5,
            max_correction_bits: 2,
            codes: vec![0x1A2_B3C4, 0x05E_6F70, 0x0F0_F0F1],
        }
    }

    #[test]
    fn rotate_four_times_is_identity() {
        let code = 0x0123_4567_89ab_cdef_u64;
        let r = (0..4).fold(code, |c, _| rotate_code_u64(c, 8, 1));
        assert_eq!(code, r);
    }

    #[test]
    fn single_rotation_moves_top_left_to_top_right() {
        // 2x2 grid with only the top-left bit set
        assert_eq!(rotate_code_u64(0b0001, 2, 1), 0b0010);
        assert_eq!(rotate_code_u64(0b0001, 2, 2), 0b1000);
        assert_eq!(rotate_code_u64(0b0001, 2, 3), 0b0100);
    }

    #[test]
    fn matcher_finds_rotated_code() {
        let dict = test_dict();
        let matcher = Matcher::new(&dict, 0).expect("matcher");

        let observed = rotate_code_u64(dict.codes[1], dict.marker_size, 3);
        let m = matcher.match_code(observed).expect("match");
        assert_eq!(m.id, 1);
        assert_eq!(m.rotation, 3);
        assert_eq!(m.hamming, 0);
    }

    #[test]
    fn hamming_budget_is_clamped_to_dictionary() {
        let dict = test_dict();
        let matcher = Matcher::new(&dict, 9).expect("matcher");
        assert_eq!(matcher.max_hamming(), 2);

        let noisy = dict.codes[0] ^ 0b1;
        let m = matcher.match_code(noisy).expect("match");
        assert_eq!((m.id, m.hamming), (0, 1));

        let strict = Matcher::new(&dict, 0).expect("matcher");
        assert!(strict.match_code(noisy).is_none());
    }
}
