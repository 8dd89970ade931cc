//! Dictionary metadata and packed marker codes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::DictionaryError;

/// A fixed ArUco-style code table.
///
/// The JSON layout matches the `*_CODES.json` files used by marker generators:
/// `{"name": "...", "marker_size": 5, "max_correction_bits": 3, "codes": [..]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Human-readable name (for debugging/logging).
    pub name: String,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    #[serde(default)]
    pub max_correction_bits: u8,
    /// One `u64` per marker id, encoding the inner `marker_size × marker_size` bits.
    ///
    /// Bits are stored in row-major order with **black = 1**.
    pub codes: Vec<u64>,
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Check that the table can be matched with `u64` codes.
    pub fn validate(&self) -> Result<(), DictionaryError> {
        validate_marker_size(self.marker_size)?;
        if self.codes.is_empty() {
            return Err(DictionaryError::Empty {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DictionaryError> {
        let dict: Self = serde_json::from_str(raw)?;
        dict.validate()?;
        Ok(dict)
    }

    /// Load and validate a dictionary from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

pub(crate) fn validate_marker_size(marker_size: usize) -> Result<(), DictionaryError> {
    if marker_size == 0 {
        return Err(DictionaryError::ZeroMarkerSize);
    }
    let bits = marker_size * marker_size;
    if bits > 64 {
        return Err(DictionaryError::TooManyBits { marker_size, bits });
    }
    Ok(())
}

/// Which marker family the locator accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerDictionary {
    /// Any bordered `marker_size × marker_size` bit grid whose inner bits
    /// mix black and white. No id is assigned.
    AnyCode { marker_size: usize },
    /// Only codes from an explicit table (ids and orientation available).
    Codes(Dictionary),
}

impl MarkerDictionary {
    #[inline]
    pub fn marker_size(&self) -> usize {
        match self {
            Self::AnyCode { marker_size } => *marker_size,
            Self::Codes(dict) => dict.marker_size,
        }
    }

    pub fn validate(&self) -> Result<(), DictionaryError> {
        match self {
            Self::AnyCode { marker_size } => validate_marker_size(*marker_size),
            Self::Codes(dict) => dict.validate(),
        }
    }
}

impl Default for MarkerDictionary {
    /// Any bordered 5x5 bit grid.
    fn default() -> Self {
        Self::AnyCode { marker_size: 5 }
    }
}
