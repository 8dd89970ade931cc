use std::path::PathBuf;

/// Errors produced while building or loading a marker dictionary.
#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error("marker_size {marker_size} implies {bits} bits > 64 (unsupported)")]
    TooManyBits { marker_size: usize, bits: usize },
    #[error("marker_size must be at least 1")]
    ZeroMarkerSize,
    #[error("dictionary `{name}` has no codes")]
    Empty { name: String },
    #[error("failed to read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors produced by the marker locator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("no fiducial marker found")]
    MarkerNotFound,
    #[error("{count} markers found, expected exactly one")]
    AmbiguousMarker { count: usize },
    #[error("invalid marker dictionary: {reason}")]
    InvalidDictionary { reason: String },
}

impl From<DictionaryError> for LocateError {
    fn from(err: DictionaryError) -> Self {
        Self::InvalidDictionary {
            reason: err.to_string(),
        }
    }
}
