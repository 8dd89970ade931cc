use marker_measure_aruco::LocateError;

/// Malformed input pixel buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidImageError {
    #[error("invalid image dimensions (width={width}, height={height})")]
    ZeroDimensions { width: u32, height: u32 },
    #[error("unsupported channel count {channels} (expected 1 or 3)")]
    UnsupportedChannels { channels: u8 },
    #[error("invalid pixel buffer length (expected {expected} bytes, got {got})")]
    BufferLength { expected: usize, got: usize },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("degenerate marker outline (perimeter={perimeter} px)")]
    DegenerateMarker { perimeter: f64 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("no objects to select from")]
    EmptyObjectSet,
}

/// Failure of one pipeline invocation. Every stage fails fast; no partial
/// results are returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidImage(#[from] InvalidImageError),
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error("no fiducial marker found")]
    MarkerNotFound,
    #[error("{count} markers found, expected exactly one")]
    AmbiguousMarker { count: usize },
    #[error("degenerate marker outline (perimeter={perimeter} px)")]
    DegenerateMarker { perimeter: f64 },
    #[error("no objects above the minimum contour area")]
    EmptyObjectSet,
}

impl From<LocateError> for PipelineError {
    fn from(err: LocateError) -> Self {
        match err {
            LocateError::MarkerNotFound => Self::MarkerNotFound,
            LocateError::AmbiguousMarker { count } => Self::AmbiguousMarker { count },
            LocateError::InvalidDictionary { reason } => Self::InvalidConfig { reason },
        }
    }
}

impl From<CalibrationError> for PipelineError {
    fn from(err: CalibrationError) -> Self {
        match err {
            CalibrationError::DegenerateMarker { perimeter } => {
                Self::DegenerateMarker { perimeter }
            }
        }
    }
}

impl From<SelectError> for PipelineError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::EmptyObjectSet => Self::EmptyObjectSet,
        }
    }
}

/// Errors of the file and codec collaborators around the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum MeasureIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    InvalidImage(#[from] InvalidImageError),
    #[error("invalid font file {path}")]
    Font { path: std::path::PathBuf },
}
