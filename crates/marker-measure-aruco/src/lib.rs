//! Square fiducial marker location and decoding.
//!
//! This crate focuses on:
//! - marker dictionaries (explicit code tables loaded from JSON, or a
//!   border-validated bit-grid family without an id table),
//! - matching observed marker codes against a dictionary in all four
//!   rotations,
//! - finding quadrilateral candidates in an image and decoding their bit grid,
//! - selecting exactly one marker under an explicit policy.

mod candidates;
mod decode;
mod dictionary;
mod error;
mod locate;
mod matcher;

pub use candidates::{find_quad_candidates, QuadCandidate, QuadSearchConfig};
pub use decode::{decode_quad, MarkerObservation, ScanDecodeConfig};
pub use dictionary::{Dictionary, MarkerDictionary};
pub use error::{DictionaryError, LocateError};
pub use locate::{
    locate_all, locate_marker, LocateConfig, MarkerDetection, MarkerLocator,
    MultipleMarkerPolicy,
};
pub use matcher::{rotate_code_u64, Match, Matcher};
