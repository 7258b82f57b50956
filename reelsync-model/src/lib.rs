//! Core data model definitions shared across reelsync crates.
#![allow(missing_docs)]

pub mod access;
pub mod error;
pub mod ids;
pub mod markers;
pub mod playback;
pub mod prelude;
pub mod source;
pub mod tracks;

// Intentionally curated re-exports for downstream consumers.
pub use access::{AccessPolicy, AccessState};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{EpisodeId, ServerId};
pub use markers::{SkipMarker, SkipMarkers, SkipWindow};
pub use playback::{Category, PlaybackPosition};
pub use source::{SourceCandidate, SourceList};
pub use tracks::{EpisodeStreams, OverlayTracks, SubtitleTrack};
