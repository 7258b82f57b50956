//! Convenience re-exports for crates that consume the model wholesale.

pub use crate::access::{AccessPolicy, AccessState};
pub use crate::ids::{EpisodeId, ServerId};
pub use crate::markers::{SkipMarker, SkipMarkers, SkipWindow};
pub use crate::playback::{Category, PlaybackPosition};
pub use crate::source::{SourceCandidate, SourceList};
pub use crate::tracks::{EpisodeStreams, OverlayTracks, SubtitleTrack};
