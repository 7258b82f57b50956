//! Per-episode playback components.

pub mod access_gate;
pub mod clock;
pub mod fallback;
pub mod secondary_audio;
pub mod skip_markers;
pub mod subtitles;
pub mod transport;

pub use access_gate::{AccessGate, GateVerdict};
pub use clock::PlaybackClock;
pub use fallback::{FallbackOutcome, ResumePoint, SourceFallbackController, SourceState};
pub use secondary_audio::{DriftSample, SecondaryAudioSync, SecondaryState};
pub use skip_markers::SkipMarkerIndex;
pub use subtitles::SubtitleOverlayController;
pub use transport::{GatedPrimary, PrimaryTransport};
