use reelsync_model::{Category, EpisodeId, ServerId};
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Errors returned by the catalog and overlay collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("no streams for episode {episode} on server {server} ({category})")]
    NotFound {
        episode: EpisodeId,
        server: ServerId,
        category: Category,
    },

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Caller mistakes on session command methods. Surface faults never end up
/// here; they become state transitions instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("no active playback session")]
    NoActiveSession,

    #[error("candidate index {index} out of range (source list has {len})")]
    CandidateOutOfRange { index: usize, len: usize },

    #[error("quality '{0}' is not offered by the current source list")]
    UnknownQuality(String),

    #[error("no secondary audio track is attached")]
    NoSecondaryTrack,

    #[error("no previous selection to retry")]
    NothingToRetry,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// The secondary audio resource could not be loaded or played. Recovered
/// locally: playback continues with the original audio.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("secondary audio {url} failed: {message}")]
pub struct SecondaryAudioError {
    pub url: Url,
    pub message: String,
}

/// Why the session ended up in its terminal failed state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// The caller supplied zero candidates
    EmptySourceList,
    /// Every candidate errored
    SourcesExhausted { attempts: usize },
    /// The catalog rejected the selection before any source loaded
    Catalog { message: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::EmptySourceList => f.write_str("no sources available"),
            FailureReason::SourcesExhausted { attempts } => {
                write!(f, "all {attempts} sources failed")
            }
            FailureReason::Catalog { message } => {
                write!(f, "could not load episode: {message}")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
