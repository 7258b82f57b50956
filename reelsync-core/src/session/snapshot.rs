use reelsync_model::PlaybackPosition;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use super::selection::Selection;
use crate::error::FailureReason;
use crate::notice::{Notice, NoticeKind};
use crate::player::{SecondaryState, SourceState};

/// Aggregate status rendered by the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nothing selected yet
    Idle,
    Loading,
    Ready,
    Error { reason: FailureReason },
    /// Free preview exhausted; terminal for this session
    Locked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondarySnapshot {
    pub state: SecondaryState,
    pub active: bool,
    pub url: Option<Url>,
}

impl Default for SecondarySnapshot {
    fn default() -> Self {
        Self {
            state: SecondaryState::Inactive,
            active: false,
            url: None,
        }
    }
}

/// Read-only view of the whole session at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub selection: Option<Selection>,
    pub status: SessionStatus,
    pub source_state: Option<SourceState>,
    pub show_skip_intro: bool,
    pub show_skip_outro: bool,
    pub candidate_index: Option<usize>,
    pub candidate_label: Option<String>,
    pub secondary: SecondarySnapshot,
    /// Language of the active subtitle overlay
    pub subtitle: Option<String>,
    /// Manual unmute is refused while the secondary track is active
    pub mute_locked: bool,
    pub notice: Option<Notice>,
    pub position: PlaybackPosition,
}

/// Queued notifications for hosts that prefer events over polling
/// snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        session_id: Uuid,
        generation: u64,
    },
    SelectionDropped {
        generation: u64,
    },
    StatusChanged {
        status: SessionStatus,
    },
    CandidateChanged {
        index: usize,
        label: String,
        automatic: bool,
    },
    SecondaryStateChanged {
        state: SecondaryState,
    },
    Notice {
        kind: NoticeKind,
        message: String,
    },
    Locked {
        position: f64,
    },
}
