//! Media surface abstraction.
//!
//! A surface is the platform's media sink (a video element, a GStreamer
//! pipeline, an mpv handle). Commands are fire-and-forget; their results
//! come back later as [`SurfaceEvent`]s which the host feeds into
//! [`PlaybackSession`](crate::session::PlaybackSession). Every event carries
//! the [`LoadTicket`] of the load that produced it so results from a
//! released or superseded load can be recognised and dropped.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reelsync_model::SubtitleTrack;
use serde::Serialize;
use url::Url;

/// Identity of one `load` call on one surface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Ticket of a surface that has never been loaded.
    pub const UNLOADED: LoadTicket = LoadTicket(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Hands out strictly increasing tickets. Clones share one counter, so a
/// ticket is unique across every surface of every session built from the
/// same issuer.
#[derive(Debug, Clone, Default)]
pub struct TicketIssuer {
    next: Arc<AtomicU64>,
}

impl TicketIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> LoadTicket {
        LoadTicket(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Platform media events, named after their HTML media element
/// counterparts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceEventKind {
    LoadedMetadata { duration: f64 },
    CanPlay,
    Play,
    Pause,
    Seeking,
    Seeked,
    TimeUpdate,
    Waiting,
    RateChange { rate: f64 },
    Ended,
    Error { message: String },
}

impl SurfaceEventKind {
    /// Events after which the drift loop resyncs immediately.
    pub fn triggers_resync(&self) -> bool {
        matches!(
            self,
            SurfaceEventKind::Play
                | SurfaceEventKind::Pause
                | SurfaceEventKind::Seeked
        )
    }

    /// Events that carry a fresh timeline position.
    pub fn is_position_update(&self) -> bool {
        matches!(self, SurfaceEventKind::TimeUpdate | SurfaceEventKind::Seeked)
    }
}

/// An event stamped with the load that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceEvent {
    pub ticket: LoadTicket,
    pub kind: SurfaceEventKind,
}

impl SurfaceEvent {
    pub fn new(ticket: LoadTicket, kind: SurfaceEventKind) -> Self {
        Self { ticket, kind }
    }
}

/// Common media commands and read-only state of a surface.
pub trait MediaSurface: Debug {
    /// Start loading `url`. Events produced by this load must carry `ticket`.
    fn load(&mut self, url: &Url, ticket: LoadTicket);
    /// Stop all network and decoder activity and drop the loaded resource.
    fn release(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn set_rate(&mut self, rate: f64);
    fn set_muted(&mut self, muted: bool);

    fn position(&self) -> f64;
    fn duration(&self) -> Option<f64>;
    fn is_playing(&self) -> bool;
    fn rate(&self) -> f64;
    fn is_muted(&self) -> bool;
}

/// Handle for an attached text track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextTrackId(pub u64);

/// Something text tracks can be attached to. Attached tracks survive a
/// `load` of a different url on the same surface.
pub trait TextTrackHost {
    /// Attach and start fetching `track`.
    fn attach_text_track(&mut self, track: &SubtitleTrack) -> TextTrackId;
    fn detach_text_track(&mut self, id: TextTrackId);
}

/// The primary surface: video plus text-track overlays.
pub trait VideoSurface: MediaSurface + TextTrackHost {}

impl<T: MediaSurface + TextTrackHost> VideoSurface for T {}

/// Creates fresh surfaces for a session. A provider is asked for a new
/// primary surface per session and a new secondary surface per secondary
/// audio url.
pub trait SurfaceProvider: Debug {
    fn primary(&mut self) -> Box<dyn VideoSurface>;
    fn secondary(&mut self) -> Box<dyn MediaSurface>;
}
