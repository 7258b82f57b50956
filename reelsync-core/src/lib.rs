//! Adaptive playback engine.
//!
//! `reelsync-core` owns the primary media surface of an episode, falls back
//! across interchangeable sources without losing position, keeps an
//! independently hosted secondary audio track (a dub) in sync with the
//! primary timeline, toggles subtitle overlays, exposes skip-intro/outro
//! windows and enforces the free-tier preview limit.
//!
//! Everything runs headless on a single thread. Hosts implement
//! [`surface::SurfaceProvider`] for their media backend, forward surface
//! events into [`session::PlaybackSession`], call
//! [`session::PlaybackSession::tick`] on a timer and render
//! [`session::PlaybackSession::snapshot`].
#![allow(missing_docs)]

pub mod error;
pub mod notice;
pub mod player;
pub mod services;
pub mod session;
pub mod settings;
pub mod surface;
pub mod testing;
pub mod time;

pub use error::{CatalogError, FailureReason, PlaybackError, Result, SecondaryAudioError};
pub use notice::{Notice, NoticeKind};
pub use services::{
    AccessStore, FixedAccess, OverlayService, StaticCatalog, StaticOverlays, StreamCatalog,
};
pub use session::{
    PlaybackSession, PositionCarry, Selection, SessionEvent, SessionServices, SessionSnapshot,
    SessionStatus,
};
pub use settings::EngineSettings;
pub use surface::{
    LoadTicket, MediaSurface, SurfaceEvent, SurfaceEventKind, SurfaceProvider, TextTrackHost,
    VideoSurface,
};
pub use time::{SystemTimeProvider, TimeProvider, VirtualTimeProvider};

pub mod prelude {
    pub use crate::player::{
        AccessGate, PlaybackClock, SecondaryAudioSync, SecondaryState, SkipMarkerIndex,
        SourceFallbackController, SourceState, SubtitleOverlayController,
    };
    pub use crate::session::{PlaybackSession, PositionCarry, Selection, SessionStatus};
    pub use crate::surface::{SurfaceEvent, SurfaceEventKind, SurfaceProvider};
    pub use reelsync_model::prelude::*;
}
