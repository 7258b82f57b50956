//! The playback session facade consumed by UIs.
//!
//! [`PlaybackSession`] outlives episode changes: it owns the collaborators,
//! the selection generation counter and the notice board, and rebuilds an
//! [`ActiveSession`] for every episode+server+category tuple. Hosts feed it
//! surface events and a periodic [`PlaybackSession::tick`], issue commands,
//! and render [`PlaybackSession::snapshot`].

mod active;
pub mod selection;
pub mod snapshot;

use std::collections::VecDeque;
use std::sync::Arc;

use reelsync_model::{Category, PlaybackPosition, ServerId, SkipWindow, SubtitleTrack};
use tracing::{debug, info, trace};
use url::Url;

use crate::error::{FailureReason, PlaybackError, Result};
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use crate::player::{PlaybackClock, SkipMarkerIndex};
use crate::services::{AccessStore, OverlayService, StreamCatalog};
use crate::settings::EngineSettings;
use crate::surface::{SurfaceEvent, SurfaceProvider, TicketIssuer};
use crate::time::TimeProvider;

pub use active::ActiveSession;
use active::{Outbox, SessionSeed};
pub use selection::{
    PositionCarry, ResolvedSelection, ResolvedStreams, Selection, SelectionResolver,
    SelectionTicket,
};
pub use snapshot::{SecondarySnapshot, SessionEvent, SessionSnapshot, SessionStatus};

/// External collaborators shared by every session
#[derive(Debug, Clone)]
pub struct SessionServices {
    pub catalog: Arc<dyn StreamCatalog>,
    pub overlays: Arc<dyn OverlayService>,
    pub access: Arc<dyn AccessStore>,
}

#[derive(Debug)]
pub struct PlaybackSession {
    resolver: SelectionResolver,
    access: Arc<dyn AccessStore>,
    provider: Box<dyn SurfaceProvider>,
    time: Arc<dyn TimeProvider>,
    settings: EngineSettings,
    tickets: TicketIssuer,
    generation: u64,
    selection: Option<Selection>,
    active: Option<ActiveSession>,
    failure: Option<FailureReason>,
    notices: NoticeBoard,
    events: VecDeque<SessionEvent>,
    last_status: SessionStatus,
    secondary_preferred: bool,
}

/// Split borrow of the active session and the outbox
macro_rules! with_active {
    ($self:ident, |$active:ident, $out:ident| $body:expr) => {{
        let now = $self.time.now();
        let Some($active) = $self.active.as_mut() else {
            return Err(PlaybackError::NoActiveSession);
        };
        #[allow(unused_mut, unused_variables)]
        let mut $out = Outbox {
            now,
            notices: &mut $self.notices,
            events: &mut $self.events,
        };
        let result = $body;
        $self.settle();
        result
    }};
}

impl PlaybackSession {
    pub fn new(
        services: SessionServices,
        provider: Box<dyn SurfaceProvider>,
        time: Arc<dyn TimeProvider>,
        settings: EngineSettings,
    ) -> Self {
        let settings = settings.normalized();
        Self {
            resolver: SelectionResolver::new(services.catalog, services.overlays),
            access: services.access,
            provider,
            time,
            notices: NoticeBoard::new(settings.notice_ttl),
            settings,
            tickets: TicketIssuer::new(),
            generation: 0,
            selection: None,
            active: None,
            failure: None,
            events: VecDeque::new(),
            last_status: SessionStatus::Idle,
            secondary_preferred: false,
        }
    }

    /// Start a new selection. The current session is torn down immediately;
    /// with [`PositionCarry::Keep`] its timeline position is carried into
    /// the next one.
    pub fn begin_selection(&mut self, selection: Selection, carry: PositionCarry) -> SelectionTicket {
        self.generation += 1;
        let resume = match carry {
            PositionCarry::Keep => self
                .active
                .as_ref()
                .map(|active| active.controller().resume_point()),
            PositionCarry::Reset => None,
        };

        if let Some(previous) = self.active.take() {
            debug!(
                generation = previous.generation(),
                next = self.generation,
                "replacing active session"
            );
        }

        info!(
            generation = self.generation,
            episode = %selection.episode,
            server = %selection.server,
            category = %selection.category,
            ?carry,
            "selection started"
        );
        self.selection = Some(selection.clone());
        self.failure = None;
        self.settle();

        SelectionTicket {
            generation: self.generation,
            selection,
            resume,
        }
    }

    /// Resolver for driving [`Self::begin_selection`] tickets on the host's
    /// runtime.
    pub fn resolver(&self) -> SelectionResolver {
        self.resolver.clone()
    }

    /// Apply a resolved selection. Returns `Ok(false)` when the result is
    /// stale (a newer selection was begun) and was dropped.
    pub fn complete_selection(&mut self, resolved: ResolvedSelection) -> Result<bool> {
        let ResolvedSelection { ticket, outcome } = resolved;
        if ticket.generation != self.generation || self.active.is_some() {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "dropping stale selection result"
            );
            self.events.push_back(SessionEvent::SelectionDropped {
                generation: ticket.generation,
            });
            return Ok(false);
        }

        let now = self.time.now();
        let resolved = match outcome {
            Ok(resolved) => resolved,
            Err(err) => {
                self.failure = Some(FailureReason::Catalog {
                    message: err.to_string(),
                });
                let message = "Could not load episode".to_string();
                self.notices.show(NoticeKind::Catalog, message.clone(), now);
                self.events.push_back(SessionEvent::Notice {
                    kind: NoticeKind::Catalog,
                    message,
                });
                self.settle();
                return Err(err.into());
            }
        };

        let skip = SkipMarkerIndex::new(resolved.streams.skip_markers());
        let seed = SessionSeed {
            generation: ticket.generation,
            selection: ticket.selection,
            sources: resolved.streams.sources,
            subtitles: resolved.streams.subtitles,
            skip,
            overlays: resolved.overlays,
            resume: ticket.resume,
            policy: self.access.access_policy(),
        };

        let active = ActiveSession::start(
            seed,
            self.provider.as_mut(),
            &self.tickets,
            &self.settings,
            self.secondary_preferred,
        );
        self.events.push_back(SessionEvent::SessionStarted {
            session_id: active.id(),
            generation: active.generation(),
        });
        self.active = Some(active);
        self.settle();
        Ok(true)
    }

    /// Begin, resolve and complete `selection` in one go.
    pub async fn select(&mut self, selection: Selection, carry: PositionCarry) -> Result<bool> {
        let ticket = self.begin_selection(selection, carry);
        let resolved = self.resolver.resolve(ticket).await;
        self.complete_selection(resolved)
    }

    pub async fn open(&mut self, selection: Selection) -> Result<bool> {
        self.select(selection, PositionCarry::Reset).await
    }

    /// Switch mirror. Rebuilds the session when the server actually changes.
    pub async fn select_server(
        &mut self,
        server: impl Into<ServerId>,
        carry: PositionCarry,
    ) -> Result<bool> {
        let server = server.into();
        self.reselect(carry, |selection| selection.server = server)
            .await
    }

    /// Switch between subbed and dubbed streams.
    pub async fn select_category(&mut self, category: Category, carry: PositionCarry) -> Result<bool> {
        self.reselect(carry, |selection| selection.category = category)
            .await
    }

    pub fn select_quality(&mut self, quality: &str) -> Result<()> {
        let index = self
            .active
            .as_ref()
            .ok_or(PlaybackError::NoActiveSession)?
            .controller()
            .sources()
            .position_of_quality(quality)
            .ok_or_else(|| PlaybackError::UnknownQuality(quality.to_string()))?;
        self.switch_candidate(index)
    }

    pub fn switch_candidate(&mut self, index: usize) -> Result<()> {
        with_active!(self, |active, out| active.switch_candidate(index, &mut out))
    }

    /// Returns whether the command reached the primary surface (or was
    /// deferred until secondary audio is ready).
    pub fn play(&mut self) -> Result<bool> {
        with_active!(self, |active, out| Ok(active.play()))
    }

    pub fn pause(&mut self) -> Result<bool> {
        with_active!(self, |active, out| Ok(active.pause()))
    }

    pub fn seek(&mut self, seconds: f64) -> Result<bool> {
        with_active!(self, |active, out| Ok(active.seek(seconds)))
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<bool> {
        with_active!(self, |active, out| Ok(active.set_rate(rate)))
    }

    /// Manual mute. Returns `false` when an unmute was refused because the
    /// secondary track is active.
    pub fn set_muted(&mut self, muted: bool) -> Result<bool> {
        with_active!(self, |active, out| Ok(active.set_muted(muted)))
    }

    /// Attach a secondary audio url, or detach with `None`. A newly attached
    /// track is activated when the viewer last chose secondary audio.
    pub fn set_secondary_audio(&mut self, url: Option<Url>) -> Result<()> {
        let activate = url.is_some() && self.secondary_preferred;
        let Some(active) = self.active.as_mut() else {
            return Err(PlaybackError::NoActiveSession);
        };
        active.set_secondary_source(url, self.provider.as_mut());
        self.settle();

        if activate {
            self.set_secondary_active(true)?;
        }
        Ok(())
    }

    pub fn set_secondary_active(&mut self, active_flag: bool) -> Result<()> {
        with_active!(self, |active, out| {
            active.set_secondary_active(active_flag, &mut out)?;
            self.secondary_preferred = active_flag;
            Ok(())
        })
    }

    pub fn set_subtitle(&mut self, track: Option<&SubtitleTrack>) -> Result<()> {
        with_active!(self, |active, out| {
            active.set_subtitle(track, &mut out);
            Ok(())
        })
    }

    pub fn cycle_subtitle(&mut self) -> Result<Option<SubtitleTrack>> {
        with_active!(self, |active, out| Ok(active.cycle_subtitle(&mut out)))
    }

    pub fn skip_intro(&mut self) -> Result<bool> {
        with_active!(self, |active, out| Ok(active.skip(SkipWindow::Intro)))
    }

    pub fn skip_outro(&mut self) -> Result<bool> {
        with_active!(self, |active, out| Ok(active.skip(SkipWindow::Outro)))
    }

    /// Recover from the error state: restart the source list after
    /// exhaustion, or re-run the last selection after a catalog failure.
    pub async fn retry(&mut self) -> Result<bool> {
        if let Some(active) = self.active.as_mut() {
            if !matches!(active.status(), SessionStatus::Error { .. }) {
                return Err(PlaybackError::NothingToRetry);
            }
            let restarted = active.retry();
            self.settle();
            return Ok(restarted);
        }

        match (&self.failure, self.selection.clone()) {
            (Some(FailureReason::Catalog { .. }), Some(selection)) => {
                info!("retrying selection after catalog failure");
                self.select(selection, PositionCarry::Reset).await
            }
            _ => Err(PlaybackError::NothingToRetry),
        }
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.dismiss()
    }

    /// Periodic timer entry point: drift correction, access gate and notice
    /// expiry.
    pub fn tick(&mut self) {
        let now = self.time.now();
        if let Some(active) = self.active.as_mut() {
            let mut out = Outbox {
                now,
                notices: &mut self.notices,
                events: &mut self.events,
            };
            active.tick(&mut out);
        }
        if self.notices.expire(now) {
            trace!("notice expired");
        }
        self.settle();
    }

    /// Feed an event from the primary surface.
    pub fn on_primary_event(&mut self, event: SurfaceEvent) {
        let now = self.time.now();
        let Some(active) = self.active.as_mut() else {
            trace!(ticket = %event.ticket, "primary event without active session");
            return;
        };
        let mut out = Outbox {
            now,
            notices: &mut self.notices,
            events: &mut self.events,
        };
        active.on_primary_event(&event, &mut out);
        self.settle();
    }

    /// Feed an event from the secondary audio surface.
    pub fn on_secondary_event(&mut self, event: SurfaceEvent) {
        let now = self.time.now();
        let Some(active) = self.active.as_mut() else {
            trace!(ticket = %event.ticket, "secondary event without active session");
            return;
        };
        let mut out = Outbox {
            now,
            notices: &mut self.notices,
            events: &mut self.events,
        };
        active.on_secondary_event(&event, &mut out);
        self.settle();
    }

    pub fn status(&self) -> SessionStatus {
        match (&self.active, &self.failure, &self.selection) {
            (Some(active), _, _) => active.status(),
            (None, Some(reason), _) => SessionStatus::Error {
                reason: reason.clone(),
            },
            (None, None, Some(_)) => SessionStatus::Loading,
            (None, None, None) => SessionStatus::Idle,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let status = self.status();
        let notice = self.notices.current().cloned();

        let Some(active) = &self.active else {
            return SessionSnapshot {
                session_id: None,
                selection: self.selection.clone(),
                status,
                source_state: None,
                show_skip_intro: false,
                show_skip_outro: false,
                candidate_index: None,
                candidate_label: None,
                secondary: SecondarySnapshot::default(),
                subtitle: None,
                mute_locked: false,
                notice,
                position: PlaybackPosition::default(),
            };
        };

        let controller = active.controller();
        SessionSnapshot {
            session_id: Some(active.id()),
            selection: Some(active.selection().clone()),
            status,
            source_state: Some(controller.state()),
            show_skip_intro: active.show_skip(SkipWindow::Intro),
            show_skip_outro: active.show_skip(SkipWindow::Outro),
            candidate_index: controller.candidate().map(|_| controller.index()),
            candidate_label: controller.candidate().map(|candidate| candidate.label()),
            secondary: active.secondary_snapshot(),
            subtitle: active
                .subtitles()
                .active()
                .map(|track| track.lang.clone()),
            mute_locked: active.secondary().is_active(),
            notice,
            position: controller.snapshot(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.current()
    }

    async fn reselect(
        &mut self,
        carry: PositionCarry,
        change: impl FnOnce(&mut Selection),
    ) -> Result<bool> {
        let mut selection = self
            .selection
            .clone()
            .ok_or(PlaybackError::NoActiveSession)?;
        change(&mut selection);

        if self.active.is_some() && self.selection.as_ref() == Some(&selection) {
            trace!("selection unchanged");
            return Ok(false);
        }
        self.select(selection, carry).await
    }

    fn settle(&mut self) {
        let status = self.status();
        if status != self.last_status {
            info!(?status, "session status changed");
            self.events
                .push_back(SessionEvent::StatusChanged { status: status.clone() });
            self.last_status = status;
        }
    }
}
