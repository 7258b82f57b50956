//! One episode+server+category tuple worth of playback components.
//!
//! An `ActiveSession` is never reused across tuples: the facade drops it and
//! builds a new one, which releases both surfaces.

use std::collections::VecDeque;
use std::time::Duration;

use reelsync_model::{
    AccessPolicy, OverlayTracks, SkipWindow, SourceList, SubtitleTrack,
};
use tracing::{debug, info, trace};
use url::Url;
use uuid::Uuid;

use super::selection::Selection;
use super::snapshot::{SecondarySnapshot, SessionEvent, SessionStatus};
use crate::error::{FailureReason, PlaybackError};
use crate::notice::{NoticeBoard, NoticeKind};
use crate::player::subtitles::{describe_track, format_language_code};
use crate::player::{
    AccessGate, FallbackOutcome, GateVerdict, GatedPrimary, PlaybackClock,
    ResumePoint, SecondaryAudioSync, SkipMarkerIndex, SourceFallbackController,
    SourceState, SubtitleOverlayController,
};
use crate::settings::EngineSettings;
use crate::surface::{SurfaceEvent, SurfaceProvider, TicketIssuer};

/// Where components report notices and events
#[derive(Debug)]
pub(crate) struct Outbox<'a> {
    pub now: Duration,
    pub notices: &'a mut NoticeBoard,
    pub events: &'a mut VecDeque<SessionEvent>,
}

impl Outbox<'_> {
    pub fn notice(&mut self, kind: NoticeKind, message: String) {
        self.notices.show(kind, message.clone(), self.now);
        self.events.push_back(SessionEvent::Notice { kind, message });
    }

    pub fn emit(&mut self, event: SessionEvent) {
        self.events.push_back(event);
    }
}

/// Inputs for building an [`ActiveSession`]
#[derive(Debug)]
pub(crate) struct SessionSeed {
    pub generation: u64,
    pub selection: Selection,
    pub sources: SourceList,
    pub subtitles: Vec<SubtitleTrack>,
    pub skip: SkipMarkerIndex,
    pub overlays: OverlayTracks,
    pub resume: Option<ResumePoint>,
    pub policy: AccessPolicy,
}

#[derive(Debug)]
pub struct ActiveSession {
    id: Uuid,
    generation: u64,
    selection: Selection,
    controller: SourceFallbackController,
    secondary: SecondaryAudioSync,
    subtitles: SubtitleOverlayController,
    skip: SkipMarkerIndex,
    gate: AccessGate,
}

impl ActiveSession {
    pub(crate) fn start(
        seed: SessionSeed,
        provider: &mut dyn SurfaceProvider,
        tickets: &TicketIssuer,
        settings: &EngineSettings,
        activate_secondary: bool,
    ) -> Self {
        let id = Uuid::now_v7();
        info!(
            session = %id,
            generation = seed.generation,
            episode = %seed.selection.episode,
            server = %seed.selection.server,
            category = %seed.selection.category,
            candidates = seed.sources.len(),
            premium = seed.policy.is_premium,
            "starting playback session"
        );

        let mut controller = SourceFallbackController::new(
            provider.primary(),
            tickets.clone(),
            settings.frame_equivalent_secs,
        );
        controller.load_with_resume(seed.sources, seed.resume);

        let mut subtitles = SubtitleOverlayController::new(seed.subtitles);
        if let Some(url) = seed.overlays.subtitle_url {
            let lang = seed.selection.language.clone().unwrap_or_else(|| "und".to_string());
            let label = format!("{} (external)", format_language_code(&lang));
            subtitles.offer(SubtitleTrack::new(url, lang).with_label(label));
        }

        let mut session = Self {
            id,
            generation: seed.generation,
            selection: seed.selection,
            controller,
            secondary: SecondaryAudioSync::new(
                tickets.clone(),
                settings.drift_tolerance_secs,
                settings.correction_interval,
            ),
            subtitles,
            skip: seed.skip,
            gate: AccessGate::new(seed.policy),
        };

        if let Some(url) = seed.overlays.audio_url {
            session.set_secondary_source(Some(url), provider);
            if activate_secondary {
                let mut primary = GatedPrimary::new(&mut session.controller, false);
                // A resource was just attached, so activation cannot fail.
                let _ = session.secondary.set_active(true, &mut primary);
            }
        }

        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn controller(&self) -> &SourceFallbackController {
        &self.controller
    }

    pub fn secondary(&self) -> &SecondaryAudioSync {
        &self.secondary
    }

    pub fn subtitles(&self) -> &SubtitleOverlayController {
        &self.subtitles
    }

    pub fn skip_markers(&self) -> &SkipMarkerIndex {
        &self.skip
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn status(&self) -> SessionStatus {
        if self.gate.is_locked() {
            return SessionStatus::Locked;
        }
        match self.controller.state() {
            SourceState::Failed => SessionStatus::Error {
                reason: self
                    .controller
                    .failure()
                    .cloned()
                    .unwrap_or(FailureReason::EmptySourceList),
            },
            SourceState::Idle | SourceState::Loading | SourceState::Error => {
                SessionStatus::Loading
            }
            _ if self.controller.is_stalled() || self.secondary.is_holding() => {
                SessionStatus::Loading
            }
            _ => SessionStatus::Ready,
        }
    }

    pub fn secondary_snapshot(&self) -> SecondarySnapshot {
        SecondarySnapshot {
            state: self.secondary.state(),
            active: self.secondary.is_active(),
            url: self.secondary.url().cloned(),
        }
    }

    pub fn show_skip(&self, window: SkipWindow) -> bool {
        let seconds = self.controller.position();
        match window {
            SkipWindow::Intro => self.skip.show_skip_intro(seconds),
            SkipWindow::Outro => self.skip.show_skip_outro(seconds),
        }
    }

    pub(crate) fn on_primary_event(&mut self, event: &SurfaceEvent, out: &mut Outbox<'_>) {
        if !self.controller.accepts(event.ticket) {
            trace!(session = %self.id, ticket = %event.ticket, "dropping stale primary event");
            return;
        }

        if let Some(outcome) = self.controller.handle_event(&event.kind) {
            self.on_fallback(outcome, out);
        }

        // Gate first: skip windows are derived from the same position when
        // the snapshot is taken afterwards.
        if event.kind.is_position_update() {
            self.evaluate_gate(out);
        }

        let locked = self.gate.is_locked();
        let mut primary = GatedPrimary::new(&mut self.controller, locked);
        self.secondary
            .on_primary_event(&event.kind, &mut primary, out.now);

        if locked && self.controller.is_playing() {
            debug!(session = %self.id, "primary started while locked; pausing");
            self.controller.force_pause();
        }
    }

    pub(crate) fn on_secondary_event(&mut self, event: &SurfaceEvent, out: &mut Outbox<'_>) {
        let before = self.secondary.state();
        let locked = self.gate.is_locked();
        let mut primary = GatedPrimary::new(&mut self.controller, locked);
        let failure = self
            .secondary
            .handle_event(event.ticket, &event.kind, &mut primary, out.now);

        if failure.is_some() {
            out.notice(
                NoticeKind::SecondaryAudio,
                "Dub audio unavailable, playing original audio".to_string(),
            );
        }
        self.note_secondary_transition(before, out);
    }

    pub(crate) fn tick(&mut self, out: &mut Outbox<'_>) {
        let locked = self.gate.is_locked();
        let mut primary = GatedPrimary::new(&mut self.controller, locked);
        self.secondary.tick(&mut primary, out.now);
        self.evaluate_gate(out);
    }

    pub(crate) fn play(&mut self) -> bool {
        if !self.gate.allows_play() {
            debug!(session = %self.id, "play ignored: access locked");
            return false;
        }
        if self.secondary.note_play_intent() {
            debug!(session = %self.id, "play deferred until secondary audio is ready");
            return true;
        }
        self.controller.play()
    }

    pub(crate) fn pause(&mut self) -> bool {
        self.secondary.note_pause_intent();
        self.controller.pause()
    }

    pub(crate) fn seek(&mut self, seconds: f64) -> bool {
        self.controller.seek(seconds)
    }

    pub(crate) fn set_rate(&mut self, rate: f64) -> bool {
        self.controller.set_rate(rate)
    }

    /// User mute. Unmuting is refused while the secondary track is active.
    pub(crate) fn set_muted(&mut self, muted: bool) -> bool {
        if !muted && self.secondary.is_active() {
            debug!(session = %self.id, "unmute refused: secondary audio active");
            return false;
        }
        self.controller.set_muted(muted);
        true
    }

    pub(crate) fn switch_candidate(
        &mut self,
        index: usize,
        out: &mut Outbox<'_>,
    ) -> Result<(), PlaybackError> {
        let previous = self.controller.index();
        self.controller.switch_to(index)?;
        if previous != index {
            let label = self.controller.candidate_label();
            out.notice(NoticeKind::Quality, format!("Quality: {label}"));
            out.emit(SessionEvent::CandidateChanged {
                index,
                label,
                automatic: false,
            });
            self.resync_secondary(out.now);
        }
        Ok(())
    }

    pub(crate) fn retry(&mut self) -> bool {
        self.controller.retry()
    }

    pub(crate) fn set_secondary_source(
        &mut self,
        url: Option<Url>,
        provider: &mut dyn SurfaceProvider,
    ) {
        let locked = self.gate.is_locked();
        let mut primary = GatedPrimary::new(&mut self.controller, locked);
        self.secondary.set_source(url, provider, &mut primary);
    }

    pub(crate) fn set_secondary_active(
        &mut self,
        active: bool,
        out: &mut Outbox<'_>,
    ) -> Result<(), PlaybackError> {
        let before = self.secondary.state();
        let locked = self.gate.is_locked();
        let mut primary = GatedPrimary::new(&mut self.controller, locked);
        self.secondary.set_active(active, &mut primary)?;
        self.resync_secondary(out.now);

        let message = if active {
            "Audio: Dub"
        } else {
            "Audio: Original"
        };
        out.notice(NoticeKind::SecondaryAudio, message.to_string());
        self.note_secondary_transition(before, out);
        Ok(())
    }

    pub(crate) fn set_subtitle(&mut self, track: Option<&SubtitleTrack>, out: &mut Outbox<'_>) {
        if self.subtitles.select(track, &mut self.controller) {
            let message = match track {
                Some(track) => format!("Subtitles: {}", describe_track(track)),
                None => "Subtitles: Off".to_string(),
            };
            out.notice(NoticeKind::Subtitles, message);
        }
    }

    pub(crate) fn cycle_subtitle(&mut self, out: &mut Outbox<'_>) -> Option<SubtitleTrack> {
        let selected = self.subtitles.cycle(&mut self.controller).cloned();
        if !self.subtitles.available().is_empty() {
            out.notice(NoticeKind::Subtitles, self.subtitles.notice_text());
        }
        selected
    }

    /// Seek past the intro or outro. Returns `false` when the episode has no
    /// such marker or the seek was not accepted.
    pub(crate) fn skip(&mut self, window: SkipWindow) -> bool {
        match self.skip.skip_target(window) {
            Some(target) => {
                info!(session = %self.id, ?window, target, "skipping");
                self.controller.seek(target)
            }
            None => false,
        }
    }

    fn on_fallback(&mut self, outcome: FallbackOutcome, out: &mut Outbox<'_>) {
        match outcome {
            FallbackOutcome::Advanced { index, label } => {
                out.notice(
                    NoticeKind::SourceFallback,
                    format!("Source failed, switching to {label}"),
                );
                out.emit(SessionEvent::CandidateChanged {
                    index,
                    label,
                    automatic: true,
                });
                self.resync_secondary(out.now);
            }
            FallbackOutcome::Exhausted { attempts } => {
                debug!(session = %self.id, attempts, "all sources failed");
                self.resync_secondary(out.now);
            }
            FallbackOutcome::Ignored => {}
        }
    }

    fn evaluate_gate(&mut self, out: &mut Outbox<'_>) {
        let position = self.controller.snapshot();
        match self.gate.evaluate(&position) {
            GateVerdict::Open => {}
            GateVerdict::Tripped => {
                self.controller.force_pause();
                self.resync_secondary(out.now);
                out.emit(SessionEvent::Locked {
                    position: position.seconds,
                });
            }
            GateVerdict::Locked => {
                if self.controller.is_playing() {
                    self.controller.force_pause();
                }
            }
        }
    }

    fn resync_secondary(&mut self, now: Duration) {
        let locked = self.gate.is_locked();
        let mut primary = GatedPrimary::new(&mut self.controller, locked);
        self.secondary.resync(&mut primary, now);
    }

    fn note_secondary_transition(
        &self,
        before: crate::player::SecondaryState,
        out: &mut Outbox<'_>,
    ) {
        let after = self.secondary.state();
        if after != before {
            out.emit(SessionEvent::SecondaryStateChanged { state: after });
        }
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        info!(session = %self.id, generation = self.generation, "tearing down playback session");
    }
}
