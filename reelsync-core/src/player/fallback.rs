//! Primary surface ownership and automatic source fallback.
//!
//! The controller walks a [`SourceList`] in order. A failing candidate is
//! marked and the next unfailed one is loaded; the timeline position from
//! before the failure is re-applied once the new candidate reports its
//! metadata. When every candidate has failed the controller parks in
//! [`SourceState::Failed`] until [`SourceFallbackController::retry`] or a
//! fresh [`SourceFallbackController::load`].

use reelsync_model::{SourceCandidate, SourceList, SubtitleTrack};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::clock::PlaybackClock;
use crate::error::{FailureReason, PlaybackError};
use crate::surface::{
    LoadTicket, SurfaceEventKind, TextTrackHost, TextTrackId, TicketIssuer,
    VideoSurface,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    /// Transient: only observable inside `report_error`
    Error,
    Failed,
}

impl SourceState {
    /// play/pause/seek are silently ignored outside these states
    pub fn accepts_commands(self) -> bool {
        matches!(
            self,
            SourceState::Ready
                | SourceState::Playing
                | SourceState::Paused
                | SourceState::Ended
        )
    }
}

/// Where to put the timeline after the next candidate loads
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResumePoint {
    pub position: f64,
    pub was_playing: bool,
}

impl ResumePoint {
    pub fn start() -> Self {
        Self {
            position: 0.0,
            was_playing: false,
        }
    }
}

/// Result of reporting a primary surface failure
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackOutcome {
    /// Reported in a state that cannot fail (idle, ended, already failed)
    Ignored,
    /// Moved on to the candidate at `index`
    Advanced { index: usize, label: String },
    /// No unfailed candidate left
    Exhausted { attempts: usize },
}

#[derive(Debug)]
pub struct SourceFallbackController {
    surface: Box<dyn VideoSurface>,
    tickets: TicketIssuer,
    ticket: LoadTicket,
    sources: SourceList,
    index: usize,
    state: SourceState,
    failed: Vec<bool>,
    attempts: usize,
    failure: Option<FailureReason>,
    pending_resume: Option<ResumePoint>,
    last_valid_position: f64,
    last_valid_duration: Option<f64>,
    stalled: bool,
    frame_equivalent: f64,
}

impl SourceFallbackController {
    pub fn new(
        surface: Box<dyn VideoSurface>,
        tickets: TicketIssuer,
        frame_equivalent: f64,
    ) -> Self {
        Self {
            surface,
            tickets,
            ticket: LoadTicket::UNLOADED,
            sources: SourceList::default(),
            index: 0,
            state: SourceState::Idle,
            failed: Vec::new(),
            attempts: 0,
            failure: None,
            pending_resume: None,
            last_valid_position: 0.0,
            last_valid_duration: None,
            stalled: false,
            frame_equivalent,
        }
    }

    /// Start a fresh source list from candidate 0.
    pub fn load(&mut self, sources: SourceList) {
        self.load_with_resume(sources, None);
    }

    /// Start a fresh source list from candidate 0, restoring `resume` once
    /// the first candidate reports its metadata.
    pub fn load_with_resume(
        &mut self,
        sources: SourceList,
        resume: Option<ResumePoint>,
    ) {
        self.failed = vec![false; sources.len()];
        self.sources = sources;
        self.attempts = 0;
        self.failure = None;
        self.pending_resume =
            resume.filter(|point| point.position > 0.0 || point.was_playing);
        self.last_valid_position = resume.map_or(0.0, |point| point.position);
        self.last_valid_duration = None;

        if self.sources.is_empty() {
            warn!("refusing to load an empty source list");
            self.fail(FailureReason::EmptySourceList);
            return;
        }

        self.start_candidate(0);
    }

    /// The primary surface failed to decode or fetch the current candidate.
    pub fn report_error(&mut self) -> FallbackOutcome {
        if matches!(
            self.state,
            SourceState::Idle | SourceState::Ended | SourceState::Failed
        ) {
            debug!(state = ?self.state, "ignoring error report");
            return FallbackOutcome::Ignored;
        }

        // A candidate that fails before its metadata arrived keeps the resume
        // point of the one that failed before it.
        if self.pending_resume.is_none() {
            self.pending_resume = Some(self.capture_resume_point());
        }

        self.state = SourceState::Error;
        self.failed[self.index] = true;
        self.attempts += 1;
        warn!(
            index = self.index,
            attempts = self.attempts,
            candidates = self.sources.len(),
            "source candidate failed"
        );

        match self.next_unfailed() {
            Some(next) => {
                self.start_candidate(next);
                FallbackOutcome::Advanced {
                    index: next,
                    label: self.candidate_label(),
                }
            }
            None => {
                let attempts = self.attempts;
                self.fail(FailureReason::SourcesExhausted { attempts });
                FallbackOutcome::Exhausted { attempts }
            }
        }
    }

    /// User-driven quality/server change. Same position-preserving contract
    /// as automatic fallback, without consuming the fallback budget.
    pub fn switch_to(&mut self, index: usize) -> Result<(), PlaybackError> {
        let len = self.sources.len();
        if index >= len {
            return Err(PlaybackError::CandidateOutOfRange { index, len });
        }

        if index == self.index && self.state != SourceState::Failed {
            trace!(index, "already on requested candidate");
            return Ok(());
        }

        if self.pending_resume.is_none() {
            self.pending_resume = Some(self.capture_resume_point());
        }

        if self.state == SourceState::Failed {
            self.reset_failures();
        }

        info!(from = self.index, to = index, "switching source candidate");
        self.start_candidate(index);
        Ok(())
    }

    /// Restart from candidate 0 after exhaustion. Returns `false` when not in
    /// the failed state or when there is nothing to retry.
    pub fn retry(&mut self) -> bool {
        if self.state != SourceState::Failed {
            return false;
        }
        if self.sources.is_empty() {
            debug!("retry needs a fresh, non-empty source list");
            return false;
        }

        if self.pending_resume.is_none() {
            self.pending_resume = Some(self.capture_resume_point());
        }
        self.reset_failures();
        info!("retrying source list from the first candidate");
        self.start_candidate(0);
        true
    }

    pub fn play(&mut self) -> bool {
        if !self.state.accepts_commands() {
            trace!(state = ?self.state, "play ignored");
            return false;
        }
        self.surface.play();
        true
    }

    /// Play intent that arrives while a candidate is loading. Applied with
    /// the resume point once the candidate reports its metadata.
    pub fn defer_play(&mut self) -> bool {
        if self.state != SourceState::Loading {
            return false;
        }
        let position = self.last_valid_position;
        self.pending_resume
            .get_or_insert(ResumePoint {
                position,
                was_playing: false,
            })
            .was_playing = true;
        debug!(position, "play deferred until candidate is ready");
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.state.accepts_commands() {
            trace!(state = ?self.state, "pause ignored");
            return false;
        }
        self.surface.pause();
        true
    }

    pub fn seek(&mut self, seconds: f64) -> bool {
        if !self.state.accepts_commands() || !seconds.is_finite() {
            trace!(state = ?self.state, seconds, "seek ignored");
            return false;
        }
        self.surface.seek(seconds.max(0.0));
        true
    }

    /// Pause regardless of the state machine; used by the access gate and
    /// the secondary-audio hold.
    pub fn force_pause(&mut self) {
        if self.surface.is_playing() {
            self.surface.pause();
        }
    }

    pub fn set_rate(&mut self, rate: f64) -> bool {
        if !rate.is_finite() || rate <= 0.0 {
            return false;
        }
        self.surface.set_rate(rate);
        true
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.surface.set_muted(muted);
    }

    pub fn is_muted(&self) -> bool {
        self.surface.is_muted()
    }

    /// Whether an event stamped with `ticket` belongs to the current load.
    pub fn accepts(&self, ticket: LoadTicket) -> bool {
        ticket != LoadTicket::UNLOADED && ticket == self.ticket
    }

    /// Apply a primary surface event (already filtered by [`Self::accepts`]).
    /// Returns the fallback outcome when the event was an error.
    pub fn handle_event(
        &mut self,
        kind: &SurfaceEventKind,
    ) -> Option<FallbackOutcome> {
        match kind {
            SurfaceEventKind::LoadedMetadata { duration } => {
                if self.state != SourceState::Loading {
                    trace!(state = ?self.state, "metadata outside of loading");
                    return None;
                }
                self.last_valid_duration = Some(*duration);
                self.state = SourceState::Ready;
                info!(
                    index = self.index,
                    duration = *duration,
                    "source candidate ready"
                );
                self.apply_resume(*duration);
            }
            SurfaceEventKind::CanPlay => self.stalled = false,
            SurfaceEventKind::Play => {
                if self.state.accepts_commands() {
                    self.state = SourceState::Playing;
                }
                self.stalled = false;
            }
            SurfaceEventKind::Pause => {
                if self.state == SourceState::Playing {
                    self.state = SourceState::Paused;
                }
            }
            SurfaceEventKind::Seeked | SurfaceEventKind::TimeUpdate => {
                if self.state.accepts_commands() {
                    self.last_valid_position = self.surface.position();
                    if matches!(kind, SurfaceEventKind::TimeUpdate) {
                        self.stalled = false;
                    }
                }
            }
            SurfaceEventKind::Waiting => {
                if self.state.accepts_commands() {
                    self.stalled = true;
                }
            }
            SurfaceEventKind::Ended => {
                if self.state.accepts_commands() {
                    self.state = SourceState::Ended;
                    self.last_valid_position = self.surface.position();
                }
            }
            SurfaceEventKind::Error { message } => {
                warn!(index = self.index, %message, "primary surface error");
                return Some(self.report_error());
            }
            SurfaceEventKind::Seeking | SurfaceEventKind::RateChange { .. } => {}
        }
        None
    }

    /// Position/play state to carry into a rebuilt session.
    pub fn resume_point(&self) -> ResumePoint {
        self.pending_resume
            .unwrap_or_else(|| self.capture_resume_point())
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sources(&self) -> &SourceList {
        &self.sources
    }

    pub fn candidate(&self) -> Option<&SourceCandidate> {
        self.sources.get(self.index)
    }

    pub fn candidate_label(&self) -> String {
        self.candidate()
            .map(SourceCandidate::label)
            .unwrap_or_default()
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub fn pending_resume(&self) -> Option<ResumePoint> {
        self.pending_resume
    }

    fn start_candidate(&mut self, index: usize) {
        let Some(candidate) = self.sources.get(index) else {
            return;
        };

        let ticket = self.tickets.issue();
        self.ticket = ticket;
        self.index = index;
        self.state = SourceState::Loading;
        self.stalled = false;
        self.last_valid_duration = None;

        info!(
            index,
            quality = candidate.quality.as_deref().unwrap_or("auto"),
            container = %candidate.container_type,
            url = %candidate.url,
            %ticket,
            "loading source candidate"
        );
        self.surface.load(&candidate.url, ticket);
    }

    fn apply_resume(&mut self, duration: f64) {
        let Some(resume) = self.pending_resume.take() else {
            return;
        };

        if resume.position > duration {
            let target = (duration - self.frame_equivalent).max(0.0);
            info!(
                requested = resume.position,
                duration, target, "resume position past end of candidate"
            );
            self.surface.seek(target);
            self.surface.pause();
            self.last_valid_position = target;
            return;
        }

        if resume.position > 0.0 {
            self.surface.seek(resume.position);
            self.last_valid_position = resume.position;
        }
        if resume.was_playing {
            self.surface.play();
        }
        debug!(
            position = resume.position,
            resumed = resume.was_playing,
            "restored timeline on new candidate"
        );
    }

    fn capture_resume_point(&self) -> ResumePoint {
        let settled = self.state.accepts_commands();
        let live = self.surface.position();
        let position = if settled && live > 0.0 {
            live
        } else {
            self.last_valid_position
        };

        ResumePoint {
            position,
            was_playing: self.state == SourceState::Playing
                || (settled && self.surface.is_playing()),
        }
    }

    fn next_unfailed(&self) -> Option<usize> {
        let len = self.sources.len();
        (1..=len)
            .map(|offset| (self.index + offset) % len)
            .find(|&candidate| !self.failed[candidate])
    }

    fn reset_failures(&mut self) {
        self.failed.iter_mut().for_each(|failed| *failed = false);
        self.attempts = 0;
        self.failure = None;
    }

    fn fail(&mut self, reason: FailureReason) {
        warn!(%reason, "playback failed");
        self.surface.release();
        self.ticket = LoadTicket::UNLOADED;
        self.state = SourceState::Failed;
        self.stalled = false;
        self.failure = Some(reason);
    }
}

impl PlaybackClock for SourceFallbackController {
    fn position(&self) -> f64 {
        if self.state.accepts_commands() {
            self.surface.position()
        } else {
            self.pending_resume
                .map_or(self.last_valid_position, |point| point.position)
        }
    }

    fn duration(&self) -> Option<f64> {
        self.last_valid_duration.or_else(|| self.surface.duration())
    }

    fn is_playing(&self) -> bool {
        self.state.accepts_commands() && self.surface.is_playing()
    }

    fn rate(&self) -> f64 {
        self.surface.rate()
    }
}

impl TextTrackHost for SourceFallbackController {
    fn attach_text_track(&mut self, track: &SubtitleTrack) -> TextTrackId {
        self.surface.attach_text_track(track)
    }

    fn detach_text_track(&mut self, id: TextTrackId) {
        self.surface.detach_text_track(id);
    }
}

impl Drop for SourceFallbackController {
    fn drop(&mut self) {
        self.surface.release();
    }
}
