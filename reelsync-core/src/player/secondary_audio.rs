//! Secondary audio track kept in lockstep with the primary timeline.
//!
//! The secondary resource lives on its own [`MediaSurface`]. While the track
//! is active the primary is muted and the secondary is corrected towards the
//! primary position: immediately on primary `play`/`pause`/`seeked`, and on
//! the periodic tick no more often than the configured interval. When the
//! secondary cannot keep pace (still attaching, or buffering) the primary is
//! held paused and resumed afterwards only if it was playing before the
//! hold.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace, warn};
use url::Url;

use super::transport::PrimaryTransport;
use crate::error::{PlaybackError, SecondaryAudioError};
use crate::surface::{
    LoadTicket, MediaSurface, SurfaceEventKind, SurfaceProvider, TicketIssuer,
};

const RATE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryState {
    Inactive,
    Attaching,
    Synced,
    Buffering,
    Detached,
}

/// One drift correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftSample {
    pub primary: f64,
    pub secondary: f64,
    /// `|secondary - primary|` before the correction
    pub drift: f64,
    pub resynced: bool,
}

#[derive(Debug)]
struct SecondaryResource {
    url: Url,
    surface: Box<dyn MediaSurface>,
    ticket: LoadTicket,
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    resume_primary: bool,
}

#[derive(Debug)]
pub struct SecondaryAudioSync {
    resource: Option<SecondaryResource>,
    state: SecondaryState,
    active: bool,
    hold: Option<Hold>,
    last_correction: Option<Duration>,
    tolerance: f64,
    min_interval: Duration,
    tickets: TicketIssuer,
}

impl SecondaryAudioSync {
    pub fn new(tickets: TicketIssuer, tolerance: f64, min_interval: Duration) -> Self {
        Self {
            resource: None,
            state: SecondaryState::Inactive,
            active: false,
            hold: None,
            last_correction: None,
            tolerance,
            min_interval,
            tickets,
        }
    }

    /// Attach `url` as the secondary resource, or detach with `None`. The
    /// previous resource is released before the new one is created.
    pub fn set_source(
        &mut self,
        url: Option<Url>,
        provider: &mut dyn SurfaceProvider,
        primary: &mut dyn PrimaryTransport,
    ) {
        if let (Some(next), Some(current)) = (&url, &self.resource)
            && *next == current.url
        {
            trace!(url = %next, "secondary audio url unchanged");
            return;
        }

        self.release_resource();
        self.last_correction = None;

        let Some(url) = url else {
            if self.active {
                self.active = false;
                primary.set_muted(false);
            }
            self.release_hold(primary);
            self.state = SecondaryState::Inactive;
            info!("secondary audio detached");
            return;
        };

        let ticket = self.tickets.issue();
        let mut surface = provider.secondary();
        surface.set_rate(primary.position().rate);
        surface.load(&url, ticket);
        info!(url = %url, %ticket, active = self.active, "attaching secondary audio");

        self.resource = Some(SecondaryResource {
            url,
            surface,
            ticket,
        });
        self.state = SecondaryState::Attaching;

        if self.active {
            self.engage_hold(primary);
        }
    }

    /// Switch between the secondary track and the primary's own audio.
    pub fn set_active(
        &mut self,
        active: bool,
        primary: &mut dyn PrimaryTransport,
    ) -> Result<(), PlaybackError> {
        if active == self.active {
            return Ok(());
        }

        if !active {
            self.active = false;
            if let Some(resource) = self.resource.as_mut() {
                resource.surface.pause();
            }
            primary.set_muted(false);
            self.release_hold(primary);
            info!("secondary audio deactivated");
            return Ok(());
        }

        if self.resource.is_none() {
            return Err(PlaybackError::NoSecondaryTrack);
        }

        self.active = true;
        primary.set_muted(true);
        info!(state = ?self.state, "secondary audio activated");

        match self.state {
            SecondaryState::Synced => {
                let position = primary.position();
                if let Some(resource) = self.resource.as_mut() {
                    resource.surface.seek(position.seconds);
                    if position.is_playing {
                        resource.surface.play();
                    }
                }
            }
            SecondaryState::Attaching | SecondaryState::Buffering => {
                self.engage_hold(primary);
            }
            SecondaryState::Inactive | SecondaryState::Detached => {}
        }
        Ok(())
    }

    /// Whether an event stamped with `ticket` belongs to the live resource.
    pub fn accepts(&self, ticket: LoadTicket) -> bool {
        self.resource
            .as_ref()
            .is_some_and(|resource| resource.ticket == ticket)
    }

    /// Apply an event from the secondary surface. Events from a released
    /// resource are ignored. A load failure detaches the track and is
    /// returned for the caller to surface as a notice.
    pub fn handle_event(
        &mut self,
        ticket: LoadTicket,
        kind: &SurfaceEventKind,
        primary: &mut dyn PrimaryTransport,
        now: Duration,
    ) -> Option<SecondaryAudioError> {
        if !self.accepts(ticket) {
            trace!(%ticket, "dropping secondary event from released resource");
            return None;
        }

        match kind {
            SurfaceEventKind::CanPlay => {
                if matches!(
                    self.state,
                    SecondaryState::Attaching | SecondaryState::Buffering
                ) {
                    info!(from = ?self.state, "secondary audio ready");
                    self.state = SecondaryState::Synced;
                    if self.active {
                        self.release_hold(primary);
                        self.correct(primary, now, true);
                    }
                }
            }
            SurfaceEventKind::Waiting => {
                if self.state == SecondaryState::Synced {
                    info!(active = self.active, "secondary audio buffering");
                    self.state = SecondaryState::Buffering;
                    if self.active {
                        self.engage_hold(primary);
                    }
                }
            }
            SurfaceEventKind::Error { message } => {
                return self.fail(message, primary);
            }
            _ => {}
        }
        None
    }

    /// React to a primary surface event.
    pub fn on_primary_event(
        &mut self,
        kind: &SurfaceEventKind,
        primary: &mut dyn PrimaryTransport,
        now: Duration,
    ) -> Option<DriftSample> {
        match kind {
            SurfaceEventKind::RateChange { rate } => {
                if let Some(resource) = self.resource.as_mut() {
                    resource.surface.set_rate(*rate);
                }
                return None;
            }
            SurfaceEventKind::Play => {
                if let Some(hold) = self.hold.as_mut() {
                    debug!("primary started during secondary hold; re-pausing");
                    hold.resume_primary = true;
                    primary.force_pause();
                    return None;
                }
            }
            _ => {}
        }

        if kind.triggers_resync() {
            return self.correct(primary, now, true);
        }
        None
    }

    /// Periodic entry point, throttled to the minimum correction interval.
    pub fn tick(
        &mut self,
        primary: &mut dyn PrimaryTransport,
        now: Duration,
    ) -> Option<DriftSample> {
        if let Some(last) = self.last_correction
            && now.saturating_sub(last) < self.min_interval
        {
            return None;
        }
        self.correct(primary, now, false)
    }

    /// Correct now, bypassing the throttle.
    pub fn resync(
        &mut self,
        primary: &mut dyn PrimaryTransport,
        now: Duration,
    ) -> Option<DriftSample> {
        self.correct(primary, now, true)
    }

    /// User play request while the primary is held: remembered instead of
    /// executed. Returns `true` if the request was absorbed.
    pub fn note_play_intent(&mut self) -> bool {
        match self.hold.as_mut() {
            Some(hold) => {
                hold.resume_primary = true;
                true
            }
            None => false,
        }
    }

    /// User pause request while the primary is held.
    pub fn note_pause_intent(&mut self) -> bool {
        match self.hold.as_mut() {
            Some(hold) => {
                hold.resume_primary = false;
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> SecondaryState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_holding(&self) -> bool {
        self.hold.is_some()
    }

    pub fn url(&self) -> Option<&Url> {
        self.resource.as_ref().map(|resource| &resource.url)
    }

    pub fn position(&self) -> Option<f64> {
        self.resource
            .as_ref()
            .map(|resource| resource.surface.position())
    }

    fn correct(
        &mut self,
        primary: &mut dyn PrimaryTransport,
        now: Duration,
        forced: bool,
    ) -> Option<DriftSample> {
        if !self.active || self.state != SecondaryState::Synced {
            return None;
        }
        let resource = self.resource.as_mut()?;
        let target = primary.position();
        self.last_correction = Some(now);

        let secondary = resource.surface.position();
        let drift = (secondary - target.seconds).abs();
        let resynced = drift > self.tolerance;
        if resynced {
            debug!(
                drift,
                primary = target.seconds,
                secondary,
                forced,
                "secondary drifted; resyncing"
            );
            resource.surface.seek(target.seconds);
        }

        if target.is_playing && !resource.surface.is_playing() {
            resource.surface.play();
        } else if !target.is_playing && resource.surface.is_playing() {
            resource.surface.pause();
        }

        if (resource.surface.rate() - target.rate).abs() > RATE_EPSILON {
            resource.surface.set_rate(target.rate);
        }

        trace!(drift, forced, "drift correction");
        Some(DriftSample {
            primary: target.seconds,
            secondary,
            drift,
            resynced,
        })
    }

    fn engage_hold(&mut self, primary: &mut dyn PrimaryTransport) {
        if self.hold.is_some() {
            return;
        }
        let was_playing = primary.position().is_playing;
        self.hold = Some(Hold {
            resume_primary: was_playing,
        });
        if was_playing {
            primary.force_pause();
        }
        debug!(was_playing, "holding primary for secondary audio");
    }

    fn release_hold(&mut self, primary: &mut dyn PrimaryTransport) {
        let Some(hold) = self.hold.take() else {
            return;
        };
        if hold.resume_primary {
            let resumed = primary.resume();
            debug!(resumed, "released primary hold");
        } else {
            debug!("released primary hold; primary stays paused");
        }
    }

    fn fail(
        &mut self,
        message: &str,
        primary: &mut dyn PrimaryTransport,
    ) -> Option<SecondaryAudioError> {
        let url = self.resource.as_ref()?.url.clone();
        warn!(url = %url, %message, "secondary audio failed; falling back to original audio");

        self.release_resource();
        self.state = SecondaryState::Detached;
        if self.active {
            self.active = false;
            primary.set_muted(false);
        }
        self.release_hold(primary);

        Some(SecondaryAudioError {
            url,
            message: message.to_string(),
        })
    }

    fn release_resource(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            resource.surface.pause();
            resource.surface.release();
            debug!(url = %resource.url, ticket = %resource.ticket, "released secondary audio");
        }
    }
}

impl Drop for SecondaryAudioSync {
    fn drop(&mut self) {
        self.release_resource();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProvider, SurfaceProbe};
    use reelsync_model::PlaybackPosition;

    #[derive(Debug, Default)]
    struct StubPrimary {
        position: PlaybackPosition,
        muted: bool,
        locked: bool,
        forced_pauses: usize,
    }

    impl PrimaryTransport for StubPrimary {
        fn position(&self) -> PlaybackPosition {
            self.position
        }

        fn force_pause(&mut self) {
            self.forced_pauses += 1;
            self.position.is_playing = false;
        }

        fn resume(&mut self) -> bool {
            if self.locked {
                return false;
            }
            self.position.is_playing = true;
            true
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }
    }

    const TOLERANCE: f64 = 0.3;

    fn sync() -> SecondaryAudioSync {
        SecondaryAudioSync::new(
            TicketIssuer::new(),
            TOLERANCE,
            Duration::from_millis(500),
        )
    }

    fn url(name: &str) -> Url {
        Url::parse(&format!("https://dub.example/{name}.m3u8")).unwrap()
    }

    fn deliver(
        sync: &mut SecondaryAudioSync,
        probe: &SurfaceProbe,
        primary: &mut StubPrimary,
        now: Duration,
    ) -> Vec<SecondaryAudioError> {
        let mut errors = Vec::new();
        loop {
            let events = probe.drain();
            if events.is_empty() {
                return errors;
            }
            for event in events {
                errors.extend(sync.handle_event(event.ticket, &event.kind, primary, now));
            }
        }
    }

    fn synced(
        primary: &mut StubPrimary,
    ) -> (SecondaryAudioSync, FakeProvider, SurfaceProbe) {
        let mut provider = FakeProvider::new();
        let mut sync = sync();
        sync.set_source(Some(url("en")), &mut provider, primary);
        let probe = provider.log().last_secondary().unwrap();
        probe.finish_load(1_440.0);
        deliver(&mut sync, &probe, primary, Duration::ZERO);
        assert_eq!(sync.state(), SecondaryState::Synced);
        (sync, provider, probe)
    }

    #[test]
    fn activation_mutes_primary_and_aligns_secondary() {
        let mut primary = StubPrimary {
            position: PlaybackPosition::playing_at(12.0),
            ..Default::default()
        };
        let (mut sync, _provider, probe) = synced(&mut primary);

        sync.set_active(true, &mut primary).unwrap();

        assert!(primary.muted);
        assert!((probe.position() - 12.0).abs() < 1e-9);
        assert!(probe.playing());
    }

    #[test]
    fn deactivation_pauses_secondary_without_release() {
        let mut primary = StubPrimary {
            position: PlaybackPosition::playing_at(5.0),
            ..Default::default()
        };
        let (mut sync, _provider, probe) = synced(&mut primary);
        sync.set_active(true, &mut primary).unwrap();

        sync.set_active(false, &mut primary).unwrap();

        assert!(!primary.muted);
        assert!(!probe.playing());
        assert!(!probe.released());
        assert_eq!(sync.state(), SecondaryState::Synced);
    }

    #[test]
    fn activation_without_track_is_rejected() {
        let mut primary = StubPrimary::default();
        let mut sync = sync();
        assert_eq!(
            sync.set_active(true, &mut primary),
            Err(PlaybackError::NoSecondaryTrack)
        );
        assert!(!primary.muted);
    }

    #[test]
    fn buffering_holds_primary_until_ready() {
        let mut primary = StubPrimary {
            position: PlaybackPosition::playing_at(30.0),
            ..Default::default()
        };
        let (mut sync, _provider, probe) = synced(&mut primary);
        sync.set_active(true, &mut primary).unwrap();

        probe.buffer();
        deliver(&mut sync, &probe, &mut primary, Duration::from_secs(1));
        assert_eq!(sync.state(), SecondaryState::Buffering);
        assert!(!primary.position.is_playing);
        assert!(sync.is_holding());

        probe.ready();
        deliver(&mut sync, &probe, &mut primary, Duration::from_secs(2));
        assert_eq!(sync.state(), SecondaryState::Synced);
        assert!(primary.position.is_playing);
        assert!(!sync.is_holding());
    }

    #[test]
    fn paused_primary_stays_paused_after_buffering() {
        let mut primary = StubPrimary {
            position: PlaybackPosition::paused_at(30.0),
            ..Default::default()
        };
        let (mut sync, _provider, probe) = synced(&mut primary);
        sync.set_active(true, &mut primary).unwrap();

        probe.buffer();
        deliver(&mut sync, &probe, &mut primary, Duration::from_secs(1));
        probe.ready();
        deliver(&mut sync, &probe, &mut primary, Duration::from_secs(2));

        assert!(!primary.position.is_playing);
        assert_eq!(primary.forced_pauses, 0);
    }

    #[test]
    fn play_intent_during_hold_is_applied_on_recovery() {
        let mut primary = StubPrimary {
            position: PlaybackPosition::paused_at(30.0),
            ..Default::default()
        };
        let (mut sync, _provider, probe) = synced(&mut primary);
        sync.set_active(true, &mut primary).unwrap();
        probe.buffer();
        deliver(&mut sync, &probe, &mut primary, Duration::from_secs(1));

        assert!(sync.note_play_intent());
        assert!(!primary.position.is_playing);

        probe.ready();
        deliver(&mut sync, &probe, &mut primary, Duration::from_secs(2));
        assert!(primary.position.is_playing);
    }

    #[test]
    fn drift_beyond_tolerance_is_resynced_and_throttled() {
        let mut primary = StubPrimary {
            position: PlaybackPosition::playing_at(10.0),
            ..Default::default()
        };
        let (mut sync, _provider, probe) = synced(&mut primary);
        sync.set_active(true, &mut primary).unwrap();

        primary.position.seconds = 20.0;
        probe.set_position(20.2);
        let sample = sync.tick(&mut primary, Duration::from_secs(1)).unwrap();
        assert!(!sample.resynced);

        probe.set_position(21.0);
        assert!(sync.tick(&mut primary, Duration::from_millis(1_400)).is_none());

        let sample = sync.tick(&mut primary, Duration::from_millis(1_500)).unwrap();
        assert!(sample.resynced);
        assert!((probe.position() - primary.position.seconds).abs() <= TOLERANCE);
    }

    #[test]
    fn primary_seeked_forces_immediate_resync() {
        let mut primary = StubPrimary {
            position: PlaybackPosition::playing_at(10.0),
            ..Default::default()
        };
        let (mut sync, _provider, probe) = synced(&mut primary);
        sync.set_active(true, &mut primary).unwrap();
        sync.tick(&mut primary, Duration::from_secs(1));

        primary.position.seconds = 300.0;
        let sample = sync
            .on_primary_event(
                &SurfaceEventKind::Seeked,
                &mut primary,
                Duration::from_millis(1_100),
            )
            .unwrap();
        assert!(sample.resynced);
        assert!((probe.position() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn rate_is_mirrored_even_when_inactive() {
        let mut primary = StubPrimary::default();
        let (mut sync, _provider, probe) = synced(&mut primary);

        sync.on_primary_event(
            &SurfaceEventKind::RateChange { rate: 1.5 },
            &mut primary,
            Duration::ZERO,
        );
        assert_eq!(probe.rate(), 1.5);
    }

    #[test]
    fn load_failure_detaches_and_unmutes() {
        let mut primary = StubPrimary {
            position: PlaybackPosition::playing_at(3.0),
            ..Default::default()
        };
        let mut provider = FakeProvider::new();
        let mut sync = sync();
        sync.set_source(Some(url("en")), &mut provider, &mut primary);
        sync.set_active(true, &mut primary).unwrap();
        assert!(sync.is_holding());

        let probe = provider.log().last_secondary().unwrap();
        probe.fail("404");
        let errors = deliver(&mut sync, &probe, &mut primary, Duration::ZERO);

        assert_eq!(errors.len(), 1);
        assert_eq!(sync.state(), SecondaryState::Detached);
        assert!(!sync.is_active());
        assert!(!primary.muted);
        assert!(primary.position.is_playing);
        assert!(probe.released());
    }

    #[test]
    fn replacing_source_releases_previous_resource_first() {
        let mut primary = StubPrimary::default();
        let (mut sync, mut provider, first) = synced(&mut primary);
        let stale = first.ticket();

        sync.set_source(Some(url("es")), &mut provider, &mut primary);

        assert!(first.released());
        assert_eq!(provider.log().secondaries().len(), 2);
        assert_eq!(sync.state(), SecondaryState::Attaching);
        assert!(!sync.accepts(stale));
        assert!(
            sync.handle_event(stale, &SurfaceEventKind::CanPlay, &mut primary, Duration::ZERO)
                .is_none()
        );
        assert_eq!(sync.state(), SecondaryState::Attaching);
    }
}
