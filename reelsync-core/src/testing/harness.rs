use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::fake::{FakeProvider, ProbeLog, SurfaceProbe};
use crate::error::Result;
use crate::session::{PlaybackSession, Selection, SessionServices, SessionSnapshot};
use crate::settings::EngineSettings;
use crate::time::VirtualTimeProvider;

/// HTML media elements fire `timeupdate` roughly every 250ms.
pub const TIME_UPDATE_STEP: Duration = Duration::from_millis(250);

const MAX_PUMP_ROUNDS: usize = 1_000;

/// A [`PlaybackSession`] wired to fake surfaces and a virtual clock.
#[derive(Debug)]
pub struct Harness {
    session: PlaybackSession,
    probes: ProbeLog,
    clock: VirtualTimeProvider,
}

impl Harness {
    pub fn new(services: SessionServices) -> Self {
        Self::with_settings(services, EngineSettings::default())
    }

    pub fn with_settings(services: SessionServices, settings: EngineSettings) -> Self {
        let provider = FakeProvider::new();
        let probes = provider.log();
        let clock = VirtualTimeProvider::new();
        let session = PlaybackSession::new(
            services,
            Box::new(provider),
            Arc::new(clock.clone()),
            settings,
        );
        Self {
            session,
            probes,
            clock,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PlaybackSession {
        &mut self.session
    }

    pub fn probes(&self) -> &ProbeLog {
        &self.probes
    }

    pub fn clock(&self) -> &VirtualTimeProvider {
        &self.clock
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Probe of the most recently created primary surface.
    ///
    /// # Panics
    /// When no session was ever started.
    pub fn primary(&self) -> SurfaceProbe {
        self.probes
            .last_primary()
            .expect("no primary surface created yet")
    }

    pub fn secondary(&self) -> Option<SurfaceProbe> {
        self.probes.last_secondary()
    }

    pub async fn open(&mut self, selection: Selection) -> Result<bool> {
        let applied = self.session.open(selection).await;
        self.pump();
        applied
    }

    /// Deliver queued surface events until every surface is quiet. Returns
    /// the number of events delivered.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_PUMP_ROUNDS {
            let primary: Vec<_> = self
                .probes
                .primaries()
                .iter()
                .flat_map(SurfaceProbe::drain)
                .collect();
            let secondary: Vec<_> = self
                .probes
                .secondaries()
                .iter()
                .flat_map(SurfaceProbe::drain)
                .collect();
            if primary.is_empty() && secondary.is_empty() {
                return delivered;
            }

            delivered += primary.len() + secondary.len();
            for event in primary {
                self.session.on_primary_event(event);
            }
            for event in secondary {
                self.session.on_secondary_event(event);
            }
        }
        warn!(delivered, "surfaces kept producing events; giving up");
        delivered
    }

    /// Primary metadata arrives; events are pumped.
    pub fn finish_primary_load(&mut self, duration: f64) {
        self.primary().finish_load(duration);
        self.pump();
    }

    /// Secondary resource becomes ready; events are pumped.
    pub fn finish_secondary_load(&mut self, duration: f64) {
        if let Some(probe) = self.secondary() {
            probe.finish_load(duration);
        }
        self.pump();
    }

    /// Let `by` pass in [`TIME_UPDATE_STEP`] increments: surfaces advance,
    /// events are pumped and the session ticks after every step.
    pub fn advance(&mut self, by: Duration) {
        let mut remaining = by;
        while !remaining.is_zero() {
            let step = remaining.min(TIME_UPDATE_STEP);
            remaining -= step;
            self.clock.advance(step);

            self.primary().advance(step.as_secs_f64());
            if let Some(secondary) = self.secondary() {
                secondary.advance(step.as_secs_f64());
            }
            self.pump();
            self.session.tick();
            self.pump();
        }
    }
}
