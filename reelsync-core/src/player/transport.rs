use reelsync_model::PlaybackPosition;
use tracing::debug;

use super::clock::PlaybackClock;
use super::fallback::SourceFallbackController;

/// What the secondary-audio sync may do to the primary surface.
pub trait PrimaryTransport {
    fn position(&self) -> PlaybackPosition;
    /// Pause without going through the user-facing command path.
    fn force_pause(&mut self);
    /// Resume after a hold. A primary that is still loading a candidate
    /// starts playing once it is ready. Returns `false` when refused.
    fn resume(&mut self) -> bool;
    fn set_muted(&mut self, muted: bool);
}

/// The primary controller as seen through the access gate: once the gate
/// has locked, resumes are refused.
#[derive(Debug)]
pub struct GatedPrimary<'a> {
    controller: &'a mut SourceFallbackController,
    locked: bool,
}

impl<'a> GatedPrimary<'a> {
    pub fn new(controller: &'a mut SourceFallbackController, locked: bool) -> Self {
        Self { controller, locked }
    }
}

impl PrimaryTransport for GatedPrimary<'_> {
    fn position(&self) -> PlaybackPosition {
        self.controller.snapshot()
    }

    fn force_pause(&mut self) {
        self.controller.force_pause();
    }

    fn resume(&mut self) -> bool {
        if self.locked {
            debug!("resume refused: access locked");
            return false;
        }
        self.controller.play() || self.controller.defer_play()
    }

    fn set_muted(&mut self, muted: bool) {
        self.controller.set_muted(muted);
    }
}
