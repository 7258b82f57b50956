//! Scriptable in-memory surfaces.
//!
//! A [`FakeSurface`] behaves like a paused HTML media element: commands
//! update its state and queue the events a real element would fire. The
//! platform side (metadata arriving, buffering, errors, time passing) is
//! driven by the test through the shared [`SurfaceProbe`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use reelsync_model::SubtitleTrack;
use url::Url;

use crate::surface::{
    LoadTicket, MediaSurface, SurfaceEvent, SurfaceEventKind, SurfaceProvider,
    TextTrackHost, TextTrackId, VideoSurface,
};

/// Every command a surface received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    Load(Url),
    Release,
    Play,
    Pause,
    Seek(f64),
    SetRate(f64),
    SetMuted(bool),
    AttachTextTrack(Url),
    DetachTextTrack(TextTrackId),
}

#[derive(Debug)]
struct FakeMedia {
    url: Option<Url>,
    ticket: LoadTicket,
    position: f64,
    duration: Option<f64>,
    playing: bool,
    rate: f64,
    muted: bool,
    released: bool,
    loads: usize,
    commands: Vec<SurfaceCommand>,
    text_tracks: Vec<(TextTrackId, SubtitleTrack)>,
    max_text_tracks: usize,
    next_text_track: u64,
    queue: VecDeque<SurfaceEvent>,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self {
            url: None,
            ticket: LoadTicket::UNLOADED,
            position: 0.0,
            duration: None,
            playing: false,
            rate: 1.0,
            muted: false,
            released: false,
            loads: 0,
            commands: Vec::new(),
            text_tracks: Vec::new(),
            max_text_tracks: 0,
            next_text_track: 0,
            queue: VecDeque::new(),
        }
    }
}

impl FakeMedia {
    fn emit(&mut self, kind: SurfaceEventKind) {
        self.queue.push_back(SurfaceEvent::new(self.ticket, kind));
    }

    fn is_loaded(&self) -> bool {
        self.url.is_some() && !self.released
    }
}

/// Test-side handle onto a fake surface. Clones share the same surface.
#[derive(Debug, Clone, Default)]
pub struct SurfaceProbe(Rc<RefCell<FakeMedia>>);

impl SurfaceProbe {
    /// Take every queued event.
    pub fn drain(&self) -> Vec<SurfaceEvent> {
        self.0.borrow_mut().queue.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.0.borrow().queue.is_empty()
    }

    /// Metadata arrived and enough data is buffered to start.
    pub fn finish_load(&self, duration: f64) {
        let mut media = self.0.borrow_mut();
        if !media.is_loaded() {
            return;
        }
        media.duration = Some(duration);
        media.emit(SurfaceEventKind::LoadedMetadata { duration });
        media.emit(SurfaceEventKind::CanPlay);
    }

    /// Decode or network failure.
    pub fn fail(&self, message: &str) {
        let mut media = self.0.borrow_mut();
        media.playing = false;
        media.emit(SurfaceEventKind::Error {
            message: message.to_string(),
        });
    }

    /// The surface ran out of data.
    pub fn buffer(&self) {
        self.0.borrow_mut().emit(SurfaceEventKind::Waiting);
    }

    /// The surface has enough data again.
    pub fn ready(&self) {
        self.0.borrow_mut().emit(SurfaceEventKind::CanPlay);
    }

    /// Let `seconds` of wall time pass. A playing surface advances by
    /// `seconds * rate` and fires `timeupdate` (and `pause`/`ended` when it
    /// reaches the end).
    pub fn advance(&self, seconds: f64) {
        let mut media = self.0.borrow_mut();
        if !media.playing || !media.is_loaded() {
            return;
        }

        let next = media.position + seconds * media.rate;
        match media.duration {
            Some(duration) if next >= duration => {
                media.position = duration;
                media.playing = false;
                media.emit(SurfaceEventKind::TimeUpdate);
                media.emit(SurfaceEventKind::Pause);
                media.emit(SurfaceEventKind::Ended);
            }
            _ => {
                media.position = next;
                media.emit(SurfaceEventKind::TimeUpdate);
            }
        }
    }

    /// Move the timeline without any event, as a drifting decoder would.
    pub fn set_position(&self, seconds: f64) {
        self.0.borrow_mut().position = seconds;
    }

    pub fn position(&self) -> f64 {
        self.0.borrow().position
    }

    pub fn playing(&self) -> bool {
        self.0.borrow().playing
    }

    pub fn muted(&self) -> bool {
        self.0.borrow().muted
    }

    pub fn rate(&self) -> f64 {
        self.0.borrow().rate
    }

    pub fn released(&self) -> bool {
        self.0.borrow().released
    }

    pub fn url(&self) -> Option<Url> {
        self.0.borrow().url.clone()
    }

    pub fn ticket(&self) -> LoadTicket {
        self.0.borrow().ticket
    }

    pub fn load_count(&self) -> usize {
        self.0.borrow().loads
    }

    pub fn commands(&self) -> Vec<SurfaceCommand> {
        self.0.borrow().commands.clone()
    }

    pub fn text_tracks(&self) -> Vec<SubtitleTrack> {
        self.0
            .borrow()
            .text_tracks
            .iter()
            .map(|(_, track)| track.clone())
            .collect()
    }

    /// Highest number of simultaneously attached text tracks ever observed
    pub fn max_text_tracks(&self) -> usize {
        self.0.borrow().max_text_tracks
    }
}

/// Surface half of a [`SurfaceProbe`]
#[derive(Debug)]
pub struct FakeSurface {
    probe: SurfaceProbe,
}

impl FakeSurface {
    pub fn new(probe: SurfaceProbe) -> Self {
        Self { probe }
    }

    fn media(&self) -> std::cell::RefMut<'_, FakeMedia> {
        self.probe.0.borrow_mut()
    }
}

impl MediaSurface for FakeSurface {
    fn load(&mut self, url: &Url, ticket: LoadTicket) {
        let mut media = self.media();
        media.commands.push(SurfaceCommand::Load(url.clone()));
        media.url = Some(url.clone());
        media.ticket = ticket;
        media.position = 0.0;
        media.duration = None;
        media.playing = false;
        media.released = false;
        media.loads += 1;
    }

    fn release(&mut self) {
        let mut media = self.media();
        media.commands.push(SurfaceCommand::Release);
        media.released = true;
        media.playing = false;
        media.url = None;
    }

    fn play(&mut self) {
        let mut media = self.media();
        media.commands.push(SurfaceCommand::Play);
        if media.is_loaded() && !media.playing {
            media.playing = true;
            media.emit(SurfaceEventKind::Play);
        }
    }

    fn pause(&mut self) {
        let mut media = self.media();
        media.commands.push(SurfaceCommand::Pause);
        if media.playing {
            media.playing = false;
            media.emit(SurfaceEventKind::Pause);
        }
    }

    fn seek(&mut self, seconds: f64) {
        let mut media = self.media();
        media.commands.push(SurfaceCommand::Seek(seconds));
        if !media.is_loaded() {
            return;
        }
        let upper = media.duration.unwrap_or(f64::MAX);
        media.position = seconds.clamp(0.0, upper);
        media.emit(SurfaceEventKind::Seeking);
        media.emit(SurfaceEventKind::Seeked);
    }

    fn set_rate(&mut self, rate: f64) {
        let mut media = self.media();
        media.commands.push(SurfaceCommand::SetRate(rate));
        media.rate = rate;
        media.emit(SurfaceEventKind::RateChange { rate });
    }

    fn set_muted(&mut self, muted: bool) {
        let mut media = self.media();
        media.commands.push(SurfaceCommand::SetMuted(muted));
        media.muted = muted;
    }

    fn position(&self) -> f64 {
        self.probe.position()
    }

    fn duration(&self) -> Option<f64> {
        self.probe.0.borrow().duration
    }

    fn is_playing(&self) -> bool {
        self.probe.playing()
    }

    fn rate(&self) -> f64 {
        self.probe.rate()
    }

    fn is_muted(&self) -> bool {
        self.probe.muted()
    }
}

impl TextTrackHost for FakeSurface {
    fn attach_text_track(&mut self, track: &SubtitleTrack) -> TextTrackId {
        let mut media = self.media();
        media.commands.push(SurfaceCommand::AttachTextTrack(track.url.clone()));
        media.next_text_track += 1;
        let id = TextTrackId(media.next_text_track);
        media.text_tracks.push((id, track.clone()));
        media.max_text_tracks = media.max_text_tracks.max(media.text_tracks.len());
        id
    }

    fn detach_text_track(&mut self, id: TextTrackId) {
        let mut media = self.media();
        media.commands.push(SurfaceCommand::DetachTextTrack(id));
        media.text_tracks.retain(|(attached, _)| *attached != id);
    }
}

#[derive(Debug, Default)]
struct Probes {
    primaries: Vec<SurfaceProbe>,
    secondaries: Vec<SurfaceProbe>,
}

/// Every surface a [`FakeProvider`] handed out, oldest first
#[derive(Debug, Clone, Default)]
pub struct ProbeLog(Rc<RefCell<Probes>>);

impl ProbeLog {
    pub fn primaries(&self) -> Vec<SurfaceProbe> {
        self.0.borrow().primaries.clone()
    }

    pub fn secondaries(&self) -> Vec<SurfaceProbe> {
        self.0.borrow().secondaries.clone()
    }

    pub fn last_primary(&self) -> Option<SurfaceProbe> {
        self.0.borrow().primaries.last().cloned()
    }

    pub fn last_secondary(&self) -> Option<SurfaceProbe> {
        self.0.borrow().secondaries.last().cloned()
    }
}

/// Hands out fake surfaces and records their probes.
#[derive(Debug, Default)]
pub struct FakeProvider {
    log: ProbeLog,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> ProbeLog {
        self.log.clone()
    }
}

impl SurfaceProvider for FakeProvider {
    fn primary(&mut self) -> Box<dyn VideoSurface> {
        let probe = SurfaceProbe::default();
        self.log.0.borrow_mut().primaries.push(probe.clone());
        Box::new(FakeSurface::new(probe))
    }

    fn secondary(&mut self) -> Box<dyn MediaSurface> {
        let probe = SurfaceProbe::default();
        self.log.0.borrow_mut().secondaries.push(probe.clone());
        Box::new(FakeSurface::new(probe))
    }
}
