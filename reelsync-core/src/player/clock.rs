use reelsync_model::PlaybackPosition;

/// Read-only view of the primary surface's timeline.
pub trait PlaybackClock {
    fn position(&self) -> f64;
    fn duration(&self) -> Option<f64>;
    fn is_playing(&self) -> bool;
    fn rate(&self) -> f64;

    /// One consistent reading of position, play state and rate.
    fn snapshot(&self) -> PlaybackPosition {
        PlaybackPosition {
            seconds: self.position(),
            is_playing: self.is_playing(),
            rate: self.rate(),
        }
    }
}
