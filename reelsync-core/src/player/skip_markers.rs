use reelsync_model::{SkipMarker, SkipMarkers, SkipWindow};

/// Intro/outro lookup for the current episode. Stateless: every answer is
/// recomputed from the position it is given.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkipMarkerIndex {
    markers: SkipMarkers,
}

impl SkipMarkerIndex {
    pub fn new(markers: SkipMarkers) -> Self {
        Self { markers }
    }

    pub fn window_at(&self, seconds: f64) -> Option<SkipWindow> {
        [SkipWindow::Intro, SkipWindow::Outro]
            .into_iter()
            .find(|window| {
                self.markers
                    .get(*window)
                    .is_some_and(|marker| marker.contains(seconds))
            })
    }

    pub fn show_skip_intro(&self, seconds: f64) -> bool {
        self.window_at(seconds) == Some(SkipWindow::Intro)
    }

    pub fn show_skip_outro(&self, seconds: f64) -> bool {
        self.window_at(seconds) == Some(SkipWindow::Outro)
    }

    /// Seek target for skipping `window`, if the episode has that marker.
    pub fn skip_target(&self, window: SkipWindow) -> Option<f64> {
        self.markers.get(window).map(|marker: SkipMarker| marker.end)
    }

    pub fn markers(&self) -> SkipMarkers {
        self.markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SkipMarkerIndex {
        SkipMarkerIndex::new(SkipMarkers::from_raw(
            Some(SkipMarker::new(30.0, 120.0).unwrap()),
            Some(SkipMarker::new(1_300.0, 1_390.0).unwrap()),
        ))
    }

    #[test]
    fn intro_window_follows_position() {
        let index = index();
        assert!(!index.show_skip_intro(29.0));
        assert!(index.show_skip_intro(30.0));
        assert!(index.show_skip_intro(119.5));
        assert!(!index.show_skip_intro(120.0));
        assert!(index.show_skip_outro(1_350.0));
        assert!(!index.show_skip_intro(1_350.0));
    }

    #[test]
    fn skip_targets_marker_end() {
        let index = index();
        assert_eq!(index.skip_target(SkipWindow::Intro), Some(120.0));
        assert_eq!(index.skip_target(SkipWindow::Outro), Some(1_390.0));
        assert_eq!(SkipMarkerIndex::default().skip_target(SkipWindow::Intro), None);
    }
}
