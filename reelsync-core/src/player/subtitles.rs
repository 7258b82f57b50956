use reelsync_model::SubtitleTrack;
use tracing::{debug, info};

use crate::surface::{TextTrackHost, TextTrackId};

/// At most one subtitle overlay on the primary surface.
///
/// Selecting a track detaches the previous overlay before attaching the new
/// one; nothing is fetched until a track is actually selected.
#[derive(Debug, Default)]
pub struct SubtitleOverlayController {
    available: Vec<SubtitleTrack>,
    active: Option<(SubtitleTrack, TextTrackId)>,
}

impl SubtitleOverlayController {
    pub fn new(available: Vec<SubtitleTrack>) -> Self {
        Self {
            available,
            active: None,
        }
    }

    /// Select `track`, or turn subtitles off with `None`. Returns `false`
    /// when the selection did not change.
    pub fn select(
        &mut self,
        track: Option<&SubtitleTrack>,
        host: &mut dyn TextTrackHost,
    ) -> bool {
        let current = self.active.as_ref().map(|(track, _)| track);
        if current == track {
            return false;
        }

        if let Some((previous, id)) = self.active.take() {
            host.detach_text_track(id);
            debug!(lang = %previous.lang, "detached subtitle overlay");
        }

        if let Some(track) = track {
            let id = host.attach_text_track(track);
            info!(lang = %track.lang, url = %track.url, "attached subtitle overlay");
            self.active = Some((track.clone(), id));
        } else {
            info!("subtitles off");
        }
        true
    }

    /// Step Off -> first -> ... -> last -> Off over the available tracks.
    pub fn cycle(&mut self, host: &mut dyn TextTrackHost) -> Option<&SubtitleTrack> {
        if self.available.is_empty() {
            return None;
        }

        let next = match self.active_index() {
            None => Some(0),
            Some(index) if index + 1 < self.available.len() => Some(index + 1),
            Some(_) => None,
        };

        let track = next.and_then(|index| self.available.get(index)).cloned();
        self.select(track.as_ref(), host);
        self.active()
    }

    /// Add a track that arrived after the session started (an overlay
    /// service subtitle, for example). Duplicate urls are ignored.
    pub fn offer(&mut self, track: SubtitleTrack) {
        if self.available.iter().all(|known| known.url != track.url) {
            self.available.push(track);
        }
    }

    pub fn active(&self) -> Option<&SubtitleTrack> {
        self.active.as_ref().map(|(track, _)| track)
    }

    pub fn available(&self) -> &[SubtitleTrack] {
        &self.available
    }

    /// Notice text for the current selection
    pub fn notice_text(&self) -> String {
        match self.active() {
            Some(track) => format!("Subtitles: {}", describe_track(track)),
            None => "Subtitles: Off".to_string(),
        }
    }

    fn active_index(&self) -> Option<usize> {
        let active = self.active()?;
        self.available.iter().position(|track| track == active)
    }
}

/// Human-readable label: explicit label, else the language name.
pub fn describe_track(track: &SubtitleTrack) -> String {
    match &track.label {
        Some(label) => label.clone(),
        None => format_language_code(&track.lang),
    }
}

/// Convert language code to human-readable name
pub fn format_language_code(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "en" | "eng" => "English",
        "es" | "spa" => "Spanish",
        "fr" | "fra" => "French",
        "de" | "deu" | "ger" => "German",
        "it" | "ita" => "Italian",
        "pt" | "por" => "Portuguese",
        "ru" | "rus" => "Russian",
        "ja" | "jpn" => "Japanese",
        "zh" | "chi" | "zho" => "Chinese",
        "ko" | "kor" => "Korean",
        "ar" | "ara" => "Arabic",
        "hi" | "hin" => "Hindi",
        "id" | "ind" => "Indonesian",
        "th" | "tha" => "Thai",
        "vi" | "vie" => "Vietnamese",
        "tr" | "tur" => "Turkish",
        _ => code,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[derive(Debug, Default)]
    struct CountingHost {
        attached: Vec<TextTrackId>,
        next: u64,
        max_attached: usize,
        attach_calls: usize,
    }

    impl TextTrackHost for CountingHost {
        fn attach_text_track(&mut self, _track: &SubtitleTrack) -> TextTrackId {
            self.next += 1;
            self.attach_calls += 1;
            let id = TextTrackId(self.next);
            self.attached.push(id);
            self.max_attached = self.max_attached.max(self.attached.len());
            id
        }

        fn detach_text_track(&mut self, id: TextTrackId) {
            self.attached.retain(|attached| *attached != id);
        }
    }

    fn track(lang: &str) -> SubtitleTrack {
        SubtitleTrack::new(
            Url::parse(&format!("https://subs.example/{lang}.vtt")).unwrap(),
            lang,
        )
    }

    #[test]
    fn nothing_is_attached_until_selected() {
        let host = CountingHost::default();
        let controller = SubtitleOverlayController::new(vec![track("en")]);
        assert!(controller.active().is_none());
        assert_eq!(host.attach_calls, 0);
    }

    #[test]
    fn switching_never_overlaps_overlays() {
        let mut host = CountingHost::default();
        let en = track("en");
        let ja = track("ja");
        let mut controller =
            SubtitleOverlayController::new(vec![en.clone(), ja.clone()]);

        assert!(controller.select(Some(&en), &mut host));
        assert!(controller.select(Some(&ja), &mut host));
        assert!(controller.select(None, &mut host));

        assert_eq!(host.max_attached, 1);
        assert!(host.attached.is_empty());
    }

    #[test]
    fn reselecting_same_track_is_a_no_op() {
        let mut host = CountingHost::default();
        let en = track("en");
        let mut controller = SubtitleOverlayController::new(vec![en.clone()]);

        controller.select(Some(&en), &mut host);
        assert!(!controller.select(Some(&en), &mut host));
        assert_eq!(host.attach_calls, 1);
    }

    #[test]
    fn cycle_wraps_through_off() {
        let mut host = CountingHost::default();
        let mut controller =
            SubtitleOverlayController::new(vec![track("en"), track("jpn")]);

        assert_eq!(controller.cycle(&mut host).map(|t| t.lang.as_str()), Some("en"));
        assert_eq!(controller.notice_text(), "Subtitles: English");
        assert_eq!(controller.cycle(&mut host).map(|t| t.lang.as_str()), Some("jpn"));
        assert_eq!(controller.notice_text(), "Subtitles: Japanese");
        assert!(controller.cycle(&mut host).is_none());
        assert_eq!(controller.notice_text(), "Subtitles: Off");
        assert!(host.attached.is_empty());
    }

    #[test]
    fn label_wins_over_language_name() {
        let labelled = track("en").with_label("English (CC)");
        assert_eq!(describe_track(&labelled), "English (CC)");
        assert_eq!(format_language_code("xx"), "xx");
    }
}
