use url::Url;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::markers::{SkipMarker, SkipMarkers};
use crate::source::SourceList;

/// Text track that can be overlaid on the primary surface
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubtitleTrack {
    pub url: Url,
    /// Language code as reported by the catalog (`en`, `jpn`, ...)
    pub lang: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: Option<String>,
}

impl SubtitleTrack {
    pub fn new(url: Url, lang: impl Into<String>) -> Self {
        Self {
            url,
            lang: lang.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Catalog response for (episode, server, category).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpisodeStreams {
    pub sources: SourceList,
    #[cfg_attr(feature = "serde", serde(default))]
    pub subtitles: Vec<SubtitleTrack>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub intro: Option<SkipMarker>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub outro: Option<SkipMarker>,
}

impl EpisodeStreams {
    pub fn skip_markers(&self) -> SkipMarkers {
        SkipMarkers::from_raw(self.intro, self.outro)
    }
}

/// Independently hosted overlays for (episode, language). A missing field
/// means the overlay is unavailable, which is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlayTracks {
    #[cfg_attr(feature = "serde", serde(default))]
    pub audio_url: Option<Url>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub subtitle_url: Option<Url>,
}

impl OverlayTracks {
    pub fn is_empty(&self) -> bool {
        self.audio_url.is_none() && self.subtitle_url.is_none()
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn catalog_payload_deserializes_with_optional_fields() {
        let raw = r#"{
            "sources": [
                {"url": "https://a.example/ep.m3u8", "quality": "1080p", "container_type": "hls"},
                {"url": "https://b.example/ep.mp4", "container_type": "mp4"}
            ],
            "intro": {"start": 0.0, "end": 0.0},
            "outro": {"start": 1310.0, "end": 1400.0}
        }"#;

        let streams: EpisodeStreams =
            serde_json::from_str(raw).expect("payload should parse");
        assert_eq!(streams.sources.len(), 2);
        assert!(streams.subtitles.is_empty());
        let markers = streams.skip_markers();
        assert!(markers.intro.is_none());
        assert!(markers.outro.is_some());
    }
}
