#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use reelsync_core::testing::Harness;
use reelsync_core::{FixedAccess, SessionServices, StaticCatalog, StaticOverlays};
use reelsync_model::{
    AccessPolicy, Category, EpisodeStreams, OverlayTracks, SkipMarker, SourceCandidate,
    SourceList, SubtitleTrack,
};
use reelsync_core::Selection;
use url::Url;

pub const EPISODE: &str = "frieren-28";
pub const SERVER: &str = "hd-1";
pub const ALT_SERVER: &str = "hd-2";
pub const DUB_URL: &str = "https://dub.example/frieren-28/en.m3u8";
pub const ALT_DUB_URL: &str = "https://dub-mirror.example/frieren-28/en.m3u8";
pub const EPISODE_SECS: f64 = 1_440.0;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn url(raw: &str) -> Url {
    Url::parse(raw).expect("fixture url")
}

pub fn sources(host: &str) -> SourceList {
    SourceList::new(vec![
        SourceCandidate::parse(&format!("https://{host}/a/master.m3u8"), Some("1080p"), "hls")
            .expect("fixture candidate"),
        SourceCandidate::parse(&format!("https://{host}/b/master.m3u8"), Some("720p"), "hls")
            .expect("fixture candidate"),
    ])
}

pub fn subtitles() -> Vec<SubtitleTrack> {
    vec![
        SubtitleTrack::new(url("https://subs.example/frieren-28/en.vtt"), "en"),
        SubtitleTrack::new(url("https://subs.example/frieren-28/ja.vtt"), "ja"),
    ]
}

pub fn streams(host: &str) -> EpisodeStreams {
    EpisodeStreams {
        sources: sources(host),
        subtitles: subtitles(),
        intro: Some(SkipMarker::new(30.0, 120.0).expect("fixture marker")),
        outro: Some(SkipMarker::new(1_300.0, 1_390.0).expect("fixture marker")),
    }
}

pub fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_streams(EPISODE, SERVER, Category::Sub, streams("cdn-a.example"))
        .with_streams(EPISODE, SERVER, Category::Dub, streams("cdn-dub.example"))
        .with_streams(EPISODE, ALT_SERVER, Category::Sub, streams("cdn-b.example"))
}

pub fn overlays() -> StaticOverlays {
    StaticOverlays::new().with_tracks(
        EPISODE,
        "en",
        OverlayTracks {
            audio_url: Some(url(DUB_URL)),
            subtitle_url: None,
        },
    )
}

pub fn services(policy: AccessPolicy) -> SessionServices {
    SessionServices {
        catalog: Arc::new(catalog()),
        overlays: Arc::new(overlays()),
        access: Arc::new(FixedAccess(policy)),
    }
}

pub fn selection() -> Selection {
    Selection::new(EPISODE, SERVER, Category::Sub).with_language("en")
}

pub fn harness(policy: AccessPolicy) -> Harness {
    init_tracing();
    Harness::new(services(policy))
}

/// Open the default selection, load the first candidate and play for
/// `seconds`.
pub async fn playing_at(policy: AccessPolicy, seconds: f64) -> Harness {
    let mut h = harness(policy);
    h.open(selection()).await.expect("selection should resolve");
    h.finish_primary_load(EPISODE_SECS);
    assert!(h.session_mut().play().expect("active session"));
    h.pump();
    h.advance(Duration::from_secs_f64(seconds));
    h
}

/// Attach, activate and ready the dub track on a playing harness.
pub fn with_synced_dub(h: &mut Harness) {
    h.session_mut()
        .set_secondary_active(true)
        .expect("dub track is attached");
    h.pump();
    h.finish_secondary_load(EPISODE_SECS);
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
