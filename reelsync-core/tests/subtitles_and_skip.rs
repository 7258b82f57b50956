mod support;

use std::sync::Arc;

use reelsync_core::testing::{Harness, SurfaceCommand};
use reelsync_core::{FixedAccess, SessionServices, StaticCatalog, StaticOverlays};
use reelsync_model::{AccessPolicy, Category, OverlayTracks};
use support::*;

#[tokio::test]
async fn subtitles_are_fetched_only_once_selected() {
    let h = playing_at(AccessPolicy::premium(), 2.0).await;

    let attached = h
        .primary()
        .commands()
        .iter()
        .any(|command| matches!(command, SurfaceCommand::AttachTextTrack(_)));
    assert!(!attached);
    assert!(h.snapshot().subtitle.is_none());
}

#[tokio::test]
async fn at_most_one_subtitle_overlay_is_ever_attached() {
    let mut h = playing_at(AccessPolicy::premium(), 2.0).await;
    let [en, ja] = <[_; 2]>::try_from(subtitles()).expect("two fixture tracks");

    h.session_mut().set_subtitle(Some(&en)).unwrap();
    h.session_mut().set_subtitle(Some(&ja)).unwrap();
    h.session_mut().cycle_subtitle().unwrap();
    h.session_mut().cycle_subtitle().unwrap();
    h.session_mut().set_subtitle(Some(&ja)).unwrap();

    // Fallback reloads the same surface; the overlay stays attached
    h.primary().fail("decode");
    h.pump();
    h.finish_primary_load(EPISODE_SECS);

    let primary = h.primary();
    assert_eq!(primary.max_text_tracks(), 1);
    assert_eq!(primary.text_tracks(), vec![ja]);
    assert_eq!(h.snapshot().subtitle.as_deref(), Some("ja"));

    h.session_mut().set_subtitle(None).unwrap();
    assert!(h.primary().text_tracks().is_empty());
    assert_eq!(
        h.snapshot().notice.map(|notice| notice.message),
        Some("Subtitles: Off".to_string())
    );
}

#[tokio::test]
async fn cycling_steps_through_tracks_and_off() {
    let mut h = playing_at(AccessPolicy::premium(), 2.0).await;

    let first = h.session_mut().cycle_subtitle().unwrap();
    assert_eq!(first.map(|track| track.lang), Some("en".to_string()));
    assert_eq!(
        h.snapshot().notice.map(|notice| notice.message),
        Some("Subtitles: English".to_string())
    );

    let second = h.session_mut().cycle_subtitle().unwrap();
    assert_eq!(second.map(|track| track.lang), Some("ja".to_string()));

    assert!(h.session_mut().cycle_subtitle().unwrap().is_none());
    assert!(h.primary().text_tracks().is_empty());
}

#[tokio::test]
async fn overlay_subtitle_is_offered_alongside_catalog_tracks() {
    init_tracing();
    let overlays = StaticOverlays::new().with_tracks(
        EPISODE,
        "en",
        OverlayTracks {
            audio_url: None,
            subtitle_url: Some(url("https://overlay.example/frieren-28/en.vtt")),
        },
    );
    let catalog = StaticCatalog::new().with_streams(
        EPISODE,
        SERVER,
        Category::Sub,
        streams("cdn-a.example"),
    );
    let mut h = Harness::new(SessionServices {
        catalog: Arc::new(catalog),
        overlays: Arc::new(overlays),
        access: Arc::new(FixedAccess(AccessPolicy::premium())),
    });
    h.open(selection()).await.unwrap();
    h.finish_primary_load(EPISODE_SECS);

    let available = h
        .session()
        .active()
        .expect("active session")
        .subtitles()
        .available()
        .len();
    assert_eq!(available, 3);
    assert!(h.secondary().is_none());

    h.session_mut().cycle_subtitle().unwrap();
    h.session_mut().cycle_subtitle().unwrap();
    let external = h.session_mut().cycle_subtitle().unwrap().expect("third track");
    assert_eq!(external.label.as_deref(), Some("English (external)"));
}

#[tokio::test]
async fn skip_intro_is_offered_inside_the_window_only() {
    let mut h = playing_at(AccessPolicy::premium(), 10.0).await;
    assert!(!h.snapshot().show_skip_intro);

    h.session_mut().seek(45.0).unwrap();
    h.pump();
    assert!(h.snapshot().show_skip_intro);
    assert!(!h.snapshot().show_skip_outro);

    assert!(h.session_mut().skip_intro().unwrap());
    h.pump();
    assert!(approx(h.primary().position(), 120.0));
    assert!(!h.snapshot().show_skip_intro);
}

#[tokio::test]
async fn skip_outro_jumps_to_marker_end() {
    let mut h = playing_at(AccessPolicy::premium(), 1.0).await;
    h.session_mut().seek(1_310.0).unwrap();
    h.pump();
    assert!(h.snapshot().show_skip_outro);

    assert!(h.session_mut().skip_outro().unwrap());
    h.pump();
    assert!(approx(h.primary().position(), 1_390.0));
    assert!(!h.snapshot().show_skip_outro);
}
