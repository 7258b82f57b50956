mod support;

use std::time::Duration;

use reelsync_core::player::SecondaryState;
use reelsync_core::testing::SurfaceCommand;
use reelsync_core::{NoticeKind, PlaybackError, SessionStatus};
use reelsync_model::AccessPolicy;
use support::*;

#[tokio::test]
async fn activating_dub_holds_primary_until_secondary_is_ready() {
    let mut h = playing_at(AccessPolicy::premium(), 15.0).await;

    h.session_mut().set_secondary_active(true).unwrap();
    h.pump();

    assert!(h.primary().muted());
    assert!(!h.primary().playing());
    assert_eq!(h.snapshot().status, SessionStatus::Loading);
    assert_eq!(h.snapshot().secondary.state, SecondaryState::Attaching);

    h.finish_secondary_load(EPISODE_SECS);

    let secondary = h.secondary().expect("dub surface");
    assert!(h.primary().playing());
    assert!(secondary.playing());
    assert!(approx(secondary.position(), h.primary().position()));
    let snapshot = h.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Ready);
    assert_eq!(snapshot.secondary.state, SecondaryState::Synced);
    assert!(snapshot.secondary.active);
}

#[tokio::test]
async fn drift_stays_within_tolerance_after_every_correction() {
    let mut h = playing_at(AccessPolicy::premium(), 5.0).await;
    with_synced_dub(&mut h);
    let secondary = h.secondary().expect("dub surface");

    for i in 1..=8 {
        // Decoder drift: the dub runs ahead by a growing amount
        secondary.set_position(h.primary().position() + 0.4 * f64::from(i));
        h.advance(Duration::from_millis(500));

        let drift = (secondary.position() - h.primary().position()).abs();
        assert!(drift <= 0.3, "drift {drift} after correction {i}");
    }
}

#[tokio::test]
async fn small_drift_is_left_alone() {
    let mut h = playing_at(AccessPolicy::premium(), 5.0).await;
    with_synced_dub(&mut h);
    let secondary = h.secondary().expect("dub surface");
    let seeks_before = seek_count(&secondary.commands());

    secondary.set_position(h.primary().position() + 0.2);
    h.advance(Duration::from_secs(1));

    assert_eq!(seek_count(&secondary.commands()), seeks_before);
}

#[tokio::test]
async fn primary_never_plays_while_secondary_buffers() {
    let mut h = playing_at(AccessPolicy::premium(), 5.0).await;
    with_synced_dub(&mut h);
    let secondary = h.secondary().expect("dub surface");
    assert!(h.primary().playing());

    secondary.buffer();
    h.pump();
    assert_eq!(h.snapshot().secondary.state, SecondaryState::Buffering);

    let held_at = h.primary().position();
    for _ in 0..8 {
        h.advance(Duration::from_millis(250));
        assert!(!h.primary().playing());
    }
    // User presses play mid-buffering: deferred, not executed
    assert!(h.session_mut().play().unwrap());
    h.pump();
    assert!(!h.primary().playing());
    assert!(approx(h.primary().position(), held_at));

    secondary.ready();
    h.pump();

    assert!(h.primary().playing());
    assert_eq!(h.snapshot().secondary.state, SecondaryState::Synced);
}

#[tokio::test]
async fn buffering_while_paused_does_not_start_playback() {
    let mut h = playing_at(AccessPolicy::premium(), 5.0).await;
    with_synced_dub(&mut h);
    h.session_mut().pause().unwrap();
    h.pump();

    let secondary = h.secondary().expect("dub surface");
    secondary.buffer();
    h.pump();
    secondary.ready();
    h.pump();

    assert!(!h.primary().playing());
    assert!(!secondary.playing());
}

#[tokio::test]
async fn unmute_is_refused_while_dub_is_active() {
    let mut h = playing_at(AccessPolicy::premium(), 5.0).await;
    with_synced_dub(&mut h);

    assert!(h.snapshot().mute_locked);
    assert!(!h.session_mut().set_muted(false).unwrap());
    assert!(h.primary().muted());

    h.session_mut().set_secondary_active(false).unwrap();
    h.pump();
    assert!(!h.primary().muted());
    assert!(!h.snapshot().mute_locked);

    let secondary = h.secondary().expect("dub surface");
    assert!(!secondary.playing());
    assert!(!secondary.released());
}

#[tokio::test]
async fn dub_failure_falls_back_to_original_audio() {
    let mut h = playing_at(AccessPolicy::premium(), 5.0).await;
    h.session_mut().set_secondary_active(true).unwrap();
    h.pump();
    assert!(!h.primary().playing());

    h.secondary().expect("dub surface").fail("404");
    h.pump();

    let snapshot = h.snapshot();
    assert_eq!(snapshot.secondary.state, SecondaryState::Detached);
    assert!(!snapshot.secondary.active);
    assert!(!h.primary().muted());
    assert!(h.primary().playing());
    assert_eq!(snapshot.status, SessionStatus::Ready);
    assert_eq!(
        snapshot.notice.map(|notice| notice.kind),
        Some(NoticeKind::SecondaryAudio)
    );
}

#[tokio::test]
async fn replacing_dub_url_releases_previous_resource_first() {
    let mut h = playing_at(AccessPolicy::premium(), 5.0).await;
    with_synced_dub(&mut h);
    let first = h.secondary().expect("dub surface");

    h.session_mut()
        .set_secondary_audio(Some(url(ALT_DUB_URL)))
        .unwrap();
    h.pump();

    assert!(first.released());
    assert_eq!(h.probes().secondaries().len(), 2);
    let second = h.secondary().expect("replacement surface");
    assert_eq!(second.url(), Some(url(ALT_DUB_URL)));
    assert_eq!(h.snapshot().secondary.state, SecondaryState::Attaching);
    assert!(!h.primary().playing());

    h.finish_secondary_load(EPISODE_SECS);
    assert!(h.primary().playing());
    assert!(approx(second.position(), h.primary().position()));
}

#[tokio::test]
async fn detaching_dub_restores_original_audio() {
    let mut h = playing_at(AccessPolicy::premium(), 5.0).await;
    with_synced_dub(&mut h);

    h.session_mut().set_secondary_audio(None).unwrap();
    h.pump();

    assert!(h.secondary().expect("dub surface").released());
    assert!(!h.primary().muted());
    assert_eq!(h.snapshot().secondary.state, SecondaryState::Inactive);
    assert_eq!(
        h.session_mut().set_secondary_active(true),
        Err(PlaybackError::NoSecondaryTrack)
    );
}

#[tokio::test]
async fn rate_and_seek_are_mirrored_to_the_dub() {
    let mut h = playing_at(AccessPolicy::premium(), 5.0).await;
    with_synced_dub(&mut h);
    let secondary = h.secondary().expect("dub surface");

    h.session_mut().set_rate(1.5).unwrap();
    h.pump();
    assert_eq!(secondary.rate(), 1.5);

    h.session_mut().seek(600.0).unwrap();
    h.pump();
    assert!(approx(secondary.position(), 600.0));
}

fn seek_count(commands: &[SurfaceCommand]) -> usize {
    commands
        .iter()
        .filter(|command| matches!(command, SurfaceCommand::Seek(_)))
        .count()
}
