//! Scripted scenarios for `reelsyncctl simulate`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use reelsync_core::{FixedAccess, Selection, SessionServices, StaticCatalog, StaticOverlays};
use reelsync_model::{AccessPolicy, Category, EpisodeId, EpisodeStreams, OverlayTracks, ServerId};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Falls back to the configured free-tier policy
    #[serde(default)]
    pub access: Option<AccessPolicy>,
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
    #[serde(default)]
    pub overlays: Vec<OverlayEntry>,
    pub selection: Selection,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    pub episode: EpisodeId,
    pub server: ServerId,
    pub category: Category,
    pub streams: EpisodeStreams,
}

#[derive(Debug, Deserialize)]
pub struct OverlayEntry {
    pub episode: EpisodeId,
    pub language: String,
    pub tracks: OverlayTracks,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Primary metadata arrives with the given duration
    FinishLoad { duration: f64 },
    FinishSecondaryLoad { duration: f64 },
    FailPrimary {
        #[serde(default = "default_failure")]
        message: String,
    },
    FailSecondary {
        #[serde(default = "default_failure")]
        message: String,
    },
    SecondaryWaiting,
    SecondaryReady,
    Play,
    Pause,
    Seek { seconds: f64 },
    SetRate { rate: f64 },
    SetMuted { muted: bool },
    /// Let wall time pass; surfaces advance and the session ticks
    Advance { seconds: f64 },
    Tick,
    SelectQuality { quality: String },
    SelectServer {
        server: ServerId,
        #[serde(default)]
        keep_position: bool,
    },
    SelectCategory {
        category: Category,
        #[serde(default)]
        keep_position: bool,
    },
    SetSecondaryAudio { url: Option<Url> },
    SetSecondaryActive { active: bool },
    /// `null` turns subtitles off
    SetSubtitle { lang: Option<String> },
    CycleSubtitle,
    SkipIntro,
    SkipOutro,
    Retry,
    DismissNotice,
}

fn default_failure() -> String {
    "MEDIA_ERR_NETWORK".to_string()
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::FinishLoad { .. } => "finish_load",
            Step::FinishSecondaryLoad { .. } => "finish_secondary_load",
            Step::FailPrimary { .. } => "fail_primary",
            Step::FailSecondary { .. } => "fail_secondary",
            Step::SecondaryWaiting => "secondary_waiting",
            Step::SecondaryReady => "secondary_ready",
            Step::Play => "play",
            Step::Pause => "pause",
            Step::Seek { .. } => "seek",
            Step::SetRate { .. } => "set_rate",
            Step::SetMuted { .. } => "set_muted",
            Step::Advance { .. } => "advance",
            Step::Tick => "tick",
            Step::SelectQuality { .. } => "select_quality",
            Step::SelectServer { .. } => "select_server",
            Step::SelectCategory { .. } => "select_category",
            Step::SetSecondaryAudio { .. } => "set_secondary_audio",
            Step::SetSecondaryActive { .. } => "set_secondary_active",
            Step::SetSubtitle { .. } => "set_subtitle",
            Step::CycleSubtitle => "cycle_subtitle",
            Step::SkipIntro => "skip_intro",
            Step::SkipOutro => "skip_outro",
            Step::Retry => "retry",
            Step::DismissNotice => "dismiss_notice",
        }
    }
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub fn services(&self, policy: AccessPolicy) -> SessionServices {
        let mut catalog = StaticCatalog::new();
        for entry in &self.catalog {
            catalog.insert(
                entry.episode.clone(),
                entry.server.clone(),
                entry.category,
                entry.streams.clone(),
            );
        }

        let overlays = self
            .overlays
            .iter()
            .fold(StaticOverlays::new(), |overlays, entry| {
                overlays.with_tracks(
                    entry.episode.clone(),
                    entry.language.clone(),
                    entry.tracks.clone(),
                )
            });

        SessionServices {
            catalog: Arc::new(catalog),
            overlays: Arc::new(overlays),
            access: Arc::new(FixedAccess(policy)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_tagged_by_name() {
        let steps: Vec<Step> = serde_json::from_str(
            r#"[
                {"step": "finish_load", "duration": 1440},
                {"step": "fail_primary"},
                {"step": "select_server", "server": "hd-2", "keep_position": true},
                {"step": "set_subtitle", "lang": null},
                {"step": "skip_intro"}
            ]"#,
        )
        .expect("valid steps");

        let names: Vec<_> = steps.iter().map(Step::name).collect();
        assert_eq!(
            names,
            ["finish_load", "fail_primary", "select_server", "set_subtitle", "skip_intro"]
        );
        assert!(matches!(
            &steps[1],
            Step::FailPrimary { message } if message == "MEDIA_ERR_NETWORK"
        ));
    }

    #[test]
    fn unknown_step_is_rejected() {
        let parsed: Result<Step, _> = serde_json::from_str(r#"{"step": "rewind"}"#);
        assert!(parsed.is_err());
    }
}
