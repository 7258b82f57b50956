//! Runs a [`Scenario`] against the fake surfaces and prints one JSON report
//! per step.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, anyhow, bail, ensure};
use reelsync_core::testing::{Harness, SurfaceProbe};
use reelsync_core::{EngineSettings, PositionCarry, SessionEvent, SessionSnapshot};
use reelsync_model::AccessPolicy;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::scenario::{Scenario, Step};

#[derive(Debug, Serialize)]
struct StepReport<'a> {
    index: usize,
    step: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    outcome: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    events: Vec<SessionEvent>,
    snapshot: SessionSnapshot,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SimulationSummary {
    pub steps: usize,
    pub failed_steps: usize,
}

pub async fn run<W: Write>(
    scenario: Scenario,
    settings: EngineSettings,
    policy: AccessPolicy,
    pretty: bool,
    out: &mut W,
) -> anyhow::Result<SimulationSummary> {
    let mut harness = Harness::with_settings(scenario.services(policy), settings);
    let mut summary = SimulationSummary::default();
    info!(
        episode = %scenario.selection.episode,
        steps = scenario.steps.len(),
        premium = policy.is_premium,
        "running scenario"
    );

    let opened = harness
        .open(scenario.selection.clone())
        .await
        .map(|applied| json!(applied))
        .map_err(anyhow::Error::from);
    report(&mut harness, 0, "open", opened, pretty, out, &mut summary)?;

    for (offset, step) in scenario.steps.iter().enumerate() {
        let result = execute(&mut harness, step).await;
        report(&mut harness, offset + 1, step.name(), result, pretty, out, &mut summary)?;
    }

    info!(
        steps = summary.steps,
        failed = summary.failed_steps,
        "scenario finished"
    );
    Ok(summary)
}

fn report<W: Write>(
    harness: &mut Harness,
    index: usize,
    step: &str,
    result: anyhow::Result<Value>,
    pretty: bool,
    out: &mut W,
    summary: &mut SimulationSummary,
) -> anyhow::Result<()> {
    summary.steps += 1;
    let (outcome, error) = match result {
        Ok(outcome) => (outcome, None),
        Err(err) => {
            warn!(index, step, error = %err, "scenario step rejected");
            summary.failed_steps += 1;
            (Value::Null, Some(format!("{err:#}")))
        }
    };

    let report = StepReport {
        index,
        step,
        outcome,
        error,
        events: harness.session_mut().drain_events(),
        snapshot: harness.snapshot(),
    };
    if pretty {
        serde_json::to_writer_pretty(&mut *out, &report)?;
    } else {
        serde_json::to_writer(&mut *out, &report)?;
    }
    writeln!(out).context("failed to write step report")?;
    Ok(())
}

async fn execute(h: &mut Harness, step: &Step) -> anyhow::Result<Value> {
    debug!(step = step.name(), "executing");
    let outcome = match step {
        Step::FinishLoad { duration } => {
            primary(h)?.finish_load(*duration);
            h.pump();
            Value::Null
        }
        Step::FinishSecondaryLoad { duration } => {
            secondary(h)?.finish_load(*duration);
            h.pump();
            Value::Null
        }
        Step::FailPrimary { message } => {
            primary(h)?.fail(message);
            h.pump();
            Value::Null
        }
        Step::FailSecondary { message } => {
            secondary(h)?.fail(message);
            h.pump();
            Value::Null
        }
        Step::SecondaryWaiting => {
            secondary(h)?.buffer();
            h.pump();
            Value::Null
        }
        Step::SecondaryReady => {
            secondary(h)?.ready();
            h.pump();
            Value::Null
        }
        Step::Play => {
            let applied = h.session_mut().play()?;
            h.pump();
            json!(applied)
        }
        Step::Pause => {
            let applied = h.session_mut().pause()?;
            h.pump();
            json!(applied)
        }
        Step::Seek { seconds } => {
            let applied = h.session_mut().seek(*seconds)?;
            h.pump();
            json!(applied)
        }
        Step::SetRate { rate } => {
            let applied = h.session_mut().set_rate(*rate)?;
            h.pump();
            json!(applied)
        }
        Step::SetMuted { muted } => {
            let applied = h.session_mut().set_muted(*muted)?;
            h.pump();
            json!(applied)
        }
        Step::Advance { seconds } => {
            ensure!(
                seconds.is_finite() && *seconds >= 0.0,
                "advance needs a non-negative number of seconds"
            );
            primary(h)?;
            h.advance(Duration::from_secs_f64(*seconds));
            Value::Null
        }
        Step::Tick => {
            h.session_mut().tick();
            h.pump();
            Value::Null
        }
        Step::SelectQuality { quality } => {
            h.session_mut().select_quality(quality)?;
            h.pump();
            Value::Null
        }
        Step::SelectServer {
            server,
            keep_position,
        } => {
            let applied = h
                .session_mut()
                .select_server(server.clone(), carry(*keep_position))
                .await?;
            h.pump();
            json!(applied)
        }
        Step::SelectCategory {
            category,
            keep_position,
        } => {
            let applied = h
                .session_mut()
                .select_category(*category, carry(*keep_position))
                .await?;
            h.pump();
            json!(applied)
        }
        Step::SetSecondaryAudio { url } => {
            h.session_mut().set_secondary_audio(url.clone())?;
            h.pump();
            Value::Null
        }
        Step::SetSecondaryActive { active } => {
            h.session_mut().set_secondary_active(*active)?;
            h.pump();
            Value::Null
        }
        Step::SetSubtitle { lang } => {
            let track = match lang {
                None => None,
                Some(lang) => {
                    let active = h
                        .session()
                        .active()
                        .ok_or_else(|| anyhow!("no active session"))?;
                    let track = active
                        .subtitles()
                        .available()
                        .iter()
                        .find(|track| track.lang.eq_ignore_ascii_case(lang))
                        .cloned();
                    match track {
                        Some(track) => Some(track),
                        None => bail!("no subtitle track for language '{lang}'"),
                    }
                }
            };
            h.session_mut().set_subtitle(track.as_ref())?;
            h.pump();
            json!(track.map(|track| track.lang))
        }
        Step::CycleSubtitle => {
            let track = h.session_mut().cycle_subtitle()?;
            h.pump();
            json!(track.map(|track| track.lang))
        }
        Step::SkipIntro => {
            let applied = h.session_mut().skip_intro()?;
            h.pump();
            json!(applied)
        }
        Step::SkipOutro => {
            let applied = h.session_mut().skip_outro()?;
            h.pump();
            json!(applied)
        }
        Step::Retry => {
            let applied = h.session_mut().retry().await?;
            h.pump();
            json!(applied)
        }
        Step::DismissNotice => {
            json!(h.session_mut().dismiss_notice().map(|notice| notice.message))
        }
    };
    Ok(outcome)
}

fn carry(keep_position: bool) -> PositionCarry {
    if keep_position {
        PositionCarry::Keep
    } else {
        PositionCarry::Reset
    }
}

fn primary(h: &Harness) -> anyhow::Result<SurfaceProbe> {
    h.probes()
        .last_primary()
        .ok_or_else(|| anyhow!("no primary surface; the selection never loaded"))
}

fn secondary(h: &Harness) -> anyhow::Result<SurfaceProbe> {
    h.probes()
        .last_secondary()
        .ok_or_else(|| anyhow!("no secondary audio surface attached"))
}
