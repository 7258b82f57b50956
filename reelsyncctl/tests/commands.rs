use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

const SCENARIO: &str = r#"{
    "access": {"is_premium": false, "free_limit_seconds": 30},
    "catalog": [{
        "episode": "ep-1",
        "server": "hd-1",
        "category": "sub",
        "streams": {
            "sources": [
                {"url": "https://cdn.example/a.m3u8", "quality": "1080p", "container_type": "hls"},
                {"url": "https://cdn.example/b.m3u8", "quality": "720p", "container_type": "hls"}
            ]
        }
    }],
    "selection": {"episode": "ep-1", "server": "hd-1", "category": "sub"},
    "steps": [
        {"step": "finish_load", "duration": 600},
        {"step": "play"},
        {"step": "advance", "seconds": 10},
        {"step": "fail_primary"},
        {"step": "finish_load", "duration": 600},
        {"step": "advance", "seconds": 25}
    ]
}"#;

fn cmd_in(dir: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("reelsyncctl");
    cmd.current_dir(dir)
        .env_remove("REELSYNC_CONFIG_PATH")
        .env_remove("REELSYNC_CONFIG_JSON")
        .env_remove("REELSYNC_FREE_LIMIT_SECS")
        .env_remove("REELSYNC_DRIFT_TOLERANCE_SECS")
        .env_remove("REELSYNC_LOG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn simulate_prints_one_report_per_step() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scenario.json");
    fs::write(&path, SCENARIO).expect("write scenario");

    let output = cmd_in(dir.path())
        .arg("simulate")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    let reports: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("json report"))
        .collect();

    assert_eq!(reports.len(), 7);
    assert_eq!(reports[4]["snapshot"]["candidate_label"], "720p");
    assert_eq!(reports[6]["snapshot"]["status"]["status"], "locked");
}

#[test]
fn premium_flag_overrides_scenario_access() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scenario.json");
    fs::write(&path, SCENARIO).expect("write scenario");

    cmd_in(dir.path())
        .arg("simulate")
        .arg(&path)
        .arg("--premium")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"locked\"").not());
}

#[test]
fn config_check_reports_defaults() {
    let dir = tempdir().expect("tempdir");
    cmd_in(dir.path())
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# source: built-in defaults"))
        .stdout(predicate::str::contains("drift_tolerance_secs = 0.3"))
        .stdout(predicate::str::contains("correction_interval = \"500ms\""));
}

#[test]
fn config_check_rejects_short_interval() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("reelsync.toml"),
        "[sync]\ncorrection_interval = \"100ms\"\n",
    )
    .expect("write config");

    cmd_in(dir.path())
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("500ms minimum"));
}

#[test]
fn bundled_demo_scenario_runs_to_the_lock() {
    let dir = tempdir().expect("tempdir");
    let demo = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../demos/fallback_and_dub.json");

    let output = cmd_in(dir.path())
        .arg("simulate")
        .arg(demo)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    let reports: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("json report"))
        .collect();
    assert_eq!(reports.len(), 19);
    assert!(reports.iter().all(|report| report.get("error").is_none()));
    let last = reports.last().expect("reports");
    assert_eq!(last["snapshot"]["status"]["status"], "locked");
}
