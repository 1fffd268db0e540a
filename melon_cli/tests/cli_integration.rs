use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{TempDir, tempdir};

const MODELS_CSV: &str = "\
season,metric_name,L,k,t0
2025-spring,estimated_volume_px3,100,0.3,20
2025-spring,density,1.0,0.1,30
2024-autumn,branch_points,400,0.2,25
";

const REGISTRY_JSON: &str = r#"[
  {"deviceID_cameraID": "dev1_cam0", "melonID": "m1", "season": "2025-spring", "pollinationDate": "2025-04-01"},
  {"deviceID_cameraID": "dev1_cam1", "melonID": "m2", "season": "2025-spring", "pollinationDate": "2025-04-03"}
]"#;

fn summaries_json(stored_deviation: f64) -> String {
    format!(
        r#"{{"items": [
  {{"melonID": "m1", "targetDate": "2025-04-21", "season": "2025-spring", "dap": 20,
    "actual_metrics": {{"estimated_volume_px3": 60.0, "density": null}},
    "deviation": {{"estimated_volume_px3": {stored_deviation}}}}},
  {{"melonID": "m1", "targetDate": "2025-04-06", "season": "2025-spring", "dap": 5,
    "actual_metrics": {{"estimated_volume_px3": 3.0}}}},
  {{"melonID": "m2", "targetDate": "2025-04-10", "season": "2025-spring", "dap": 7,
    "actual_metrics": {{"estimated_volume_px3": 4.0}}}}
]}}"#
    )
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(stored_deviation: f64) -> Self {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("models.csv"), MODELS_CSV).unwrap();
        fs::write(dir.path().join("registry.json"), REGISTRY_JSON).unwrap();
        fs::write(
            dir.path().join("summaries.json"),
            summaries_json(stored_deviation),
        )
        .unwrap();
        Self { dir }
    }

    fn with_summaries(self, json: &str) -> Self {
        fs::write(self.path("summaries.json"), json).unwrap();
        self
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self, sub: &str) -> Command {
        let mut cmd = Command::cargo_bin("melon").unwrap();
        cmd.env_remove("RUST_LOG").arg(sub);
        if sub != "melons" {
            cmd.arg("--models")
                .arg(self.path("models.csv"))
                .arg("--summaries")
                .arg(self.path("summaries.json"));
        }
        cmd.arg("--registry").arg(self.path("registry.json"));
        cmd
    }
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.output().unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

fn write_config(dir: &Path, toml: &str) -> PathBuf {
    let path = dir.join("melon.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["series"], 2, "required", "stderr")]
#[case(
    &["deviations", "--models", "m.csv", "--date", "2025-04-06", "--dap", "5"],
    2,
    "cannot be used with",
    "stderr"
)]
fn cli_usage_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let mut cmd = Command::cargo_bin("melon").unwrap();
    for a in args {
        cmd.arg(a);
    }
    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
#[case(&[], 0, "4/21", "stdout")]
#[case(&["--metric", "density"], 0, "網目密度 [density]", "stdout")]
#[case(&["--melon", "m9"], 4, "not in the device registry", "stderr")]
#[case(&["--horizon", "-1"], 3, "out of range", "stderr")]
#[case(&["--pollination-date", "2025/13/40"], 3, "Pollination date is invalid", "stderr")]
#[case(&["--metric", "vh_ratio"], 1, "vh_ratio", "stderr")]
fn series_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let fx = Fixture::new(10.0);
    let mut cmd = fx.cmd("series");
    cmd.args(args);
    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn series_json_is_dense_and_ordered() {
    let fx = Fixture::new(10.0);
    let mut cmd = Command::cargo_bin("melon").unwrap();
    let v = json_stdout(
        cmd.arg("--json")
            .arg("series")
            .arg("--models")
            .arg(fx.path("models.csv"))
            .arg("--summaries")
            .arg(fx.path("summaries.json"))
            .arg("--registry")
            .arg(fx.path("registry.json"))
            .arg("--horizon")
            .arg("30"),
    );
    let series = v["series"].as_array().unwrap();
    let names: Vec<&str> = series.iter().map(|s| s["metric"].as_str().unwrap()).collect();
    // this season's models only, canonical order
    assert_eq!(names, ["estimated_volume_px3", "density"]);
    let points = series[0]["points"].as_array().unwrap();
    assert_eq!(points.len(), 31);
    assert_eq!(points[20]["actual"], 60.0);
    assert_eq!(points[20]["ideal"], 50.0);
    assert!(points[19]["actual"].is_null());
    assert_eq!(v["current_dap"], 20);
}

#[test]
fn deviations_for_latest_day() {
    let fx = Fixture::new(10.0);
    fx.cmd("deviations")
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-04-21 (DAP 20)"))
        .stdout(predicate::str::contains("+10.00"))
        .stdout(predicate::str::contains("above"))
        .stdout(predicate::str::contains("favorable"));
}

#[test]
fn deviations_json_for_selected_dap() {
    let fx = Fixture::new(10.0);
    let mut cmd = Command::cargo_bin("melon").unwrap();
    cmd.arg("--json")
        .arg("deviations")
        .arg("--models")
        .arg(fx.path("models.csv"))
        .arg("--summaries")
        .arg(fx.path("summaries.json"))
        .arg("--registry")
        .arg(fx.path("registry.json"))
        .arg("--dap")
        .arg("5");
    let v = json_stdout(&mut cmd);
    assert_eq!(v["current"]["dap"], 5);
    assert_eq!(v["dates"].as_array().unwrap().len(), 2);
    let dev = &v["current"]["deviations"][0];
    assert_eq!(dev["metric"], "estimated_volume_px3");
    // 3.0 measured against an ideal of about 1.1
    assert_eq!(dev["favorable"], true);
    assert_eq!(dev["signal"], "above");
    assert!(v["current"]["mismatches"].is_null());
}

#[test]
fn deviations_without_registry_use_flags() {
    let fx = Fixture::new(10.0);
    Command::cargo_bin("melon")
        .unwrap()
        .arg("deviations")
        .arg("--models")
        .arg(fx.path("models.csv"))
        .arg("--summaries")
        .arg(fx.path("summaries.json"))
        .arg("--melon")
        .arg("m2")
        .arg("--season")
        .arg("2025-spring")
        .arg("--pollination-date")
        .arg("2025-04-03")
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-04-10 (DAP 7)"));
}

const OTHER_SEASON_FIRST: &str = r#"{"items": [
  {"melonID": "m2", "targetDate": "2024-10-10", "season": "2024-autumn", "dap": 7,
   "actual_metrics": {"branch_points": 90.0}},
  {"melonID": "m1", "targetDate": "2025-04-21", "season": "2025-spring", "dap": 20,
   "actual_metrics": {"estimated_volume_px3": 60.0}}
]}"#;

const NO_SEASON: &str = r#"{"items": [
  {"melonID": "m2", "targetDate": "2024-10-10", "season": "2024-autumn", "dap": 7,
   "actual_metrics": {"branch_points": 90.0}},
  {"melonID": "m1", "targetDate": "2025-04-21", "dap": 20,
   "actual_metrics": {"estimated_volume_px3": 60.0}}
]}"#;

fn unregistered(fx: &Fixture, sub: &str) -> Command {
    let mut cmd = Command::cargo_bin("melon").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg(sub)
        .arg("--models")
        .arg(fx.path("models.csv"))
        .arg("--summaries")
        .arg(fx.path("summaries.json"))
        .arg("--melon")
        .arg("m1")
        .arg("--pollination-date")
        .arg("2025-04-01");
    cmd
}

#[test]
fn season_comes_from_the_selected_melons_records() {
    let fx = Fixture::new(10.0).with_summaries(OTHER_SEASON_FIRST);
    unregistered(&fx, "deviations")
        .assert()
        .success()
        .stdout(predicate::str::contains("season 2025-spring"))
        .stdout(predicate::str::contains("+10.00"));
}

#[test]
fn unknown_season_across_several_model_seasons_fails() {
    let fx = Fixture::new(10.0).with_summaries(NO_SEASON);
    unregistered(&fx, "series")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("2024-autumn, 2025-spring"))
        .stderr(predicate::str::contains("--season"));
    unregistered(&fx, "series")
        .arg("--season")
        .arg("2025-spring")
        .assert()
        .success();
}

#[test]
fn missing_melon_source_is_reported() {
    let fx = Fixture::new(10.0);
    Command::cargo_bin("melon")
        .unwrap()
        .arg("series")
        .arg("--models")
        .arg(fx.path("models.csv"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--pollination-date"));
}

#[rstest]
#[case(10.0, 0, "2025-04-21 (DAP 20): ok")]
#[case(12.5, 6, "computed 10.000000 stored 12.500000")]
fn check_compares_stored_deviation(
    #[case] stored: f64,
    #[case] exit_code: i32,
    #[case] needle: &str,
) {
    let fx = Fixture::new(stored);
    fx.cmd("check")
        .assert()
        .code(exit_code)
        .stdout(predicate::str::contains(needle))
        .stdout(predicate::str::contains("2025-04-06 (DAP 5): no stored deviation"));
}

#[test]
fn check_flags_stored_ideals_off_the_curve() {
    let fx = Fixture::new(10.0).with_summaries(
        r#"{"items": [
  {"melonID": "m1", "targetDate": "2025-04-21", "season": "2025-spring", "dap": 20,
   "actual_metrics": {"estimated_volume_px3": 60.0},
   "ideal_metrics": {"estimated_volume_px3": 49.0},
   "deviation": {"estimated_volume_px3": 10.0}}
]}"#,
    );
    fx.cmd("check")
        .assert()
        .code(6)
        .stdout(predicate::str::contains("2025-04-21 (DAP 20): ok"))
        .stdout(predicate::str::contains(
            "estimated_volume_px3 ideal 50.000000 stored ideal 49.000000",
        ));
}

#[test]
fn check_failure_as_json() {
    let fx = Fixture::new(12.5);
    let mut cmd = Command::cargo_bin("melon").unwrap();
    let out = cmd
        .arg("--json")
        .arg("check")
        .arg("--models")
        .arg(fx.path("models.csv"))
        .arg("--summaries")
        .arg(fx.path("summaries.json"))
        .arg("--registry")
        .arg(fx.path("registry.json"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(6));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let mut lines = stdout.lines();
    let report: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(report["mismatches"], 1);
    let err: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(err["reason"], "CheckFailed");
    assert_eq!(err["details"]["days"], 1);
}

#[test]
fn melons_lists_registry() {
    let fx = Fixture::new(10.0);
    fx.cmd("melons")
        .assert()
        .success()
        .stdout(predicate::str::contains("m1"))
        .stdout(predicate::str::contains("dev1_cam1"));
}

#[test]
fn unknown_melon_as_json_error() {
    let fx = Fixture::new(10.0);
    let mut cmd = Command::cargo_bin("melon").unwrap();
    cmd.arg("--json")
        .arg("series")
        .arg("--models")
        .arg(fx.path("models.csv"))
        .arg("--registry")
        .arg(fx.path("registry.json"))
        .arg("--melon")
        .arg("m9")
        .assert()
        .code(4)
        .stdout(predicate::str::contains("\"reason\":\"UnknownMelon\""));
}

#[test]
fn bad_model_csv_header_is_explained() {
    let fx = Fixture::new(10.0);
    fs::write(fx.path("models.csv"), "season,metric,L,k,t0\ns,density,1,0.1,30\n").unwrap();
    fx.cmd("series")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}

#[test]
fn out_of_range_config_is_rejected() {
    let fx = Fixture::new(10.0);
    let cfg = write_config(fx.dir.path(), "[growth]\nhorizon_days = 400\n");
    let mut cmd = Command::cargo_bin("melon").unwrap();
    cmd.arg("--config").arg(cfg).arg("melons").arg("--registry").arg(fx.path("registry.json"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn config_horizon_and_labels_apply() {
    let fx = Fixture::new(10.0);
    let cfg = write_config(
        fx.dir.path(),
        r#"
[growth]
horizon_days = 25

[[metrics]]
name = "estimated_volume_px3"
label = "volume"
"#,
    );
    let mut cmd = Command::cargo_bin("melon").unwrap();
    cmd.arg("--config")
        .arg(cfg)
        .arg("series")
        .arg("--models")
        .arg(fx.path("models.csv"))
        .arg("--registry")
        .arg(fx.path("registry.json"))
        .arg("--metric")
        .arg("estimated_volume_px3");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("horizon 25 days"))
        .stdout(predicate::str::contains("volume [estimated_volume_px3]"));
}
