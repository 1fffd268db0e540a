use std::fs::File;
use std::io::Write;

use chrono::NaiveDate;
use melon_config::{
    load_models_csv, load_models_path, load_registry_json, load_summaries_json,
};
use rstest::rstest;
use tempfile::tempdir;

fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
}

#[rstest]
fn models_csv_roundtrips_rows() {
    let dir = tempdir().unwrap();
    let path = write_file(
        &dir,
        "models.csv",
        "season,metric_name,L,k,t0\n2025-spring,estimated_volume_px3,100,0.3,20\n2025-spring,density,0.8,0.2,25\n",
    );
    let models = load_models_csv(&path).unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].metric_name, "estimated_volume_px3");
    assert_eq!(models[0].parameters.l, 100.0);
    assert_eq!(models[1].parameters.t0, 25.0);
}

#[rstest]
fn models_csv_rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "models.csv", "metric,L,k,t0\ndensity,1,1,1\n");
    let err = load_models_csv(&path).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers 'season,metric_name,L,k,t0'"));
}

#[rstest]
fn models_csv_reports_bad_row_line() {
    let dir = tempdir().unwrap();
    let path = write_file(
        &dir,
        "models.csv",
        "season,metric_name,L,k,t0\ns,density,1,1,1\ns,density,abc,1,1\n",
    );
    let err = load_models_csv(&path).expect_err("bad number");
    assert!(format!("{err}").contains("invalid CSV row 3"));
}

#[rstest]
fn models_csv_rejects_non_finite_parameters() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "models.csv", "season,metric_name,L,k,t0\ns,density,NaN,1,1\n");
    let err = load_models_csv(&path).expect_err("NaN L");
    assert!(format!("{err}").contains("L must be finite"));
}

#[rstest]
fn models_path_dispatches_on_extension() {
    let dir = tempdir().unwrap();
    let path = write_file(
        &dir,
        "models.json",
        r#"[{"season":"s","metric_name":"density","parameters":{"L":1.0,"k":0.1,"t0":10}}]"#,
    );
    let models = load_models_path(&path).unwrap();
    assert_eq!(models[0].metric_name, "density");
}

#[rstest]
fn summaries_are_sorted_and_nulls_kept() {
    let json = r#"{"items":[
        {"melonID":"m1","targetDate":"2025-01-03","dap":2,
         "actual_metrics":{"density":0.4,"branch_points":null}},
        {"melonID":"m1","targetDate":"2025-01-02","dap":1,
         "actual_metrics":{"density":0.3},"deviation":{"density":-0.01}}
    ]}"#;
    let items = load_summaries_json(json).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].target_date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    assert_eq!(items[0].dap, 1);
    assert_eq!(items[1].actual_metrics.get("branch_points"), Some(&None));
    assert!(items[1].deviation.is_none());
}

#[rstest]
#[case(r#"[{"melonID":"m1","targetDate":"2025-01-03","dap":-1}]"#, "record 0")]
#[case(r#"[{"melonID":"m1","targetDate":"not-a-date","dap":1}]"#, "record 0")]
#[case(r#"[{"melonID":"","targetDate":"2025-01-03","dap":1}]"#, "melonID must not be empty")]
#[case(r#"{"data":[]}"#, "JSON array")]
fn summaries_reject_malformed_records(#[case] json: &str, #[case] needle: &str) {
    let err = load_summaries_json(json).expect_err("malformed");
    assert!(format!("{err}").contains(needle), "got: {err}");
}

#[rstest]
fn registry_keeps_pollination_date_verbatim() {
    let json = r#"[{"deviceID_cameraID":"dev1_cam0","melonID":"m1","season":"2025-spring","pollinationDate":"2025/01/01"}]"#;
    let maps = load_registry_json(json).unwrap();
    assert_eq!(maps[0].device_camera_id, "dev1_cam0");
    assert_eq!(maps[0].pollination_date, "2025/01/01");
}
