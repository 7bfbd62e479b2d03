use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "timefill-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn plan_json(label: &str, extra: &[&str]) -> serde_json::Value {
    let exe = env!("CARGO_BIN_EXE_timefill");
    let output_path = temp_path(label);
    let status = Command::new(exe)
        .args(["--mode", "plan", "--report", "json", "--seed", "1", "--output"])
        .arg(&output_path)
        .args(extra)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    serde_json::from_str(&content).expect("valid json")
}

#[allow(clippy::cast_possible_truncation)]
fn quarters(value: &serde_json::Value) -> i64 {
    let hours = value.as_f64().expect("numeric hours");
    let scaled = hours * 4.0;
    assert!((scaled - scaled.round()).abs() < 1e-9, "{hours} is not a quarter");
    scaled.round() as i64
}

#[test]
fn cli_plan_writes_json_week() {
    let report = plan_json("plan", &[]);
    assert_eq!(report["seed"], 1);
    assert_eq!(report["submitted"], false);
    let days = report["days"].as_array().expect("days array");
    assert_eq!(days.len(), 5);

    for day in days {
        let target = quarters(&day["target_hours"]);
        assert!((32..=52).contains(&target), "target {target} outside 8-13 hours");
        let hours = day["hours"].as_object().expect("hours object");
        assert_eq!(hours.len(), 2);
        assert!(hours.contains_key("student"));
        assert!(hours.contains_key("admin"));
        let total: i64 = hours.values().map(quarters).sum();
        assert_eq!(total, quarters(&day["total_hours"]));
        assert!((total - target).abs() <= 1);
    }
}

#[test]
fn cli_plan_is_reproducible_for_a_seed() {
    let first = plan_json("repeat-a", &[]);
    let second = plan_json("repeat-b", &[]);
    assert_eq!(first, second);
}

#[test]
fn cli_plan_honours_day_and_hour_overrides() {
    let report = plan_json(
        "overrides",
        &["--days", "3", "--min-hours", "10", "--max-hours", "10"],
    );
    let days = report["days"].as_array().expect("days array");
    assert_eq!(days.len(), 3);
    assert!(days.iter().all(|day| day["target_hours"] == 10.0));
}

#[test]
fn cli_rejects_inverted_hour_bounds() {
    let exe = env!("CARGO_BIN_EXE_timefill");
    let output = Command::new(exe)
        .args(["--mode", "plan", "--min-hours", "9", "--max-hours", "8"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid settings"));
}
