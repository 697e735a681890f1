//! CLI command tests
//!
//! Inputs are written to temp files the way a user would pass them.

use std::io::Write;
use std::path::PathBuf;

use orrery_core::test_utils::sample_chart;
use orrery_core::{InsightCategory, PatternKind, WindowType};
use tempfile::TempDir;

use crate::commands::{self, truncate};

const POSITIONS: &str = r#"[
    {"id": "sun", "longitude": 15.5, "speed": 0.98},
    {"id": "saturn", "longitude": 45.5, "speed": 0.1, "house": 2},
    {"id": "pluto", "longitude": 301.0, "speed": -0.01}
]"#;

struct Inputs {
    _dir: TempDir,
    chart: PathBuf,
    positions: PathBuf,
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn inputs() -> Inputs {
    let dir = tempfile::tempdir().unwrap();
    let chart_json = serde_json::to_string_pretty(&sample_chart("chart-1")).unwrap();
    let chart = write_file(&dir, "chart.json", &chart_json);
    let positions = write_file(&dir, "positions.json", POSITIONS);
    Inputs {
        _dir: dir,
        chart,
        positions,
    }
}

// ========== Input Loading Tests ==========

#[test]
fn test_load_positions_fills_missing_houses() {
    let inputs = inputs();
    let chart = commands::load_chart(&inputs.chart).unwrap();
    let positions = commands::load_positions(&inputs.positions, &chart).unwrap();

    assert_eq!(positions.len(), 3);
    // Equal houses from 0° Aries: 15.5° is house 1, 301° is house 11
    assert_eq!(positions[0].house, 1);
    assert_eq!(positions[1].house, 2);
    assert_eq!(positions[2].house, 11);
    assert_eq!(positions[2].name, "Pluto");
    assert!(positions[2].is_retrograde());
}

#[test]
fn test_load_chart_rejects_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "chart.json", "{\"id\": ");
    assert!(commands::load_chart(&path).is_err());
    assert!(commands::load_chart(&dir.path().join("missing.json")).is_err());
}

#[test]
fn test_parse_date() {
    let at = commands::parse_date(Some("2026-03-20")).unwrap();
    assert_eq!(at.format("%Y-%m-%d %H:%M").to_string(), "2026-03-20 12:00");
    assert!(commands::parse_date(Some("20-03-2026")).is_err());
    assert!(commands::parse_date(None).is_ok());
}

#[test]
fn test_load_config_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "orrery.toml", "[transits]\nwindow_buffer_days = 2\n");
    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.window_buffer_days, 2);

    let bad = write_file(&dir, "bad.toml", "[transits]\npromotion_max_orb = 5.0\n");
    assert!(commands::load_config(Some(&bad)).is_err());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a longer title", 8), "a lon...");
}

// ========== Chart Command Tests ==========

#[test]
fn test_detect_chart_patterns() {
    let inputs = inputs();
    let patterns = commands::detect_chart_patterns(None, &inputs.chart).unwrap();
    let kinds: Vec<PatternKind> = patterns.iter().map(|p| p.kind).collect();
    assert!(kinds.contains(&PatternKind::GrandTrine));
    assert!(kinds.contains(&PatternKind::TSquare));
    assert!(kinds.contains(&PatternKind::Yod));
    assert!(commands::cmd_patterns(None, &inputs.chart).is_ok());
}

#[test]
fn test_body_dignity() {
    // Venus at 45° is in Taurus, its own sign
    let (position, dignity) = commands::body_dignity("Venus", 45.0).unwrap();
    assert_eq!(position.id, "venus");
    assert!(dignity.ruler);
    assert_eq!(dignity.score, 5);

    // Sun at 190° is in Libra, its fall
    let (_, dignity) = commands::body_dignity("sun", 190.0).unwrap();
    assert!(dignity.fall);
    assert!(dignity.score < 0);

    assert!(commands::body_dignity("sun", f64::NAN).is_err());
    assert!(commands::cmd_dignity("moon", -30.0).is_ok());
}

// ========== Analysis Command Tests ==========

#[test]
fn test_run_windows() {
    let inputs = inputs();
    let analysis =
        commands::run_windows(None, &inputs.chart, &inputs.positions, Some("2026-03-20")).unwrap();

    assert_eq!(analysis.birth_chart_id, "chart-1");
    assert!(!analysis.transits.is_empty());
    assert!(analysis
        .windows
        .iter()
        .any(|w| w.window_type == WindowType::Challenge));
    assert!(commands::cmd_windows(None, &inputs.chart, &inputs.positions, None).is_ok());
}

#[tokio::test]
async fn test_run_analysis() {
    let inputs = inputs();
    let analysis = commands::run_analysis(
        None,
        &inputs.chart,
        &inputs.positions,
        Some("2026-03-20"),
    )
    .await
    .unwrap();

    assert_eq!(analysis.birth_chart_id, "chart-1");
    assert!(analysis.date.is_some());
    assert!(analysis
        .insights
        .iter()
        .any(|i| i.category == InsightCategory::Transit));
    assert!(analysis
        .insights
        .iter()
        .any(|i| i.category == InsightCategory::CoreIdentity));
}

#[tokio::test]
async fn test_analysis_of_chart_without_houses() {
    let dir = tempfile::tempdir().unwrap();
    let mut chart = sample_chart("chart-1");
    chart.houses.clear();
    let chart_path = write_file(&dir, "chart.json", &serde_json::to_string(&chart).unwrap());
    let positions = write_file(&dir, "positions.json", POSITIONS);

    let analysis = commands::run_analysis(None, &chart_path, &positions, Some("2026-03-20"))
        .await
        .unwrap();
    assert!(analysis
        .insights
        .iter()
        .any(|i| i.category == InsightCategory::Transit));

    let windows =
        commands::run_windows(None, &chart_path, &positions, Some("2026-03-20")).unwrap();
    assert!(windows
        .transits
        .iter()
        .all(|t| t.transiting_house.is_none()));
}

#[tokio::test]
async fn test_cmd_analyze_outputs() {
    let inputs = inputs();
    commands::cmd_analyze(None, &inputs.chart, &inputs.positions, None, false)
        .await
        .unwrap();
    commands::cmd_analyze(
        None,
        &inputs.chart,
        &inputs.positions,
        Some("2026-03-20"),
        true,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_analysis_with_invalid_date_fails() {
    let inputs = inputs();
    let result =
        commands::run_analysis(None, &inputs.chart, &inputs.positions, Some("tomorrow")).await;
    assert!(result.is_err());
}
