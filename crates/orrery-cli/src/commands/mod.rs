//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analysis` - Orchestrated insight analysis and transit windows
//! - `chart` - Natal chart commands (patterns, dignity)
//!
//! Shared input loading lives here.

pub mod analysis;
pub mod chart;

// Re-export command functions for main.rs
pub use analysis::*;
pub use chart::*;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use orrery_core::geometry::house_for_longitude;
use orrery_core::{BirthChart, CelestialBody, OrreryConfig};
use serde::Deserialize;

/// A transiting body as written in a positions file
///
/// Name, sign and in-sign degree are derived from the longitude. When the
/// house is omitted it is taken from the natal cusps.
#[derive(Debug, Deserialize)]
pub struct PositionInput {
    pub id: String,
    pub longitude: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub house: Option<u8>,
}

/// Load the config from `--config`, else the default override, else embedded
pub fn load_config(path: Option<&Path>) -> Result<OrreryConfig> {
    let config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Using config from --config");
            OrreryConfig::load_from(path)
        }
        None => OrreryConfig::load(),
    };
    let config = config.context("Failed to load config")?;
    tracing::debug!(
        cache_ttl_secs = config.cache_ttl.as_secs(),
        window_buffer_days = config.window_buffer_days,
        promotion_max_orb = config.promotion_max_orb,
        "Config loaded"
    );
    Ok(config)
}

pub fn load_chart(path: &Path) -> Result<BirthChart> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read chart file {}", path.display()))?;
    let chart: BirthChart = serde_json::from_str(&content)
        .with_context(|| format!("Invalid chart JSON in {}", path.display()))?;
    for body in &chart.bodies {
        body.validate()
            .with_context(|| format!("Invalid body in {}", path.display()))?;
    }
    if chart.houses.len() != 12 {
        tracing::info!(
            birth_chart_id = %chart.id,
            houses = chart.houses.len(),
            "Chart has no full set of house cusps, transiting houses will be omitted"
        );
    }
    tracing::debug!(
        birth_chart_id = %chart.id,
        bodies = chart.bodies.len(),
        "Chart loaded"
    );
    Ok(chart)
}

/// Load transiting positions, placing bodies without a house in the chart's
pub fn load_positions(path: &Path, chart: &BirthChart) -> Result<Vec<CelestialBody>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read positions file {}", path.display()))?;
    let inputs: Vec<PositionInput> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid positions JSON in {}", path.display()))?;

    let positions: Vec<CelestialBody> = inputs
        .into_iter()
        .map(|p| {
            let house = p
                .house
                .or_else(|| house_for_longitude(p.longitude, &chart.houses))
                .unwrap_or(1);
            CelestialBody::at(p.id, p.longitude, p.speed, house)
        })
        .collect();
    tracing::debug!(positions = positions.len(), "Transiting positions loaded");
    Ok(positions)
}

/// Parse `--date` as noon UTC on that day, defaulting to now
pub fn parse_date(date: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(date) = date else {
        return Ok(Utc::now());
    };
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .context("Invalid --date format (use YYYY-MM-DD)")?;
    let noon = day
        .and_hms_opt(12, 0, 0)
        .context("Invalid --date value")?;
    Ok(noon.and_utc())
}

/// Truncate a string for table output
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
