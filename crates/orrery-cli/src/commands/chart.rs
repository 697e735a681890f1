//! Natal chart command implementations (patterns, dignity)

use std::path::Path;

use anyhow::{Context, Result};
use orrery_core::dignity::describe;
use orrery_core::{CelestialBody, Dignity, DignityCalculator, Pattern, PatternDetector};

use super::{load_chart, load_config};

pub fn detect_chart_patterns(
    config_path: Option<&Path>,
    chart_path: &Path,
) -> Result<Vec<Pattern>> {
    let config = load_config(config_path)?;
    let chart = load_chart(chart_path)?;
    PatternDetector::new(config.orbs)
        .detect_patterns(&chart.bodies)
        .context("Pattern detection failed")
}

pub fn cmd_patterns(config_path: Option<&Path>, chart_path: &Path) -> Result<()> {
    let patterns = detect_chart_patterns(config_path, chart_path)?;

    println!();
    println!("🔺 Chart patterns");
    println!("   ─────────────────────────────────────────────────────────────");

    if patterns.is_empty() {
        println!("   No Grand Trine, T-Square or Yod found.");
        return Ok(());
    }

    for pattern in &patterns {
        println!("   {}: {}", pattern.title, pattern.bodies.join(", "));
        if !pattern.houses.is_empty() {
            let houses: Vec<String> = pattern.houses.iter().map(|h| h.to_string()).collect();
            println!("      Houses: {}", houses.join(", "));
        }
        for strength in &pattern.strengths {
            println!("      + {}", strength);
        }
        for challenge in &pattern.challenges {
            println!("      - {}", challenge);
        }
    }

    Ok(())
}

/// Dignity of `body` at `longitude`, from the sign the longitude falls in
pub fn body_dignity(body: &str, longitude: f64) -> Result<(CelestialBody, Dignity)> {
    if !longitude.is_finite() {
        anyhow::bail!("Longitude must be a finite number of degrees");
    }
    let position = CelestialBody::at(body.trim().to_lowercase(), longitude, 0.0, 1);
    let dignity = DignityCalculator::default().dignity_for_body(&position);
    Ok((position, dignity))
}

pub fn cmd_dignity(body: &str, longitude: f64) -> Result<()> {
    let (position, dignity) = body_dignity(body, longitude)?;

    println!(
        "{} at {:.2}° {} ({:.2}° ecliptic)",
        position.name, position.sign_longitude, position.sign, position.longitude
    );
    println!("   Condition: {}", describe(&dignity));
    println!("   Score: {:+}", dignity.score);

    Ok(())
}
