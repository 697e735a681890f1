//! Analysis command implementations (analyze, windows)

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use orrery_core::narrative::narrate_all;
use orrery_core::transits::SignificanceWeights;
use orrery_core::{
    InMemoryCache, InMemoryChartStore, InsightAnalysis, InsightOrchestrator, PatternDetector,
    Severity, StaticEphemeris, TemplateLifeThemeAnalyzer, TemplateNarrator, TransitAnalysis,
    TransitAnalyzer, TransitClassifier, WindowAggregator, WindowType,
};

use super::{load_chart, load_config, load_positions, parse_date, truncate};

/// Run the orchestrated analysis for one chart file
pub async fn run_analysis(
    config_path: Option<&Path>,
    chart_path: &Path,
    positions_path: &Path,
    date: Option<&str>,
) -> Result<InsightAnalysis> {
    let config = load_config(config_path)?;
    let chart = load_chart(chart_path)?;
    let positions = load_positions(positions_path, &chart)?;
    let chart_id = chart.id.clone();

    let ephemeris = StaticEphemeris::new(positions).with_houses(chart.houses.clone());
    let store = InMemoryChartStore::new();
    store.insert(chart).await;

    let orchestrator = InsightOrchestrator::new(
        Arc::new(store),
        Arc::new(ephemeris),
        Arc::new(TemplateLifeThemeAnalyzer::new()),
        Arc::new(InMemoryCache::new()),
        &config,
    );

    let analysis = match date {
        Some(_) => {
            let at = parse_date(date)?;
            orchestrator.analyze_for_date(&chart_id, at).await
        }
        None => orchestrator.analyze(&chart_id).await,
    };
    analysis.with_context(|| format!("Analysis failed for chart {}", chart_id))
}

pub async fn cmd_analyze(
    config_path: Option<&Path>,
    chart_path: &Path,
    positions_path: &Path,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let analysis = run_analysis(config_path, chart_path, positions_path, date).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!();
    println!("🔭 Insights for chart {}", analysis.birth_chart_id);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {}", analysis.overall_summary);
    println!();

    let narratives = narrate_all(&TemplateNarrator, &analysis)
        .await
        .context("Failed to narrate insights")?;
    for insight in &analysis.insights {
        let marker = match insight.severity {
            Severity::High => "🔴",
            Severity::Medium => "🟡",
            Severity::Low => "⚪",
        };
        println!(
            "   {} [{}] {}",
            marker,
            insight.category,
            truncate(&insight.title, 60)
        );
        if let Some((_, text)) = narratives.iter().find(|(key, _)| *key == insight.key) {
            println!("      {}", truncate(text, 100));
        }
    }

    println!();
    println!(
        "   High: {}  Medium: {}  Low: {}",
        analysis.count_by_severity(Severity::High),
        analysis.count_by_severity(Severity::Medium),
        analysis.count_by_severity(Severity::Low)
    );

    Ok(())
}

/// Transit analysis for one chart file, without the life theme step
pub fn run_windows(
    config_path: Option<&Path>,
    chart_path: &Path,
    positions_path: &Path,
    date: Option<&str>,
) -> Result<TransitAnalysis> {
    let config = load_config(config_path)?;
    let chart = load_chart(chart_path)?;
    let positions = load_positions(positions_path, &chart)?;
    let at = parse_date(date)?;

    let analyzer = TransitAnalyzer::new(
        PatternDetector::new(config.orbs.clone()),
        TransitClassifier::new(SignificanceWeights::default(), config.promotion_max_orb),
        WindowAggregator::new(config.window_buffer_days),
    );
    analyzer
        .analyze(&chart, &positions, at)
        .with_context(|| format!("Transit analysis failed for chart {}", chart.id))
}

pub fn cmd_windows(
    config_path: Option<&Path>,
    chart_path: &Path,
    positions_path: &Path,
    date: Option<&str>,
) -> Result<()> {
    let analysis = run_windows(config_path, chart_path, positions_path, date)?;

    println!();
    println!(
        "🪐 Transit windows for chart {} on {}",
        analysis.birth_chart_id,
        analysis.date.format("%Y-%m-%d")
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if analysis.windows.is_empty() {
        println!("   No close transits on this date.");
        return Ok(());
    }

    for window in &analysis.windows {
        let marker = match window.window_type {
            WindowType::Opportunity => "✨",
            WindowType::Challenge => "⚡",
            WindowType::Integration => "🔄",
        };
        println!("   {} {} ({:.2})", marker, window.title, window.significance);
        println!(
            "      {} to {}",
            window.start_date.format("%Y-%m-%d"),
            window.end_date.format("%Y-%m-%d")
        );
        for transit in &window.transits {
            println!(
                "      {} {} natal {} (orb {:.2}°, exact {})",
                transit.planet,
                transit.aspect_type,
                transit.aspecting_natal,
                transit.orb,
                transit.exact_date.format("%Y-%m-%d")
            );
        }
    }

    if !analysis.major_themes.is_empty() {
        println!();
        println!("   Themes: {}", analysis.major_themes.join(", "));
    }
    for recommendation in &analysis.recommendations {
        println!("   • {}", recommendation);
    }

    Ok(())
}
