//! Insight orchestrator - cache lookup, fetch, compose, cache store

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use crate::cache::{insight_key, CacheBackend, Generation, InsightCacheManager};
use crate::config::OrreryConfig;
use crate::dignity::DignityCalculator;
use crate::error::{Error, Result};
use crate::models::{BirthChart, HouseCusp, LifeThemeAnalysis};
use crate::patterns::PatternDetector;
use crate::providers::{BirthChartStore, EphemerisProvider, LifeThemeAnalyzer};
use crate::transits::{
    SignificanceWeights, TransitAnalysis, TransitAnalyzer, TransitClassifier, WindowAggregator,
};

use super::builders::{
    overall_summary, AnalysisContext, CoreIdentityBuilder, DignityBuilder, InsightBuilder,
    LifeThemeBuilder, PatternBuilder, TransitBuilder,
};
use super::types::{InsightAnalysis, InsightCategory};

type Cell = Arc<OnceCell<InsightAnalysis>>;
type InFlight = Mutex<HashMap<String, Cell>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, Cell>> {
    // Entries are plain Arcs, so a poisoned map is still consistent
    in_flight.lock().unwrap_or_else(|e| e.into_inner())
}

/// Removes a request's in-flight entry when the request finishes or is dropped
struct InFlightGuard<'a> {
    in_flight: &'a InFlight,
    key: String,
    cell: Cell,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = lock(self.in_flight);
        if in_flight
            .get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.cell))
        {
            in_flight.remove(&self.key);
        }
    }
}

/// Composes chart, life theme and transit data into one `InsightAnalysis`
///
/// Results are cached per chart (and per date for dated requests). Concurrent
/// misses for the same key share one computation.
pub struct InsightOrchestrator {
    charts: Arc<dyn BirthChartStore>,
    ephemeris: Arc<dyn EphemerisProvider>,
    life_themes: Arc<dyn LifeThemeAnalyzer>,
    cache: InsightCacheManager,
    transits: TransitAnalyzer,
    builders: Vec<Box<dyn InsightBuilder>>,
    in_flight: InFlight,
}

impl InsightOrchestrator {
    /// Create an orchestrator with the built-in insight builders
    pub fn new(
        charts: Arc<dyn BirthChartStore>,
        ephemeris: Arc<dyn EphemerisProvider>,
        life_themes: Arc<dyn LifeThemeAnalyzer>,
        cache: Arc<dyn CacheBackend>,
        config: &OrreryConfig,
    ) -> Self {
        let detector = PatternDetector::new(config.orbs.clone());
        let transits = TransitAnalyzer::new(
            detector.clone(),
            TransitClassifier::new(SignificanceWeights::default(), config.promotion_max_orb),
            WindowAggregator::new(config.window_buffer_days),
        );

        let mut orchestrator = Self {
            charts,
            ephemeris,
            life_themes,
            cache: InsightCacheManager::new(cache, config.cache_ttl),
            transits,
            builders: Vec::new(),
            in_flight: Mutex::new(HashMap::new()),
        };

        // Register built-in builders
        orchestrator.register(Box::new(CoreIdentityBuilder));
        orchestrator.register(Box::new(DignityBuilder::new(DignityCalculator::default())));
        orchestrator.register(Box::new(PatternBuilder::new(detector)));
        orchestrator.register(Box::new(LifeThemeBuilder));
        orchestrator.register(Box::new(TransitBuilder));

        orchestrator
    }

    /// Register an insight builder
    pub fn register(&mut self, builder: Box<dyn InsightBuilder>) {
        self.builders.push(builder);
    }

    /// Get list of registered insight categories
    pub fn insight_categories(&self) -> Vec<InsightCategory> {
        self.builders.iter().map(|b| b.id()).collect()
    }

    /// Analysis for a chart with transits at the current instant
    pub async fn analyze(&self, birth_chart_id: &str) -> Result<InsightAnalysis> {
        self.analyze_keyed(birth_chart_id, None).await
    }

    /// Analysis for a chart with transits at `date`
    pub async fn analyze_for_date(
        &self,
        birth_chart_id: &str,
        date: DateTime<Utc>,
    ) -> Result<InsightAnalysis> {
        self.analyze_keyed(birth_chart_id, Some(date)).await
    }

    /// Transit analysis alone, cache first
    pub async fn transit_analysis(
        &self,
        birth_chart_id: &str,
        date: DateTime<Utc>,
    ) -> Result<TransitAnalysis> {
        validate_id(birth_chart_id)?;
        if let Some(cached) = self.cache.get_transit(birth_chart_id, date).await {
            return Ok(cached);
        }
        let generation = self.cache.generation(birth_chart_id).await;

        let chart = self.load_chart(birth_chart_id).await?;
        let (positions, houses) = tokio::try_join!(
            self.ephemeris.calculate_positions(date, &chart.location),
            self.natal_houses(&chart),
        )?;
        let chart = BirthChart { houses, ..chart };

        let analysis = self.transits.analyze(&chart, &positions, date)?;
        self.cache.set_transit(&analysis, generation).await;
        Ok(analysis)
    }

    /// Drop everything cached for a chart so the next request recomputes
    ///
    /// Computations already running for the chart still answer their own
    /// callers, but their cache writes are discarded.
    pub async fn invalidate(&self, birth_chart_id: &str) {
        let undated = insight_key(birth_chart_id, None);
        let dated_prefix = format!("{}:", undated);
        lock(&self.in_flight)
            .retain(|key, _| *key != undated && !key.starts_with(&dated_prefix));

        self.cache.invalidate_all(birth_chart_id).await;
    }

    #[cfg(test)]
    pub(crate) fn in_flight_len(&self) -> usize {
        lock(&self.in_flight).len()
    }

    async fn analyze_keyed(
        &self,
        birth_chart_id: &str,
        date: Option<DateTime<Utc>>,
    ) -> Result<InsightAnalysis> {
        validate_id(birth_chart_id)?;

        if let Some(cached) = self.cache.get_insight(birth_chart_id, date).await {
            return Ok(cached);
        }

        let key = insight_key(birth_chart_id, date);
        let cell = lock(&self.in_flight)
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        let guard = InFlightGuard {
            in_flight: &self.in_flight,
            key,
            cell,
        };

        // A failed or dropped initialisation leaves the cell empty and the
        // next waiter runs the computation itself
        let result = guard
            .cell
            .get_or_try_init(|| self.compute(birth_chart_id, date))
            .await
            .cloned();
        drop(guard);
        result
    }

    async fn compute(
        &self,
        birth_chart_id: &str,
        date: Option<DateTime<Utc>>,
    ) -> Result<InsightAnalysis> {
        tracing::debug!(birth_chart_id = %birth_chart_id, ?date, "Computing insight analysis");

        let generation = self.cache.generation(birth_chart_id).await;
        let chart = self.load_chart(birth_chart_id).await?;
        let at = date.unwrap_or_else(Utc::now);

        let (life_theme, positions, houses) = tokio::try_join!(
            self.life_theme(&chart, generation),
            self.ephemeris.calculate_positions(at, &chart.location),
            self.natal_houses(&chart),
        )?;
        let chart = BirthChart { houses, ..chart };

        let transit_analysis = self.transits.analyze(&chart, &positions, at)?;
        // Undated runs use the current instant, which a day-keyed entry would misreport
        if date.is_some() {
            self.cache.set_transit(&transit_analysis, generation).await;
        }

        let ctx = AnalysisContext {
            chart: &chart,
            life_theme: &life_theme,
            transits: Some(&transit_analysis),
        };

        let mut insights = Vec::new();
        for builder in &self.builders {
            let built = builder.build(&ctx)?;
            tracing::debug!(
                builder = builder.name(),
                count = built.len(),
                "Insight builder complete"
            );
            insights.extend(built);
        }

        // Highest severity first; builder order breaks ties
        insights.sort_by(|a, b| b.severity.priority().cmp(&a.severity.priority()));

        let now = Utc::now();
        let analysis = InsightAnalysis {
            birth_chart_id: chart.id.clone(),
            user_id: chart.user_id.clone(),
            date,
            overall_summary: overall_summary(&insights),
            insights,
            created_at: now,
            updated_at: now,
        };

        self.cache.set_insight(&analysis, generation).await;

        tracing::info!(
            birth_chart_id = %analysis.birth_chart_id,
            insights = analysis.insights.len(),
            windows = transit_analysis.windows.len(),
            "Insight analysis complete"
        );
        Ok(analysis)
    }

    async fn load_chart(&self, birth_chart_id: &str) -> Result<BirthChart> {
        self.charts
            .get_by_id(birth_chart_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Birth chart {}", birth_chart_id)))
    }

    /// Life theme, cache first
    async fn life_theme(
        &self,
        chart: &BirthChart,
        generation: Generation,
    ) -> Result<LifeThemeAnalysis> {
        if let Some(cached) = self.cache.get_life_theme(&chart.id).await {
            return Ok(cached);
        }
        let analysis = self.life_themes.analyze(chart).await?;
        self.cache.set_life_theme(&analysis, generation).await;
        Ok(analysis)
    }

    /// The chart's own cusps, else the ephemeris's for the birth moment
    ///
    /// Cusps are optional. When the ephemeris cannot supply them the analysis
    /// goes ahead without transiting houses; other failures propagate.
    async fn natal_houses(&self, chart: &BirthChart) -> Result<Vec<HouseCusp>> {
        if chart.houses.len() == 12 {
            return Ok(chart.houses.clone());
        }
        match self
            .ephemeris
            .calculate_houses(chart.birth_time, &chart.location)
            .await
        {
            Err(Error::ServiceUnavailable(reason)) => {
                tracing::warn!(
                    birth_chart_id = %chart.id,
                    reason = %reason,
                    "House cusps unavailable, continuing without transiting houses"
                );
                Ok(Vec::new())
            }
            result => result,
        }
    }
}

fn validate_id(birth_chart_id: &str) -> Result<()> {
    if birth_chart_id.trim().is_empty() {
        return Err(Error::Validation("Birth chart id is empty".to_string()));
    }
    Ok(())
}
