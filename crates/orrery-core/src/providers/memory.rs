//! In-memory collaborators
//!
//! Deterministic stand-ins for the external services. Each one counts its
//! calls so tests can assert that cached paths skip it, and the slow ones can
//! be given an artificial delay for concurrency tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::{
    Aspect, BirthChart, CelestialBody, ChartAngles, Element, GeoLocation, HouseCusp,
    LifeThemeAnalysis,
};
use crate::narrative::NarrativeRequest;
use crate::patterns::PatternDetector;

use super::{
    BirthChartStore, EphemerisChart, EphemerisProvider, LifeThemeAnalyzer, NarrativeGenerator,
};

/// Ephemeris that returns one fixed set of positions for every instant
#[derive(Default)]
pub struct StaticEphemeris {
    positions: Vec<CelestialBody>,
    houses: Vec<HouseCusp>,
    angles: Option<ChartAngles>,
    detector: PatternDetector,
    delay: Option<Duration>,
    position_calls: AtomicUsize,
    house_calls: AtomicUsize,
}

impl StaticEphemeris {
    pub fn new(positions: Vec<CelestialBody>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    pub fn with_houses(mut self, houses: Vec<HouseCusp>) -> Self {
        self.houses = houses;
        self
    }

    pub fn with_angles(mut self, angles: ChartAngles) -> Self {
        self.angles = Some(angles);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn position_calls(&self) -> usize {
        self.position_calls.load(Ordering::SeqCst)
    }

    pub fn house_calls(&self) -> usize {
        self.house_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl EphemerisProvider for StaticEphemeris {
    async fn calculate_positions(
        &self,
        _time: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<Vec<CelestialBody>> {
        location.validate()?;
        self.position_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.positions.clone())
    }

    async fn calculate_aspects(&self, bodies: &[CelestialBody]) -> Result<Vec<Aspect>> {
        self.detector.detect_aspects(bodies)
    }

    async fn calculate_houses(
        &self,
        _time: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<Vec<HouseCusp>> {
        location.validate()?;
        self.house_calls.fetch_add(1, Ordering::SeqCst);
        if self.houses.is_empty() {
            return Err(Error::ServiceUnavailable(
                "No house cusps configured".to_string(),
            ));
        }
        Ok(self.houses.clone())
    }

    async fn calculate_birth_chart(
        &self,
        time: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<EphemerisChart> {
        let bodies = self.calculate_positions(time, location).await?;
        let aspects = self.calculate_aspects(&bodies).await?;
        Ok(EphemerisChart {
            bodies,
            aspects,
            houses: self.houses.clone(),
            angles: self.angles.clone(),
        })
    }
}

/// Chart store backed by a map
#[derive(Default)]
pub struct InMemoryChartStore {
    charts: RwLock<HashMap<String, BirthChart>>,
    lookups: AtomicUsize,
}

impl InMemoryChartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, chart: BirthChart) {
        self.charts.write().await.insert(chart.id.clone(), chart);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BirthChartStore for InMemoryChartStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<BirthChart>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.charts.read().await.get(id).cloned())
    }
}

/// Life themes built from element balance and the luminaries' signs
#[derive(Default)]
pub struct TemplateLifeThemeAnalyzer {
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl TemplateLifeThemeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

const ELEMENTS: [Element; 4] = [Element::Fire, Element::Earth, Element::Air, Element::Water];

fn element_strength(element: Element) -> &'static str {
    match element {
        Element::Fire => "Enthusiasm and the courage to start things",
        Element::Earth => "Patience and a gift for making ideas tangible",
        Element::Air => "Curiosity and ease with people and ideas",
        Element::Water => "Emotional depth and strong intuition",
    }
}

fn element_challenge(element: Element) -> &'static str {
    match element {
        Element::Fire => "Finding motivation when nothing sparks it",
        Element::Earth => "Staying grounded in practical routines",
        Element::Air => "Stepping back to see a situation objectively",
        Element::Water => "Recognising and voicing feelings",
    }
}

fn element_theme(element: Element) -> &'static str {
    match element {
        Element::Fire => "Self-expression and initiative",
        Element::Earth => "Building security and lasting structures",
        Element::Air => "Connection, learning and exchange",
        Element::Water => "Emotional bonds and inner life",
    }
}

#[async_trait]
impl LifeThemeAnalyzer for TemplateLifeThemeAnalyzer {
    async fn analyze(&self, chart: &BirthChart) -> Result<LifeThemeAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let sun = chart
            .body("sun")
            .ok_or_else(|| Error::Validation(format!("Chart {} has no Sun", chart.id)))?;

        let mut parts = vec![format!("{} Sun", sun.sign)];
        if let Some(moon) = chart.body("moon") {
            parts.push(format!("{} Moon", moon.sign));
        }
        if let Some(rising) = chart.rising_sign() {
            parts.push(format!("{} rising", rising));
        }

        let counts: Vec<(Element, usize)> = ELEMENTS
            .iter()
            .map(|e| {
                let n = chart.bodies.iter().filter(|b| b.sign.element() == *e).count();
                (*e, n)
            })
            .collect();
        let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);

        let strengths = counts
            .iter()
            .filter(|(_, n)| *n == max && max > 0)
            .map(|(e, _)| element_strength(*e).to_string())
            .collect();
        let challenges = counts
            .iter()
            .filter(|(_, n)| *n == 0)
            .map(|(e, _)| element_challenge(*e).to_string())
            .collect();

        let mut themes = vec![element_theme(sun.sign.element()).to_string()];
        if let Some(moon) = chart.body("moon") {
            let theme = element_theme(moon.sign.element()).to_string();
            if !themes.contains(&theme) {
                themes.push(theme);
            }
        }

        Ok(LifeThemeAnalysis {
            birth_chart_id: chart.id.clone(),
            core_identity: parts.join(", "),
            strengths,
            challenges,
            themes,
        })
    }
}

/// Narrator that strings the facts together after the title
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

#[async_trait]
impl NarrativeGenerator for TemplateNarrator {
    async fn narrate(&self, request: &NarrativeRequest) -> Result<String> {
        if request.facts.is_empty() {
            return Ok(format!("{}.", request.title));
        }
        Ok(format!("{}. {}", request.title, request.facts.join(" ")))
    }
}
