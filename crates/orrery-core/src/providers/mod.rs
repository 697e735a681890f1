//! External collaborators
//!
//! The engine computes geometry and classification itself but consumes
//! positions, stored charts, life themes and prose from outside. Each of those
//! sits behind an async trait here.
//!
//! # Architecture
//!
//! - `EphemerisProvider`: planetary positions, aspects and house cusps
//! - `BirthChartStore`: stored natal charts by id
//! - `LifeThemeAnalyzer`: whole-chart life theme summary
//! - `NarrativeGenerator`: turns structured insight data into prose
//!
//! In-memory implementations (`StaticEphemeris`, `InMemoryChartStore`,
//! `TemplateLifeThemeAnalyzer`, `TemplateNarrator`) back the CLI and tests.

mod memory;

pub use crate::cache::{CacheBackend, InMemoryCache};
pub use memory::{
    InMemoryChartStore, StaticEphemeris, TemplateLifeThemeAnalyzer, TemplateNarrator,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    Aspect, BirthChart, CelestialBody, ChartAngles, GeoLocation, HouseCusp, LifeThemeAnalysis,
};
use crate::narrative::NarrativeRequest;

/// Everything an ephemeris computes for one instant and place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemerisChart {
    pub bodies: Vec<CelestialBody>,
    pub aspects: Vec<Aspect>,
    pub houses: Vec<HouseCusp>,
    #[serde(default)]
    pub angles: Option<ChartAngles>,
}

/// Source of planetary positions
#[async_trait]
pub trait EphemerisProvider: Send + Sync {
    /// Body positions at `time` as seen from `location`
    async fn calculate_positions(
        &self,
        time: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<Vec<CelestialBody>>;

    /// Aspects between the given bodies
    async fn calculate_aspects(&self, bodies: &[CelestialBody]) -> Result<Vec<Aspect>>;

    /// The twelve house cusps at `time` and `location`
    async fn calculate_houses(
        &self,
        time: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<Vec<HouseCusp>>;

    /// Positions, aspects, houses and angles together
    async fn calculate_birth_chart(
        &self,
        time: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<EphemerisChart>;
}

/// Stored natal charts
#[async_trait]
pub trait BirthChartStore: Send + Sync {
    /// `Ok(None)` when no chart has this id
    async fn get_by_id(&self, id: &str) -> Result<Option<BirthChart>>;
}

/// Whole-chart life theme summary
#[async_trait]
pub trait LifeThemeAnalyzer: Send + Sync {
    async fn analyze(&self, chart: &BirthChart) -> Result<LifeThemeAnalysis>;
}

/// Prose for structured insight data
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn narrate(&self, request: &NarrativeRequest) -> Result<String>;
}
