//! Orrery Core Library
//!
//! Shared functionality for the Orrery transit insight engine:
//! - Ecliptic geometry (signs, separations, orbs, houses)
//! - Essential dignity scoring
//! - Aspect and macro-pattern detection
//! - Transit classification and window aggregation
//! - Failure-tolerant insight cache
//! - Insight orchestrator with single-flight computation
//! - Pluggable collaborators (ephemeris, chart store, life themes, prose)

pub mod cache;
pub mod config;
pub mod dignity;
pub mod error;
pub mod geometry;
pub mod insights;
pub mod models;
pub mod narrative;
pub mod patterns;
pub mod providers;
pub mod transits;

/// Test utilities: chart fixtures and failing collaborators
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{CacheBackend, InMemoryCache, InsightCacheManager};
pub use config::OrreryConfig;
pub use dignity::{DignityCalculator, DignityTables};
pub use error::{Error, Result};
pub use insights::{Insight, InsightAnalysis, InsightCategory, InsightOrchestrator, Severity};
pub use models::{
    Aspect, AspectNature, AspectType, BirthChart, CelestialBody, ChartAngles, Dignity, Element,
    GeoLocation, HouseCusp, LifeThemeAnalysis, Modality, Pattern, PatternKind, ZodiacSign,
};
pub use narrative::NarrativeRequest;
pub use patterns::{OrbTable, PatternDetector};
pub use providers::{
    BirthChartStore, EphemerisChart, EphemerisProvider, InMemoryChartStore, LifeThemeAnalyzer,
    NarrativeGenerator, StaticEphemeris, TemplateLifeThemeAnalyzer, TemplateNarrator,
};
pub use transits::{
    Transit, TransitAnalysis, TransitAnalyzer, TransitClassifier, TransitWindow, WindowAggregator,
    WindowType,
};
