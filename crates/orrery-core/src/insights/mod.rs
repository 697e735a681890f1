//! Insight Engine - structured chart insights
//!
//! The orchestrator loads a birth chart, gathers its life theme and current
//! transits, and runs a set of pluggable builders over the result. Each builder
//! covers one category of insight.
//!
//! ## Insight Categories
//!
//! - **Core Identity** - Sun, Moon and rising sign
//! - **Dignity** - planets strong or weak in their signs
//! - **Pattern** - Grand Trine, T-Square and Yod configurations
//! - **Life Theme** - the life theme analyzer's summary
//! - **Transit** - current opportunity, challenge and integration windows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orrery_core::insights::InsightOrchestrator;
//!
//! let orchestrator = InsightOrchestrator::new(charts, ephemeris, themes, cache, &config);
//! let analysis = orchestrator.analyze("chart-1").await?;
//! ```

pub mod builders;
pub mod engine;
pub mod types;


pub use builders::{
    overall_summary, AnalysisContext, CoreIdentityBuilder, DignityBuilder, InsightBuilder,
    LifeThemeBuilder, PatternBuilder, TransitBuilder,
};
pub use engine::InsightOrchestrator;
pub use types::{Insight, InsightAnalysis, InsightCategory, Severity};
