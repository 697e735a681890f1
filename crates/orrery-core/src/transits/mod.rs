//! Transits - moving positions measured against a natal chart
//!
//! A transit is an aspect from a body's current position to a body in the
//! birth chart. The pipeline runs in three stages:
//!
//! - **Detection** - cross aspects between transiting and natal bodies
//!   (`PatternDetector::detect_cross_aspects`)
//! - **Classification** - window type, significance and exact date for each
//!   close aspect (`TransitClassifier`)
//! - **Aggregation** - same-type transits folded into dated windows with
//!   themes and recommendations (`WindowAggregator`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orrery_core::transits::TransitAnalyzer;
//!
//! let analyzer = TransitAnalyzer::default();
//! let analysis = analyzer.analyze(&chart, &positions, Utc::now())?;
//! ```

pub mod classifier;
pub mod types;
pub mod window;

pub use classifier::{
    estimate_exact_date, HouseClass, PlanetClass, SignificanceWeights, TransitClassifier,
};
pub use types::{StrengthTier, Transit, TransitAnalysis, TransitWindow, WindowType};
pub use window::{WindowAggregator, DEFAULT_BUFFER_DAYS, MAX_BUFFER_DAYS};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{BirthChart, CelestialBody};
use crate::patterns::PatternDetector;

/// Runs detection, classification and aggregation for one chart
#[derive(Debug, Clone, Default)]
pub struct TransitAnalyzer {
    detector: PatternDetector,
    classifier: TransitClassifier,
    aggregator: WindowAggregator,
}

impl TransitAnalyzer {
    pub fn new(
        detector: PatternDetector,
        classifier: TransitClassifier,
        aggregator: WindowAggregator,
    ) -> Self {
        Self {
            detector,
            classifier,
            aggregator,
        }
    }

    /// Promoted transits from `transiting` to the chart's bodies, in
    /// detection order
    pub fn transits(
        &self,
        chart: &BirthChart,
        transiting: &[CelestialBody],
        at: DateTime<Utc>,
    ) -> Result<Vec<Transit>> {
        let aspects = self.detector.detect_cross_aspects(transiting, &chart.bodies)?;

        let mut transits = Vec::new();
        for aspect in &aspects {
            let (Some(moving), Some(natal)) = (
                transiting.iter().find(|b| b.id == aspect.body_a),
                chart.body(&aspect.body_b),
            ) else {
                continue;
            };
            if let Some(transit) =
                self.classifier
                    .classify(moving, natal, aspect, &chart.houses, at)?
            {
                transits.push(transit);
            }
        }

        tracing::debug!(
            birth_chart_id = %chart.id,
            aspects = aspects.len(),
            transits = transits.len(),
            "Transit classification complete"
        );
        Ok(transits)
    }

    /// Full transit analysis for a chart at `at`
    pub fn analyze(
        &self,
        chart: &BirthChart,
        transiting: &[CelestialBody],
        at: DateTime<Utc>,
    ) -> Result<TransitAnalysis> {
        let transits = self.transits(chart, transiting, at)?;
        Ok(self.aggregator.analyze(&chart.id, at, transits))
    }
}
