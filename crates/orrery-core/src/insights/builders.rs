//! Insight builders - one per insight category
//!
//! Each builder reads the analysis context and produces zero or more insights.
//! Builders are pure; everything they need has already been fetched.

use crate::dignity::{describe, DignityCalculator};
use crate::error::Result;
use crate::models::{BirthChart, LifeThemeAnalysis, PatternKind};
use crate::patterns::PatternDetector;
use crate::transits::{TransitAnalysis, WindowType};

use super::types::{Insight, InsightCategory, Severity};

/// Inputs shared by every builder
pub struct AnalysisContext<'a> {
    pub chart: &'a BirthChart,
    pub life_theme: &'a LifeThemeAnalysis,
    /// Absent when no transiting positions were requested
    pub transits: Option<&'a TransitAnalysis>,
}

/// Trait for insight builders
pub trait InsightBuilder: Send + Sync {
    /// Category of the insights this builder produces
    fn id(&self) -> InsightCategory;

    /// Human-readable name
    fn name(&self) -> &'static str;

    fn build(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>>;
}

/// Sun, Moon and rising sign
pub struct CoreIdentityBuilder;

impl InsightBuilder for CoreIdentityBuilder {
    fn id(&self) -> InsightCategory {
        InsightCategory::CoreIdentity
    }

    fn name(&self) -> &'static str {
        "Core Identity"
    }

    fn build(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let chart = ctx.chart;
        let Some(sun) = chart.body("sun") else {
            return Ok(Vec::new());
        };

        let mut title = format!("Sun in {}", sun.sign);
        let mut description = format!(
            "Your Sun in {} ({:?}, {:?}) describes your core drive",
            sun.sign,
            sun.sign.element(),
            sun.sign.modality()
        );
        let mut bodies = vec![sun.id.clone()];

        if let Some(moon) = chart.body("moon") {
            title.push_str(&format!(", Moon in {}", moon.sign));
            description.push_str(&format!(
                "; your Moon in {} shows what you need to feel secure",
                moon.sign
            ));
            bodies.push(moon.id.clone());
        }
        if let Some(rising) = chart.rising_sign() {
            title.push_str(&format!(", {} rising", rising));
            description.push_str(&format!(
                "; {} rising colours how you meet the world",
                rising
            ));
        }
        description.push('.');

        Ok(vec![Insight::new(
            InsightCategory::CoreIdentity,
            "core_identity",
            Severity::High,
            title,
            description,
        )
        .with_bodies(bodies)
        .with_data(serde_json::json!({
            "sun": sun.sign,
            "moon": chart.body("moon").map(|m| m.sign),
            "rising": chart.rising_sign(),
        }))])
    }
}

/// Bodies in domicile, exaltation, detriment or fall
pub struct DignityBuilder {
    calculator: DignityCalculator,
}

impl DignityBuilder {
    pub fn new(calculator: DignityCalculator) -> Self {
        Self { calculator }
    }
}

impl InsightBuilder for DignityBuilder {
    fn id(&self) -> InsightCategory {
        InsightCategory::Dignity
    }

    fn name(&self) -> &'static str {
        "Essential Dignity"
    }

    fn build(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let mut insights = Vec::new();

        for body in &ctx.chart.bodies {
            let dignity = self.calculator.dignity_for_body(body);
            if dignity.score == 0 {
                continue;
            }

            let severity = match dignity.score.abs() {
                s if s >= 9 => Severity::High,
                s if s >= 5 => Severity::Medium,
                _ => Severity::Low,
            };
            let condition = describe(&dignity);
            let description = if dignity.score > 0 {
                format!(
                    "{} in {} is in {}, so its qualities come through with ease.",
                    body.name, body.sign, condition
                )
            } else {
                format!(
                    "{} in {} is in {}, so its qualities take conscious effort.",
                    body.name, body.sign, condition
                )
            };

            insights.push(
                Insight::new(
                    InsightCategory::Dignity,
                    format!("dignity:{}", body.id),
                    severity,
                    format!("{} in {}", body.name, body.sign),
                    description,
                )
                .with_bodies([body.id.clone()])
                .with_data(serde_json::to_value(dignity)?),
            );
        }

        Ok(insights)
    }
}

/// Grand Trine, T-Square and Yod configurations
pub struct PatternBuilder {
    detector: PatternDetector,
}

impl PatternBuilder {
    pub fn new(detector: PatternDetector) -> Self {
        Self { detector }
    }
}

impl InsightBuilder for PatternBuilder {
    fn id(&self) -> InsightCategory {
        InsightCategory::Pattern
    }

    fn name(&self) -> &'static str {
        "Chart Patterns"
    }

    fn build(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let patterns = self.detector.detect_patterns(&ctx.chart.bodies)?;

        patterns
            .into_iter()
            .map(|pattern| -> Result<Insight> {
                let severity = match pattern.kind {
                    PatternKind::GrandTrine => Severity::Medium,
                    PatternKind::TSquare | PatternKind::Yod => Severity::High,
                };
                let description = format!(
                    "{}. Strengths: {}. Challenges: {}.",
                    pattern.title,
                    pattern.strengths.join("; "),
                    pattern.challenges.join("; ")
                );
                Ok(Insight::new(
                    InsightCategory::Pattern,
                    format!("pattern:{}", pattern.kind.as_str()),
                    severity,
                    pattern.title.clone(),
                    description,
                )
                .with_bodies(pattern.bodies.clone())
                .with_data(serde_json::to_value(&pattern)?))
            })
            .collect()
    }
}

/// The life theme analyzer's summary
pub struct LifeThemeBuilder;

impl InsightBuilder for LifeThemeBuilder {
    fn id(&self) -> InsightCategory {
        InsightCategory::LifeTheme
    }

    fn name(&self) -> &'static str {
        "Life Theme"
    }

    fn build(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let theme = ctx.life_theme;
        let mut description = theme.core_identity.clone();
        if !theme.themes.is_empty() {
            description.push_str(&format!(". Themes: {}", theme.themes.join(", ")));
        }

        Ok(vec![Insight::new(
            InsightCategory::LifeTheme,
            "life_theme",
            Severity::Medium,
            "Life Themes",
            description,
        )
        .with_data(serde_json::to_value(theme)?)])
    }
}

/// One insight per transit window
pub struct TransitBuilder;

impl InsightBuilder for TransitBuilder {
    fn id(&self) -> InsightCategory {
        InsightCategory::Transit
    }

    fn name(&self) -> &'static str {
        "Transit Windows"
    }

    fn build(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Insight>> {
        let Some(analysis) = ctx.transits else {
            return Ok(Vec::new());
        };

        Ok(analysis
            .windows
            .iter()
            .map(|window| {
                Insight::new(
                    InsightCategory::Transit,
                    format!("transit:{}", window.window_type),
                    Severity::from_significance(window.significance),
                    window.title.clone(),
                    window.description.clone(),
                )
                .with_window(window.window_type)
                .with_bodies(window.involved_planets.clone())
                .with_data(serde_json::json!({
                    "significance": window.significance,
                    "startDate": window.start_date,
                    "endDate": window.end_date,
                    "aspectType": window.aspect_type,
                    "keywords": window.keywords,
                    "transits": window.transits.len(),
                }))
            })
            .collect())
    }
}

/// Summary line from the severity and window counts
pub fn overall_summary(insights: &[Insight]) -> String {
    let high = insights
        .iter()
        .filter(|i| i.severity == Severity::High)
        .count();
    let windows = |kind: WindowType| {
        insights
            .iter()
            .filter(|i| i.window_type == Some(kind))
            .count()
    };

    format!(
        "{} insights, {} high priority. Transit windows: {} opportunity, {} challenge, {} integration.",
        insights.len(),
        high,
        windows(WindowType::Opportunity),
        windows(WindowType::Challenge),
        windows(WindowType::Integration)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_chart, sample_date, sample_life_theme, sample_positions};
    use crate::transits::TransitAnalyzer;

    #[test]
    fn test_core_identity() {
        let chart = sample_chart("chart-1");
        let theme = sample_life_theme("chart-1");
        let ctx = AnalysisContext {
            chart: &chart,
            life_theme: &theme,
            transits: None,
        };
        let insights = CoreIdentityBuilder.build(&ctx).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Sun in Aries, Moon in Leo, Aries rising");
        assert_eq!(insights[0].related_bodies, vec!["sun", "moon"]);
    }

    #[test]
    fn test_dignity_insights_skip_peregrine_bodies() {
        let chart = sample_chart("chart-1");
        let theme = sample_life_theme("chart-1");
        let ctx = AnalysisContext {
            chart: &chart,
            life_theme: &theme,
            transits: None,
        };
        let insights = DignityBuilder::new(DignityCalculator::default())
            .build(&ctx)
            .unwrap();
        let keys: Vec<&str> = insights.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "dignity:sun",
                "dignity:venus",
                "dignity:mars",
                "dignity:jupiter",
                "dignity:saturn"
            ]
        );
        assert_eq!(insights[0].data["exaltation"], true);
        assert_eq!(insights[1].severity, Severity::Medium);
        assert_eq!(insights[0].severity, Severity::Low);
    }

    #[test]
    fn test_pattern_insights() {
        let chart = sample_chart("chart-1");
        let theme = sample_life_theme("chart-1");
        let ctx = AnalysisContext {
            chart: &chart,
            life_theme: &theme,
            transits: None,
        };
        let insights = PatternBuilder::new(PatternDetector::default())
            .build(&ctx)
            .unwrap();
        let keys: Vec<&str> = insights.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["pattern:grand_trine", "pattern:t_square", "pattern:yod"]);
        assert_eq!(insights[1].severity, Severity::High);
    }

    #[test]
    fn test_transit_insights_follow_windows() {
        let chart = sample_chart("chart-1");
        let theme = sample_life_theme("chart-1");
        let analysis = TransitAnalyzer::default()
            .analyze(&chart, &sample_positions(), sample_date())
            .unwrap();
        let ctx = AnalysisContext {
            chart: &chart,
            life_theme: &theme,
            transits: Some(&analysis),
        };
        let insights = TransitBuilder.build(&ctx).unwrap();
        assert_eq!(insights.len(), analysis.windows.len());
        assert!(insights.iter().all(|i| i.window_type.is_some()));
        assert!(insights
            .iter()
            .any(|i| i.window_type == Some(WindowType::Challenge)));
    }

    #[test]
    fn test_overall_summary_counts() {
        let insights = vec![
            Insight::new(InsightCategory::Transit, "a", Severity::High, "", "")
                .with_window(WindowType::Challenge),
            Insight::new(InsightCategory::Dignity, "b", Severity::Low, "", ""),
        ];
        assert_eq!(
            overall_summary(&insights),
            "2 insights, 1 high priority. Transit windows: 0 opportunity, 1 challenge, 0 integration."
        );
    }
}
