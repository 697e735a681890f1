//! Transit window aggregation
//!
//! Groups promoted transits by window type and derives dated windows, themes
//! and recommendations. All text comes from fixed templates so the same set of
//! transits always produces the same windows.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::models::AspectType;

use super::types::{Transit, TransitAnalysis, TransitWindow, WindowType};

/// Days added past the last exact date of a window
pub const DEFAULT_BUFFER_DAYS: i64 = 7;

/// Largest accepted buffer, about ten years
pub const MAX_BUFFER_DAYS: i64 = 3650;

/// Builds windows from classified transits
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    buffer_days: i64,
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_DAYS)
    }
}

impl WindowAggregator {
    /// Buffers outside `0..=MAX_BUFFER_DAYS` are clamped into it
    pub fn new(buffer_days: i64) -> Self {
        Self {
            buffer_days: buffer_days.clamp(0, MAX_BUFFER_DAYS),
        }
    }

    pub fn buffer_days(&self) -> i64 {
        self.buffer_days
    }

    /// One window per window type present, most significant first
    ///
    /// Groups appear in the order their first transit was seen; the sort is
    /// stable so equally significant windows keep that order.
    pub fn aggregate(&self, transits: &[Transit]) -> Vec<TransitWindow> {
        let mut order: Vec<WindowType> = Vec::new();
        let mut groups: HashMap<WindowType, Vec<Transit>> = HashMap::new();

        for transit in transits {
            groups
                .entry(transit.window_type)
                .or_insert_with(|| {
                    order.push(transit.window_type);
                    Vec::new()
                })
                .push(transit.clone());
        }

        let mut windows: Vec<TransitWindow> = order
            .into_iter()
            .filter_map(|window_type| {
                let members = groups.remove(&window_type)?;
                self.build_window(window_type, members)
            })
            .collect();

        windows.sort_by(|a, b| {
            b.significance
                .partial_cmp(&a.significance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        windows
    }

    fn build_window(&self, window_type: WindowType, transits: Vec<Transit>) -> Option<TransitWindow> {
        let start_date = transits.iter().map(|t| t.exact_date).min()?;
        let last_exact = transits.iter().map(|t| t.exact_date).max()?;
        let end_date = Duration::try_days(self.buffer_days)
            .and_then(|buffer| last_exact.checked_add_signed(buffer))
            .unwrap_or(last_exact);

        let significance = round_mean(transits.iter().map(|t| t.significance));

        let transiting = distinct(transits.iter().map(|t| t.planet.as_str()));
        let mut involved_planets = transiting.clone();
        for name in transits.iter().map(|t| t.aspecting_natal.as_str()) {
            if !involved_planets.iter().any(|p| p == name) {
                involved_planets.push(name.to_string());
            }
        }

        let influences = distinct(transits.iter().map(|t| t.influence.as_str()));
        let aspect_type = dominant_aspect(&transits)?;

        let template = WindowTemplate::for_type(window_type);
        let title = format!("{}: {}", template.title, transiting.join(", "));
        let description = template
            .description
            .replace("{planets}", &join_names(&transiting))
            .replace("{influences}", &influences.join(" and "));

        let mut keywords: Vec<String> = template.keywords.iter().map(|k| k.to_string()).collect();
        for kind in distinct(transits.iter().map(|t| t.aspect_type.as_str())) {
            if !keywords.contains(&kind) {
                keywords.push(kind);
            }
        }

        Some(TransitWindow {
            window_type,
            title,
            start_date,
            end_date,
            transits,
            significance,
            description,
            involved_planets,
            aspect_type,
            keywords,
        })
    }

    /// Themes for the whole analysis, deduplicated in first-seen order
    pub fn major_themes(&self, windows: &[TransitWindow]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut themes = Vec::new();
        for window in windows {
            let template = WindowTemplate::for_type(window.window_type);
            push_unique(&mut themes, &mut seen, template.theme);
            for transit in &window.transits {
                if let Some(theme) = planet_theme(&transit.planet_id) {
                    push_unique(&mut themes, &mut seen, theme);
                }
            }
        }
        themes
    }

    /// Recommendations for the whole analysis, deduplicated in first-seen order
    pub fn recommendations(&self, windows: &[TransitWindow]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut recommendations = Vec::new();
        for window in windows {
            for rec in WindowTemplate::for_type(window.window_type).recommendations {
                push_unique(&mut recommendations, &mut seen, rec);
            }
        }
        recommendations
    }

    /// Full transit analysis for one chart and date
    pub fn analyze(
        &self,
        birth_chart_id: &str,
        date: DateTime<Utc>,
        transits: Vec<Transit>,
    ) -> TransitAnalysis {
        let windows = self.aggregate(&transits);
        let major_themes = self.major_themes(&windows);
        let recommendations = self.recommendations(&windows);
        TransitAnalysis {
            birth_chart_id: birth_chart_id.to_string(),
            date,
            transits,
            windows,
            major_themes,
            recommendations,
        }
    }
}

/// Fixed text for each window type
struct WindowTemplate {
    title: &'static str,
    description: &'static str,
    theme: &'static str,
    keywords: &'static [&'static str],
    recommendations: &'static [&'static str],
}

impl WindowTemplate {
    fn for_type(window_type: WindowType) -> Self {
        match window_type {
            WindowType::Opportunity => Self {
                title: "Window of Opportunity",
                description: "Supportive {influences} contacts from {planets} favor new beginnings and growth.",
                theme: "Growth and new opportunities",
                keywords: &["growth", "expansion", "momentum"],
                recommendations: &[
                    "Take initiative on plans you have been considering",
                    "Say yes to invitations and new connections",
                ],
            },
            WindowType::Challenge => Self {
                title: "Period of Challenge",
                description: "Testing {influences} contacts from {planets} call for patience and deliberate effort.",
                theme: "Working through obstacles",
                keywords: &["tension", "discipline", "breakthrough"],
                recommendations: &[
                    "Move carefully and avoid forcing outcomes",
                    "Practice patience with yourself and others",
                ],
            },
            WindowType::Integration => Self {
                title: "Integration Phase",
                description: "{planets} ask for recent changes to be absorbed through {influences} contacts.",
                theme: "Inner transformation",
                keywords: &["reflection", "assimilation", "renewal"],
                recommendations: &[
                    "Make time for reflection before acting",
                    "Let recent lessons settle into new habits",
                ],
            },
        }
    }
}

fn planet_theme(planet_id: &str) -> Option<&'static str> {
    match planet_id {
        "sun" => Some("Identity and vitality"),
        "moon" => Some("Emotional needs and security"),
        "mercury" => Some("Communication and learning"),
        "venus" => Some("Relationships and values"),
        "mars" => Some("Action and drive"),
        "jupiter" => Some("Expansion and opportunity"),
        "saturn" => Some("Structure and responsibility"),
        "uranus" => Some("Sudden change and liberation"),
        "neptune" => Some("Intuition and spiritual growth"),
        "pluto" => Some("Deep transformation"),
        _ => None,
    }
}

fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, item: &str) {
    if seen.insert(item.to_string()) {
        out.push(item.to_string());
    }
}

fn distinct<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.iter().any(|o| o == item) {
            out.push(item.to_string());
        }
    }
    out
}

/// "Sun", "Sun and Moon", "Sun, Moon and Mars"
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Most frequent aspect type; the first one seen wins ties
fn dominant_aspect(transits: &[Transit]) -> Option<AspectType> {
    let mut counts: Vec<(AspectType, usize)> = Vec::new();
    for transit in transits {
        match counts.iter_mut().find(|(kind, _)| *kind == transit.aspect_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((transit.aspect_type, 1)),
        }
    }
    let best = counts.iter().map(|(_, c)| *c).max()?;
    counts
        .into_iter()
        .find(|(_, c)| *c == best)
        .map(|(kind, _)| kind)
}

fn round_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return 0.0;
    }
    ((sum / count as f64) * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectNature, ZodiacSign};
    use crate::transits::types::StrengthTier;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, d, 0, 0, 0).unwrap()
    }

    fn transit(
        planet: &str,
        natal: &str,
        kind: AspectType,
        window_type: WindowType,
        significance: f64,
        exact: DateTime<Utc>,
    ) -> Transit {
        Transit {
            planet: crate::models::body_name(planet),
            planet_id: planet.to_string(),
            sign: ZodiacSign::Aries,
            house: 3,
            transiting_house: None,
            orb: 0.5,
            exact_date: exact,
            aspecting_natal: crate::models::body_name(natal),
            aspect_type: kind,
            influence: kind.nature(),
            strength: 0.9,
            strength_tier: StrengthTier::High,
            window_type,
            significance,
            is_retrograde: false,
        }
    }

    #[test]
    fn test_groups_by_window_type() {
        let agg = WindowAggregator::default();
        let transits = vec![
            transit("jupiter", "sun", AspectType::Trine, WindowType::Opportunity, 0.8, day(3)),
            transit("saturn", "moon", AspectType::Square, WindowType::Challenge, 0.9, day(5)),
            transit("venus", "mars", AspectType::Sextile, WindowType::Opportunity, 0.7, day(9)),
        ];
        let windows = agg.aggregate(&transits);

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].window_type, WindowType::Challenge);
        assert_eq!(windows[1].window_type, WindowType::Opportunity);

        let opp = &windows[1];
        assert_eq!(opp.transits.len(), 2);
        assert_eq!(opp.start_date, day(3));
        assert_eq!(opp.end_date, day(9) + Duration::days(7));
        assert_eq!(opp.significance, 0.75);
        assert_eq!(opp.involved_planets, vec!["Jupiter", "Venus", "Sun", "Mars"]);
        assert_eq!(opp.title, "Window of Opportunity: Jupiter, Venus");
        assert_eq!(
            opp.description,
            "Supportive harmonious contacts from Jupiter and Venus favor new beginnings and growth."
        );
        assert!(opp.keywords.contains(&"trine".to_string()));
        assert!(opp.keywords.contains(&"sextile".to_string()));
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let agg = WindowAggregator::new(0);
        let transits = vec![
            transit("pluto", "sun", AspectType::Square, WindowType::Integration, 0.8, day(1)),
            transit("sun", "moon", AspectType::Trine, WindowType::Opportunity, 0.8, day(2)),
            transit("mars", "venus", AspectType::Square, WindowType::Challenge, 0.8, day(3)),
        ];
        let kinds: Vec<WindowType> = agg
            .aggregate(&transits)
            .iter()
            .map(|w| w.window_type)
            .collect();
        assert_eq!(
            kinds,
            vec![
                WindowType::Integration,
                WindowType::Opportunity,
                WindowType::Challenge
            ]
        );
    }

    #[test]
    fn test_dominant_aspect_first_seen_wins_ties() {
        let transits = vec![
            transit("sun", "moon", AspectType::Sextile, WindowType::Opportunity, 0.8, day(1)),
            transit("venus", "moon", AspectType::Trine, WindowType::Opportunity, 0.8, day(1)),
            transit("mars", "moon", AspectType::Trine, WindowType::Opportunity, 0.8, day(1)),
        ];
        assert_eq!(dominant_aspect(&transits), Some(AspectType::Trine));
        assert_eq!(dominant_aspect(&transits[..2]), Some(AspectType::Sextile));
    }

    #[test]
    fn test_themes_and_recommendations_are_deduplicated() {
        let agg = WindowAggregator::default();
        let transits = vec![
            transit("saturn", "sun", AspectType::Square, WindowType::Challenge, 0.9, day(1)),
            transit("saturn", "moon", AspectType::Opposition, WindowType::Challenge, 0.9, day(2)),
        ];
        let analysis = agg.analyze("chart-1", day(1), transits);

        assert_eq!(
            analysis.major_themes,
            vec!["Working through obstacles", "Structure and responsibility"]
        );
        assert_eq!(analysis.recommendations.len(), 2);
        assert_eq!(analysis.windows[0].involved_planets, vec!["Saturn", "Sun", "Moon"]);
        assert_eq!(analysis.windows[0].transits[0].influence, AspectNature::Challenging);
    }

    #[test]
    fn test_same_input_same_text() {
        let agg = WindowAggregator::default();
        let transits = vec![
            transit("uranus", "venus", AspectType::Quincunx, WindowType::Challenge, 0.9, day(4)),
            transit("neptune", "moon", AspectType::Trine, WindowType::Opportunity, 0.8, day(6)),
        ];
        assert_eq!(agg.aggregate(&transits), agg.aggregate(&transits));
    }

    #[test]
    fn test_empty_input() {
        let agg = WindowAggregator::default();
        let analysis = agg.analyze("chart-1", day(1), Vec::new());
        assert!(analysis.windows.is_empty());
        assert!(analysis.major_themes.is_empty());
    }

    #[test]
    fn test_oversized_buffer_is_clamped() {
        let agg = WindowAggregator::new(9_000_000_000_000);
        assert_eq!(agg.buffer_days(), MAX_BUFFER_DAYS);
        assert_eq!(WindowAggregator::new(-3).buffer_days(), 0);

        let windows = agg.aggregate(&[transit(
            "jupiter",
            "sun",
            AspectType::Trine,
            WindowType::Opportunity,
            0.8,
            day(3),
        )]);
        assert_eq!(
            windows[0].end_date,
            day(3) + Duration::days(MAX_BUFFER_DAYS)
        );
    }

    #[test]
    fn test_join_names() {
        let names: Vec<String> = ["Sun", "Moon", "Mars"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_names(&names[..1]), "Sun");
        assert_eq!(join_names(&names[..2]), "Sun and Moon");
        assert_eq!(join_names(&names), "Sun, Moon and Mars");
    }
}
