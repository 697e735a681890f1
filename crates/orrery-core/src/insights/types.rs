//! Core types for the insight engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::transits::WindowType;

/// What part of the chart an insight speaks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsightCategory {
    /// Sun, Moon and rising sign
    CoreIdentity,
    /// Planets strong or weak in their signs
    Dignity,
    /// Grand Trine, T-Square, Yod
    Pattern,
    /// Summary from the life theme analyzer
    LifeTheme,
    /// Current transit windows
    Transit,
}

impl InsightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightCategory::CoreIdentity => "coreIdentity",
            InsightCategory::Dignity => "dignity",
            InsightCategory::Pattern => "pattern",
            InsightCategory::LifeTheme => "lifeTheme",
            InsightCategory::Transit => "transit",
        }
    }
}

impl fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coreIdentity" => Ok(InsightCategory::CoreIdentity),
            "dignity" => Ok(InsightCategory::Dignity),
            "pattern" => Ok(InsightCategory::Pattern),
            "lifeTheme" => Ok(InsightCategory::LifeTheme),
            "transit" => Ok(InsightCategory::Transit),
            _ => Err(format!("Unknown insight category: {}", s)),
        }
    }
}

/// How strongly an insight should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Numeric priority for sorting (higher = more prominent)
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }

    /// Severity for a significance score in [0, 1]
    pub fn from_significance(significance: f64) -> Self {
        if significance >= 0.8 {
            Severity::High
        } else if significance >= 0.6 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// One structured insight about a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Stable key within an analysis (e.g., "dignity:mars", "transit:challenge")
    pub key: String,
    pub category: InsightCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Set for transit insights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_type: Option<WindowType>,
    #[serde(default)]
    pub related_bodies: Vec<String>,
    /// Category-specific structured payload
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Insight {
    pub fn new(
        category: InsightCategory,
        key: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            category,
            severity,
            title: title.into(),
            description: description.into(),
            window_type: None,
            related_bodies: Vec::new(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_window(mut self, window_type: WindowType) -> Self {
        self.window_type = Some(window_type);
        self
    }

    pub fn with_bodies<I, S>(mut self, bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_bodies = bodies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// The composed analysis for one chart (and optionally one date)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightAnalysis {
    pub birth_chart_id: String,
    pub user_id: String,
    /// Requested analysis date; `None` for the undated analysis
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub insights: Vec<Insight>,
    pub overall_summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InsightAnalysis {
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.insights.iter().filter(|i| i.severity == severity).count()
    }

    pub fn count_by_window(&self, window_type: WindowType) -> usize {
        self.insights
            .iter()
            .filter(|i| i.window_type == Some(window_type))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names() {
        assert_eq!(InsightCategory::CoreIdentity.as_str(), "coreIdentity");
        assert_eq!(
            InsightCategory::from_str("lifeTheme").unwrap(),
            InsightCategory::LifeTheme
        );
        let json = serde_json::to_string(&InsightCategory::LifeTheme).unwrap();
        assert_eq!(json, "\"lifeTheme\"");
    }

    #[test]
    fn test_severity_priority() {
        assert!(Severity::High.priority() > Severity::Medium.priority());
        assert!(Severity::Medium.priority() > Severity::Low.priority());
        assert_eq!(Severity::from_significance(0.85), Severity::High);
        assert_eq!(Severity::from_significance(0.7), Severity::Medium);
        assert_eq!(Severity::from_significance(0.2), Severity::Low);
    }

    #[test]
    fn test_insight_builder() {
        let insight = Insight::new(
            InsightCategory::Transit,
            "transit:challenge",
            Severity::High,
            "Period of Challenge",
            "Saturn squares the Moon",
        )
        .with_window(WindowType::Challenge)
        .with_bodies(["saturn", "moon"])
        .with_data(serde_json::json!({"significance": 0.9}));

        assert_eq!(insight.related_bodies, vec!["saturn", "moon"]);
        assert_eq!(insight.window_type, Some(WindowType::Challenge));
        assert_eq!(insight.data["significance"], 0.9);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let insight = Insight::new(
            InsightCategory::Dignity,
            "dignity:sun",
            Severity::Medium,
            "Sun in Leo",
            "",
        )
        .with_bodies(["sun"]);
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["relatedBodies"][0], "sun");
        assert!(json.get("windowType").is_none());
    }
}
