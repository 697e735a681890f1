//! Core types for transit classification and windows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{AspectNature, AspectType, ZodiacSign};

/// Character of a period opened by one or more transits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Supportive conditions worth acting on
    Opportunity,
    /// Friction that calls for care
    Challenge,
    /// Slower change to absorb and assimilate
    Integration,
}

impl WindowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowType::Opportunity => "opportunity",
            WindowType::Challenge => "challenge",
            WindowType::Integration => "integration",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WindowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opportunity" => Ok(WindowType::Opportunity),
            "challenge" => Ok(WindowType::Challenge),
            "integration" => Ok(WindowType::Integration),
            _ => Err(format!("Unknown window type: {}", s)),
        }
    }
}

/// Exactness tier of a transit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthTier {
    /// Orb within 1°
    High,
    /// Orb within 3°
    Medium,
    Low,
}

impl StrengthTier {
    pub fn from_orb(orb: f64) -> Self {
        if orb <= 1.0 {
            StrengthTier::High
        } else if orb <= 3.0 {
            StrengthTier::Medium
        } else {
            StrengthTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthTier::High => "high",
            StrengthTier::Medium => "medium",
            StrengthTier::Low => "low",
        }
    }
}

/// One transiting body's aspect to one natal body at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transit {
    /// Transiting body display name
    pub planet: String,
    pub planet_id: String,
    /// Sign the transiting body occupies
    pub sign: ZodiacSign,
    /// Natal house activated (the natal body's house)
    pub house: u8,
    /// House the transiting body passes through, when natal cusps are known
    pub transiting_house: Option<u8>,
    pub orb: f64,
    /// Estimated moment the aspect is exact
    pub exact_date: DateTime<Utc>,
    /// Natal body display name
    pub aspecting_natal: String,
    #[serde(rename = "type")]
    pub aspect_type: AspectType,
    pub influence: AspectNature,
    /// 1 at exact, falling to 0 at 8° of orb
    pub strength: f64,
    pub strength_tier: StrengthTier,
    pub window_type: WindowType,
    pub significance: f64,
    pub is_retrograde: bool,
}

/// Same-type transits gathered into one dated period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitWindow {
    #[serde(rename = "type")]
    pub window_type: WindowType,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub transits: Vec<Transit>,
    pub significance: f64,
    pub description: String,
    pub involved_planets: Vec<String>,
    /// Most frequent aspect type among the members
    pub aspect_type: AspectType,
    pub keywords: Vec<String>,
}

/// Everything derived from one chart's transits on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitAnalysis {
    pub birth_chart_id: String,
    pub date: DateTime<Utc>,
    pub transits: Vec<Transit>,
    pub windows: Vec<TransitWindow>,
    pub major_themes: Vec<String>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_tiers() {
        assert_eq!(StrengthTier::from_orb(0.0), StrengthTier::High);
        assert_eq!(StrengthTier::from_orb(1.0), StrengthTier::High);
        assert_eq!(StrengthTier::from_orb(1.01), StrengthTier::Medium);
        assert_eq!(StrengthTier::from_orb(3.0), StrengthTier::Medium);
        assert_eq!(StrengthTier::from_orb(3.5), StrengthTier::Low);
    }

    #[test]
    fn test_window_type_round_trip_names() {
        for wt in [
            WindowType::Opportunity,
            WindowType::Challenge,
            WindowType::Integration,
        ] {
            assert_eq!(WindowType::from_str(wt.as_str()).unwrap(), wt);
        }
        assert!(WindowType::from_str("eclipse").is_err());
    }
}
