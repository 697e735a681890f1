//! Transit classification
//!
//! Labels one transiting-aspect-to-natal-body relationship with a window type
//! and a significance score. Window type comes from an ordered rule table, the
//! first rule with an opinion wins. Significance is additive over weight
//! tables keyed by aspect nature, planet class and house class.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};
use crate::geometry::house_for_longitude;
use crate::models::{Aspect, AspectNature, AspectType, CelestialBody, HouseCusp};

use super::types::{StrengthTier, Transit, WindowType};

/// Longest look-ahead/behind when estimating an exact date
const MAX_EXACT_DAYS: f64 = 30.0;

/// Orb at which a transit's strength reaches zero
const STRENGTH_ZERO_ORB: f64 = 8.0;

/// Orb up to which the aspect itself decides the window type
const CLOSE_ORB: f64 = 3.0;

/// Orb that earns the full exactness bonus
const EXACT_ORB: f64 = 1.0;

/// Planet grouping used by window and significance rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanetClass {
    /// Sun, Moon, Mercury, Venus, Mars
    Personal,
    /// Jupiter, Saturn
    Social,
    /// Uranus, Neptune, Pluto
    Transformative,
    Other,
}

impl PlanetClass {
    /// Accepts ids ("sun") or display names ("Sun")
    pub fn of(planet: &str) -> Self {
        match planet.trim().to_lowercase().as_str() {
            "sun" | "moon" | "mercury" | "venus" | "mars" => PlanetClass::Personal,
            "jupiter" | "saturn" => PlanetClass::Social,
            "uranus" | "neptune" | "pluto" => PlanetClass::Transformative,
            _ => PlanetClass::Other,
        }
    }
}

/// House grouping used by window and significance rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HouseClass {
    /// 6, 8 and 12
    Challenging,
    /// Angular houses 1, 4, 7 and 10
    Opportunity,
    Neutral,
}

impl HouseClass {
    pub fn of(house: u8) -> Self {
        match house {
            6 | 8 | 12 => HouseClass::Challenging,
            1 | 4 | 7 | 10 => HouseClass::Opportunity,
            _ => HouseClass::Neutral,
        }
    }
}

/// Inputs every window rule sees
#[derive(Debug, Clone, Copy)]
struct WindowInput<'a> {
    aspect: AspectType,
    orb: f64,
    planet: &'a str,
    house: u8,
}

type WindowRule = fn(&WindowInput<'_>) -> Option<WindowType>;

fn close_challenging_aspect(input: &WindowInput<'_>) -> Option<WindowType> {
    (input.aspect.nature() == AspectNature::Challenging && input.orb <= CLOSE_ORB)
        .then_some(WindowType::Challenge)
}

fn close_harmonious_aspect(input: &WindowInput<'_>) -> Option<WindowType> {
    (input.aspect.nature() == AspectNature::Harmonious && input.orb <= CLOSE_ORB)
        .then_some(WindowType::Opportunity)
}

fn house_emphasis(input: &WindowInput<'_>) -> Option<WindowType> {
    match HouseClass::of(input.house) {
        HouseClass::Challenging => Some(WindowType::Challenge),
        HouseClass::Opportunity => Some(WindowType::Opportunity),
        HouseClass::Neutral => None,
    }
}

fn planet_character(input: &WindowInput<'_>) -> Option<WindowType> {
    match PlanetClass::of(input.planet) {
        PlanetClass::Transformative => Some(WindowType::Integration),
        PlanetClass::Personal => Some(WindowType::Opportunity),
        PlanetClass::Social => Some(WindowType::Integration),
        PlanetClass::Other => None,
    }
}

/// Evaluated in order; the first `Some` decides
const WINDOW_RULES: &[WindowRule] = &[
    close_challenging_aspect,
    close_harmonious_aspect,
    house_emphasis,
    planet_character,
];

const DEFAULT_WINDOW: WindowType = WindowType::Integration;

/// Additive significance weights
#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceWeights {
    pub base: f64,
    pub aspect: HashMap<AspectNature, f64>,
    pub planet: HashMap<PlanetClass, f64>,
    pub house: HashMap<HouseClass, f64>,
    /// Bonus for orb within 1°
    pub exact_orb: f64,
    /// Bonus for orb within 3° (not stacked with `exact_orb`)
    pub close_orb: f64,
    pub retrograde: f64,
}

impl Default for SignificanceWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            aspect: HashMap::from([
                (AspectNature::Challenging, 0.2),
                (AspectNature::Harmonious, 0.1),
            ]),
            planet: HashMap::from([
                (PlanetClass::Transformative, 0.2),
                (PlanetClass::Personal, 0.1),
            ]),
            house: HashMap::from([
                (HouseClass::Challenging, 0.1),
                (HouseClass::Opportunity, 0.1),
            ]),
            exact_orb: 0.2,
            close_orb: 0.1,
            retrograde: 0.1,
        }
    }
}

/// Classifies transit aspects into windows and scores their significance
#[derive(Debug, Clone)]
pub struct TransitClassifier {
    weights: SignificanceWeights,
    /// Largest orb promoted to a full `Transit` record. Only tightens the
    /// high-tier cutoff, never widens it.
    promotion_max_orb: f64,
}

impl Default for TransitClassifier {
    fn default() -> Self {
        Self::new(SignificanceWeights::default(), EXACT_ORB)
    }
}

impl TransitClassifier {
    pub fn new(weights: SignificanceWeights, promotion_max_orb: f64) -> Self {
        Self {
            weights,
            promotion_max_orb,
        }
    }

    pub fn promotion_max_orb(&self) -> f64 {
        self.promotion_max_orb
    }

    /// Window type for an aspect, first matching rule wins
    pub fn window_type(aspect: AspectType, orb: f64, planet: &str, house: u8) -> WindowType {
        let input = WindowInput {
            aspect,
            orb,
            planet,
            house,
        };
        WINDOW_RULES
            .iter()
            .find_map(|rule| rule(&input))
            .unwrap_or(DEFAULT_WINDOW)
    }

    /// Significance in [0, 1]
    pub fn significance(
        &self,
        aspect: AspectType,
        orb: f64,
        planet: &str,
        house: u8,
        retrograde: bool,
    ) -> f64 {
        let w = &self.weights;
        let mut score = w.base;

        score += w.aspect.get(&aspect.nature()).copied().unwrap_or(0.0);
        score += w.planet.get(&PlanetClass::of(planet)).copied().unwrap_or(0.0);
        score += w.house.get(&HouseClass::of(house)).copied().unwrap_or(0.0);

        if orb <= EXACT_ORB {
            score += w.exact_orb;
        } else if orb <= CLOSE_ORB {
            score += w.close_orb;
        }

        if retrograde {
            score += w.retrograde;
        }

        round_score(score.clamp(0.0, 1.0))
    }

    /// Classify one aspect from a transiting body to a natal body
    ///
    /// Returns `Ok(None)` when the aspect is too wide to be promoted to a
    /// transit record. Unknown aspect types, bad orbs and aspects that do not
    /// join the two given bodies are validation errors.
    pub fn classify(
        &self,
        transiting: &CelestialBody,
        natal: &CelestialBody,
        aspect: &Aspect,
        natal_cusps: &[HouseCusp],
        at: DateTime<Utc>,
    ) -> Result<Option<Transit>> {
        let kind = aspect.kind()?;
        if !aspect.orb.is_finite() || aspect.orb < 0.0 {
            return Err(Error::Validation(format!(
                "Aspect orb must be a non-negative number, got {}",
                aspect.orb
            )));
        }
        if aspect.body_a != transiting.id || aspect.body_b != natal.id {
            return Err(Error::Validation(format!(
                "Aspect {}-{} does not join {} and {}",
                aspect.body_a, aspect.body_b, transiting.id, natal.id
            )));
        }
        transiting.validate()?;
        natal.validate()?;

        let tier = StrengthTier::from_orb(aspect.orb);
        if tier != StrengthTier::High || aspect.orb > self.promotion_max_orb {
            return Ok(None);
        }

        let house = natal.house;
        let window_type = Self::window_type(kind, aspect.orb, &transiting.id, house);
        let significance = self.significance(
            kind,
            aspect.orb,
            &transiting.id,
            house,
            transiting.is_retrograde(),
        );

        Ok(Some(Transit {
            planet: transiting.name.clone(),
            planet_id: transiting.id.clone(),
            sign: transiting.sign,
            house,
            transiting_house: house_for_longitude(transiting.longitude, natal_cusps),
            orb: aspect.orb,
            exact_date: estimate_exact_date(at, aspect.orb, transiting.speed, aspect.is_applying),
            aspecting_natal: natal.name.clone(),
            aspect_type: kind,
            influence: kind.nature(),
            strength: round_score((1.0 - aspect.orb / STRENGTH_ZERO_ORB).clamp(0.0, 1.0)),
            strength_tier: tier,
            window_type,
            significance,
            is_retrograde: transiting.is_retrograde(),
        }))
    }
}

/// Moment the aspect perfects, from the orb left to cover at the current speed
pub fn estimate_exact_date(
    at: DateTime<Utc>,
    orb: f64,
    speed: f64,
    applying: bool,
) -> DateTime<Utc> {
    if speed.abs() < 1e-6 || orb == 0.0 {
        return at;
    }
    let days = (orb / speed.abs()).min(MAX_EXACT_DAYS);
    let offset = Duration::seconds((days * 86_400.0).round() as i64);
    if applying {
        at + offset
    } else {
        at - offset
    }
}

/// Round to three decimals so additive weights compare exactly
fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap()
    }

    fn aspect(a: &str, b: &str, kind: &str, orb: f64, applying: bool) -> Aspect {
        Aspect {
            body_a: a.to_string(),
            body_b: b.to_string(),
            aspect_type: kind.to_string(),
            angle: 0.0,
            orb,
            is_applying: applying,
        }
    }

    #[test]
    fn test_window_rule_priority() {
        // Close challenging aspect beats an opportunity house
        assert_eq!(
            TransitClassifier::window_type(AspectType::Square, 2.0, "jupiter", 1),
            WindowType::Challenge
        );
        // Close harmonious aspect beats a challenging house
        assert_eq!(
            TransitClassifier::window_type(AspectType::Trine, 2.5, "saturn", 8),
            WindowType::Opportunity
        );
        // Wide aspect falls through to the house
        assert_eq!(
            TransitClassifier::window_type(AspectType::Trine, 5.0, "sun", 12),
            WindowType::Challenge
        );
        assert_eq!(
            TransitClassifier::window_type(AspectType::Square, 5.0, "pluto", 10),
            WindowType::Opportunity
        );
        // Neutral house falls through to the planet
        assert_eq!(
            TransitClassifier::window_type(AspectType::Square, 5.0, "Pluto", 3),
            WindowType::Integration
        );
        assert_eq!(
            TransitClassifier::window_type(AspectType::Square, 5.0, "mars", 3),
            WindowType::Opportunity
        );
        assert_eq!(
            TransitClassifier::window_type(AspectType::Square, 5.0, "saturn", 3),
            WindowType::Integration
        );
        // Nothing applies
        assert_eq!(
            TransitClassifier::window_type(AspectType::Square, 5.0, "chiron", 3),
            WindowType::Integration
        );
    }

    #[test]
    fn test_significance_weights() {
        let c = TransitClassifier::default();
        // 0.5 + 0.2 + 0.2 + 0.1 + 0.2 + 0.1 capped
        assert_eq!(c.significance(AspectType::Square, 0.5, "pluto", 8, true), 1.0);
        // 0.5 + 0.1 (harmonious) + 0 (social) + 0 (neutral house) + 0 (wide)
        assert_eq!(c.significance(AspectType::Trine, 5.0, "jupiter", 3, false), 0.6);
        // 0.5 + 0.2 + 0 + 0.1 + 0.1
        assert_eq!(c.significance(AspectType::Square, 2.0, "saturn", 8, false), 0.9);
    }

    #[test]
    fn test_significance_monotonic_in_orb() {
        let c = TransitClassifier::default();
        for kind in AspectType::all() {
            for planet in ["sun", "saturn", "pluto", "chiron"] {
                for house in 1..=12 {
                    let mut previous = c.significance(*kind, 3.0, planet, house, false);
                    for orb in [2.5, 2.0, 1.5, 1.0] {
                        let current = c.significance(*kind, orb, planet, house, false);
                        assert!(current >= previous);
                        previous = current;
                    }
                }
            }
        }
    }

    #[test]
    fn test_sun_conjunct_natal_sun() {
        let c = TransitClassifier::default();
        let natal_sun = CelestialBody::at("sun", 0.0, 0.98, 1);
        let transit_sun = CelestialBody::at("sun", 0.5, 0.98, 1);
        let asp = aspect("sun", "sun", "conjunction", 0.5, false);

        let transit = c
            .classify(&transit_sun, &natal_sun, &asp, &[], at())
            .unwrap()
            .unwrap();

        assert_eq!(transit.window_type, WindowType::Opportunity);
        assert_eq!(transit.strength_tier, StrengthTier::High);
        assert!(transit.significance >= 0.8);
        assert_eq!(transit.influence, AspectNature::Harmonious);
        assert_eq!(transit.house, 1);
    }

    #[test]
    fn test_saturn_square_moon_in_eighth() {
        let c = TransitClassifier::default();
        let natal_moon = CelestialBody::at("moon", 60.0, 13.0, 8);

        assert_eq!(
            TransitClassifier::window_type(AspectType::Square, 2.0, "saturn", natal_moon.house),
            WindowType::Challenge
        );
        let significance =
            c.significance(AspectType::Square, 2.0, "saturn", natal_moon.house, false);
        assert!(significance >= 0.8);

        // A 2° orb is medium tier, so it is scored but not promoted
        let saturn = CelestialBody::at("saturn", 152.0, 0.1, 11);
        let asp = aspect("saturn", "moon", "square", 2.0, true);
        assert!(c.classify(&saturn, &natal_moon, &asp, &[], at()).unwrap().is_none());
    }

    #[test]
    fn test_only_high_tier_is_promoted() {
        let c = TransitClassifier::default();
        let natal = CelestialBody::at("venus", 100.0, 1.2, 5);
        let mars = CelestialBody::at("mars", 222.0, 0.6, 9);
        let asp = aspect("mars", "venus", "trine", 2.0, true);
        assert!(c.classify(&mars, &natal, &asp, &[], at()).unwrap().is_none());
    }

    #[test]
    fn test_unknown_aspect_type_is_rejected() {
        let c = TransitClassifier::default();
        let natal = CelestialBody::at("venus", 100.0, 1.2, 5);
        let mars = CelestialBody::at("mars", 140.0, 0.6, 6);
        let asp = aspect("mars", "venus", "novile", 0.0, true);
        assert!(matches!(
            c.classify(&mars, &natal, &asp, &[], at()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_mismatched_bodies_are_rejected() {
        let c = TransitClassifier::default();
        let natal = CelestialBody::at("venus", 100.0, 1.2, 5);
        let mars = CelestialBody::at("mars", 100.5, 0.6, 5);
        let asp = aspect("jupiter", "venus", "conjunction", 0.5, true);
        assert!(matches!(
            c.classify(&mars, &natal, &asp, &[], at()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = TransitClassifier::default();
        let natal = CelestialBody::at("moon", 200.0, 13.0, 6);
        let uranus = CelestialBody::at("uranus", 19.5, -0.02, 12);
        let asp = aspect("uranus", "moon", "opposition", 0.5, false);
        let first = c.classify(&uranus, &natal, &asp, &[], at()).unwrap();
        let second = c.classify(&uranus, &natal, &asp, &[], at()).unwrap();
        assert_eq!(first, second);
        let transit = first.unwrap();
        assert!(transit.is_retrograde);
        assert_eq!(transit.significance, 1.0);
    }

    #[test]
    fn test_transiting_house_uses_cusps() {
        let c = TransitClassifier::default();
        let cusps: Vec<HouseCusp> = (0..12)
            .map(|i| HouseCusp {
                number: i + 1,
                longitude: i as f64 * 30.0,
            })
            .collect();
        let natal = CelestialBody::at("sun", 10.0, 1.0, 1);
        let jupiter = CelestialBody::at("jupiter", 130.5, 0.1, 5);
        let asp = aspect("jupiter", "sun", "trine", 0.5, true);
        let transit = c.classify(&jupiter, &natal, &asp, &cusps, at()).unwrap().unwrap();
        assert_eq!(transit.transiting_house, Some(5));
        assert_eq!(transit.house, 1);
    }

    #[test]
    fn test_estimate_exact_date() {
        let now = at();
        assert_eq!(estimate_exact_date(now, 1.0, 0.0, true), now);
        assert_eq!(estimate_exact_date(now, 1.0, 1.0, true), now + Duration::days(1));
        assert_eq!(estimate_exact_date(now, 1.0, -0.5, false), now - Duration::days(2));
        assert_eq!(estimate_exact_date(now, 1.0, 0.01, true), now + Duration::days(30));
    }
}
