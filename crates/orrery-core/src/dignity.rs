//! Essential dignity scoring
//!
//! Rulership and exaltation signs come from a `DignityTables` value that the
//! caller constructs and injects. Detriment and fall are the signs opposite
//! rulership and exaltation, so only the first two tables are stored.

use std::collections::HashMap;

use crate::models::{CelestialBody, Dignity, ZodiacSign};

const RULER_SCORE: i32 = 5;
const EXALTATION_SCORE: i32 = 4;
const DETRIMENT_SCORE: i32 = -5;
const FALL_SCORE: i32 = -4;

/// Rulership and exaltation signs per body id
#[derive(Debug, Clone)]
pub struct DignityTables {
    rulerships: HashMap<String, Vec<ZodiacSign>>,
    exaltations: HashMap<String, ZodiacSign>,
}

impl DignityTables {
    /// Empty tables; every body scores 0
    pub fn empty() -> Self {
        Self {
            rulerships: HashMap::new(),
            exaltations: HashMap::new(),
        }
    }

    /// Traditional rulerships plus modern outer-planet rulerships
    pub fn traditional() -> Self {
        use ZodiacSign::*;

        let mut tables = Self::empty();
        tables
            .with_rulership("sun", &[Leo])
            .with_rulership("moon", &[Cancer])
            .with_rulership("mercury", &[Gemini, Virgo])
            .with_rulership("venus", &[Taurus, Libra])
            .with_rulership("mars", &[Aries, Scorpio])
            .with_rulership("jupiter", &[Sagittarius, Pisces])
            .with_rulership("saturn", &[Capricorn, Aquarius])
            .with_rulership("uranus", &[Aquarius])
            .with_rulership("neptune", &[Pisces])
            .with_rulership("pluto", &[Scorpio])
            .with_exaltation("sun", Aries)
            .with_exaltation("moon", Taurus)
            .with_exaltation("mercury", Virgo)
            .with_exaltation("venus", Pisces)
            .with_exaltation("mars", Capricorn)
            .with_exaltation("jupiter", Cancer)
            .with_exaltation("saturn", Libra);
        tables
    }

    pub fn with_rulership(&mut self, body_id: &str, signs: &[ZodiacSign]) -> &mut Self {
        self.rulerships
            .insert(body_id.to_lowercase(), signs.to_vec());
        self
    }

    pub fn with_exaltation(&mut self, body_id: &str, sign: ZodiacSign) -> &mut Self {
        self.exaltations.insert(body_id.to_lowercase(), sign);
        self
    }

    pub fn rulerships(&self, body_id: &str) -> &[ZodiacSign] {
        self.rulerships
            .get(body_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn exaltation(&self, body_id: &str) -> Option<ZodiacSign> {
        self.exaltations.get(body_id).copied()
    }
}

impl Default for DignityTables {
    fn default() -> Self {
        Self::traditional()
    }
}

/// The sign six places on
fn opposite(sign: ZodiacSign) -> ZodiacSign {
    ZodiacSign::from_index(sign.index() + 6)
}

/// Scores a body's standing in the sign it occupies
#[derive(Debug, Clone, Default)]
pub struct DignityCalculator {
    tables: DignityTables,
}

impl DignityCalculator {
    pub fn new(tables: DignityTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &DignityTables {
        &self.tables
    }

    /// Dignity of `body_id` in the sign with 1-based index `sign_index`
    ///
    /// Total: bodies missing from both tables score 0, and indices outside
    /// 1-12 wrap around the zodiac.
    pub fn dignity(&self, body_id: &str, sign_index: u8) -> Dignity {
        let id = body_id.to_lowercase();
        let sign = ZodiacSign::from_index(sign_index);

        let rulerships = self.tables.rulerships(&id);
        let exaltation = self.tables.exaltation(&id);

        let ruler = rulerships.contains(&sign);
        let detriment = rulerships.iter().any(|s| opposite(*s) == sign);
        let exalted = exaltation == Some(sign);
        let fall = exaltation.map(opposite) == Some(sign);

        let mut score = 0;
        if ruler {
            score += RULER_SCORE;
        }
        if exalted {
            score += EXALTATION_SCORE;
        }
        if detriment {
            score += DETRIMENT_SCORE;
        }
        if fall {
            score += FALL_SCORE;
        }

        Dignity {
            ruler,
            exaltation: exalted,
            detriment,
            fall,
            score,
        }
    }

    /// Dignity of a body in the sign it currently occupies
    pub fn dignity_for_body(&self, body: &CelestialBody) -> Dignity {
        self.dignity(&body.id, body.sign.index())
    }
}

/// Short label for a dignity, strongest condition first
pub fn describe(dignity: &Dignity) -> &'static str {
    match (dignity.ruler, dignity.exaltation, dignity.detriment, dignity.fall) {
        (true, true, _, _) => "domicile and exaltation",
        (true, _, _, _) => "domicile",
        (_, true, _, _) => "exaltation",
        (_, _, true, true) => "detriment and fall",
        (_, _, true, _) => "detriment",
        (_, _, _, true) => "fall",
        _ => "peregrine",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> DignityCalculator {
        DignityCalculator::new(DignityTables::traditional())
    }

    #[test]
    fn test_sun_in_leo_is_ruler() {
        let d = calc().dignity("sun", ZodiacSign::Leo.index());
        assert!(d.ruler);
        assert_eq!(d.score, 5);
    }

    #[test]
    fn test_sun_in_aquarius_is_detriment() {
        let d = calc().dignity("sun", ZodiacSign::Aquarius.index());
        assert!(d.detriment);
        assert_eq!(d.score, -5);
    }

    #[test]
    fn test_exaltation_and_fall() {
        let d = calc().dignity("moon", ZodiacSign::Taurus.index());
        assert!(d.exaltation);
        assert_eq!(d.score, 4);

        let d = calc().dignity("moon", ZodiacSign::Scorpio.index());
        assert!(d.fall);
        assert_eq!(d.score, -4);
    }

    #[test]
    fn test_mercury_extremes() {
        let d = calc().dignity("mercury", ZodiacSign::Virgo.index());
        assert!(d.ruler && d.exaltation);
        assert_eq!(d.score, 9);

        let d = calc().dignity("mercury", ZodiacSign::Pisces.index());
        assert!(d.detriment && d.fall);
        assert_eq!(d.score, -9);
    }

    #[test]
    fn test_unknown_body_scores_zero() {
        let d = calc().dignity("chiron", 5);
        assert_eq!(d, Dignity::default());
    }

    #[test]
    fn test_id_is_case_insensitive() {
        assert_eq!(calc().dignity("Venus", 2).score, 5);
    }

    #[test]
    fn test_empty_tables_are_injected() {
        let calc = DignityCalculator::new(DignityTables::empty());
        assert_eq!(calc.dignity("sun", ZodiacSign::Leo.index()).score, 0);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let calc = calc();
        for body in [
            "sun", "moon", "mercury", "venus", "mars", "jupiter", "saturn", "uranus",
            "neptune", "pluto",
        ] {
            for idx in 1..=12 {
                let score = calc.dignity(body, idx).score;
                assert!((-9..=9).contains(&score), "{} in {}: {}", body, idx, score);
            }
        }
    }

    #[test]
    fn test_dignity_for_body_uses_sign() {
        let mars = CelestialBody::at("mars", 280.0, 0.7, 10);
        let d = calc().dignity_for_body(&mars);
        assert!(d.exaltation);
        assert_eq!(describe(&d), "exaltation");
    }
}
