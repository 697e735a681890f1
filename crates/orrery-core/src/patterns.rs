//! Aspect and macro-pattern detection over a set of bodies
//!
//! Two-body aspects are classified against an `OrbTable`. Three-body
//! configurations (Grand Trine, T-Square, Yod) are found by exhaustive search
//! over the natal bodies; charts carry a dozen or so bodies, so O(n³) is fine.
//! Only the first match of each configuration is reported.

use std::collections::HashMap;

use crate::error::Result;
use crate::geometry::{angular_separation, is_applying, orb_from, within_orb};
use crate::models::{Aspect, AspectType, CelestialBody, Pattern, PatternKind};

/// Allowed orb per aspect type, in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct OrbTable {
    orbs: HashMap<AspectType, f64>,
}

impl OrbTable {
    pub fn new() -> Self {
        let orbs = AspectType::all()
            .iter()
            .map(|kind| (*kind, Self::default_orb(*kind)))
            .collect();
        Self { orbs }
    }

    /// Built-in orb for an aspect type
    pub fn default_orb(kind: AspectType) -> f64 {
        match kind {
            AspectType::Conjunction
            | AspectType::Opposition
            | AspectType::Trine
            | AspectType::Square => 8.0,
            AspectType::Sextile => 6.0,
            AspectType::Quincunx => 3.0,
            AspectType::SemiSquare | AspectType::Sesquisquare => 2.0,
        }
    }

    pub fn orb(&self, kind: AspectType) -> f64 {
        self.orbs
            .get(&kind)
            .copied()
            .unwrap_or_else(|| Self::default_orb(kind))
    }

    pub fn set(&mut self, kind: AspectType, orb: f64) {
        self.orbs.insert(kind, orb);
    }

    /// Aspect type whose orb contains `separation`, checked in `AspectType::all` order
    pub fn classify(&self, separation: f64) -> Option<(AspectType, f64)> {
        AspectType::all().iter().find_map(|kind| {
            let orb = orb_from(separation, kind.exact_angle());
            (orb <= self.orb(*kind)).then_some((*kind, orb))
        })
    }
}

impl Default for OrbTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds aspects and named configurations among bodies
#[derive(Debug, Clone, Default)]
pub struct PatternDetector {
    orbs: OrbTable,
}

impl PatternDetector {
    pub fn new(orbs: OrbTable) -> Self {
        Self { orbs }
    }

    pub fn orbs(&self) -> &OrbTable {
        &self.orbs
    }

    /// Aspect between two bodies, if any type's orb contains their separation
    pub fn aspect_between(&self, a: &CelestialBody, b: &CelestialBody) -> Option<Aspect> {
        let separation = angular_separation(a.longitude, b.longitude);
        let (kind, orb) = self.orbs.classify(separation)?;
        Some(Aspect {
            body_a: a.id.clone(),
            body_b: b.id.clone(),
            aspect_type: kind.as_str().to_string(),
            angle: separation,
            orb,
            is_applying: is_applying(a.longitude, b.longitude, a.speed, b.speed, kind.exact_angle()),
        })
    }

    /// Aspects between every unordered pair of bodies
    pub fn detect_aspects(&self, bodies: &[CelestialBody]) -> Result<Vec<Aspect>> {
        validate_all(bodies)?;

        let mut aspects = Vec::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                if let Some(aspect) = self.aspect_between(&bodies[i], &bodies[j]) {
                    aspects.push(aspect);
                }
            }
        }
        Ok(aspects)
    }

    /// Aspects from each moving body to each natal body
    ///
    /// `body_a` is always the transiting body and `body_b` the natal one.
    pub fn detect_cross_aspects(
        &self,
        transiting: &[CelestialBody],
        natal: &[CelestialBody],
    ) -> Result<Vec<Aspect>> {
        validate_all(transiting)?;
        validate_all(natal)?;

        let mut aspects = Vec::new();
        for moving in transiting {
            for fixed in natal {
                // Natal bodies do not move within the analysis
                let mut still = fixed.clone();
                still.speed = 0.0;
                if let Some(aspect) = self.aspect_between(moving, &still) {
                    aspects.push(aspect);
                }
            }
        }
        Ok(aspects)
    }

    /// All configurations found, at most one per kind, in the order
    /// Grand Trine, T-Square, Yod
    pub fn detect_patterns(&self, bodies: &[CelestialBody]) -> Result<Vec<Pattern>> {
        validate_all(bodies)?;

        let found = [
            self.find_grand_trine(bodies)?,
            self.find_t_square(bodies)?,
            self.find_yod(bodies)?,
        ];
        let patterns: Vec<Pattern> = found.into_iter().flatten().collect();

        tracing::debug!(
            bodies = bodies.len(),
            patterns = patterns.len(),
            "Pattern detection complete"
        );
        Ok(patterns)
    }

    /// Three bodies pairwise trine
    pub fn find_grand_trine(&self, bodies: &[CelestialBody]) -> Result<Option<Pattern>> {
        validate_all(bodies)?;
        let n = bodies.len();

        for i in 0..n {
            for j in (i + 1)..n {
                if !self.holds(&bodies[i], &bodies[j], AspectType::Trine) {
                    continue;
                }
                for k in (j + 1)..n {
                    if self.holds(&bodies[i], &bodies[k], AspectType::Trine)
                        && self.holds(&bodies[j], &bodies[k], AspectType::Trine)
                    {
                        return Ok(Some(self.build(
                            PatternKind::GrandTrine,
                            [&bodies[i], &bodies[j], &bodies[k]],
                            [
                                (0, 1, AspectType::Trine),
                                (0, 2, AspectType::Trine),
                                (1, 2, AspectType::Trine),
                            ],
                        )));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Two bodies in opposition, both square to an apex
    pub fn find_t_square(&self, bodies: &[CelestialBody]) -> Result<Option<Pattern>> {
        validate_all(bodies)?;
        Ok(self.find_apex_pattern(
            bodies,
            PatternKind::TSquare,
            AspectType::Opposition,
            AspectType::Square,
        ))
    }

    /// Two bodies in sextile, both quincunx to an apex
    pub fn find_yod(&self, bodies: &[CelestialBody]) -> Result<Option<Pattern>> {
        validate_all(bodies)?;
        Ok(self.find_apex_pattern(
            bodies,
            PatternKind::Yod,
            AspectType::Sextile,
            AspectType::Quincunx,
        ))
    }

    fn find_apex_pattern(
        &self,
        bodies: &[CelestialBody],
        kind: PatternKind,
        base: AspectType,
        to_apex: AspectType,
    ) -> Option<Pattern> {
        let n = bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if !self.holds(&bodies[i], &bodies[j], base) {
                    continue;
                }
                for k in 0..n {
                    if k == i || k == j {
                        continue;
                    }
                    if self.holds(&bodies[i], &bodies[k], to_apex)
                        && self.holds(&bodies[j], &bodies[k], to_apex)
                    {
                        return Some(self.build(
                            kind,
                            [&bodies[i], &bodies[j], &bodies[k]],
                            [(0, 1, base), (0, 2, to_apex), (1, 2, to_apex)],
                        ));
                    }
                }
            }
        }
        None
    }

    fn holds(&self, a: &CelestialBody, b: &CelestialBody, kind: AspectType) -> bool {
        within_orb(
            angular_separation(a.longitude, b.longitude),
            kind.exact_angle(),
            self.orbs.orb(kind),
        )
    }

    fn build(
        &self,
        kind: PatternKind,
        members: [&CelestialBody; 3],
        links: [(usize, usize, AspectType); 3],
    ) -> Pattern {
        let aspects = links
            .iter()
            .map(|(a, b, aspect_type)| {
                let (a, b) = (members[*a], members[*b]);
                let separation = angular_separation(a.longitude, b.longitude);
                Aspect {
                    body_a: a.id.clone(),
                    body_b: b.id.clone(),
                    aspect_type: aspect_type.as_str().to_string(),
                    angle: separation,
                    orb: orb_from(separation, aspect_type.exact_angle()),
                    is_applying: is_applying(
                        a.longitude,
                        b.longitude,
                        a.speed,
                        b.speed,
                        aspect_type.exact_angle(),
                    ),
                }
            })
            .collect();

        let (strengths, challenges, recommendations) = interpretation(kind);

        Pattern {
            kind,
            title: format!(
                "{} ({})",
                kind.title(),
                members
                    .iter()
                    .map(|b| b.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            bodies: members.iter().map(|b| b.id.clone()).collect(),
            aspects,
            houses: members.iter().map(|b| b.house).collect(),
            strengths,
            challenges,
            recommendations,
        }
    }
}

fn validate_all(bodies: &[CelestialBody]) -> Result<()> {
    bodies.iter().try_for_each(|b| b.validate())
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fixed strengths, challenges and recommendations per configuration
fn interpretation(kind: PatternKind) -> (Vec<String>, Vec<String>, Vec<String>) {
    match kind {
        PatternKind::GrandTrine => (
            to_strings(&[
                "Natural talent and ease in the element involved",
                "Energy flows freely between three areas of life",
                "Resilience and a capacity for self-sufficiency",
            ]),
            to_strings(&[
                "Complacency when things come too easily",
                "Gifts may stay undeveloped without outside pressure",
            ]),
            to_strings(&[
                "Set deliberate goals that stretch these talents",
                "Share the ease of this configuration with others",
            ]),
        ),
        PatternKind::TSquare => (
            to_strings(&[
                "Drive and ambition fuelled by inner tension",
                "Ability to act decisively under pressure",
            ]),
            to_strings(&[
                "Recurring stress focused through the apex planet",
                "Tendency to overcompensate in the apex area",
                "Difficulty finding balance between the opposing planets",
            ]),
            to_strings(&[
                "Develop the qualities of the empty leg opposite the apex",
                "Channel the tension into sustained, concrete projects",
            ]),
        ),
        PatternKind::Yod => (
            to_strings(&[
                "A strong sense of purpose or special mission",
                "Unique skills that develop through adjustment",
            ]),
            to_strings(&[
                "Feeling pulled in directions that do not fit together",
                "Restlessness until the apex energy finds an outlet",
            ]),
            to_strings(&[
                "Treat the apex planet as the focus of growth",
                "Make small, repeated adjustments rather than big leaps",
            ]),
        ),
    }
}
