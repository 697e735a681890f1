//! Test utilities for orrery-core
//!
//! Chart fixtures with known patterns and dignities, plus collaborators that
//! always fail, for exercising error and cache-failure paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::cache::CacheBackend;
use crate::error::{Error, Result};
use crate::models::{
    Aspect, BirthChart, CelestialBody, ChartAngles, GeoLocation, HouseCusp, LifeThemeAnalysis,
};
use crate::providers::{BirthChartStore, EphemerisChart, EphemerisProvider, StaticEphemeris};

/// Equal houses from 0° Aries, so each house matches its sign
pub fn sample_houses() -> Vec<HouseCusp> {
    (0..12)
        .map(|i| HouseCusp {
            number: i + 1,
            longitude: f64::from(i) * 30.0,
        })
        .collect()
}

/// A chart holding a Grand Trine (Sun, Moon, Jupiter), a T-Square (Sun and
/// Saturn opposed, Mars at the apex) and a Yod (Moon and Uranus sextile,
/// Mars at the apex)
///
/// Dignities: Sun, Mars and Saturn exalted; Venus and Jupiter in their own
/// signs.
pub fn sample_chart(id: &str) -> BirthChart {
    BirthChart {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        birth_time: Utc.with_ymd_and_hms(1990, 4, 5, 6, 30, 0).unwrap(),
        location: GeoLocation {
            latitude: 40.7128,
            longitude: -74.006,
        },
        bodies: vec![
            CelestialBody::at("sun", 15.0, 0.98, 1),
            CelestialBody::at("moon", 135.0, 13.2, 5),
            CelestialBody::at("mercury", 20.0, 1.4, 1),
            CelestialBody::at("venus", 50.0, 1.1, 2),
            CelestialBody::at("mars", 285.0, 0.7, 10),
            CelestialBody::at("jupiter", 255.0, 0.1, 9),
            CelestialBody::at("saturn", 195.0, -0.05, 7),
            CelestialBody::at("uranus", 75.0, 0.04, 3),
        ],
        houses: sample_houses(),
        angles: Some(ChartAngles::from_asc_mc(0.0, 270.0)),
    }
}

/// Transiting positions with several sub-degree contacts to `sample_chart`
///
/// The Sun sits 0.5° past its natal place, Saturn squares the natal Moon and
/// Pluto (retrograde) makes an exact sesquisquare to natal Uranus.
pub fn sample_positions() -> Vec<CelestialBody> {
    vec![
        CelestialBody::at("sun", 15.5, 0.98, 1),
        CelestialBody::at("saturn", 45.5, 0.1, 2),
        CelestialBody::at("pluto", 301.0, -0.01, 11),
    ]
}

pub fn sample_life_theme(birth_chart_id: &str) -> LifeThemeAnalysis {
    LifeThemeAnalysis {
        birth_chart_id: birth_chart_id.to_string(),
        core_identity: "Aries Sun, Leo Moon, Aries rising".to_string(),
        strengths: vec!["Enthusiasm and the courage to start things".to_string()],
        challenges: vec!["Recognising and voicing feelings".to_string()],
        themes: vec!["Self-expression and initiative".to_string()],
    }
}

/// A fixed analysis instant
pub fn sample_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap()
}

/// Cache backend whose every operation fails
#[derive(Default)]
pub struct FailingCache {
    attempts: AtomicUsize,
}

impl FailingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Cache("connection refused".to_string()))
    }
}

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.fail()
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        self.fail()
    }
}

/// Ephemeris that is always unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEphemeris;

fn unavailable<T>() -> Result<T> {
    Err(Error::ServiceUnavailable("ephemeris offline".to_string()))
}

#[async_trait]
impl EphemerisProvider for FailingEphemeris {
    async fn calculate_positions(
        &self,
        _time: DateTime<Utc>,
        _location: &GeoLocation,
    ) -> Result<Vec<CelestialBody>> {
        unavailable()
    }

    async fn calculate_aspects(&self, _bodies: &[CelestialBody]) -> Result<Vec<Aspect>> {
        unavailable()
    }

    async fn calculate_houses(
        &self,
        _time: DateTime<Utc>,
        _location: &GeoLocation,
    ) -> Result<Vec<HouseCusp>> {
        unavailable()
    }

    async fn calculate_birth_chart(
        &self,
        _time: DateTime<Utc>,
        _location: &GeoLocation,
    ) -> Result<EphemerisChart> {
        unavailable()
    }
}

/// Ephemeris whose first position lookups fail, then delegates
pub struct FlakyEphemeris {
    inner: StaticEphemeris,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl FlakyEphemeris {
    /// Fails the first `failures` position lookups, each after `delay`
    pub fn new(inner: StaticEphemeris, failures: usize, delay: Duration) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(failures),
            delay,
        }
    }

    pub fn inner(&self) -> &StaticEphemeris {
        &self.inner
    }
}

#[async_trait]
impl EphemerisProvider for FlakyEphemeris {
    async fn calculate_positions(
        &self,
        time: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<Vec<CelestialBody>> {
        tokio::time::sleep(self.delay).await;
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return unavailable();
        }
        self.inner.calculate_positions(time, location).await
    }

    async fn calculate_aspects(&self, bodies: &[CelestialBody]) -> Result<Vec<Aspect>> {
        self.inner.calculate_aspects(bodies).await
    }

    async fn calculate_houses(
        &self,
        time: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<Vec<HouseCusp>> {
        self.inner.calculate_houses(time, location).await
    }

    async fn calculate_birth_chart(
        &self,
        time: DateTime<Utc>,
        location: &GeoLocation,
    ) -> Result<EphemerisChart> {
        self.inner.calculate_birth_chart(time, location).await
    }
}

/// Chart store whose lookups always fail
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingChartStore;

#[async_trait]
impl BirthChartStore for FailingChartStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<BirthChart>> {
        Err(Error::Service(format!("chart store timed out loading {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternDetector;
    use crate::models::PatternKind;

    #[test]
    fn test_sample_chart_patterns() {
        let chart = sample_chart("chart-1");
        let patterns = PatternDetector::default()
            .detect_patterns(&chart.bodies)
            .unwrap();
        let kinds: Vec<PatternKind> = patterns.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![PatternKind::GrandTrine, PatternKind::TSquare, PatternKind::Yod]
        );
        assert_eq!(patterns[1].bodies, vec!["sun", "saturn", "mars"]);
        assert_eq!(patterns[2].bodies, vec!["moon", "uranus", "mars"]);
    }

    #[test]
    fn test_sample_chart_is_valid() {
        let chart = sample_chart("chart-1");
        for body in &chart.bodies {
            body.validate().unwrap();
        }
        chart.location.validate().unwrap();
        assert_eq!(chart.houses.len(), 12);
    }
}
