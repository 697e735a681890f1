//! Angular helpers for ecliptic longitudes
//!
//! Pure functions over degrees. Inputs are expected to be finite; NaN or
//! infinite values are caller errors and are rejected earlier by
//! `CelestialBody::validate`.

use crate::models::{HouseCusp, ZodiacSign, SIGNS};

/// Normalize a longitude into [0, 360)
pub fn normalize_longitude(lon: f64) -> f64 {
    let normalized = lon.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Sign containing a longitude: `floor(lon mod 360 / 30)` into the sign table
pub fn sign_from_longitude(lon: f64) -> ZodiacSign {
    let idx = (normalize_longitude(lon) / 30.0).floor() as usize;
    SIGNS[idx % 12]
}

/// Degrees within the sign, [0, 30)
pub fn sign_longitude(lon: f64) -> f64 {
    normalize_longitude(lon) % 30.0
}

/// Minimal circular distance between two longitudes, in [0, 180]
pub fn angular_separation(a: f64, b: f64) -> f64 {
    let diff = (normalize_longitude(a) - normalize_longitude(b)).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Deviation of a separation from an exact aspect angle
pub fn orb_from(separation: f64, exact_angle: f64) -> f64 {
    (separation - exact_angle).abs()
}

/// Inclusive orb test: `|separation - exact| <= orb`
pub fn within_orb(separation: f64, exact_angle: f64, orb: f64) -> bool {
    orb_from(separation, exact_angle) <= orb
}

/// Signed difference `a - b` folded into (-180, 180]
pub fn signed_difference(a: f64, b: f64) -> f64 {
    let mut diff = normalize_longitude(a) - normalize_longitude(b);
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff <= -180.0 {
        diff += 360.0;
    }
    diff
}

/// Size of a house from its cusp to the next, across the 0°/360° boundary
pub fn house_size(cusp: f64, next_cusp: f64) -> f64 {
    let cusp = normalize_longitude(cusp);
    let mut next = normalize_longitude(next_cusp);
    if next < cusp {
        next += 360.0;
    }
    next - cusp
}

/// House (1-12) containing a longitude, given the chart's cusps
///
/// Returns `None` unless all twelve cusps are present.
pub fn house_for_longitude(lon: f64, cusps: &[HouseCusp]) -> Option<u8> {
    if cusps.len() != 12 {
        return None;
    }
    let mut ordered: Vec<&HouseCusp> = cusps.iter().collect();
    ordered.sort_by_key(|c| c.number);
    if ordered
        .iter()
        .enumerate()
        .any(|(i, c)| c.number as usize != i + 1)
    {
        return None;
    }

    let lon = normalize_longitude(lon);
    for (i, cusp) in ordered.iter().enumerate() {
        let next = ordered[(i + 1) % 12];
        let size = house_size(cusp.longitude, next.longitude);
        let offset = house_size(cusp.longitude, lon);
        if offset < size {
            return Some(cusp.number);
        }
    }
    None
}

/// Whether two bodies are moving toward an exact aspect
///
/// Projects the pair a short step forward using their speeds and checks
/// whether the orb shrinks. Equal speeds count as applying while the
/// separation is still short of the exact angle.
pub fn is_applying(lon_a: f64, lon_b: f64, speed_a: f64, speed_b: f64, exact_angle: f64) -> bool {
    let relative_speed = speed_a - speed_b;
    let current = angular_separation(lon_a, lon_b);

    if relative_speed.abs() < 0.01 {
        return current < exact_angle + 0.5;
    }

    let time_step = 0.1;
    let future = angular_separation(
        lon_a + speed_a * time_step,
        lon_b + speed_b * time_step,
    );

    orb_from(future, exact_angle) < orb_from(current, exact_angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equal_cusps(start: f64) -> Vec<HouseCusp> {
        (0..12)
            .map(|i| HouseCusp {
                number: i as u8 + 1,
                longitude: normalize_longitude(start + i as f64 * 30.0),
            })
            .collect()
    }

    #[test]
    fn test_sign_from_longitude() {
        assert_eq!(sign_from_longitude(0.0), ZodiacSign::Aries);
        assert_eq!(sign_from_longitude(29.999), ZodiacSign::Aries);
        assert_eq!(sign_from_longitude(30.0), ZodiacSign::Taurus);
        assert_eq!(sign_from_longitude(359.9), ZodiacSign::Pisces);
        assert_eq!(sign_from_longitude(360.0), ZodiacSign::Aries);
        assert_eq!(sign_from_longitude(-10.0), ZodiacSign::Pisces);
        assert_eq!(sign_from_longitude(725.0), ZodiacSign::Aries);
    }

    #[test]
    fn test_angular_separation() {
        assert_eq!(angular_separation(10.0, 20.0), 10.0);
        assert_eq!(angular_separation(350.0, 10.0), 20.0);
        assert_eq!(angular_separation(0.0, 180.0), 180.0);
        assert_eq!(angular_separation(90.0, 270.0), 180.0);
        assert!((angular_separation(359.5, 0.5) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_separation_is_symmetric() {
        for (a, b) in [(12.5, 300.0), (0.0, 359.0), (45.0, 225.0)] {
            assert_eq!(angular_separation(a, b), angular_separation(b, a));
        }
    }

    #[test]
    fn test_within_orb_is_inclusive() {
        assert!(within_orb(128.0, 120.0, 8.0));
        assert!(!within_orb(128.1, 120.0, 8.0));
        assert!(within_orb(112.0, 120.0, 8.0));
    }

    #[test]
    fn test_signed_difference() {
        assert!((signed_difference(10.0, 350.0) - 20.0).abs() < 1e-9);
        assert!((signed_difference(350.0, 10.0) + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_house_size_wraps() {
        assert_eq!(house_size(330.0, 20.0), 50.0);
        assert_eq!(house_size(10.0, 40.0), 30.0);
    }

    #[test]
    fn test_house_for_longitude() {
        let cusps = equal_cusps(345.0);
        assert_eq!(house_for_longitude(350.0, &cusps), Some(1));
        assert_eq!(house_for_longitude(5.0, &cusps), Some(1));
        assert_eq!(house_for_longitude(15.0, &cusps), Some(2));
        assert_eq!(house_for_longitude(344.0, &cusps), Some(12));
        assert_eq!(house_for_longitude(200.0, &cusps[..6]), None);
    }

    #[test]
    fn test_is_applying() {
        // Faster body closing on a trine from 115°
        assert!(is_applying(115.0, 0.0, 1.0, 0.0, 120.0));
        // Same body past exact is separating
        assert!(!is_applying(125.0, 0.0, 1.0, 0.0, 120.0));
        // Retrograde motion reverses the direction
        assert!(is_applying(125.0, 0.0, -1.0, 0.0, 120.0));
    }
}
