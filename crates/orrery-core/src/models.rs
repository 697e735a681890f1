//! Data models for Orrery
//!
//! Chart-side types shared by every stage: bodies, signs, aspects, houses and
//! the birth chart itself. Transit and insight types live next to the code
//! that produces them (`transits::types`, `insights::types`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geometry;

/// The twelve tropical zodiac signs, in order from 0° Aries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

/// Sign table indexed by `floor(longitude / 30)`
pub const SIGNS: [ZodiacSign; 12] = [
    ZodiacSign::Aries,
    ZodiacSign::Taurus,
    ZodiacSign::Gemini,
    ZodiacSign::Cancer,
    ZodiacSign::Leo,
    ZodiacSign::Virgo,
    ZodiacSign::Libra,
    ZodiacSign::Scorpio,
    ZodiacSign::Sagittarius,
    ZodiacSign::Capricorn,
    ZodiacSign::Aquarius,
    ZodiacSign::Pisces,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Cardinal,
    Fixed,
    Mutable,
}

impl ZodiacSign {
    /// 1-based position in the zodiac (Aries = 1, Pisces = 12)
    pub fn index(&self) -> u8 {
        *self as u8 + 1
    }

    /// Sign for a 1-based index; wraps outside 1..=12
    pub fn from_index(index: u8) -> Self {
        SIGNS[(index as usize + 11) % 12]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }

    pub fn element(&self) -> Element {
        match (self.index() - 1) % 4 {
            0 => Element::Fire,
            1 => Element::Earth,
            2 => Element::Air,
            _ => Element::Water,
        }
    }

    pub fn modality(&self) -> Modality {
        match (self.index() - 1) % 3 {
            0 => Modality::Cardinal,
            1 => Modality::Fixed,
            _ => Modality::Mutable,
        }
    }

    /// Ruling body id. Modern rulership gives Scorpio, Aquarius and Pisces
    /// to the outer planets.
    pub fn ruler(&self, modern: bool) -> &'static str {
        match self {
            ZodiacSign::Aries => "mars",
            ZodiacSign::Taurus => "venus",
            ZodiacSign::Gemini => "mercury",
            ZodiacSign::Cancer => "moon",
            ZodiacSign::Leo => "sun",
            ZodiacSign::Virgo => "mercury",
            ZodiacSign::Libra => "venus",
            ZodiacSign::Scorpio if modern => "pluto",
            ZodiacSign::Scorpio => "mars",
            ZodiacSign::Sagittarius => "jupiter",
            ZodiacSign::Capricorn => "saturn",
            ZodiacSign::Aquarius if modern => "uranus",
            ZodiacSign::Aquarius => "saturn",
            ZodiacSign::Pisces if modern => "neptune",
            ZodiacSign::Pisces => "jupiter",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Whether an aspect eases or strains the bodies involved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectNature {
    Harmonious,
    Challenging,
}

impl AspectNature {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectNature::Harmonious => "harmonious",
            AspectNature::Challenging => "challenging",
        }
    }
}

/// Recognised aspect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AspectType {
    Conjunction,
    Opposition,
    Trine,
    Square,
    Sextile,
    SemiSquare,
    Sesquisquare,
    Quincunx,
}

impl AspectType {
    /// Every aspect type, major aspects first
    pub fn all() -> &'static [AspectType] {
        &[
            AspectType::Conjunction,
            AspectType::Opposition,
            AspectType::Trine,
            AspectType::Square,
            AspectType::Sextile,
            AspectType::Quincunx,
            AspectType::SemiSquare,
            AspectType::Sesquisquare,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectType::Conjunction => "conjunction",
            AspectType::Opposition => "opposition",
            AspectType::Trine => "trine",
            AspectType::Square => "square",
            AspectType::Sextile => "sextile",
            AspectType::SemiSquare => "semiSquare",
            AspectType::Sesquisquare => "sesquisquare",
            AspectType::Quincunx => "quincunx",
        }
    }

    pub fn exact_angle(&self) -> f64 {
        match self {
            AspectType::Conjunction => 0.0,
            AspectType::SemiSquare => 45.0,
            AspectType::Sextile => 60.0,
            AspectType::Square => 90.0,
            AspectType::Trine => 120.0,
            AspectType::Sesquisquare => 135.0,
            AspectType::Quincunx => 150.0,
            AspectType::Opposition => 180.0,
        }
    }

    pub fn nature(&self) -> AspectNature {
        match self {
            AspectType::Conjunction | AspectType::Trine | AspectType::Sextile => {
                AspectNature::Harmonious
            }
            AspectType::Opposition
            | AspectType::Square
            | AspectType::SemiSquare
            | AspectType::Sesquisquare
            | AspectType::Quincunx => AspectNature::Challenging,
        }
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "conjunction" => Ok(AspectType::Conjunction),
            "opposition" => Ok(AspectType::Opposition),
            "trine" => Ok(AspectType::Trine),
            "square" => Ok(AspectType::Square),
            "sextile" => Ok(AspectType::Sextile),
            "semisquare" => Ok(AspectType::SemiSquare),
            "sesquisquare" | "sesquiquadrate" => Ok(AspectType::Sesquisquare),
            "quincunx" | "inconjunct" => Ok(AspectType::Quincunx),
            _ => Err(Error::Validation(format!("Unknown aspect type: {}", s))),
        }
    }
}

/// Position of one body at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CelestialBody {
    /// Lowercase id ("sun", "moon", "north_node")
    pub id: String,
    /// Display name ("Sun", "North Node")
    pub name: String,
    /// Ecliptic longitude in [0, 360)
    pub longitude: f64,
    pub latitude: f64,
    /// Degrees per day; negative when retrograde
    pub speed: f64,
    /// House 1..=12
    pub house: u8,
    pub sign: ZodiacSign,
    /// Degrees within the sign, [0, 30)
    pub sign_longitude: f64,
}

impl CelestialBody {
    /// Build a body from id and longitude, deriving name, sign and in-sign degree
    pub fn at(id: impl Into<String>, longitude: f64, speed: f64, house: u8) -> Self {
        let id = id.into();
        let longitude = geometry::normalize_longitude(longitude);
        Self {
            name: body_name(&id),
            id,
            longitude,
            latitude: 0.0,
            speed,
            house,
            sign: geometry::sign_from_longitude(longitude),
            sign_longitude: geometry::sign_longitude(longitude),
        }
    }

    pub fn is_retrograde(&self) -> bool {
        self.speed < 0.0
    }

    /// Reject positions the geometry cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.longitude.is_finite() {
            return Err(Error::Validation(format!(
                "Body '{}' has no usable longitude ({})",
                self.id, self.longitude
            )));
        }
        if !self.speed.is_finite() {
            return Err(Error::Validation(format!(
                "Body '{}' has a non-finite speed",
                self.id
            )));
        }
        if !(1..=12).contains(&self.house) {
            return Err(Error::Validation(format!(
                "Body '{}' has house {} outside 1-12",
                self.id, self.house
            )));
        }
        Ok(())
    }
}

/// Display name for a body id: "north_node" -> "North Node"
pub fn body_name(id: &str) -> String {
    id.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A measured angular relationship between two bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aspect {
    pub body_a: String,
    pub body_b: String,
    /// Aspect type as received ("trine", "semiSquare", ...)
    #[serde(rename = "type")]
    pub aspect_type: String,
    /// Measured separation in degrees, [0, 180]
    pub angle: f64,
    /// Deviation from the exact aspect angle
    pub orb: f64,
    pub is_applying: bool,
}

impl Aspect {
    /// Parsed aspect type; unknown names are a validation error
    pub fn kind(&self) -> Result<AspectType> {
        self.aspect_type.parse()
    }
}

/// One house cusp of a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseCusp {
    pub number: u8,
    pub longitude: f64,
}

impl HouseCusp {
    pub fn sign(&self) -> ZodiacSign {
        geometry::sign_from_longitude(self.longitude)
    }

    /// Traditional ruler of the house: the ruler of the sign on its cusp
    pub fn ruler(&self) -> &'static str {
        self.sign().ruler(false)
    }
}

/// Angular points of a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartAngles {
    pub ascendant: f64,
    pub midheaven: f64,
    pub descendant: f64,
    pub imum_coeli: f64,
}

impl ChartAngles {
    /// Angles derived from ascendant and midheaven
    pub fn from_asc_mc(ascendant: f64, midheaven: f64) -> Self {
        Self {
            ascendant: geometry::normalize_longitude(ascendant),
            midheaven: geometry::normalize_longitude(midheaven),
            descendant: geometry::normalize_longitude(ascendant + 180.0),
            imum_coeli: geometry::normalize_longitude(midheaven + 180.0),
        }
    }
}

/// Geographic position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::Validation(format!(
                "Latitude {} outside -90..90",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::Validation(format!(
                "Longitude {} outside -180..180",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// A natal chart as stored upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthChart {
    pub id: String,
    pub user_id: String,
    pub birth_time: DateTime<Utc>,
    pub location: GeoLocation,
    pub bodies: Vec<CelestialBody>,
    #[serde(default)]
    pub houses: Vec<HouseCusp>,
    #[serde(default)]
    pub angles: Option<ChartAngles>,
}

impl BirthChart {
    pub fn body(&self, id: &str) -> Option<&CelestialBody> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Sign on the ascendant, from the angles or else the first house cusp
    pub fn rising_sign(&self) -> Option<ZodiacSign> {
        self.angles
            .as_ref()
            .map(|a| a.ascendant)
            .or_else(|| {
                self.houses
                    .iter()
                    .find(|h| h.number == 1)
                    .map(|h| h.longitude)
            })
            .map(geometry::sign_from_longitude)
    }
}

/// Essential dignity of a body in its sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dignity {
    pub ruler: bool,
    pub exaltation: bool,
    pub detriment: bool,
    pub fall: bool,
    pub score: i32,
}

/// Named three-body configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    GrandTrine,
    TSquare,
    Yod,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::GrandTrine => "grand_trine",
            PatternKind::TSquare => "t_square",
            PatternKind::Yod => "yod",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PatternKind::GrandTrine => "Grand Trine",
            PatternKind::TSquare => "T-Square",
            PatternKind::Yod => "Yod",
        }
    }
}

/// A detected macro-pattern with its fixed interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub kind: PatternKind,
    pub title: String,
    /// Body ids taking part; for T-Square and Yod the apex body is last
    pub bodies: Vec<String>,
    pub aspects: Vec<Aspect>,
    pub houses: Vec<u8>,
    pub strengths: Vec<String>,
    pub challenges: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Output of the external life theme analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeThemeAnalysis {
    pub birth_chart_id: String,
    pub core_identity: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
}
