//! Engine configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, else the override in the data dir
//!    (~/.local/share/orrery/config/orrery.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default values.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::DEFAULT_TTL;
use crate::error::{Error, Result};
use crate::models::AspectType;
use crate::patterns::OrbTable;
use crate::transits::{DEFAULT_BUFFER_DAYS, MAX_BUFFER_DAYS};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/orrery.toml");

/// Resolved engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct OrreryConfig {
    pub cache_ttl: Duration,
    pub window_buffer_days: i64,
    /// Widest orb promoted to a transit record, in (0, 1]
    pub promotion_max_orb: f64,
    pub orbs: OrbTable,
}

impl Default for OrreryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            window_buffer_days: DEFAULT_BUFFER_DAYS,
            promotion_max_orb: 1.0,
            orbs: OrbTable::default(),
        }
    }
}

impl OrreryConfig {
    /// Load from the default override location, else the embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from `path` if it exists, else the embedded defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// The embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("orrery").join("config").join("orrery.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<OrreryConfig> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let content = match path {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "Loading config override");
            fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    cache: Option<RawCache>,
    transits: Option<RawTransits>,
    orbs: Option<HashMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct RawCache {
    ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawTransits {
    window_buffer_days: Option<i64>,
    promotion_max_orb: Option<f64>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<OrreryConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = OrreryConfig::default();

    if let Some(cache) = raw.cache {
        if let Some(ttl) = cache.ttl_secs {
            config.cache_ttl = Duration::from_secs(ttl);
        }
    }

    if let Some(transits) = raw.transits {
        if let Some(days) = transits.window_buffer_days {
            if !(0..=MAX_BUFFER_DAYS).contains(&days) {
                return Err(Error::Config(format!(
                    "window_buffer_days must be in 0..={}, got {}",
                    MAX_BUFFER_DAYS, days
                )));
            }
            config.window_buffer_days = days;
        }
        if let Some(orb) = transits.promotion_max_orb {
            if !(orb > 0.0 && orb <= 1.0) {
                return Err(Error::Config(format!(
                    "promotion_max_orb must be in (0, 1], got {}",
                    orb
                )));
            }
            config.promotion_max_orb = orb;
        }
    }

    if let Some(orbs) = raw.orbs {
        for (name, orb) in orbs {
            let Ok(kind) = name.parse::<AspectType>() else {
                tracing::debug!(aspect = %name, "Skipping unknown aspect in config");
                continue;
            };
            if !orb.is_finite() || orb < 0.0 {
                return Err(Error::Config(format!(
                    "Orb for {} must be a non-negative number, got {}",
                    name, orb
                )));
            }
            config.orbs.set(kind, orb);
        }
    }

    Ok(config)
}
