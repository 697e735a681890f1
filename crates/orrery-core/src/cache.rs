//! Insight cache
//!
//! `CacheBackend` is the storage seam (a key/value store with per-entry TTL).
//! `InsightCacheManager` sits on top and owns the key scheme:
//!
//! - `insight:{birthChartId}` and `insight:{birthChartId}:{Y-M-D}`
//! - `transit:{birthChartId}:{Y-M-D}`
//! - `lifeTheme:{birthChartId}`
//!
//! The manager never fails. Backend and serialization errors are logged and
//! read as a miss (on get) or dropped (on set and delete), so a broken cache
//! only costs recomputation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::insights::InsightAnalysis;
use crate::models::LifeThemeAnalysis;
use crate::transits::TransitAnalysis;

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Key/value storage with per-entry expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Value under `key`, or `None` if missing or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Process-local cache backend
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until next read
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| Error::Cache(format!("TTL {:?} out of range", ttl)))?;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

pub fn insight_key(birth_chart_id: &str, date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(date) => format!("insight:{}:{}", birth_chart_id, day(date)),
        None => format!("insight:{}", birth_chart_id),
    }
}

pub fn transit_key(birth_chart_id: &str, date: DateTime<Utc>) -> String {
    format!("transit:{}:{}", birth_chart_id, day(date))
}

pub fn life_theme_key(birth_chart_id: &str) -> String {
    format!("lifeTheme:{}", birth_chart_id)
}

fn day(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// A chart's invalidation count at some moment
///
/// Writes carry the generation observed when their computation started. A
/// write whose generation is behind the chart's current one is dropped, so a
/// computation that overlaps `invalidate_all` cannot repopulate the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Default)]
struct ChartEntries {
    generation: u64,
    /// Every key written for the chart, so dated entries can be invalidated
    written: HashSet<String>,
}

/// Typed, failure-tolerant access to cached analyses
pub struct InsightCacheManager {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    charts: Mutex<HashMap<String, ChartEntries>>,
}

impl InsightCacheManager {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            charts: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current generation for a chart; take it before computing anything to cache
    pub async fn generation(&self, birth_chart_id: &str) -> Generation {
        let charts = self.charts.lock().await;
        Generation(charts.get(birth_chart_id).map_or(0, |c| c.generation))
    }

    pub async fn get_insight(
        &self,
        birth_chart_id: &str,
        date: Option<DateTime<Utc>>,
    ) -> Option<InsightAnalysis> {
        self.get_json(&insight_key(birth_chart_id, date)).await
    }

    pub async fn set_insight(&self, analysis: &InsightAnalysis, generation: Generation) {
        let key = insight_key(&analysis.birth_chart_id, analysis.date);
        self.set_json(&analysis.birth_chart_id, key, analysis, generation)
            .await;
    }

    pub async fn get_transit(
        &self,
        birth_chart_id: &str,
        date: DateTime<Utc>,
    ) -> Option<TransitAnalysis> {
        self.get_json(&transit_key(birth_chart_id, date)).await
    }

    pub async fn set_transit(&self, analysis: &TransitAnalysis, generation: Generation) {
        let key = transit_key(&analysis.birth_chart_id, analysis.date);
        self.set_json(&analysis.birth_chart_id, key, analysis, generation)
            .await;
    }

    pub async fn get_life_theme(&self, birth_chart_id: &str) -> Option<LifeThemeAnalysis> {
        self.get_json(&life_theme_key(birth_chart_id)).await
    }

    pub async fn set_life_theme(&self, analysis: &LifeThemeAnalysis, generation: Generation) {
        let key = life_theme_key(&analysis.birth_chart_id);
        self.set_json(&analysis.birth_chart_id, key, analysis, generation)
            .await;
    }

    /// Drop every cached entry for a chart
    ///
    /// Advances the chart's generation first, so writes from computations
    /// already under way are discarded. Covers the undated insight and life
    /// theme keys plus every dated key this manager has written. Individual
    /// delete failures are logged and skipped.
    pub async fn invalidate_all(&self, birth_chart_id: &str) {
        let mut keys = vec![
            insight_key(birth_chart_id, None),
            life_theme_key(birth_chart_id),
        ];
        let written = {
            let mut charts = self.charts.lock().await;
            let entry = charts.entry(birth_chart_id.to_string()).or_default();
            entry.generation += 1;
            std::mem::take(&mut entry.written)
        };
        let mut dated: Vec<String> = written
            .into_iter()
            .filter(|k| !keys.contains(k))
            .collect();
        dated.sort();
        keys.extend(dated);

        for key in &keys {
            self.delete(key).await;
        }

        tracing::info!(
            birth_chart_id = %birth_chart_id,
            keys = keys.len(),
            "Cache invalidated"
        );
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key).await {
            Ok(Some(value)) => {
                tracing::debug!(key = %key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                tracing::debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize>(
        &self,
        birth_chart_id: &str,
        key: String,
        value: &T,
        generation: Generation,
    ) {
        if self.generation(birth_chart_id).await != generation {
            tracing::debug!(key = %key, "Skipping cache write from an invalidated computation");
            return;
        }

        if let Err(e) = self.try_set(&key, value).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
            return;
        }

        // An invalidation may have landed while the write was in flight
        let current = {
            let mut charts = self.charts.lock().await;
            let entry = charts.entry(birth_chart_id.to_string()).or_default();
            if entry.generation == generation.0 {
                entry.written.insert(key.clone());
            }
            Generation(entry.generation)
        };
        if current != generation {
            tracing::debug!(key = %key, "Removing cache write overtaken by invalidation");
            self.delete(&key).await;
        }
    }

    async fn try_set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, raw, self.ttl).await
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Cache delete failed");
        }
    }
}
