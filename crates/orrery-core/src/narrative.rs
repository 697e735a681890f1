//! Inputs for prose generation
//!
//! The engine never writes prose itself. It turns each insight into a
//! `NarrativeRequest` that a `NarrativeGenerator` can phrase, after the
//! analysis is complete.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::insights::{Insight, InsightAnalysis, InsightCategory, Severity};
use crate::providers::NarrativeGenerator;

/// Structured facts for one paragraph of prose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeRequest {
    /// Key of the insight this request describes
    pub key: String,
    pub category: InsightCategory,
    pub severity: Severity,
    pub title: String,
    pub facts: Vec<String>,
    pub related_bodies: Vec<String>,
}

impl NarrativeRequest {
    pub fn from_insight(insight: &Insight) -> Self {
        let mut facts = Vec::new();
        if !insight.description.is_empty() {
            facts.push(insight.description.clone());
        }
        if let Some(window_type) = insight.window_type {
            facts.push(format!("Window type: {}", window_type));
        }
        if let Some(keywords) = insight.data.get("keywords").and_then(|k| k.as_array()) {
            let keywords: Vec<&str> = keywords.iter().filter_map(|k| k.as_str()).collect();
            if !keywords.is_empty() {
                facts.push(format!("Keywords: {}", keywords.join(", ")));
            }
        }

        Self {
            key: insight.key.clone(),
            category: insight.category,
            severity: insight.severity,
            title: insight.title.clone(),
            facts,
            related_bodies: insight.related_bodies.clone(),
        }
    }
}

/// One request per insight, most severe first
pub fn requests_for(analysis: &InsightAnalysis) -> Vec<NarrativeRequest> {
    let mut requests: Vec<NarrativeRequest> = analysis
        .insights
        .iter()
        .map(NarrativeRequest::from_insight)
        .collect();
    requests.sort_by(|a, b| b.severity.priority().cmp(&a.severity.priority()));
    requests
}

/// Run every request through a generator, keyed by insight key
pub async fn narrate_all(
    generator: &dyn NarrativeGenerator,
    analysis: &InsightAnalysis,
) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for request in requests_for(analysis) {
        let text = generator.narrate(&request).await?;
        out.push((request.key, text));
    }
    Ok(out)
}
