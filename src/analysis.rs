/// Data structures for utubext analyses
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AnalysisError;

/// Grounding sources kept per analysis
pub const MAX_SOURCES: usize = 6;

/// Minimum trend score of a high-yield ("sweet spot") opportunity
pub const HIGH_YIELD_MIN_TREND: u8 = 70;

/// Saturation of a topic. Serialized with the localized labels the
/// provider is instructed to return; English names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompetitionLevel {
    #[serde(rename = "Düşük", alias = "Low")]
    Low,
    #[serde(rename = "Orta", alias = "Medium")]
    Medium,
    #[serde(rename = "Yüksek", alias = "High")]
    High,
}

impl CompetitionLevel {
    pub const ALL: [CompetitionLevel; 3] = [
        CompetitionLevel::Low,
        CompetitionLevel::Medium,
        CompetitionLevel::High,
    ];

    /// Localized label, identical to the serialized form
    pub fn label(self) -> &'static str {
        match self {
            CompetitionLevel::Low => "Düşük",
            CompetitionLevel::Medium => "Orta",
            CompetitionLevel::High => "Yüksek",
        }
    }

    pub fn parse(value: &str) -> Option<CompetitionLevel> {
        let value = value.trim();
        CompetitionLevel::ALL.into_iter().find(|level| {
            level.label() == value || format!("{:?}", level).eq_ignore_ascii_case(value)
        })
    }

    /// Width of the saturation bar, in percent
    pub fn saturation_percent(self) -> u8 {
        match self {
            CompetitionLevel::Low => 33,
            CompetitionLevel::Medium => 66,
            CompetitionLevel::High => 100,
        }
    }
}

impl fmt::Display for CompetitionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display tier of a trend score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendTier {
    Strong,
    Moderate,
    Weak,
}

impl TrendTier {
    pub fn for_score(score: u8) -> TrendTier {
        if score > 75 {
            TrendTier::Strong
        } else if score > 50 {
            TrendTier::Moderate
        } else {
            TrendTier::Weak
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            TrendTier::Strong => "trend-strong",
            TrendTier::Moderate => "trend-moderate",
            TrendTier::Weak => "trend-weak",
        }
    }
}

/// A grounding citation returned by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// Structured result of one analysis request, before persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub title: String,
    pub summary: String,
    #[serde(deserialize_with = "clamped_score")]
    pub trend_score: u8,
    pub competition_level: CompetitionLevel,
    #[serde(default)]
    pub top_keywords: Vec<String>,
    #[serde(default)]
    pub viral_hooks: Vec<String>,
    #[serde(default)]
    pub suggested_titles: Vec<String>,
    #[serde(default)]
    pub full_script_prompt: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl Analysis {
    /// Parse the provider's JSON answer and attach the grounding sources.
    ///
    /// The trend score is clamped to 0..=100 and the competition level must
    /// be one of the three known levels; anything else fails the request.
    pub fn from_provider_json(text: &str, sources: Vec<Source>) -> Result<Analysis, AnalysisError> {
        let mut analysis: Analysis = serde_json::from_str(text)
            .map_err(|e| AnalysisError::Unparsable(e.to_string()))?;

        analysis.sources = sources;
        analysis.sources.truncate(MAX_SOURCES);

        Ok(analysis)
    }

    /// High momentum and low competition
    pub fn is_high_yield(&self) -> bool {
        self.trend_score >= HIGH_YIELD_MIN_TREND && self.competition_level == CompetitionLevel::Low
    }

    pub fn trend_tier(&self) -> TrendTier {
        TrendTier::for_score(self.trend_score)
    }
}

/// A persisted analysis. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub analysis: Analysis,
}

impl AnalysisRecord {
    pub fn new(id: String, timestamp: DateTime<Utc>, analysis: Analysis) -> AnalysisRecord {
        AnalysisRecord {
            id,
            timestamp,
            analysis,
        }
    }
}

/// Clamp a raw score into 0..=100, rounding to the nearest integer
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

fn clamped_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_score)
}
