/// History filtering: preset views and custom thresholds

use crate::analysis::{AnalysisRecord, CompetitionLevel};

/// Trend score required by the "high-trend" preset
pub const HIGH_TREND_MIN: u8 = 75;

/// Active view over the history list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    HighTrend,
    LowCompetition,
    SweetSpot,
    Custom,
}

impl ViewFilter {
    pub const PRESETS: [ViewFilter; 4] = [
        ViewFilter::All,
        ViewFilter::HighTrend,
        ViewFilter::LowCompetition,
        ViewFilter::SweetSpot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewFilter::All => "all",
            ViewFilter::HighTrend => "high-trend",
            ViewFilter::LowCompetition => "low-competition",
            ViewFilter::SweetSpot => "sweet-spot",
            ViewFilter::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewFilter::All => "All",
            ViewFilter::HighTrend => "High trend",
            ViewFilter::LowCompetition => "Low competition",
            ViewFilter::SweetSpot => "Sweet spot",
            ViewFilter::Custom => "Custom",
        }
    }

    pub fn parse(value: &str) -> Option<ViewFilter> {
        match value {
            "all" => Some(ViewFilter::All),
            "high-trend" => Some(ViewFilter::HighTrend),
            "low-competition" => Some(ViewFilter::LowCompetition),
            "sweet-spot" => Some(ViewFilter::SweetSpot),
            "custom" => Some(ViewFilter::Custom),
            _ => None,
        }
    }
}

/// Competition threshold control: either every level or exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompetitionTarget {
    #[default]
    All,
    Only(CompetitionLevel),
}

impl CompetitionTarget {
    /// Value used by the selector control
    pub fn as_value(self) -> &'static str {
        match self {
            CompetitionTarget::All => "all",
            CompetitionTarget::Only(level) => level.label(),
        }
    }

    pub fn parse(value: &str) -> Option<CompetitionTarget> {
        if value == "all" {
            Some(CompetitionTarget::All)
        } else {
            CompetitionLevel::parse(value).map(CompetitionTarget::Only)
        }
    }

    pub fn accepts(self, level: CompetitionLevel) -> bool {
        match self {
            CompetitionTarget::All => true,
            CompetitionTarget::Only(target) => target == level,
        }
    }
}

/// Does this record qualify as a high-yield opportunity
pub fn is_high_yield(record: &AnalysisRecord) -> bool {
    record.analysis.is_high_yield()
}

/// Records visible under a view filter, in their original order
pub fn compute_visible(
    records: &[AnalysisRecord],
    filter: ViewFilter,
    min_trend: u8,
    target: CompetitionTarget,
) -> Vec<AnalysisRecord> {
    records
        .iter()
        .filter(|record| {
            let analysis = &record.analysis;
            match filter {
                ViewFilter::HighTrend => analysis.trend_score >= HIGH_TREND_MIN,
                ViewFilter::LowCompetition => analysis.competition_level == CompetitionLevel::Low,
                ViewFilter::SweetSpot => analysis.is_high_yield(),
                ViewFilter::All | ViewFilter::Custom => {
                    analysis.trend_score >= min_trend && target.accepts(analysis.competition_level)
                }
            }
        })
        .cloned()
        .collect()
}

/// Filter selector plus the two threshold controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterState {
    pub filter: ViewFilter,
    pub min_trend: u8,
    pub target: CompetitionTarget,
}

impl FilterState {
    pub fn select(self, filter: ViewFilter) -> FilterState {
        FilterState { filter, ..self }
    }

    /// Moving the trend slider switches to the custom view
    pub fn with_min_trend(self, min_trend: u8) -> FilterState {
        FilterState {
            filter: ViewFilter::Custom,
            min_trend: min_trend.min(100),
            ..self
        }
    }

    /// Changing the competition selector switches to the custom view
    pub fn with_target(self, target: CompetitionTarget) -> FilterState {
        FilterState {
            filter: ViewFilter::Custom,
            target,
            ..self
        }
    }

    pub fn apply(&self, records: &[AnalysisRecord]) -> Vec<AnalysisRecord> {
        compute_visible(records, self.filter, self.min_trend, self.target)
    }
}
