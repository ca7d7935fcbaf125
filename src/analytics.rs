//! Analytics Functions
//!
//! Rolling CAGR, rolling percentile rank and monthly reduction. Every stage
//! is a pure function of its input; an entity's output depends only on its
//! own series.

pub mod monthly;
pub mod primitives;
pub mod ranking;
pub mod returns;
pub mod windows;

pub use monthly::{FinalEntry, FinalResult, MonthlyAggregator, MonthlySummary};
pub use ranking::RollingPercentileRanker;
pub use returns::RollingReturnCalculator;
pub use windows::{FixedLag, SortedWindow, WindowStrategy};

use crate::config::PipelineConfig;
use crate::time_series::{EntitySeries, RankPoint, ReturnPoint};

/// Intermediate series for one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityAnalytics {
    pub returns: Vec<ReturnPoint>,
    pub ranks: Vec<RankPoint>,
}

/// Runs the return and rank stages over one entity's series.
///
/// # Examples
/// ```
/// use index_strength::analytics::analyze_entity;
/// use index_strength::config::PipelineConfig;
/// use index_strength::time_series::{EntitySeries, Observation};
/// use chrono::{Duration, NaiveDate};
///
/// let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
/// let observations = (0..6)
///     .map(|i| Observation::new(start + Duration::days(i), 100.0 + i as f64))
///     .collect();
/// let series = EntitySeries::from_observations(observations);
///
/// let analytics = analyze_entity(&series, &PipelineConfig::new(2, 3));
/// assert_eq!(analytics.returns.len(), 4);
/// assert_eq!(analytics.ranks.len(), 2);
/// ```
pub fn analyze_entity(series: &EntitySeries, config: &PipelineConfig) -> EntityAnalytics {
    let returns = RollingReturnCalculator::from_config(config).compute(series.observations());
    let ranks = RollingPercentileRanker::from_config(config).compute(&returns);
    EntityAnalytics { returns, ranks }
}
