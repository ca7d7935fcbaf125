//! Batch orchestration: loader → returns → ranks → monthly reduction.

use crate::analytics::{analyze_entity, EntityAnalytics, FinalResult, MonthlyAggregator, MonthlySummary};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::loader::{SeriesLoader, TableSource};
use crate::symbol::Symbol;
use crate::time_series::{RankPoint, SeriesSet};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Why an entity has no value in the final result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AbsenceReason {
    /// Series too short (or too sparse) to produce any percentile rank
    InsufficientHistory { observations: usize, required: usize },
    /// Ranked, but not during the dataset's most recent month
    NoDataInLatestMonth { last_ranked: NaiveDate },
}

impl fmt::Display for AbsenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsenceReason::InsufficientHistory {
                observations,
                required,
            } => write!(
                f,
                "insufficient history ({} observations, {} required)",
                observations, required
            ),
            AbsenceReason::NoDataInLatestMonth { last_ranked } => {
                write!(f, "no ranks in latest month (last ranked {})", last_ranked)
            }
        }
    }
}

/// An entity left out of the final result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbsentEntity {
    pub symbol: Symbol,
    pub reason: AbsenceReason,
}

/// Outcome of one pipeline run with the diagnostics needed to tell a
/// complete result from a partial or empty one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub result: FinalResult,
    pub entities_loaded: usize,
    pub entities_with_returns: usize,
    pub entities_with_ranks: usize,
    pub absent: Vec<AbsentEntity>,
    /// Every entity's monthly means, newest month first
    pub monthly: Vec<MonthlySummary>,
}

impl PipelineReport {
    /// No entity received a final value.
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// Some loaded entities are missing from the final result.
    pub fn is_partial(&self) -> bool {
        !self.absent.is_empty()
    }
}

/// The batch pipeline with validated window sizes.
#[derive(Debug, Clone)]
pub struct StrengthPipeline {
    config: PipelineConfig,
    aggregator: MonthlyAggregator,
}

impl StrengthPipeline {
    /// # Errors
    /// Returns `PipelineError::InvalidConfig` for zero window sizes.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(StrengthPipeline {
            config,
            aggregator: MonthlyAggregator::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Loads the table from `source` and runs the pipeline over it.
    pub fn run_source(
        &self,
        source: &dyn TableSource,
        loader: &SeriesLoader,
    ) -> Result<PipelineReport, PipelineError> {
        let set = loader.load_from(source)?;
        Ok(self.run(&set))
    }

    /// Returns and ranks for every entity, computed independently.
    pub fn analyze(&self, set: &SeriesSet) -> BTreeMap<Symbol, EntityAnalytics> {
        let entries: Vec<_> = set.iter().collect();
        entries
            .par_iter()
            .map(|(symbol, series)| {
                let analytics = analyze_entity(series, &self.config);
                tracing::debug!(
                    symbol = %symbol,
                    observations = series.len(),
                    returns = analytics.returns.len(),
                    ranks = analytics.ranks.len(),
                    "StrengthPipeline: analyzed entity"
                );
                ((*symbol).clone(), analytics)
            })
            .collect()
    }

    /// Runs returns, ranks and the monthly reduction over a loaded set.
    pub fn run(&self, set: &SeriesSet) -> PipelineReport {
        log::info!(
            "Running pipeline over {} entities (horizon {}, rank window {}, {:.2} years)",
            set.len(),
            self.config.horizon_days,
            self.config.rank_window_size,
            self.config.years()
        );

        let analyzed = self.analyze(set);
        let entities_with_returns = analyzed.values().filter(|a| !a.returns.is_empty()).count();

        let ranks: BTreeMap<Symbol, Vec<RankPoint>> = analyzed
            .into_iter()
            .map(|(symbol, analytics)| (symbol, analytics.ranks))
            .collect();
        let entities_with_ranks = ranks.values().filter(|r| !r.is_empty()).count();

        let result = self.aggregator.aggregate(&ranks);
        let monthly = self.aggregator.monthly_means(&ranks);
        let absent = self.absent_entities(set, &ranks, &result);

        match result.month {
            Some(month) => log::info!(
                "Final month {}: {} of {} entities ranked",
                month,
                result.len(),
                set.len()
            ),
            None => log::warn!(
                "No entity has {} or more observations; result is empty",
                self.config.min_series_len()
            ),
        }
        for entity in &absent {
            log::warn!("{} absent from result: {}", entity.symbol, entity.reason);
        }

        PipelineReport {
            result,
            entities_loaded: set.len(),
            entities_with_returns,
            entities_with_ranks,
            absent,
            monthly,
        }
    }

    fn absent_entities(
        &self,
        set: &SeriesSet,
        ranks: &BTreeMap<Symbol, Vec<RankPoint>>,
        result: &FinalResult,
    ) -> Vec<AbsentEntity> {
        set.iter()
            .filter(|(symbol, _)| !result.contains(symbol))
            .map(|(symbol, series)| {
                let last_ranked = ranks
                    .get(symbol)
                    .and_then(|points| points.last())
                    .map(|point| point.date);
                let reason = match last_ranked {
                    Some(last_ranked) => AbsenceReason::NoDataInLatestMonth { last_ranked },
                    None => AbsenceReason::InsufficientHistory {
                        observations: series.len(),
                        required: self.config.min_series_len(),
                    },
                };
                AbsentEntity {
                    symbol: symbol.clone(),
                    reason,
                }
            })
            .collect()
    }
}
