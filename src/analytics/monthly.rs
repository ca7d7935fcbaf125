//! Monthly reduction of daily percentile ranks and selection of the most
//! recent month.

use crate::analytics::primitives::mean;
use crate::symbol::Symbol;
use crate::time_series::{RankPoint, YearMonth};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean percentile of one entity over one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub symbol: Symbol,
    pub month: YearMonth,
    pub mean_percentile: f64,
    /// RankPoints averaged into the mean
    pub days: usize,
}

/// One entity's strength score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalEntry {
    pub symbol: Symbol,
    pub percentile: f64,
}

/// Per-entity mean percentile for the most recent month in the dataset,
/// sorted ascending by percentile.
///
/// `month` is `None` only when no entity produced any RankPoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub month: Option<YearMonth>,
    pub entries: Vec<FinalEntry>,
}

impl FinalResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Percentile for `symbol`, `None` when the entity is absent.
    pub fn get(&self, symbol: &Symbol) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| &entry.symbol == symbol)
            .map(|entry| entry.percentile)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.get(symbol).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FinalEntry> {
        self.entries.iter()
    }

    /// Weakest `n` entities, weakest first.
    pub fn bottom(&self, n: usize) -> &[FinalEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Strongest `n` entities, strongest first.
    pub fn top(&self, n: usize) -> Vec<&FinalEntry> {
        self.entries.iter().rev().take(n).collect()
    }

    /// Percentiles in result order.
    pub fn percentiles(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.percentile).collect()
    }
}

/// Groups RankPoints by entity and calendar month.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    pub fn new() -> Self {
        MonthlyAggregator
    }

    /// Mean percentile per entity per month, newest month first, then by
    /// symbol.
    pub fn monthly_means(&self, ranks: &BTreeMap<Symbol, Vec<RankPoint>>) -> Vec<MonthlySummary> {
        let mut summaries = Vec::new();

        for (symbol, points) in ranks {
            let mut by_month: BTreeMap<YearMonth, Vec<f64>> = BTreeMap::new();
            for point in points {
                by_month
                    .entry(YearMonth::from_date(point.date))
                    .or_default()
                    .push(point.percentile);
            }

            for (month, values) in by_month {
                if let Some(mean_percentile) = mean(&values) {
                    summaries.push(MonthlySummary {
                        symbol: symbol.clone(),
                        month,
                        mean_percentile,
                        days: values.len(),
                    });
                }
            }
        }

        summaries.sort_by(|a, b| b.month.cmp(&a.month).then_with(|| a.symbol.cmp(&b.symbol)));
        summaries
    }

    /// Most recent month holding a RankPoint for any entity.
    pub fn latest_month(&self, ranks: &BTreeMap<Symbol, Vec<RankPoint>>) -> Option<YearMonth> {
        ranks
            .values()
            .flat_map(|points| points.iter())
            .map(|point| YearMonth::from_date(point.date))
            .max()
    }

    /// Reduces all entities' ranks to the FinalResult.
    ///
    /// The month is chosen once across the whole dataset; entities without
    /// RankPoints in that month are left out rather than backfilled from an
    /// earlier month.
    pub fn aggregate(&self, ranks: &BTreeMap<Symbol, Vec<RankPoint>>) -> FinalResult {
        let Some(month) = self.latest_month(ranks) else {
            log::warn!("No entity has any percentile rank; final result is empty");
            return FinalResult::default();
        };

        let mut entries: Vec<FinalEntry> = ranks
            .iter()
            .filter_map(|(symbol, points)| {
                let values: Vec<f64> = points
                    .iter()
                    .filter(|point| month.contains(point.date))
                    .map(|point| point.percentile)
                    .collect();
                let percentile = mean(&values)?;
                Some(FinalEntry {
                    symbol: symbol.clone(),
                    percentile,
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            OrderedFloat(a.percentile)
                .cmp(&OrderedFloat(b.percentile))
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        tracing::debug!(month = %month, entities = entries.len(), "MonthlyAggregator: final month");

        FinalResult {
            month: Some(month),
            entries,
        }
    }
}
