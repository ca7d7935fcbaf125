//! Comparison of a computed result against a reference set of
//! percentiles, e.g. a previously published summary.

use crate::analytics::FinalResult;
use crate::error::PipelineError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

/// Absolute difference below which two values count as the same.
pub const EXACT_TOLERANCE: f64 = 1e-4;
/// Absolute difference below which two values count as close.
pub const CLOSE_TOLERANCE: f64 = 1e-2;

#[derive(Debug, Deserialize)]
struct ReferenceRow {
    symbol: String,
    percentile: f64,
}

/// Reads a `symbol,percentile` CSV with a header row.
pub fn load_reference_csv<R: Read>(reader: R) -> Result<BTreeMap<String, f64>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut reference = BTreeMap::new();
    for row in csv_reader.deserialize::<ReferenceRow>() {
        let row = row?;
        reference.insert(row.symbol, row.percentile);
    }
    Ok(reference)
}

/// One symbol present in both result sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub symbol: String,
    pub reference: f64,
    pub computed: f64,
    /// `reference - computed`
    pub diff: f64,
    pub abs_diff: f64,
    /// `abs_diff` as a percentage of the reference, 0 when the reference is 0
    pub pct_diff: f64,
}

/// Overall agreement between the two result sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// Every common symbol matches exactly
    Match,
    /// More than 90% of common symbols match exactly
    MostlyMatch,
    Diverges,
    /// No symbol in common
    NoOverlap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub only_reference: Vec<String>,
    pub only_computed: Vec<String>,
    /// Largest absolute difference first
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonReport {
    pub fn exact_matches(&self) -> usize {
        self.rows.iter().filter(|r| r.abs_diff < EXACT_TOLERANCE).count()
    }

    pub fn close_matches(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.abs_diff >= EXACT_TOLERANCE && r.abs_diff < CLOSE_TOLERANCE)
            .count()
    }

    pub fn significant_differences(&self) -> usize {
        self.rows.iter().filter(|r| r.abs_diff >= CLOSE_TOLERANCE).count()
    }

    pub fn verdict(&self) -> Verdict {
        if self.rows.is_empty() {
            return Verdict::NoOverlap;
        }
        let exact = self.exact_matches();
        if exact == self.rows.len() {
            Verdict::Match
        } else if exact as f64 > self.rows.len() as f64 * 0.9 {
            Verdict::MostlyMatch
        } else {
            Verdict::Diverges
        }
    }
}

/// Compares `computed` with `reference` symbol by symbol.
pub fn compare_results(computed: &FinalResult, reference: &BTreeMap<String, f64>) -> ComparisonReport {
    let computed_values: BTreeMap<String, f64> = computed
        .iter()
        .map(|entry| (entry.symbol.to_string(), entry.percentile))
        .collect();

    let reference_symbols: BTreeSet<&String> = reference.keys().collect();
    let computed_symbols: BTreeSet<&String> = computed_values.keys().collect();

    let only_reference = reference_symbols
        .difference(&computed_symbols)
        .map(|s| s.to_string())
        .collect();
    let only_computed = computed_symbols
        .difference(&reference_symbols)
        .map(|s| s.to_string())
        .collect();

    let mut rows: Vec<ComparisonRow> = reference
        .iter()
        .filter_map(|(symbol, &reference_value)| {
            let computed_value = *computed_values.get(symbol)?;
            let diff = reference_value - computed_value;
            let abs_diff = diff.abs();
            let pct_diff = if reference_value != 0.0 {
                abs_diff / reference_value * 100.0
            } else {
                0.0
            };
            Some(ComparisonRow {
                symbol: symbol.clone(),
                reference: reference_value,
                computed: computed_value,
                diff,
                abs_diff,
                pct_diff,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        OrderedFloat(b.abs_diff)
            .cmp(&OrderedFloat(a.abs_diff))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    ComparisonReport {
        only_reference,
        only_computed,
        rows,
    }
}
