//! Output formatting: summary CSV, JSON, frontend records and statistics.

use crate::analytics::primitives::{mean, median, round_to};
use crate::analytics::FinalResult;
use crate::catalog::{Category, CategoryTable, NameMap};
use crate::error::PipelineError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Decimal places written for percentiles.
pub const PERCENTILE_DECIMALS: i32 = 6;

/// Reading of a percentile relative to the entity's own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpretation {
    #[serde(rename = "Very Bullish")]
    VeryBullish,
    Bullish,
    Neutral,
    Bearish,
    #[serde(rename = "Very Bearish")]
    VeryBearish,
}

impl Interpretation {
    pub fn from_percentile(percentile: f64) -> Self {
        if percentile >= 0.8 {
            Interpretation::VeryBullish
        } else if percentile >= 0.6 {
            Interpretation::Bullish
        } else if percentile >= 0.4 {
            Interpretation::Neutral
        } else if percentile >= 0.2 {
            Interpretation::Bearish
        } else {
            Interpretation::VeryBearish
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interpretation::VeryBullish => "Very Bullish",
            Interpretation::Bullish => "Bullish",
            Interpretation::Neutral => "Neutral",
            Interpretation::Bearish => "Bearish",
            Interpretation::VeryBearish => "Very Bearish",
        }
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    index: &'a str,
    percentile: f64,
}

/// Writes `Index,Percentile` rows in result order (weakest first).
pub fn write_summary_csv<W: Write>(result: &FinalResult, writer: W) -> Result<(), PipelineError> {
    // Empty results still get a header row.
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(["Index", "Percentile"])?;
    for entry in result.iter() {
        csv_writer.serialize(SummaryRow {
            index: entry.symbol.as_str(),
            percentile: round_to(entry.percentile, PERCENTILE_DECIMALS),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the whole result, month included, as pretty JSON.
pub fn write_result_json<W: Write>(result: &FinalResult, mut writer: W) -> Result<(), PipelineError> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    Ok(())
}

/// One row of the strongest-first listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    /// 1 = strongest
    pub rank: usize,
    pub symbol: String,
    pub percentile: f64,
    pub interpretation: Interpretation,
}

/// Strongest-first listing with ranks and interpretation bands.
pub fn ranked_rows(result: &FinalResult) -> Vec<RankedRow> {
    result
        .entries
        .iter()
        .rev()
        .enumerate()
        .map(|(i, entry)| {
            let percentile = round_to(entry.percentile, PERCENTILE_DECIMALS);
            RankedRow {
                rank: i + 1,
                symbol: entry.symbol.to_string(),
                percentile,
                interpretation: Interpretation::from_percentile(percentile),
            }
        })
        .collect()
}

/// Record consumed by the static results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendRecord {
    pub full_name: String,
    pub display_name: String,
    pub percentile: f64,
    pub category: Category,
}

/// Frontend records plus the symbols that had no category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontendExport {
    pub records: Vec<FrontendRecord>,
    /// `(source symbol, canonical name)` pairs left out
    pub unmatched: Vec<(String, String)>,
}

/// Normalizes names, attaches categories and orders records by category,
/// strongest first within each category.
pub fn build_frontend_records(
    result: &FinalResult,
    names: &NameMap,
    categories: &CategoryTable,
) -> FrontendExport {
    let mut export = FrontendExport::default();

    for entry in result.iter() {
        let canonical = names.normalize(entry.symbol.as_str());
        match categories.category(&canonical) {
            Some(category) => export.records.push(FrontendRecord {
                full_name: entry.symbol.to_string(),
                display_name: canonical,
                percentile: round_to(entry.percentile, PERCENTILE_DECIMALS),
                category,
            }),
            None => export.unmatched.push((entry.symbol.to_string(), canonical)),
        }
    }

    export.records.sort_by(|a, b| {
        a.category
            .display_order()
            .cmp(&b.category.display_order())
            .then_with(|| OrderedFloat(b.percentile).cmp(&OrderedFloat(a.percentile)))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    if !export.unmatched.is_empty() {
        log::warn!(
            "{} of {} indices have no category and were left out",
            export.unmatched.len(),
            result.len()
        );
    }

    export
}

pub fn write_frontend_json<W: Write>(
    records: &[FrontendRecord],
    mut writer: W,
) -> Result<(), PipelineError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Distribution of final percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStatistics {
    /// `None` for an empty set of values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(SummaryStatistics {
            count: values.len(),
            mean: mean(values)?,
            median: median(values)?,
            min: values.iter().copied().map(OrderedFloat).min()?.0,
            max: values.iter().copied().map(OrderedFloat).max()?.0,
        })
    }

    pub fn from_result(result: &FinalResult) -> Option<Self> {
        Self::from_values(&result.percentiles())
    }
}

/// Per-category summary of the frontend records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStatistics {
    pub category: Category,
    pub count: usize,
    pub mean: f64,
    pub top: String,
    pub bottom: String,
}

pub fn category_statistics(records: &[FrontendRecord]) -> Vec<CategoryStatistics> {
    let mut grouped: BTreeMap<Category, Vec<&FrontendRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.category).or_default().push(record);
    }

    grouped
        .into_iter()
        .filter_map(|(category, members)| {
            let values: Vec<f64> = members.iter().map(|r| r.percentile).collect();
            let top = members
                .iter()
                .max_by_key(|r| OrderedFloat(r.percentile))?;
            let bottom = members
                .iter()
                .min_by_key(|r| OrderedFloat(r.percentile))?;
            Some(CategoryStatistics {
                category,
                count: members.len(),
                mean: mean(&values)?,
                top: top.display_name.clone(),
                bottom: bottom.display_name.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::FinalEntry;
    use crate::symbol::Symbol;
    use crate::time_series::YearMonth;

    fn result(entries: &[(&str, f64)]) -> FinalResult {
        FinalResult {
            month: Some(YearMonth::new(2025, 11)),
            entries: entries
                .iter()
                .map(|(name, p)| FinalEntry {
                    symbol: Symbol::new(*name).unwrap(),
                    percentile: *p,
                })
                .collect(),
        }
    }

    #[test]
    fn interpretation_bands() {
        assert_eq!(Interpretation::from_percentile(0.95), Interpretation::VeryBullish);
        assert_eq!(Interpretation::from_percentile(0.8), Interpretation::VeryBullish);
        assert_eq!(Interpretation::from_percentile(0.6), Interpretation::Bullish);
        assert_eq!(Interpretation::from_percentile(0.5), Interpretation::Neutral);
        assert_eq!(Interpretation::from_percentile(0.2), Interpretation::Bearish);
        assert_eq!(Interpretation::from_percentile(0.0), Interpretation::VeryBearish);
        assert_eq!(Interpretation::Bearish.to_string(), "Bearish");
    }

    #[test]
    fn summary_csv_rounds_and_keeps_order() {
        let result = result(&[("Nifty IT", 0.1234567), ("Nifty Bank", 0.9)]);
        let mut out = Vec::new();
        write_summary_csv(&result, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Index,Percentile\nNifty IT,0.123457\nNifty Bank,0.9\n");
    }

    #[test]
    fn summary_csv_of_empty_result_has_header() {
        let mut out = Vec::new();
        write_summary_csv(&FinalResult::default(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Index,Percentile\n");
    }

    #[test]
    fn result_json_carries_month() {
        let result = result(&[("Nifty IT", 0.25)]);
        let mut out = Vec::new();
        write_result_json(&result, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["month"]["year"], 2025);
        assert_eq!(value["month"]["month"], 11);
        assert_eq!(value["entries"][0]["symbol"], "Nifty IT");
    }

    #[test]
    fn ranked_rows_strongest_first() {
        let rows = ranked_rows(&result(&[("A", 0.1), ("B", 0.5), ("C", 0.85)]));
        let names: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].interpretation, Interpretation::VeryBullish);
        assert_eq!(rows[2].interpretation, Interpretation::VeryBearish);
    }

    #[test]
    fn frontend_records_sorted_by_category_then_strength() {
        let result = result(&[
            ("Nifty IT", 0.2),
            ("Nifty Smallcap 100", 0.3),
            ("Nifty Bank", 0.7),
            ("Nifty 50", 0.6),
            ("Unknown", 0.99),
        ]);

        let mut names = NameMap::new();
        names.insert("Nifty Smallcap 100", "NIFTY SMLCAP 100");
        let mut categories = CategoryTable::new();
        categories.insert("Nifty IT", Category::Sectoral);
        categories.insert("Nifty Bank", Category::Sectoral);
        categories.insert("Nifty 50", Category::BroadMarket);
        categories.insert("NIFTY SMLCAP 100", Category::BroadMarket);

        let export = build_frontend_records(&result, &names, &categories);
        let order: Vec<&str> = export.records.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(order, vec!["Nifty 50", "NIFTY SMLCAP 100", "Nifty Bank", "Nifty IT"]);
        assert_eq!(export.records[1].full_name, "Nifty Smallcap 100");
        assert_eq!(
            export.unmatched,
            vec![("Unknown".to_string(), "Unknown".to_string())]
        );
    }

    #[test]
    fn frontend_json_uses_camel_case() {
        let record = FrontendRecord {
            full_name: "Nifty Bank".to_string(),
            display_name: "NIFTY BANK".to_string(),
            percentile: 0.5,
            category: Category::Sectoral,
        };
        let mut out = Vec::new();
        write_frontend_json(&[record], &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["fullName"], "Nifty Bank");
        assert_eq!(value[0]["displayName"], "NIFTY BANK");
        assert_eq!(value[0]["category"], "Sectoral");
    }

    #[test]
    fn summary_statistics() {
        let stats = SummaryStatistics::from_result(&result(&[("A", 0.1), ("B", 0.3), ("C", 0.8)]))
            .unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 0.4).abs() < 1e-12);
        assert_eq!(stats.median, 0.3);
        assert_eq!(stats.min, 0.1);
        assert_eq!(stats.max, 0.8);

        assert_eq!(SummaryStatistics::from_values(&[]), None);
    }

    #[test]
    fn category_statistics_top_and_bottom() {
        let records = vec![
            FrontendRecord {
                full_name: "a".to_string(),
                display_name: "A".to_string(),
                percentile: 0.9,
                category: Category::Sectoral,
            },
            FrontendRecord {
                full_name: "b".to_string(),
                display_name: "B".to_string(),
                percentile: 0.1,
                category: Category::Sectoral,
            },
            FrontendRecord {
                full_name: "c".to_string(),
                display_name: "C".to_string(),
                percentile: 0.4,
                category: Category::Thematic,
            },
        ];

        let stats = category_statistics(&records);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].category, Category::Sectoral);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].top, "A");
        assert_eq!(stats[0].bottom, "B");
        assert!((stats[0].mean - 0.5).abs() < 1e-12);
        assert_eq!(stats[1].category, Category::Thematic);
    }
}
