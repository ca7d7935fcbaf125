//! Display-side lookup tables: raw-to-canonical index names and index
//! categories. Used only when formatting results, never by the analytics.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Index family shown as a section on the results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Broad Market")]
    BroadMarket,
    Sectoral,
    Strategy,
    Thematic,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::BroadMarket,
        Category::Sectoral,
        Category::Strategy,
        Category::Thematic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::BroadMarket => "Broad Market",
            Category::Sectoral => "Sectoral",
            Category::Strategy => "Strategy",
            Category::Thematic => "Thematic",
        }
    }

    /// Position on the results page, starting at 1.
    pub fn display_order(&self) -> u8 {
        match self {
            Category::BroadMarket => 1,
            Category::Sectoral => 2,
            Category::Strategy => 3,
            Category::Thematic => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = PipelineError;

    /// Accepts the label with or without an " Indices" suffix, any case.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        let normalized = normalized
            .strip_suffix(" indices")
            .unwrap_or(&normalized)
            .trim();

        Category::ALL
            .iter()
            .copied()
            .find(|category| category.label().to_ascii_lowercase() == normalized)
            .ok_or_else(|| PipelineError::DataFormat(format!("unknown category '{}'", raw.trim())))
    }
}

#[derive(Debug, Deserialize)]
struct NameRow {
    raw: String,
    canonical: String,
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    symbol: String,
    category: String,
}

/// Maps names used by the price source to canonical display names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMap {
    to_canonical: HashMap<String, String>,
}

impl NameMap {
    pub fn new() -> Self {
        NameMap {
            to_canonical: HashMap::new(),
        }
    }

    pub fn insert(&mut self, raw: impl Into<String>, canonical: impl Into<String>) {
        self.to_canonical
            .insert(raw.into().trim().to_string(), canonical.into().trim().to_string());
    }

    pub fn len(&self) -> usize {
        self.to_canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_canonical.is_empty()
    }

    /// Canonical name for `raw`, or `raw` itself (trimmed) when unmapped.
    pub fn normalize(&self, raw: &str) -> String {
        let key = raw.trim();
        self.to_canonical
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// First raw name mapping to `canonical`, if any.
    pub fn raw_name(&self, canonical: &str) -> Option<&str> {
        let mut matches: Vec<&str> = self
            .to_canonical
            .iter()
            .filter(|(_, c)| c.as_str() == canonical)
            .map(|(raw, _)| raw.as_str())
            .collect();
        matches.sort_unstable();
        matches.first().copied()
    }

    /// Reads a `raw,canonical` CSV with a header row.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut map = NameMap::new();
        for row in csv_reader.deserialize::<NameRow>() {
            let row = row?;
            map.insert(row.raw, row.canonical);
        }
        Ok(map)
    }
}

/// Canonical name → category lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTable {
    categories: HashMap<String, Category>,
}

impl CategoryTable {
    pub fn new() -> Self {
        CategoryTable {
            categories: HashMap::new(),
        }
    }

    pub fn insert(&mut self, symbol: impl Into<String>, category: Category) {
        self.categories.insert(symbol.into().trim().to_string(), category);
    }

    pub fn category(&self, symbol: &str) -> Option<Category> {
        self.categories.get(symbol.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Reads a `symbol,category` CSV with a header row.
    ///
    /// # Errors
    /// Returns `PipelineError::DataFormat` for an unknown category label.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut table = CategoryTable::new();
        for row in csv_reader.deserialize::<CategoryRow>() {
            let row = row?;
            let category = row.category.parse::<Category>()?;
            table.insert(row.symbol, category);
        }
        Ok(table)
    }
}
