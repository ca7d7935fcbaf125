use crate::symbol::Symbol;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// A single dated index level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Trading date
    pub date: NaiveDate,
    /// Index level on that date
    pub value: f64,
}

impl Observation {
    /// Creates a new Observation.
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Observation { date, value }
    }

    /// Whether the value can take part in a return calculation.
    pub fn is_usable(&self) -> bool {
        is_usable_value(self.value)
    }
}

/// Index levels must be finite and strictly positive.
pub fn is_usable_value(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Annualized rolling return ending at `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub annualized_return: f64,
}

impl ReturnPoint {
    pub fn new(date: NaiveDate, annualized_return: f64) -> Self {
        ReturnPoint {
            date,
            annualized_return,
        }
    }
}

/// Percentile of a return within its own trailing window, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankPoint {
    pub date: NaiveDate,
    pub percentile: f64,
}

impl RankPoint {
    pub fn new(date: NaiveDate, percentile: f64) -> Self {
        RankPoint { date, percentile }
    }
}

/// Calendar month key. Orders by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        YearMonth { year, month }
    }

    /// Returns the month that contains `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Whether `date` falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Date range covered by a series or table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &DateRange) -> DateRange {
        DateRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Ordered observation sequence for one entity.
///
/// Construction enforces the series invariants: strictly ascending dates,
/// no duplicate dates, only usable (finite, positive) values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySeries {
    observations: Vec<Observation>,
}

impl EntitySeries {
    /// Builds a series from observations in any order.
    ///
    /// Unusable values are dropped. When two observations share a date the
    /// one appearing later in `observations` wins.
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let mut usable: Vec<Observation> =
            observations.into_iter().filter(Observation::is_usable).collect();

        // Stable sort keeps input order among equal dates.
        usable.sort_by_key(|obs| obs.date);

        let mut deduped: Vec<Observation> = Vec::with_capacity(usable.len());
        for obs in usable {
            match deduped.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => deduped.push(obs),
            }
        }

        EntitySeries {
            observations: deduped,
        }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Returns the range from the first to the last observation.
    pub fn date_range(&self) -> Option<DateRange> {
        let first = self.observations.first()?;
        let last = self.observations.last()?;
        Some(DateRange::new(first.date, last.date))
    }
}

/// Per-entity series keyed by symbol. Iteration order is by symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    series: BTreeMap<Symbol, EntitySeries>,
}

impl SeriesSet {
    pub fn new() -> Self {
        SeriesSet {
            series: BTreeMap::new(),
        }
    }

    /// Adds or replaces the series for `symbol`.
    pub fn insert(&mut self, symbol: Symbol, series: EntitySeries) {
        self.series.insert(symbol, series);
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&EntitySeries> {
        self.series.get(symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.series.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Symbol, EntitySeries> {
        self.series.iter()
    }

    /// Total number of observations across all entities.
    pub fn total_observations(&self) -> usize {
        self.series.values().map(EntitySeries::len).sum()
    }

    /// Range covered by all non-empty series.
    pub fn date_range(&self) -> Option<DateRange> {
        self.series
            .values()
            .filter_map(EntitySeries::date_range)
            .reduce(|acc, range| acc.union(&range))
    }
}

impl<'a> IntoIterator for &'a SeriesSet {
    type Item = (&'a Symbol, &'a EntitySeries);
    type IntoIter = btree_map::Iter<'a, Symbol, EntitySeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}

impl FromIterator<(Symbol, EntitySeries)> for SeriesSet {
    fn from_iter<I: IntoIterator<Item = (Symbol, EntitySeries)>>(iter: I) -> Self {
        SeriesSet {
            series: iter.into_iter().collect(),
        }
    }
}
