//! Wide-table input: one date column plus one value column per entity.
//!
//! `TableSource` implementations produce an untyped `RawTable`; the
//! `SeriesLoader` turns it into typed, ordered per-entity series.

use crate::config::DEFAULT_DATE_FORMATS;
use crate::error::PipelineError;
use crate::symbol::Symbol;
use crate::time_series::{is_usable_value, EntitySeries, Observation, SeriesSet};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

/// One row of the wide table, cells still as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub date: String,
    /// One cell per entity header, empty when missing
    pub cells: Vec<String>,
}

/// Untyped wide table: entity headers and rows of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    /// Creates an empty table with the given entity headers.
    pub fn new(headers: Vec<String>) -> Self {
        RawTable {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded with empty cells and long rows
    /// are truncated to the header count.
    pub fn push_row(&mut self, date: impl Into<String>, cells: Vec<String>) {
        let mut cells = cells;
        cells.resize(self.headers.len(), String::new());
        self.rows.push(RawRow {
            date: date.into(),
            cells,
        });
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    /// Reads a CSV with a header row.
    ///
    /// Every column except `date_column` becomes an entity. Repeated header
    /// names get `.1`, `.2`, ... suffixes so each column stays addressable.
    ///
    /// # Errors
    /// Returns `PipelineError::DataFormat` if the date column is missing and
    /// `PipelineError::Csv` for malformed CSV.
    pub fn read_csv<R: Read>(reader: R, date_column: &str) -> Result<Self, PipelineError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header_record = csv_reader.headers()?.clone();
        let date_index = header_record
            .iter()
            .position(|h| h == date_column)
            .or_else(|| {
                header_record
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(date_column))
            })
            .ok_or_else(|| {
                PipelineError::DataFormat(format!("date column '{}' not found", date_column))
            })?;

        let value_indices: Vec<usize> = (0..header_record.len())
            .filter(|&i| i != date_index)
            .collect();
        let headers = dedupe_headers(
            value_indices
                .iter()
                .map(|&i| header_record.get(i).unwrap_or_default().to_string()),
        );

        let mut table = RawTable::new(headers);
        for record in csv_reader.records() {
            let record = record?;
            let date = record.get(date_index).unwrap_or_default().to_string();
            let cells = value_indices
                .iter()
                .map(|&i| record.get(i).unwrap_or_default().to_string())
                .collect();
            table.push_row(date, cells);
        }

        Ok(table)
    }
}

fn dedupe_headers<I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut taken: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|header| {
            let name = if taken.contains(&header) {
                let count = counts.entry(header.clone()).or_insert(0);
                loop {
                    *count += 1;
                    let candidate = format!("{}.{}", header, count);
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                }
            } else {
                header
            };
            taken.insert(name.clone());
            name
        })
        .collect()
}

/// Source of the wide input table.
///
/// Implementations can be:
/// - A CSV file on disk
/// - An in-memory table (for testing)
pub trait TableSource {
    /// Reads the whole table.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read or is structurally
    /// malformed.
    fn read_table(&self) -> Result<RawTable, PipelineError>;
}

/// Reads the table from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    path: PathBuf,
    date_column: String,
}

impl CsvTableSource {
    pub fn new(path: impl AsRef<Path>, date_column: impl Into<String>) -> Self {
        CsvTableSource {
            path: path.as_ref().to_path_buf(),
            date_column: date_column.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for CsvTableSource {
    fn read_table(&self) -> Result<RawTable, PipelineError> {
        let file = std::fs::File::open(&self.path)?;
        let table = RawTable::read_csv(std::io::BufReader::new(file), &self.date_column)?;
        log::info!(
            "Loaded {}: {} rows, {} index columns",
            self.path.display(),
            table.rows().len(),
            table.headers().len()
        );
        Ok(table)
    }
}

/// In-memory table source for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableSource {
    table: RawTable,
}

impl InMemoryTableSource {
    pub fn new(table: RawTable) -> Self {
        InMemoryTableSource { table }
    }
}

impl TableSource for InMemoryTableSource {
    fn read_table(&self) -> Result<RawTable, PipelineError> {
        Ok(self.table.clone())
    }
}

/// Parses a raw table into ordered per-entity series.
#[derive(Debug, Clone)]
pub struct SeriesLoader {
    date_formats: Vec<String>,
}

impl Default for SeriesLoader {
    fn default() -> Self {
        SeriesLoader {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl SeriesLoader {
    /// Creates a loader trying `date_formats` in order.
    pub fn new(date_formats: Vec<String>) -> Self {
        SeriesLoader { date_formats }
    }

    /// Parses a date cell with the first matching format.
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        self.date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
    }

    /// Parses a value cell; `None` for anything unusable as an index level.
    pub fn parse_value(raw: &str) -> Option<f64> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| is_usable_value(*value))
    }

    /// Reads and loads a table from `source`.
    pub fn load_from(&self, source: &dyn TableSource) -> Result<SeriesSet, PipelineError> {
        let table = source.read_table()?;
        self.load(&table)
    }

    /// Builds one ordered series per entity column.
    ///
    /// Bad value cells are dropped for their entity only. Rows whose date
    /// cannot be parsed are dropped for every entity.
    ///
    /// # Errors
    /// Returns `PipelineError::DataFormat` if the table has no rows or if no
    /// date parses. Blank headers are skipped; headers that collide after
    /// trimming get a `.N` suffix.
    pub fn load(&self, table: &RawTable) -> Result<SeriesSet, PipelineError> {
        if table.rows().is_empty() {
            return Err(PipelineError::DataFormat(
                "table has no data rows".to_string(),
            ));
        }

        let dates: Vec<Option<NaiveDate>> = table
            .rows()
            .iter()
            .map(|row| self.parse_date(&row.date))
            .collect();

        let parsed_dates = dates.iter().filter(|d| d.is_some()).count();
        if parsed_dates == 0 {
            return Err(PipelineError::DataFormat(format!(
                "none of {} date cells matched formats {:?}",
                dates.len(),
                self.date_formats
            )));
        }
        if parsed_dates < dates.len() {
            log::warn!(
                "Dropped {} of {} rows with unparseable dates",
                dates.len() - parsed_dates,
                dates.len()
            );
        }

        let mut set = SeriesSet::new();
        for (column, header) in table.headers().iter().enumerate() {
            let symbol = match Symbol::new(header.as_str()) {
                Ok(symbol) => symbol,
                Err(err) => {
                    log::warn!("Skipping column {}: {}", column + 1, err);
                    continue;
                }
            };
            let symbol = if set.contains(&symbol) {
                let renamed = unique_symbol(&set, &symbol);
                log::warn!("Duplicate column '{}' loaded as '{}'", symbol, renamed);
                renamed
            } else {
                symbol
            };

            let observations: Vec<Observation> = table
                .rows()
                .iter()
                .zip(dates.iter())
                .filter_map(|(row, date)| {
                    let date = (*date)?;
                    let value = Self::parse_value(row.cells.get(column)?)?;
                    Some(Observation::new(date, value))
                })
                .collect();

            let cell_count = observations.len();
            let series = EntitySeries::from_observations(observations);

            tracing::debug!(
                symbol = %symbol,
                observations = series.len(),
                dropped = parsed_dates - series.len(),
                duplicates = cell_count - series.len(),
                "SeriesLoader: built series"
            );
            if series.is_empty() {
                log::warn!("{}: no usable values", symbol);
            }

            set.insert(symbol, series);
        }

        if let Some(range) = set.date_range() {
            log::info!(
                "Loaded {} entities, {} observations, {}",
                set.len(),
                set.total_observations(),
                range
            );
        }

        Ok(set)
    }
}

/// First `symbol.N` not yet present in `set`.
fn unique_symbol(set: &SeriesSet, symbol: &Symbol) -> Symbol {
    (1..)
        .filter_map(|n| Symbol::new(format!("{}.{}", symbol, n)).ok())
        .find(|candidate| !set.contains(candidate))
        .unwrap_or_else(|| symbol.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_date_tries_formats_in_order() {
        let loader = SeriesLoader::default();
        assert_eq!(loader.parse_date("14/11/25"), Some(date(2025, 11, 14)));
        assert_eq!(loader.parse_date("14/11/2025"), Some(date(2025, 11, 14)));
        assert_eq!(loader.parse_date("2025-11-14"), Some(date(2025, 11, 14)));
        assert_eq!(loader.parse_date("14-Nov-2025"), Some(date(2025, 11, 14)));
        assert_eq!(loader.parse_date(""), None);
        assert_eq!(loader.parse_date("not a date"), None);
    }

    #[test]
    fn test_parse_value_rejects_unusable_cells() {
        assert_eq!(SeriesLoader::parse_value(" 19500.25 "), Some(19500.25));
        assert_eq!(SeriesLoader::parse_value(""), None);
        assert_eq!(SeriesLoader::parse_value("-"), None);
        assert_eq!(SeriesLoader::parse_value("0"), None);
        assert_eq!(SeriesLoader::parse_value("-3.5"), None);
        assert_eq!(SeriesLoader::parse_value("NaN"), None);
        assert_eq!(SeriesLoader::parse_value("inf"), None);
    }

    #[test]
    fn test_bad_cells_drop_only_their_entity() {
        let mut table = RawTable::new(cells(&["Nifty 50", "Nifty Bank"]));
        table.push_row("2024-01-01", cells(&["100", "200"]));
        table.push_row("2024-01-02", cells(&["", "201"]));
        table.push_row("2024-01-03", cells(&["102", "oops"]));

        let set = SeriesLoader::default().load(&table).unwrap();
        let nifty = set.get(&Symbol::new("Nifty 50").unwrap()).unwrap();
        let bank = set.get(&Symbol::new("Nifty Bank").unwrap()).unwrap();

        assert_eq!(nifty.len(), 2);
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.observations()[1].date, date(2024, 1, 2));
    }

    #[test]
    fn test_unsorted_rows_are_sorted() {
        let mut table = RawTable::new(cells(&["A"]));
        table.push_row("03/01/24", cells(&["3"]));
        table.push_row("01/01/24", cells(&["1"]));
        table.push_row("02/01/24", cells(&["2"]));

        let set = SeriesLoader::default().load(&table).unwrap();
        let values: Vec<f64> = set
            .get(&Symbol::new("A").unwrap())
            .unwrap()
            .observations()
            .iter()
            .map(|o| o.value)
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_all_invalid_column_yields_empty_series() {
        let mut table = RawTable::new(cells(&["A", "B"]));
        table.push_row("2024-01-01", cells(&["1", "x"]));
        table.push_row("2024-01-02", cells(&["2", "-1"]));

        let set = SeriesLoader::default().load(&table).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get(&Symbol::new("B").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_date_axis_is_data_format_error() {
        let mut table = RawTable::new(cells(&["A"]));
        table.push_row("yesterday", cells(&["1"]));
        table.push_row("today", cells(&["2"]));

        let err = SeriesLoader::default().load(&table).unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }

    #[test]
    fn test_partially_parseable_dates_drop_rows() {
        let mut table = RawTable::new(cells(&["A"]));
        table.push_row("2024-01-01", cells(&["1"]));
        table.push_row("garbage", cells(&["2"]));
        table.push_row("2024-01-03", cells(&["3"]));

        let set = SeriesLoader::default().load(&table).unwrap();
        assert_eq!(set.get(&Symbol::new("A").unwrap()).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_table_is_data_format_error() {
        let table = RawTable::new(cells(&["A"]));
        let err = SeriesLoader::default().load(&table).unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }

    #[test]
    fn test_blank_header_column_is_skipped() {
        // Trailing comma in a spreadsheet export leaves an unnamed column.
        let data = "DATE,Nifty Bank,\n01/01/20,100,\n02/01/20,101,\n";
        let table = RawTable::read_csv(data.as_bytes(), "DATE").unwrap();
        assert_eq!(table.headers(), &["Nifty Bank".to_string(), String::new()]);

        let set = SeriesLoader::default().load(&table).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&Symbol::new("Nifty Bank").unwrap()).unwrap().len(), 2);
    }

    #[test]
    fn test_headers_equal_after_trim_are_kept_apart() {
        let mut table = RawTable::new(cells(&["A", " A "]));
        table.push_row("2024-01-01", cells(&["1", "2"]));

        let set = SeriesLoader::default().load(&table).unwrap();
        assert_eq!(set.len(), 2);
        let renamed = set.get(&Symbol::new("A.1").unwrap()).unwrap();
        assert_eq!(renamed.observations()[0].value, 2.0);
    }

    #[test]
    fn test_read_csv_extracts_date_column_anywhere() {
        let data = "Nifty 50,DATE,Nifty IT\n100,01/01/24,300\n101,02/01/24,\n";
        let table = RawTable::read_csv(data.as_bytes(), "DATE").unwrap();

        assert_eq!(table.headers(), &["Nifty 50".to_string(), "Nifty IT".to_string()]);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].date, "01/01/24");
        assert_eq!(table.rows()[1].cells, cells(&["101", ""]));
    }

    #[test]
    fn test_read_csv_date_column_case_insensitive_fallback() {
        let data = "Date,A\n2024-01-01,1\n";
        let table = RawTable::read_csv(data.as_bytes(), "DATE").unwrap();
        assert_eq!(table.headers(), &["A".to_string()]);
    }

    #[test]
    fn test_read_csv_missing_date_column() {
        let data = "Day,A\n2024-01-01,1\n";
        let err = RawTable::read_csv(data.as_bytes(), "DATE").unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }

    #[test]
    fn test_read_csv_dedupes_repeated_headers() {
        let data = "DATE,G-Sec,G-Sec,G-Sec\n2024-01-01,1,2,3\n";
        let table = RawTable::read_csv(data.as_bytes(), "DATE").unwrap();
        assert_eq!(
            table.headers(),
            &["G-Sec".to_string(), "G-Sec.1".to_string(), "G-Sec.2".to_string()]
        );
    }

    #[test]
    fn test_read_csv_suffix_does_not_collide_with_existing_header() {
        let data = "DATE,A,A,A.1\n2024-01-01,1,2,3\n2024-01-02,1,2,3\n";
        let table = RawTable::read_csv(data.as_bytes(), "DATE").unwrap();
        assert_eq!(
            table.headers(),
            &["A".to_string(), "A.1".to_string(), "A.1.1".to_string()]
        );

        let set = SeriesLoader::default().load(&table).unwrap();
        assert_eq!(set.len(), 3);
        let values = |name: &str| -> Vec<f64> {
            set.get(&Symbol::new(name).unwrap())
                .unwrap()
                .observations()
                .iter()
                .map(|o| o.value)
                .collect()
        };
        assert_eq!(values("A"), vec![1.0, 1.0]);
        assert_eq!(values("A.1"), vec![2.0, 2.0]);
        assert_eq!(values("A.1.1"), vec![3.0, 3.0]);
    }

    #[test]
    fn test_read_csv_pads_short_rows() {
        let data = "DATE,A,B\n2024-01-01,1\n";
        let table = RawTable::read_csv(data.as_bytes(), "DATE").unwrap();
        assert_eq!(table.rows()[0].cells, cells(&["1", ""]));
    }

    #[test]
    fn test_load_from_in_memory_source() {
        let mut table = RawTable::new(cells(&["A"]));
        table.push_row("2024-01-01", cells(&["1"]));
        let source = InMemoryTableSource::new(table);

        let set = SeriesLoader::default().load_from(&source).unwrap();
        assert_eq!(set.total_observations(), 1);
    }

    #[test]
    fn test_csv_source_missing_file_is_io_error() {
        let source = CsvTableSource::new("does/not/exist.csv", "DATE");
        let err = source.read_table().unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
