use crate::error::PipelineError;
use std::path::PathBuf;

/// Default return horizon: five years of daily positions.
pub const DEFAULT_HORIZON_DAYS: usize = 1825;
/// Default percentile window: five years of rolling returns.
pub const DEFAULT_RANK_WINDOW_SIZE: usize = 1825;
/// Positions per year used to annualize the horizon.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Date formats tried in order when parsing the date column.
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d", "%d-%b-%Y"];

/// Window sizes for the analytics core.
///
/// Both sizes are counted in positions of the ordered series, not calendar
/// days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Positions between the two endpoints of a CAGR (default: 1825)
    pub horizon_days: usize,
    /// Trailing returns each percentile is ranked against (default: 1825)
    pub rank_window_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            horizon_days: DEFAULT_HORIZON_DAYS,
            rank_window_size: DEFAULT_RANK_WINDOW_SIZE,
        }
    }
}

impl PipelineConfig {
    pub fn new(horizon_days: usize, rank_window_size: usize) -> Self {
        PipelineConfig {
            horizon_days,
            rank_window_size,
        }
    }

    pub fn with_horizon_days(mut self, horizon_days: usize) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_rank_window_size(mut self, rank_window_size: usize) -> Self {
        self.rank_window_size = rank_window_size;
        self
    }

    /// Years represented by the horizon, always `horizon_days / 365`.
    pub fn years(&self) -> f64 {
        self.horizon_days as f64 / DAYS_PER_YEAR
    }

    /// Minimum series length that yields at least one percentile.
    pub fn min_series_len(&self) -> usize {
        self.horizon_days + self.rank_window_size
    }

    /// Rejects window sizes the calculators cannot work with.
    ///
    /// # Errors
    /// Returns `PipelineError::InvalidConfig` if either size is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.horizon_days == 0 {
            return Err(PipelineError::InvalidConfig(
                "horizon_days must be positive".to_string(),
            ));
        }
        if self.rank_window_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "rank_window_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for one batch run of the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Wide CSV of daily index levels
    pub input_path: PathBuf,
    /// Header of the date column
    pub date_column: String,
    /// chrono formats tried for each date cell
    pub date_formats: Vec<String>,
    /// Directory receiving the summary files
    pub output_dir: PathBuf,
    /// Optional `raw,canonical` name table
    pub name_map_path: Option<PathBuf>,
    /// Optional `symbol,category` table
    pub categories_path: Option<PathBuf>,
    /// Optional `symbol,percentile` reference result to compare against
    pub reference_path: Option<PathBuf>,
    pub pipeline: PipelineConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            input_path: PathBuf::from("data/indices_rawdata.csv"),
            date_column: "DATE".to_string(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            output_dir: PathBuf::from("data"),
            name_map_path: None,
            categories_path: None,
            reference_path: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl RunConfig {
    /// Reads settings from `STRENGTH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for
    /// missing or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RunConfig::default();

        let input_path = lookup("STRENGTH_INPUT")
            .map(PathBuf::from)
            .unwrap_or(defaults.input_path);
        let date_column = lookup("STRENGTH_DATE_COLUMN").unwrap_or(defaults.date_column);
        let date_formats = lookup("STRENGTH_DATE_FORMATS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|formats| !formats.is_empty())
            .unwrap_or(defaults.date_formats);
        let output_dir = lookup("STRENGTH_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let horizon_days = parse_size(&lookup, "STRENGTH_HORIZON_DAYS", DEFAULT_HORIZON_DAYS);
        let rank_window_size =
            parse_size(&lookup, "STRENGTH_RANK_WINDOW", DEFAULT_RANK_WINDOW_SIZE);

        RunConfig {
            input_path,
            date_column,
            date_formats,
            output_dir,
            name_map_path: lookup("STRENGTH_NAME_MAP").map(PathBuf::from),
            categories_path: lookup("STRENGTH_CATEGORIES").map(PathBuf::from),
            reference_path: lookup("STRENGTH_REFERENCE").map(PathBuf::from),
            pipeline: PipelineConfig::new(horizon_days, rank_window_size),
        }
    }
}

fn parse_size<F>(lookup: &F, key: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Ignoring {}={:?}: not a positive integer, using {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}
