pub mod symbol;
pub mod time_series;
pub mod error;
pub mod config;
pub mod loader;
pub mod analytics;
pub mod pipeline;
pub mod catalog;
pub mod export;
pub mod compare;


pub use symbol::{Symbol, SymbolError};
pub use time_series::{
    DateRange, EntitySeries, Observation, RankPoint, ReturnPoint, SeriesSet, YearMonth,
};
pub use error::PipelineError;
pub use config::{PipelineConfig, RunConfig};
pub use loader::{CsvTableSource, InMemoryTableSource, RawTable, SeriesLoader, TableSource};
pub use analytics::{
    analyze_entity,
    EntityAnalytics,
    FinalEntry,
    FinalResult,
    MonthlyAggregator,
    MonthlySummary,
    RollingPercentileRanker,
    RollingReturnCalculator,
};
pub use pipeline::{AbsenceReason, AbsentEntity, PipelineReport, StrengthPipeline};
pub use catalog::{Category, CategoryTable, NameMap};
pub use export::{FrontendRecord, Interpretation, SummaryStatistics};
pub use compare::{compare_results, ComparisonReport, Verdict};
