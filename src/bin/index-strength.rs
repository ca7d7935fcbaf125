//! Index Strength Batch Job
//!
//! Run with: `cargo run --bin index-strength`

use index_strength::catalog::{CategoryTable, NameMap};
use index_strength::compare::{compare_results, load_reference_csv};
use index_strength::export::{
    build_frontend_records, category_statistics, ranked_rows, write_frontend_json,
    write_result_json, write_summary_csv, SummaryStatistics,
};
use index_strength::{CsvTableSource, PipelineReport, RunConfig, SeriesLoader, StrengthPipeline};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level:
    //   RUST_LOG=debug cargo run --bin index-strength
    //   RUST_LOG=index_strength::analytics=trace cargo run --bin index-strength
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = RunConfig::from_env();

    println!("Index Strength: rolling CAGR percentile summary");
    println!("   Input:        {}", config.input_path.display());
    println!("   Date column:  {}", config.date_column);
    println!("   Horizon:      {} positions ({:.2} years)", config.pipeline.horizon_days, config.pipeline.years());
    println!("   Rank window:  {} returns", config.pipeline.rank_window_size);
    println!("   Output dir:   {}", config.output_dir.display());
    println!();

    let pipeline = StrengthPipeline::new(config.pipeline)?;
    let loader = SeriesLoader::new(config.date_formats.clone());
    let source = CsvTableSource::new(&config.input_path, config.date_column.clone());
    let report = pipeline.run_source(&source, &loader)?;

    std::fs::create_dir_all(&config.output_dir)?;
    let summary_path = config.output_dir.join("final_summary.csv");
    write_summary_csv(&report.result, BufWriter::new(File::create(&summary_path)?))?;
    let json_path = config.output_dir.join("final_summary.json");
    write_result_json(&report.result, BufWriter::new(File::create(&json_path)?))?;
    println!("Saved {} and {}", summary_path.display(), json_path.display());

    print_report(&report);

    if let Some(categories_path) = &config.categories_path {
        let names = match &config.name_map_path {
            Some(path) => NameMap::read_csv(File::open(path)?)?,
            None => NameMap::new(),
        };
        let categories = CategoryTable::read_csv(File::open(categories_path)?)?;
        write_frontend(&report, &names, &categories, &config.output_dir)?;
    }

    if let Some(reference_path) = &config.reference_path {
        let reference = load_reference_csv(File::open(reference_path)?)?;
        let comparison = compare_results(&report.result, &reference);
        println!();
        println!("Comparison with {}", reference_path.display());
        println!("   Common indices:       {}", comparison.rows.len());
        println!("   Only in reference:    {}", comparison.only_reference.len());
        println!("   Only in computed:     {}", comparison.only_computed.len());
        println!("   Exact (<0.0001):      {}", comparison.exact_matches());
        println!("   Close (<0.01):        {}", comparison.close_matches());
        println!("   Significant (>=0.01): {}", comparison.significant_differences());
        println!("   Verdict:              {:?}", comparison.verdict());
        for row in comparison.rows.iter().take(10) {
            println!(
                "   {:<48} ref {:.6}  new {:.6}  diff {:+.6}",
                row.symbol, row.reference, row.computed, row.diff
            );
        }
    }

    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!();
    match report.result.month {
        Some(month) => println!("Latest month: {}", month),
        None => {
            println!("WARNING: no index has enough history for a percentile; nothing to report.");
            return;
        }
    }
    println!(
        "Ranked {} of {} indices ({} with returns)",
        report.result.len(),
        report.entities_loaded,
        report.entities_with_returns
    );
    if report.is_partial() {
        println!("WARNING: {} indices absent from the result:", report.absent.len());
        for entity in &report.absent {
            println!("   {}: {}", entity.symbol, entity.reason);
        }
    }

    let rows = ranked_rows(&report.result);
    println!();
    println!("TOP 10 (strongest relative to own history)");
    for row in rows.iter().take(10) {
        println!("   {:>3}. {:<48} {:.4}  {}", row.rank, row.symbol, row.percentile, row.interpretation);
    }
    println!();
    println!("BOTTOM 10 (weakest relative to own history)");
    for row in rows.iter().rev().take(10) {
        println!("   {:>3}. {:<48} {:.4}  {}", row.rank, row.symbol, row.percentile, row.interpretation);
    }

    if let Some(stats) = SummaryStatistics::from_result(&report.result) {
        println!();
        println!("STATISTICS");
        println!("   Total indices:     {}", stats.count);
        println!("   Mean percentile:   {:.4}", stats.mean);
        println!("   Median percentile: {:.4}", stats.median);
        println!("   Min percentile:    {:.4}", stats.min);
        println!("   Max percentile:    {:.4}", stats.max);
    }
}

fn write_frontend(
    report: &PipelineReport,
    names: &NameMap,
    categories: &CategoryTable,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let export = build_frontend_records(&report.result, names, categories);
    let path = output_dir.join("indices_frontend.json");
    write_frontend_json(&export.records, BufWriter::new(File::create(&path)?))?;

    println!();
    println!(
        "Saved {} indices to {} ({} without category)",
        export.records.len(),
        path.display(),
        export.unmatched.len()
    );
    for (symbol, canonical) in export.unmatched.iter().take(10) {
        println!("   unmatched: {} (as {})", symbol, canonical);
    }

    for stats in category_statistics(&export.records) {
        println!(
            "   {:<13} count {:>3}  mean {:.4}  top {}  bottom {}",
            stats.category.label(),
            stats.count,
            stats.mean,
            stats.top,
            stats.bottom
        );
    }

    Ok(())
}
