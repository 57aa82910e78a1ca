//! MBO → MBP-10 reconstruction binary.
//!
//! Usage:
//!
//! ```bash
//! mbp10-reconstructor <mbo_input_file.csv>
//! ```
//!
//! Reads the MBO CSV export, replays it through the book, and writes the
//! MBP-10 snapshot rows to `output.csv` in the working directory. Exits 0
//! on success, 1 on I/O failure or empty input.

use std::env;
use std::process;
use std::time::Instant;

use mbp10_reconstructor::{
    parse_file, price_to_f64, Book, MbpCsvWriter, MbpPipeline, PipelineConfig, ReconError, Result,
    WarningTracker,
};

const OUTPUT_PATH: &str = "output.csv";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <mbo_input_file.csv>", args[0]);
        eprintln!("Example: {} mbo.csv", args[0]);
        process::exit(1);
    }

    if let Err(e) = run(&args[1]) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(input: &str) -> Result<()> {
    println!("MBO → MBP-10 reconstruction engine");
    println!("Processing MBO file: {input}");

    let parse_start = Instant::now();
    let mut parse_warnings = WarningTracker::new(true);
    let (events, parser_stats) = parse_file(input, &mut parse_warnings)?;

    if events.is_empty() {
        return Err(ReconError::EmptyInput(input.to_string()));
    }
    println!(
        "Parsed {} MBO events in {} ms ({} rows skipped)",
        events.len(),
        parse_start.elapsed().as_millis(),
        parser_stats.rows_skipped
    );

    let mut writer = MbpCsvWriter::create(OUTPUT_PATH)?;
    let mut pipeline = MbpPipeline::new(PipelineConfig::default());

    let process_start = Instant::now();
    pipeline.run(&events, &mut writer)?;
    writer.flush()?;

    let stats = pipeline.stats();
    println!(
        "\nProcessed {} events in {} ms",
        stats.events_processed,
        process_start.elapsed().as_millis()
    );
    println!(
        "Wrote {} MBP-10 snapshots to {OUTPUT_PATH}",
        stats.snapshots_written
    );
    println!(
        "Collapsed {} T→F→C sequences; suppressed {} orphan cancels, {} re-adds, {} no-op snapshots",
        stats.triples_collapsed,
        stats.orphan_cancels_filtered,
        stats.readds_suppressed,
        stats.unchanged_suppressed
    );
    if !pipeline.warnings().is_empty() {
        println!("Processing warnings: {}", pipeline.warnings());
    }
    if !parse_warnings.is_empty() {
        println!("Parser warnings: {parse_warnings}");
    }

    let book = pipeline.book();
    println!(
        "\nFinal book: {} bid levels, {} ask levels, {} live orders",
        book.bid_level_count(),
        book.ask_level_count(),
        book.order_count()
    );
    print_top_levels(book);

    println!("\nOrder book processing completed successfully");
    Ok(())
}

fn print_top_levels(book: &Book) {
    let top = book.top10();

    println!("\nTop 5 Bid Levels:");
    println!("Price      | Size     | Count");
    println!("-----------|----------|------");
    for level in top.bids.iter().take(5).filter(|l| l.price != 0) {
        println!(
            "{:>10.2} | {:>8} | {:>5}",
            price_to_f64(level.price),
            level.size,
            level.count
        );
    }

    println!("\nTop 5 Ask Levels:");
    println!("Price      | Size     | Count");
    println!("-----------|----------|------");
    for level in top.asks.iter().take(5).filter(|l| l.price != 0) {
        println!(
            "{:>10.2} | {:>8} | {:>5}",
            price_to_f64(level.price),
            level.size,
            level.count
        );
    }
}
