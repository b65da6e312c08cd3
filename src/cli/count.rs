use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::catalog::store::RegionCatalogue;
use crate::cli::OutputFormat;
use crate::matching::engine::{CountConfig, CountEngine, CountSummary, DEFAULT_CHUNK_SIZE};
use crate::parsing::{RecordStream, StreamConfig};
use crate::utils::validation::{
    clamp_quality_map, clamp_quality_value, clamp_threads, hardware_threads, validate_chunk_size,
    validate_input_file,
};

/// Name of the populated catalogue written inside the output directory
pub const OUTPUT_FILE: &str = "output.json";

#[derive(Args)]
pub struct CountArgs {
    /// Input file (FASTA, FASTQ, CSV, TSV, SAM or BAM)
    /// Text formats may be gzip compressed (.gz, .gzip, .bgz)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Motif catalogue (JSON) listing regions, motifs and patterns per label
    #[arg(short, long)]
    pub motifs: PathBuf,

    /// Output directory, created if missing
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Number of worker threads (clamped to the available cores)
    #[arg(short, long, default_value = "1")]
    pub threads: usize,

    /// Records per worker buffer before a parallel dispatch
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Log progress every N records (0 disables)
    #[arg(long, default_value = "0")]
    pub progress: u64,

    /// Mean base quality below which a read is counted as qv_fail (0-92)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub quality_value: i64,

    /// Mapping quality below which a mapped read is counted as mapq_fail (0-254)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub quality_map: i64,

    /// Upper-case sequences before searching
    #[arg(long)]
    pub validate_sequence: bool,

    /// Warn when a CSV/TSV line has a different field count than its header
    #[arg(long)]
    pub warn_field_mismatch: bool,
}

/// Execute count subcommand
///
/// # Errors
///
/// Returns an error if an input is missing or unreadable, the catalogue is
/// invalid, a record cannot be parsed, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CountArgs, format: OutputFormat) -> anyhow::Result<()> {
    let started = Instant::now();

    validate_input_file(&args.input)?;
    validate_input_file(&args.motifs)?;
    let chunk_size = validate_chunk_size(args.chunk_size)?;

    let stream_config = StreamConfig {
        quality_value: clamp_quality_value(args.quality_value),
        quality_map: clamp_quality_map(args.quality_map),
        warn_on_field_mismatch: args.warn_field_mismatch,
    };
    let count_config = CountConfig {
        threads: clamp_threads(args.threads, hardware_threads()),
        chunk_size,
        progress: args.progress,
        validate_sequence: args.validate_sequence,
    };

    let catalogue = RegionCatalogue::load_from_file(&args.motifs)
        .with_context(|| format!("Invalid motif catalogue {}", args.motifs.display()))?;
    let patterns = catalogue.compile_patterns()?;
    info!(
        labels = catalogue.len(),
        regions = catalogue.region_count(),
        patterns = patterns.len(),
        "Loaded motif catalogue"
    );

    let stream = RecordStream::open(&args.input, &stream_config)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    info!(
        input = %args.input.display(),
        format = %stream.format(),
        estimated_total = stream.estimated_total(),
        threads = count_config.threads,
        "Counting motifs"
    );

    let mut engine = CountEngine::new(catalogue, patterns, count_config);
    let summary = engine.count_stream(stream)?;
    let catalogue = engine.into_catalogue();

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let output_path = args.output.join(OUTPUT_FILE);
    catalogue.write_to_file(&output_path)?;

    info!(
        "Total records analysed: {} in {:.2?}",
        summary.records,
        started.elapsed()
    );

    match format {
        OutputFormat::Text => print_text_summary(&catalogue, &summary, &output_path),
        OutputFormat::Json => println!("{}", catalogue.to_json()?),
        OutputFormat::Tsv => print_tsv_summary(&catalogue),
    }

    Ok(())
}

fn print_text_summary(catalogue: &RegionCatalogue, summary: &CountSummary, output_path: &Path) {
    println!("Motif Count Results");
    println!("{}", "=".repeat(60));
    println!("Records analysed: {}", summary.records);
    if summary.chunks > 0 {
        println!("Parallel chunks: {}", summary.chunks);
    }
    println!("Output: {}", output_path.display());

    for (label, regions) in catalogue.iter() {
        println!("\n{label}:");
        for region in regions {
            println!(
                "  {} ({}-{}): {} reads, {} bases",
                region.name, region.start, region.end, region.reads_count, region.total_bases
            );
            for (motif, count) in &region.motifs {
                println!("    {motif}: {count}");
            }
            for (pattern, count) in &region.regex {
                println!("    /{pattern}/: {count}");
            }
        }
    }
}

fn print_tsv_summary(catalogue: &RegionCatalogue) {
    println!("label\tregion\tstart\tend\tcount\ttotal_bases\tkind\tkey\toccurrences");
    for (label, regions) in catalogue.iter() {
        for region in regions {
            let prefix = format!(
                "{label}\t{}\t{}\t{}\t{}\t{}",
                region.name, region.start, region.end, region.reads_count, region.total_bases
            );
            for (motif, count) in &region.motifs {
                println!("{prefix}\tmotif\t{motif}\t{count}");
            }
            for (pattern, count) in &region.regex {
                println!("{prefix}\tregex\t{pattern}\t{count}");
            }
        }
    }
}
