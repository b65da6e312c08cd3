//! Command-line interface for motif-count.
//!
//! One command, **count**, tallies motif and pattern occurrences from a
//! sequencing input into the regions of a motif catalogue.
//!
//! ## Usage
//!
//! ```text
//! # Count telomeric repeats in a FASTQ file
//! motif-count count reads.fq.gz --motifs telomeres.json
//!
//! # Aligned reads, 8 workers, progress every million records
//! motif-count count sample.bam --motifs telomeres.json --threads 8 --progress 1000000
//!
//! # Print the populated catalogue instead of a summary
//! motif-count --format json count reads.csv --motifs telomeres.json
//! ```

use clap::{Parser, Subcommand};

pub mod count;

#[derive(Parser)]
#[command(name = "motif-count")]
#[command(version)]
#[command(about = "Count sequence motifs and patterns inside genomic regions")]
#[command(
    long_about = "motif-count reads FASTA, FASTQ, CSV/TSV, SAM or BAM input and tallies, for every region of a JSON motif catalogue:\n- read and base counts\n- non-overlapping motif occurrences, bucketed by mean base quality\n- regular expression matches"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "silent")]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub silent: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count motifs and patterns per region
    Count(count::CountArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
