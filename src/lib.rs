//! # motif-count
//!
//! A library for counting sequence motifs and regular-expression patterns
//! inside named genomic regions.
//!
//! Reads are pulled from FASTA, FASTQ, CSV/TSV, SAM or BAM input. Each read
//! carries a label (its reference name, or `unmapped`, `qv_fail`,
//! `mapq_fail`) that selects a list of regions from a JSON motif catalogue.
//! Every region that contains the read is updated with:
//!
//! - **Read and base counts**
//! - **Motif counts**: non-overlapping, left to right
//! - **Quality histograms**: motif occurrences bucketed by their mean base quality
//! - **Pattern counts**: regular-expression matches
//!
//! Large inputs can be counted in parallel: batches of reads are tallied into
//! private zeroed copies of the catalogue and merged back by region index.
//!
//! ## Example
//!
//! ```rust,no_run
//! use motif_count::{CountConfig, CountEngine, RecordStream, RegionCatalogue, StreamConfig};
//! use std::path::Path;
//!
//! let catalogue = RegionCatalogue::load_from_file(Path::new("telomeres.json")).unwrap();
//! let patterns = catalogue.compile_patterns().unwrap();
//! let stream = RecordStream::open(Path::new("reads.fq.gz"), &StreamConfig::default()).unwrap();
//!
//! let config = CountConfig { threads: 4, ..CountConfig::default() };
//! let mut engine = CountEngine::new(catalogue, patterns, config);
//! let summary = engine.count_stream(stream).unwrap();
//!
//! println!("{} records", summary.records);
//! println!("{}", engine.catalogue().to_json().unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Motif catalogue storage, lookup and merging
//! - [`core`]: Records and regions
//! - [`matching`]: Search primitives and the counting engine
//! - [`parsing`]: Input format detection and record readers
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::{CatalogueError, RegionCatalogue};
pub use core::record::Record;
pub use core::region::{Region, RegionError};
pub use matching::engine::{CountConfig, CountEngine, CountSummary, EngineError};
pub use matching::search::PatternSet;
pub use parsing::{RecordStream, StreamConfig, StreamError};
