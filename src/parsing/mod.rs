//! Readers that turn sequencing inputs into a uniform stream of records.
//!
//! Supported inputs, selected by file name suffix:
//!
//! | Suffix | Reader | Label |
//! |--------|--------|-------|
//! | `.fa`, `.fasta`, `.fna` | FASTA | `unmapped` |
//! | `.fq`, `.fastq` | FASTQ | `unmapped` or `qv_fail` |
//! | `.csv`, `.tsv` | Delimited text with a `sequence` column | `unmapped` |
//! | `.bam`, `.sam` | Aligned reads | reference name, `unmapped`, `qv_fail` or `mapq_fail` |
//!
//! Text formats may carry a trailing `.gz`, `.gzip` or `.bgz` suffix.
//!
//! ## Example
//!
//! ```rust,no_run
//! use motif_count::parsing::{RecordStream, StreamConfig};
//! use std::path::Path;
//!
//! let config = StreamConfig { quality_value: 20, ..StreamConfig::default() };
//! let mut stream = RecordStream::open(Path::new("reads.fq.gz"), &config).unwrap();
//! while let Some(record) = stream.next_record().unwrap() {
//!     println!("{} {}", record.label, record.sequence.len());
//! }
//! ```

pub mod alignment;
pub mod delimited;
pub mod estimate;
pub mod fastx;
pub mod format;
pub mod stream;

pub use stream::{RecordStream, StreamConfig, StreamError};
