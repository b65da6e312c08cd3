use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::record::Record;
use crate::parsing::alignment::AlignmentReader;
use crate::parsing::delimited::DelimitedReader;
use crate::parsing::estimate::estimate_total;
use crate::parsing::fastx::FastxReader;
use crate::parsing::format::{classify, open_text, InputFormat, InputKind};

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Invalid delimited header: {0}")]
    InvalidHeader(String),

    #[error("Missing required field <{field}> on line {line}")]
    MissingField { field: String, line: usize },
}

/// Thresholds applied while reading records
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamConfig {
    /// Mean base quality below which a record is labelled `qv_fail`
    pub quality_value: u8,

    /// Mapping quality below which a mapped record is labelled `mapq_fail`
    pub quality_map: u8,

    /// Warn when a delimited line has a different field count than the header
    pub warn_on_field_mismatch: bool,
}

enum Source {
    Fastx(FastxReader),
    Delimited(DelimitedReader),
    Alignment(AlignmentReader),
}

/// Pull-based stream of [`Record`]s over any supported input format.
///
/// The reader for the format is chosen once when the stream is opened.
/// File handles are released by [`RecordStream::close`] or when the stream
/// is dropped.
pub struct RecordStream {
    source: Source,
    format: InputFormat,
    path: PathBuf,
    count: u64,
    estimated_total: u64,
}

impl RecordStream {
    /// Open `path`, selecting the reader from the file name suffix.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::UnsupportedFormat` for unknown suffixes,
    /// `StreamError::Io` if the file cannot be opened, or a format-specific
    /// error if the header cannot be read.
    pub fn open(path: &Path, config: &StreamConfig) -> Result<Self, StreamError> {
        let format = classify(path)?;
        let estimated_total = estimate_total(path, format);
        debug!(path = %path.display(), %format, estimated_total, "Opening input");

        let source = match format.kind {
            InputKind::Fasta | InputKind::Fastq => Source::Fastx(FastxReader::new(
                open_text(path, format.compressed)?,
                format.kind,
                config.quality_value,
            )),
            InputKind::Csv | InputKind::Tsv => {
                let separator = format.kind.separator().unwrap_or(',');
                Source::Delimited(DelimitedReader::new(
                    open_text(path, format.compressed)?,
                    separator,
                    config.warn_on_field_mismatch,
                )?)
            }
            InputKind::Bam | InputKind::Sam => Source::Alignment(AlignmentReader::open(
                path,
                format,
                config.quality_value,
                config.quality_map,
            )?),
        };

        Ok(Self {
            source,
            format,
            path: path.to_path_buf(),
            count: 0,
            estimated_total,
        })
    }

    /// Pull the next record, `None` at end of stream.
    ///
    /// Filtered alignments are returned with `valid == false` and are not
    /// counted.
    ///
    /// # Errors
    ///
    /// Returns any read or decode error of the underlying reader.
    pub fn next_record(&mut self) -> Result<Option<Record>, StreamError> {
        let record = match &mut self.source {
            Source::Fastx(reader) => reader.read_record()?,
            Source::Delimited(reader) => reader.read_record()?,
            Source::Alignment(reader) => reader.read_record()?,
        };
        if matches!(&record, Some(r) if r.valid) {
            self.count += 1;
        }
        Ok(record)
    }

    /// Valid records pulled so far
    pub fn count_so_far(&self) -> u64 {
        self.count
    }

    /// Advisory record total computed when the stream was opened
    pub fn estimated_total(&self) -> u64 {
        self.estimated_total
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    /// Release the underlying handles, returning the number of valid records read.
    pub fn close(self) -> u64 {
        debug!(path = %self.path.display(), records = self.count, "Closing input");
        self.count
    }
}

impl Iterator for RecordStream {
    type Item = Result<Record, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
