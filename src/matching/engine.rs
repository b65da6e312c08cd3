use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::store::{CatalogueError, RegionCatalogue};
use crate::core::record::Record;
use crate::matching::search::PatternSet;
use crate::parsing::stream::{RecordStream, StreamError};

/// Default number of records per worker buffer before a dispatch
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration for the counting engine
#[derive(Debug, Clone)]
pub struct CountConfig {
    /// Worker count; 1 runs sequentially on the calling thread
    pub threads: usize,

    /// A dispatch cycle starts once the last worker buffer holds more than this many records
    pub chunk_size: usize,

    /// Log progress every this many records, 0 disables
    pub progress: u64,

    /// Upper-case every sequence before searching it
    pub validate_sequence: bool,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress: 0,
            validate_sequence: false,
        }
    }
}

/// Totals reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountSummary {
    /// Valid records tallied
    pub records: u64,

    /// Parallel dispatch cycles, 0 for a sequential run
    pub chunks: u64,
}

/// Tally one record into every matching region of `catalogue`.
///
/// The record's own label selects the region list, falling back to
/// `"other"`; only regions that fully contain the record span (or are
/// wildcards) are updated.
pub fn tally_record(
    catalogue: &mut RegionCatalogue,
    record: &Record,
    patterns: &PatternSet,
    normalize_case: bool,
) {
    let Some(regions) = catalogue.regions_for_mut(&record.label) else {
        return;
    };

    let sequence = if normalize_case {
        Cow::Owned(record.sequence.to_ascii_uppercase())
    } else {
        Cow::Borrowed(record.sequence.as_str())
    };

    for region in regions
        .iter_mut()
        .filter(|region| region.intersects_span(record.start, record.end))
    {
        region.tally(&sequence, record.quality.as_deref(), patterns);
    }
}

/// Tally `batch` into a zeroed copy of `template`.
#[must_use]
pub fn tally_batch(
    template: &RegionCatalogue,
    batch: &[Record],
    patterns: &PatternSet,
    normalize_case: bool,
) -> RegionCatalogue {
    let mut partial = template.zeroed_copy();
    for record in batch.iter().filter(|record| record.valid) {
        tally_record(&mut partial, record, patterns, normalize_case);
    }
    partial
}

/// Accumulates motif and pattern counts for a stream of records.
///
/// Owns the authoritative catalogue. In parallel mode every worker tallies
/// into its own zeroed copy, and only the driving thread merges results back.
pub struct CountEngine {
    catalogue: RegionCatalogue,
    patterns: PatternSet,
    config: CountConfig,
}

impl CountEngine {
    pub fn new(catalogue: RegionCatalogue, patterns: PatternSet, config: CountConfig) -> Self {
        Self {
            catalogue,
            patterns,
            config,
        }
    }

    pub fn catalogue(&self) -> &RegionCatalogue {
        &self.catalogue
    }

    pub fn into_catalogue(self) -> RegionCatalogue {
        self.catalogue
    }

    /// Drain `stream` into the catalogue, closing it whether or not the run succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first read error from the stream, a merge error, or a
    /// worker pool error.
    pub fn count_stream(&mut self, mut stream: RecordStream) -> Result<CountSummary, EngineError> {
        let estimated_total = stream.estimated_total();
        let result = self.run(stream.by_ref(), estimated_total);
        stream.close();
        result
    }

    /// Tally every valid record from `records`.
    ///
    /// `estimated_total` only feeds progress messages.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by `records`, a merge error, or a
    /// worker pool error.
    pub fn run<I>(&mut self, records: I, estimated_total: u64) -> Result<CountSummary, EngineError>
    where
        I: IntoIterator<Item = Result<Record, StreamError>>,
    {
        if self.config.threads > 1 {
            self.run_parallel(records, estimated_total)
        } else {
            self.run_sequential(records, estimated_total)
        }
    }

    fn run_sequential<I>(&mut self, records: I, estimated_total: u64) -> Result<CountSummary, EngineError>
    where
        I: IntoIterator<Item = Result<Record, StreamError>>,
    {
        let mut summary = CountSummary::default();
        for record in records {
            let record = record?;
            if !record.valid {
                continue;
            }
            tally_record(
                &mut self.catalogue,
                &record,
                &self.patterns,
                self.config.validate_sequence,
            );
            summary.records += 1;
            self.report_progress(summary.records, estimated_total);
        }
        Ok(summary)
    }

    fn run_parallel<I>(&mut self, records: I, estimated_total: u64) -> Result<CountSummary, EngineError>
    where
        I: IntoIterator<Item = Result<Record, StreamError>>,
    {
        let workers = self.config.threads;
        let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
        debug!(workers, chunk_size = self.config.chunk_size, "Starting parallel count");

        let mut buffers: Vec<Vec<Record>> = (0..workers).map(|_| Vec::new()).collect();
        let mut summary = CountSummary::default();

        for record in records {
            let record = record?;
            if !record.valid {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)]
            let slot = (summary.records % workers as u64) as usize;
            buffers[slot].push(record);
            summary.records += 1;
            self.report_progress(summary.records, estimated_total);

            if buffers[workers - 1].len() > self.config.chunk_size {
                self.dispatch(&pool, &mut buffers)?;
                summary.chunks += 1;
            }
        }

        if buffers.iter().any(|buffer| !buffer.is_empty()) {
            self.dispatch(&pool, &mut buffers)?;
            summary.chunks += 1;
        }

        Ok(summary)
    }

    /// Run one fan-out/fan-in cycle over the current buffers, leaving them empty.
    fn dispatch(&mut self, pool: &ThreadPool, buffers: &mut [Vec<Record>]) -> Result<(), EngineError> {
        let batches: Vec<Vec<Record>> = buffers.iter_mut().map(std::mem::take).collect();
        debug!(
            batches = batches.len(),
            records = batches.iter().map(Vec::len).sum::<usize>(),
            "Dispatching chunk"
        );

        let template = &self.catalogue;
        let patterns = &self.patterns;
        let normalize_case = self.config.validate_sequence;
        let partials: Vec<RegionCatalogue> = pool.install(|| {
            batches
                .par_iter()
                .map(|batch| tally_batch(template, batch, patterns, normalize_case))
                .collect()
        });

        for partial in &partials {
            self.catalogue.merge_aligned(partial)?;
        }
        Ok(())
    }

    fn report_progress(&self, count: u64, estimated_total: u64) {
        if self.config.progress == 0 || count % self.config.progress != 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let percent = if estimated_total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / estimated_total as f64
        };
        info!("Progress: {count} of {estimated_total} ({percent:.1}%)");
    }
}
