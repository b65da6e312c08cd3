use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::matching::search::{count_motif, count_motif_with_quality, count_pattern, PatternSet};

/// Number of mean-quality buckets kept per motif (0..=99)
pub const QUALITY_BUCKETS: u8 = 100;

/// Occurrence counts keyed by rounded mean base quality
pub type QualityHistogram = BTreeMap<u8, u64>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegionError {
    #[error("Regions do not match: expected {expected}, found {found}")]
    IdentityMismatch { expected: String, found: String },
}

/// A named genomic interval with its motif and pattern tallies.
///
/// Identity is the `(start, end, name)` triple. A region with `start == end`
/// is a wildcard that matches every record placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RegionDefinition")]
pub struct Region {
    pub start: u64,
    pub end: u64,
    pub name: String,

    /// Number of records tallied into this region
    #[serde(rename = "count")]
    pub reads_count: u64,

    /// Sum of the lengths of tallied records
    pub total_bases: u64,

    /// Literal motif -> non-overlapping occurrence count
    pub motifs: BTreeMap<String, u64>,

    /// Literal motif -> quality bucket -> occurrence count
    pub motif_quality: BTreeMap<String, QualityHistogram>,

    /// Pattern -> occurrence count
    pub regex: BTreeMap<String, u64>,
}

/// On-disk shape of a region in the motif catalogue.
///
/// Counter values present in the file are ignored: every region starts at zero.
#[derive(Deserialize)]
struct RegionDefinition {
    start: u64,
    end: u64,
    name: String,
    #[serde(default)]
    motifs: BTreeMap<String, IgnoredAny>,
    #[serde(default)]
    regex: BTreeMap<String, IgnoredAny>,
}

impl From<RegionDefinition> for Region {
    fn from(definition: RegionDefinition) -> Self {
        Region::new(definition.start, definition.end, definition.name)
            .with_motifs(definition.motifs.into_keys())
            .with_patterns(definition.regex.into_keys())
    }
}

fn empty_histogram() -> QualityHistogram {
    (0..QUALITY_BUCKETS).map(|bucket| (bucket, 0)).collect()
}

impl Region {
    pub fn new(start: u64, end: u64, name: impl Into<String>) -> Self {
        Self {
            start,
            end,
            name: name.into(),
            reads_count: 0,
            total_bases: 0,
            motifs: BTreeMap::new(),
            motif_quality: BTreeMap::new(),
            regex: BTreeMap::new(),
        }
    }

    /// Register literal motifs, each with a zeroed count and quality histogram.
    #[must_use]
    pub fn with_motifs<I, S>(mut self, motifs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for motif in motifs {
            let motif = motif.into();
            self.motif_quality
                .insert(motif.clone(), empty_histogram());
            self.motifs.insert(motif, 0);
        }
        self
    }

    #[must_use]
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            self.regex.insert(pattern.into(), 0);
        }
        self
    }

    /// Short identity string used in logs and errors
    pub fn identity(&self) -> String {
        format!("{}:{}-{}", self.name, self.start, self.end)
    }

    pub fn same_region(&self, other: &Region) -> bool {
        self.start == other.start && self.end == other.end && self.name == other.name
    }

    pub fn is_wildcard(&self) -> bool {
        self.start == self.end
    }

    /// True if `point` lies in `[start, end]` or the region is a wildcard.
    pub fn intersects_point(&self, point: u64) -> bool {
        self.is_wildcard() || (self.start <= point && point <= self.end)
    }

    /// True if the span is fully contained in the region (or the region is a wildcard).
    ///
    /// Both span ends are mapped into the region's own unit interval, so a
    /// partial overlap never matches.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn intersects_span(&self, span_start: u64, span_end: u64) -> bool {
        if self.is_wildcard() {
            return true;
        }
        let width = self.end as f64 - self.start as f64;
        let left = (span_start as f64 - self.start as f64) / width;
        let right = (span_end as f64 - self.start as f64) / width;
        left >= 0.0 && right <= 1.0
    }

    /// Zero every counter, keeping identity and the registered keys.
    pub fn reset(&mut self) {
        self.motifs.values_mut().for_each(|count| *count = 0);
        for histogram in self.motif_quality.values_mut() {
            histogram.values_mut().for_each(|count| *count = 0);
        }
        self.regex.values_mut().for_each(|count| *count = 0);
        self.reads_count = 0;
        self.total_bases = 0;
    }

    /// Add every counter of `other` into `self`.
    ///
    /// # Errors
    ///
    /// Returns `RegionError::IdentityMismatch` if the two values are not the same region.
    pub fn merge(&mut self, other: &Region) -> Result<(), RegionError> {
        if !self.same_region(other) {
            return Err(RegionError::IdentityMismatch {
                expected: self.identity(),
                found: other.identity(),
            });
        }

        for (motif, count) in &other.motifs {
            *self.motifs.entry(motif.clone()).or_insert(0) += count;
        }
        for (motif, histogram) in &other.motif_quality {
            let target = self
                .motif_quality
                .entry(motif.clone())
                .or_insert_with(empty_histogram);
            for (bucket, count) in histogram {
                *target.entry(*bucket).or_insert(0) += count;
            }
        }
        for (pattern, count) in &other.regex {
            *self.regex.entry(pattern.clone()).or_insert(0) += count;
        }
        self.reads_count += other.reads_count;
        self.total_bases += other.total_bases;

        Ok(())
    }

    /// Count every motif and pattern of this region in `sequence`.
    ///
    /// `sequence` is expected to be case-normalized already when required;
    /// the quality histogram is only filled when `quality` is present.
    pub fn tally(&mut self, sequence: &str, quality: Option<&[u8]>, patterns: &PatternSet) {
        for (motif, count) in &mut self.motifs {
            *count += count_motif(sequence, motif, false);
        }
        if let Some(quality) = quality {
            for motif in self.motifs.keys() {
                count_motif_with_quality(sequence, motif, quality, &mut self.motif_quality);
            }
        }
        for (pattern, count) in &mut self.regex {
            if let Some(compiled) = patterns.get(pattern) {
                *count += count_pattern(sequence, compiled, false);
            }
        }
        self.reads_count += 1;
        self.total_bases += sequence.len() as u64;
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identity())
    }
}
