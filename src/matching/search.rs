//! Motif and pattern search primitives.
//!
//! All searches run on the raw bytes of the sequence. Pattern searches use
//! `regex::bytes` so match offsets can be used to slice the sequence
//! without char-boundary checks.

use regex::bytes::Regex;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::core::region::{QualityHistogram, QUALITY_BUCKETS};

/// Characters before the end of a match that are re-examined by
/// [`count_consecutive_pattern`].
pub const CONSECUTIVE_WINDOW: usize = 6;

fn normalized(sequence: &str, normalize_case: bool) -> Cow<'_, str> {
    if normalize_case {
        Cow::Owned(sequence.to_ascii_uppercase())
    } else {
        Cow::Borrowed(sequence)
    }
}

/// Count non-overlapping occurrences of `motif`, scanning left to right.
///
/// After each hit the scan resumes past the whole motif, so `"AAAA"` holds
/// two `"AA"`, not three. An empty motif never matches.
#[must_use]
pub fn count_motif(sequence: &str, motif: &str, normalize_case: bool) -> u64 {
    if motif.is_empty() {
        return 0;
    }
    let sequence = normalized(sequence, normalize_case);
    sequence.match_indices(motif).count() as u64
}

/// Map a mean quality onto its histogram bucket.
///
/// The mean is rounded to the nearest integer; anything outside `0..=99`
/// falls into bucket 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quality_bucket(mean: f64) -> u8 {
    let rounded = mean.round();
    if rounded.is_nan() || rounded < 0.0 || rounded >= f64::from(QUALITY_BUCKETS) {
        0
    } else {
        rounded as u8
    }
}

/// Histogram every non-overlapping occurrence of `motif` by its mean base quality.
///
/// Increments `table[motif][bucket]` once per occurrence. Occurrences whose
/// span is not covered by `quality` are skipped.
pub fn count_motif_with_quality(
    sequence: &str,
    motif: &str,
    quality: &[u8],
    table: &mut BTreeMap<String, QualityHistogram>,
) {
    if motif.is_empty() {
        return;
    }
    let Some(histogram) = table.get_mut(motif) else {
        return;
    };

    for (position, _) in sequence.match_indices(motif) {
        let Some(window) = quality.get(position..position + motif.len()) else {
            continue;
        };
        let total: u64 = window.iter().map(|&q| u64::from(q)).sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = total as f64 / window.len() as f64;
        *histogram.entry(quality_bucket(mean)).or_insert(0) += 1;
    }
}

/// Count pattern matches, resuming each search on the text after the previous match.
///
/// Empty matches are stepped over without being counted.
#[must_use]
pub fn count_pattern(sequence: &str, pattern: &Regex, normalize_case: bool) -> u64 {
    let sequence = normalized(sequence, normalize_case);
    let mut remainder = sequence.as_bytes();
    let mut occurrences = 0;

    while let Some(found) = pattern.find(remainder) {
        if found.is_empty() {
            if found.end() >= remainder.len() {
                break;
            }
            remainder = &remainder[found.end() + 1..];
            continue;
        }
        occurrences += 1;
        remainder = &remainder[found.end()..];
    }

    occurrences
}

/// Count every pattern match, resuming each search [`CONSECUTIVE_WINDOW`]
/// characters before the end of the previous match.
///
/// Stepping back lets matches share their boundary motif, e.g. three chained
/// `TTAGGG...TTAGGG` pairs sharing inner repeats count 3. Matches separated
/// by unrelated sequence are counted too. The search always moves forward by
/// at least one character.
#[must_use]
pub fn count_consecutive_pattern(sequence: &str, pattern: &Regex, normalize_case: bool) -> u64 {
    let sequence = normalized(sequence, normalize_case);
    let mut remainder = sequence.as_bytes();
    let mut occurrences = 0;

    while let Some(found) = pattern.find(remainder) {
        if !found.is_empty() {
            occurrences += 1;
        }
        let next = found
            .end()
            .saturating_sub(CONSECUTIVE_WINDOW)
            .max(found.start() + 1);
        if next >= remainder.len() {
            break;
        }
        remainder = &remainder[next..];
    }

    occurrences
}

/// Compiled patterns keyed by their source text.
///
/// Built once per run and shared read-only by every worker.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    compiled: HashMap<String, Regex>,
}

impl PatternSet {
    /// Compile every pattern, skipping duplicates.
    ///
    /// # Errors
    ///
    /// Returns the pattern text and the `regex::Error` of the first pattern
    /// that fails to compile.
    pub fn compile<I, S>(patterns: I) -> Result<Self, (String, regex::Error)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = HashMap::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if compiled.contains_key(pattern) {
                continue;
            }
            let regex = Regex::new(pattern).map_err(|e| (pattern.to_string(), e))?;
            compiled.insert(pattern.to_string(), regex);
        }
        Ok(Self { compiled })
    }

    pub fn get(&self, pattern: &str) -> Option<&Regex> {
        self.compiled.get(pattern)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TELOMERE: &str = "TTAGGGCTTAGGGAAATTAGGGCCCTTAGGGACTTTAGGGTTAGGGTTAACCC";
    const MIXED_CASE: &str = "TTAGGGCTTAGGGAAATTAGGGCCCTTAGGGactttAGGGTTaGGGTTaaCCC";

    fn regex(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    #[test]
    fn test_count_motif() {
        assert_eq!(count_motif(TELOMERE, "TTAGGG", false), 6);
        assert_eq!(count_motif(MIXED_CASE, "TTAGGG", false), 4);
        assert_eq!(count_motif(MIXED_CASE, "TTAGGG", true), 6);
    }

    #[test]
    fn test_count_motif_is_non_overlapping() {
        assert_eq!(count_motif("AAAA", "AA", false), 2);
        assert_eq!(count_motif("AAAAA", "AA", false), 2);
        assert_eq!(count_motif("ACGT", "", false), 0);
        assert_eq!(count_motif("", "A", false), 0);
    }

    #[test]
    fn test_quality_bucket() {
        assert_eq!(quality_bucket(32.0 / 3.0), 11);
        assert_eq!(quality_bucket(10.4), 10);
        assert_eq!(quality_bucket(99.0), 99);
        assert_eq!(quality_bucket(99.6), 0);
        assert_eq!(quality_bucket(-3.0), 0);
    }

    #[test]
    fn test_count_motif_with_quality() {
        let sequence = "TTAGGGCTTAGGGAAATTAGGG";
        let quality = [
            1, 1, 1, 1, 1, 1, // TTAGGG
            7, // C
            10, 10, 12, 10, 10, 12, // TTAGGG, mean 10.67
            3, 3, 2, // AAA
            40, 40, 40, 40, 40, 40, // TTAGGG
        ];
        let mut table = BTreeMap::new();
        table.insert("TTAGGG".to_string(), QualityHistogram::new());

        count_motif_with_quality(sequence, "TTAGGG", &quality, &mut table);

        let histogram = &table["TTAGGG"];
        assert_eq!(histogram.get(&1), Some(&1));
        assert_eq!(histogram.get(&11), Some(&1));
        assert_eq!(histogram.get(&40), Some(&1));
        assert_eq!(histogram.values().sum::<u64>(), 3);
    }

    #[test]
    fn test_count_motif_with_quality_out_of_range_goes_to_zero() {
        let mut table = BTreeMap::new();
        table.insert("AC".to_string(), QualityHistogram::new());
        count_motif_with_quality("ACAC", "AC", &[120, 120, 5, 5], &mut table);
        assert_eq!(table["AC"].get(&0), Some(&1));
        assert_eq!(table["AC"].get(&5), Some(&1));
    }

    #[test]
    fn test_count_motif_with_short_quality_skips() {
        let mut table = BTreeMap::new();
        table.insert("AC".to_string(), QualityHistogram::new());
        count_motif_with_quality("ACAC", "AC", &[20, 20, 20], &mut table);
        assert_eq!(table["AC"].values().sum::<u64>(), 1);
    }

    #[test]
    fn test_count_pattern() {
        assert_eq!(count_pattern(TELOMERE, &regex("(TTAGGG)(.{0})TTAGGG"), false), 1);
        assert_eq!(count_pattern(TELOMERE, &regex("(TTAGGG)(.{1})TTAGGG"), false), 1);
        assert_eq!(count_pattern(TELOMERE, &regex("(TTAGGG)(.{3})TTAGGG"), false), 2);
    }

    #[test]
    fn test_count_pattern_normalizes_case() {
        let pattern = regex("TTAGGG");
        assert_eq!(count_pattern(MIXED_CASE, &pattern, false), 4);
        assert_eq!(count_pattern(MIXED_CASE, &pattern, true), 6);
    }

    #[test]
    fn test_count_pattern_empty_matches_terminate() {
        assert_eq!(count_pattern("ACGT", &regex("T*"), false), 1);
        assert_eq!(count_pattern("", &regex("A*"), false), 0);
    }

    #[test]
    fn test_count_consecutive_pattern() {
        assert_eq!(
            count_consecutive_pattern(TELOMERE, &regex("(TTAGGG)(.{0})TTAGGG"), false),
            1
        );
        assert_eq!(
            count_consecutive_pattern(TELOMERE, &regex("(TTAGGG)(.{1})TTAGGG"), false),
            1
        );
        assert_eq!(
            count_consecutive_pattern(TELOMERE, &regex("(TTAGGG)(.{3})TTAGGG"), false),
            3
        );
    }

    #[test]
    fn test_count_consecutive_pattern_counts_separated_matches() {
        let sequence = "TTAGGGTTAGGGAAAAAAAAAATTAGGGTTAGGG";
        assert_eq!(
            count_consecutive_pattern(sequence, &regex("(TTAGGG)(.{0})TTAGGG"), false),
            2
        );
    }

    #[test]
    fn test_count_consecutive_pattern_short_match_advances() {
        assert_eq!(count_consecutive_pattern("AAAA", &regex("A"), false), 4);
    }

    #[test]
    fn test_pattern_set() {
        let set = PatternSet::compile(["A+", "C{2}", "A+"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get("A+").is_some());
        assert!(set.get("G").is_none());

        let (pattern, _) = PatternSet::compile(["(AC"]).unwrap_err();
        assert_eq!(pattern, "(AC");
    }
}
