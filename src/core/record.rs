/// Label for reads with no reference placement.
pub const UNMAPPED: &str = "unmapped";

/// Label for reads whose mean base quality is below the quality-value threshold.
pub const QV_FAIL: &str = "qv_fail";

/// Label for mapped reads whose mapping quality is below the threshold.
pub const MAPQ_FAIL: &str = "mapq_fail";

/// Fallback label used when a record's own label is absent from the catalogue.
pub const OTHER: &str = "other";

/// One normalized sequence observation pulled from a [`RecordStream`](crate::parsing::RecordStream).
///
/// Records are transient: they are created per pull, handed to the tally
/// step and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    /// Bases as read from the input
    pub sequence: String,

    /// One-based left-most position, 0 when the record has no placement
    pub start: u64,

    /// `start` plus the read length
    pub end: u64,

    /// Contig name or one of the synthetic bucket labels
    pub label: String,

    /// Phred base qualities (offset already removed), when the format carries them
    pub quality: Option<Vec<u8>>,

    /// False for records the caller must drop (filtered alignments)
    pub valid: bool,
}

impl Record {
    pub fn new(sequence: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            label: label.into(),
            valid: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_span(mut self, start: u64, end: u64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    #[must_use]
    pub fn with_quality(mut self, quality: Vec<u8>) -> Self {
        self.quality = Some(quality);
        self
    }

    /// A placeholder for a record that was read but must not be tallied.
    pub fn filtered() -> Self {
        Self::default()
    }
}

/// Mean of a quality slice, 0.0 for an empty slice.
#[must_use]
pub fn mean_quality(quality: &[u8]) -> f64 {
    if quality.is_empty() {
        return 0.0;
    }
    let total: u64 = quality.iter().map(|&q| u64::from(q)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = total as f64 / quality.len() as f64;
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = Record::new("ACGT", "chr1")
            .with_span(100, 104)
            .with_quality(vec![30, 30, 20, 20]);

        assert!(record.valid);
        assert_eq!(record.start, 100);
        assert_eq!(record.end, 104);
        assert_eq!(record.quality.as_deref(), Some(&[30, 30, 20, 20][..]));
    }

    #[test]
    fn test_filtered_record_is_invalid() {
        let record = Record::filtered();
        assert!(!record.valid);
        assert!(record.sequence.is_empty());
    }

    #[test]
    fn test_mean_quality() {
        assert!((mean_quality(&[10, 10, 12]) - 10.666_666).abs() < 1e-3);
        assert!(mean_quality(&[]).abs() < f64::EPSILON);
    }
}
