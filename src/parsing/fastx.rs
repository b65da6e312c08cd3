//! FASTA/FASTQ record reader using noodles.
//!
//! Records carry the `"unmapped"` label; FASTQ records whose mean base
//! quality is below the quality-value threshold are relabelled `"qv_fail"`.

use noodles::{fasta, fastq};
use std::io::BufRead;

use crate::core::record::{mean_quality, Record, QV_FAIL, UNMAPPED};
use crate::parsing::format::InputKind;
use crate::parsing::stream::StreamError;

/// Phred+33 offset used by FASTQ quality strings
const PHRED_OFFSET: u8 = 33;

enum Inner {
    Fasta {
        reader: fasta::io::Reader<Box<dyn BufRead>>,
        definition: String,
    },
    Fastq {
        reader: fastq::io::Reader<Box<dyn BufRead>>,
        record: fastq::Record,
    },
}

pub struct FastxReader {
    inner: Inner,
    quality_value: u8,
}

impl FastxReader {
    /// Wrap an already opened (and decompressed) text reader.
    ///
    /// `kind` other than FASTQ is read as FASTA.
    pub fn new(reader: Box<dyn BufRead>, kind: InputKind, quality_value: u8) -> Self {
        let inner = if kind == InputKind::Fastq {
            Inner::Fastq {
                reader: fastq::io::Reader::new(reader),
                record: fastq::Record::default(),
            }
        } else {
            Inner::Fasta {
                reader: fasta::io::Reader::new(reader),
                definition: String::new(),
            }
        };
        Self {
            inner,
            quality_value,
        }
    }

    /// Read the next record, `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Noodles` if the record is malformed.
    pub fn read_record(&mut self) -> Result<Option<Record>, StreamError> {
        match &mut self.inner {
            Inner::Fasta { reader, definition } => {
                definition.clear();
                let read = reader
                    .read_definition(definition)
                    .map_err(|e| StreamError::Noodles(format!("Failed to parse FASTA record: {e}")))?;
                if read == 0 {
                    return Ok(None);
                }

                let mut sequence = Vec::new();
                reader
                    .read_sequence(&mut sequence)
                    .map_err(|e| StreamError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

                Ok(Some(Record::new(
                    String::from_utf8_lossy(&sequence).into_owned(),
                    UNMAPPED,
                )))
            }
            Inner::Fastq { reader, record } => {
                let read = reader
                    .read_record(record)
                    .map_err(|e| StreamError::Noodles(format!("Failed to parse FASTQ record: {e}")))?;
                if read == 0 {
                    return Ok(None);
                }

                let sequence = String::from_utf8_lossy(record.sequence()).into_owned();
                let quality: Vec<u8> = record
                    .quality_scores()
                    .iter()
                    .map(|&q| q.saturating_sub(PHRED_OFFSET))
                    .collect();

                if quality.is_empty() {
                    return Ok(Some(Record::new(sequence, UNMAPPED)));
                }

                let label = if mean_quality(&quality) < f64::from(self.quality_value) {
                    QV_FAIL
                } else {
                    UNMAPPED
                };
                Ok(Some(Record::new(sequence, label).with_quality(quality)))
            }
        }
    }
}
