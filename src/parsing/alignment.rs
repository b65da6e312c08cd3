//! BAM/SAM record reader using noodles.
//!
//! Secondary, duplicate, QC-fail and supplementary alignments come back as
//! filtered records. Mapped records are labelled with their reference name
//! and may be relabelled `"qv_fail"` or `"mapq_fail"`.

use noodles::sam::alignment::RecordBuf;
use noodles::{bam, sam};
use std::fs::File;
use std::io::{self, BufRead, Read};
use std::path::Path;

use crate::core::record::{mean_quality, Record, MAPQ_FAIL, QV_FAIL, UNMAPPED};
use crate::parsing::format::{open_text, InputFormat, InputKind};
use crate::parsing::stream::StreamError;

/// Mapping quality noodles reports as missing
const MAPQ_MISSING: u8 = 255;

trait AlignmentRead {
    fn next_record_buf(&mut self, header: &sam::Header, record: &mut RecordBuf)
        -> io::Result<usize>;
}

impl<R: Read> AlignmentRead for bam::io::Reader<R> {
    fn next_record_buf(
        &mut self,
        header: &sam::Header,
        record: &mut RecordBuf,
    ) -> io::Result<usize> {
        self.read_record_buf(header, record)
    }
}

impl<R: BufRead> AlignmentRead for sam::io::Reader<R> {
    fn next_record_buf(
        &mut self,
        header: &sam::Header,
        record: &mut RecordBuf,
    ) -> io::Result<usize> {
        self.read_record_buf(header, record)
    }
}

pub struct AlignmentReader {
    reader: Box<dyn AlignmentRead>,
    header: sam::Header,
    record: RecordBuf,
    reference_names: Vec<String>,
    quality_value: u8,
    quality_map: u8,
}

impl AlignmentReader {
    /// Open a BAM or SAM file and read its header.
    ///
    /// SAM text may be gzip compressed; BAM is always read as BGZF.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Io` if the file cannot be opened,
    /// `StreamError::Noodles` if the header cannot be parsed, or
    /// `StreamError::UnsupportedFormat` for a non-alignment format.
    pub fn open(
        path: &Path,
        format: InputFormat,
        quality_value: u8,
        quality_map: u8,
    ) -> Result<Self, StreamError> {
        let (reader, header): (Box<dyn AlignmentRead>, sam::Header) = match format.kind {
            InputKind::Bam => {
                let mut reader = File::open(path).map(bam::io::Reader::new)?;
                let header = reader
                    .read_header()
                    .map_err(|e| StreamError::Noodles(e.to_string()))?;
                (Box::new(reader), header)
            }
            InputKind::Sam => {
                let mut reader = sam::io::Reader::new(open_text(path, format.compressed)?);
                let header = reader
                    .read_header()
                    .map_err(|e| StreamError::Noodles(e.to_string()))?;
                (Box::new(reader), header)
            }
            _ => return Err(StreamError::UnsupportedFormat(format.to_string())),
        };

        let reference_names = header
            .reference_sequences()
            .keys()
            .map(ToString::to_string)
            .collect();

        Ok(Self {
            reader,
            header,
            record: RecordBuf::default(),
            reference_names,
            quality_value,
            quality_map,
        })
    }

    /// Reference sequence names declared by the header, in header order
    pub fn reference_names(&self) -> &[String] {
        &self.reference_names
    }

    /// Read the next alignment, `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Noodles` if the record cannot be decoded.
    pub fn read_record(&mut self) -> Result<Option<Record>, StreamError> {
        let read = self
            .reader
            .next_record_buf(&self.header, &mut self.record)
            .map_err(|e| StreamError::Noodles(format!("Failed to parse alignment record: {e}")))?;
        if read == 0 {
            return Ok(None);
        }

        let flags = self.record.flags();
        if flags.is_secondary()
            || flags.is_duplicate()
            || flags.is_qc_fail()
            || flags.is_supplementary()
        {
            return Ok(Some(Record::filtered()));
        }

        let sequence = String::from_utf8_lossy(self.record.sequence().as_ref()).into_owned();
        let quality = self.record.quality_scores().as_ref().to_vec();
        let start = self
            .record
            .alignment_start()
            .map_or(0, |position| usize::from(position) as u64);
        let end = start + sequence.len() as u64;

        let reference = self
            .record
            .reference_sequence_id()
            .and_then(|id| self.reference_names.get(id));

        let label = match reference {
            Some(name) if !flags.is_unmapped() => {
                let mapping_quality = self
                    .record
                    .mapping_quality()
                    .map_or(MAPQ_MISSING, |mapq| mapq.get());

                if !quality.is_empty() && mean_quality(&quality) < f64::from(self.quality_value) {
                    QV_FAIL
                } else if mapping_quality < self.quality_map {
                    MAPQ_FAIL
                } else {
                    name.as_str()
                }
            }
            _ => UNMAPPED,
        };

        let mut record = Record::new(sequence, label).with_span(start, end);
        if !quality.is_empty() {
            record = record.with_quality(quality);
        }
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAM: &[u8] = b"@HD\tVN:1.6\n\
@SQ\tSN:chr1\tLN:100000\n\
@SQ\tSN:chr2\tLN:50000\n\
r1\t0\tchr2\t10\t255\t4M\t*\t0\t0\tACGT\t*\n\
r2\t1024\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tIIII\n\
r3\t512\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tIIII\n\
r4\t2048\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tIIII\n";

    fn sam_reader(quality_value: u8, quality_map: u8) -> (NamedTempFile, AlignmentReader) {
        let mut temp = NamedTempFile::with_suffix(".sam").unwrap();
        temp.write_all(SAM).unwrap();
        temp.flush().unwrap();
        let format = InputFormat {
            kind: InputKind::Sam,
            compressed: false,
        };
        let reader = AlignmentReader::open(temp.path(), format, quality_value, quality_map).unwrap();
        (temp, reader)
    }

    #[test]
    fn test_reference_names() {
        let (_temp, reader) = sam_reader(0, 0);
        assert_eq!(reader.reference_names().to_vec(), vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_missing_quality_and_mapq() {
        let (_temp, mut reader) = sam_reader(30, 254);

        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(record.label, "chr2");
        assert_eq!((record.start, record.end), (10, 14));
        assert!(record.quality.is_none());
    }

    #[test]
    fn test_flag_filters() {
        let (_temp, mut reader) = sam_reader(0, 0);
        reader.read_record().unwrap();

        for _ in 0..3 {
            let record = reader.read_record().unwrap().unwrap();
            assert!(!record.valid);
        }
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn test_rejects_text_formats() {
        let format = InputFormat {
            kind: InputKind::Fastq,
            compressed: false,
        };
        assert!(matches!(
            AlignmentReader::open(Path::new("reads.fq"), format, 0, 0),
            Err(StreamError::UnsupportedFormat(_))
        ));
    }
}
