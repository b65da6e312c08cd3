//! Advisory record totals used for progress reporting.
//!
//! Text formats are counted by scanning lines once; BAM totals come from the
//! `.bai` index metadata when an index is present. Any failure yields 0.

use noodles::bam;
use noodles::csi::binning_index::{BinningIndex, ReferenceSequence as _};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::parsing::format::{open_text, InputFormat, InputKind};

/// Estimate the number of records in `path`.
///
/// Never fails; an unreadable input or missing index gives 0.
pub fn estimate_total(path: &Path, format: InputFormat) -> u64 {
    let estimate = match format.kind {
        InputKind::Bam => count_indexed(path),
        _ => count_text(path, format),
    };

    match estimate {
        Ok(total) => total,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Could not estimate record total");
            0
        }
    }
}

fn count_text(path: &Path, format: InputFormat) -> io::Result<u64> {
    let reader = open_text(path, format.compressed).map_err(io::Error::other)?;
    let lines = count_lines(reader, format.kind)?;
    Ok(lines)
}

/// Count records in a text stream by its line structure
pub fn count_lines<R: BufRead>(mut reader: R, kind: InputKind) -> io::Result<u64> {
    let mut line = Vec::new();
    let mut lines = 0u64;
    let mut headers = 0u64;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        lines += 1;
        match (kind, line.first()) {
            (InputKind::Fasta, Some(b'>')) | (InputKind::Sam, Some(b'@')) => headers += 1,
            _ => {}
        }
    }

    Ok(match kind {
        InputKind::Fasta => headers,
        InputKind::Fastq => lines / 4,
        InputKind::Csv | InputKind::Tsv => lines.saturating_sub(1),
        InputKind::Sam => lines - headers,
        InputKind::Bam => 0,
    })
}

/// Candidate index paths: `<input>.bai`, then the `.bam` suffix replaced by `.bai`
fn index_candidates(path: &Path) -> Vec<PathBuf> {
    let mut appended = path.as_os_str().to_owned();
    appended.push(".bai");
    vec![PathBuf::from(appended), path.with_extension("bai")]
}

fn count_indexed(path: &Path) -> io::Result<u64> {
    let index_path = index_candidates(path)
        .into_iter()
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no .bai index found"))?;

    let index = bam::bai::read(&index_path)?;

    let placed: u64 = index
        .reference_sequences()
        .iter()
        .filter_map(|reference_sequence| reference_sequence.metadata())
        .map(|metadata| metadata.mapped_record_count() + metadata.unmapped_record_count())
        .sum();
    let unplaced = index.unplaced_unmapped_record_count().unwrap_or(0);

    Ok(placed + unplaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn count(content: &str, kind: InputKind) -> u64 {
        count_lines(Cursor::new(content.as_bytes()), kind).unwrap()
    }

    #[test]
    fn test_count_fasta() {
        assert_eq!(count(">a\nACGT\nACGT\n>b\nGG\n", InputKind::Fasta), 2);
        assert_eq!(count("", InputKind::Fasta), 0);
    }

    #[test]
    fn test_count_fastq() {
        assert_eq!(count("@a\nACGT\n+\nIIII\n@b\nAC\n+\nII\n\n", InputKind::Fastq), 2);
    }

    #[test]
    fn test_count_delimited() {
        assert_eq!(count("id,sequence\n1,A\n2,C\n3,G\n", InputKind::Csv), 3);
        assert_eq!(count("sequence\n", InputKind::Tsv), 0);
        assert_eq!(count("", InputKind::Csv), 0);
    }

    #[test]
    fn test_count_sam() {
        let sam = "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:10\nr1\t4\t*\t0\t0\t*\t*\t0\t0\tA\t*\n";
        assert_eq!(count(sam, InputKind::Sam), 1);
    }

    #[test]
    fn test_index_candidates() {
        let candidates = index_candidates(Path::new("/data/sample.bam"));
        assert_eq!(candidates[0], PathBuf::from("/data/sample.bam.bai"));
        assert_eq!(candidates[1], PathBuf::from("/data/sample.bai"));
    }

    #[test]
    fn test_missing_inputs_estimate_zero() {
        let bam = InputFormat {
            kind: InputKind::Bam,
            compressed: false,
        };
        assert_eq!(estimate_total(Path::new("/nonexistent/sample.bam"), bam), 0);

        let fastq = InputFormat {
            kind: InputKind::Fastq,
            compressed: false,
        };
        assert_eq!(estimate_total(Path::new("/nonexistent/reads.fq"), fastq), 0);
    }

    #[test]
    fn test_estimate_from_file() {
        let mut temp = NamedTempFile::with_suffix(".fa").unwrap();
        temp.write_all(b">a\nAC\n>b\nGT\n>c\nTT\n").unwrap();
        temp.flush().unwrap();

        let format = InputFormat {
            kind: InputKind::Fasta,
            compressed: false,
        };
        assert_eq!(estimate_total(temp.path(), format), 3);
    }
}
