use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::parsing::stream::StreamError;

/// Base kind of an input file, independent of compression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Fasta,
    Fastq,
    /// Comma-separated text with a header line
    Csv,
    /// Tab-separated text with a header line
    Tsv,
    Bam,
    Sam,
}

impl InputKind {
    /// True for the aligned-read formats
    pub fn is_aligned(self) -> bool {
        matches!(self, Self::Bam | Self::Sam)
    }

    /// Field separator for the delimited formats
    pub fn separator(self) -> Option<char> {
        match self {
            Self::Csv => Some(','),
            Self::Tsv => Some('\t'),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Fasta => "FASTA",
            Self::Fastq => "FASTQ",
            Self::Csv => "CSV",
            Self::Tsv => "TSV",
            Self::Bam => "BAM",
            Self::Sam => "SAM",
        }
    }
}

/// File format as selected from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    pub kind: InputKind,
    pub compressed: bool,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.compressed {
            write!(f, "{} (gzip)", self.kind.display_name())
        } else {
            write!(f, "{}", self.kind.display_name())
        }
    }
}

fn is_compression_suffix(suffix: &str) -> bool {
    matches!(suffix, "gz" | "gzip" | "bgz")
}

/// Select the input format from the file name suffix.
///
/// The last suffix may be a compression suffix (`gz`, `gzip`, `bgz`), in
/// which case the one before it selects the kind. Matching is case-insensitive.
///
/// # Errors
///
/// Returns `StreamError::UnsupportedFormat` if no known suffix is found.
pub fn classify(path: &Path) -> Result<InputFormat, StreamError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let parts: Vec<&str> = name.split('.').collect();
    let unsupported = || StreamError::UnsupportedFormat(path.display().to_string());

    let (suffix, compressed) = match parts.as_slice() {
        [.., suffix, last] if is_compression_suffix(last) => {
            if parts.len() < 3 {
                return Err(unsupported());
            }
            (*suffix, true)
        }
        [_, .., last] => (*last, false),
        _ => return Err(unsupported()),
    };

    let kind = match suffix {
        "fa" | "fasta" | "fna" => InputKind::Fasta,
        "fq" | "fastq" => InputKind::Fastq,
        "csv" => InputKind::Csv,
        "tsv" => InputKind::Tsv,
        "bam" => InputKind::Bam,
        "sam" => InputKind::Sam,
        _ => return Err(unsupported()),
    };

    Ok(InputFormat { kind, compressed })
}

/// Open a text input, decompressing gzip/bgzip when `compressed` is set
///
/// # Errors
///
/// Returns `StreamError::Io` if the file cannot be opened.
pub fn open_text(path: &Path, compressed: bool) -> Result<Box<dyn BufRead>, StreamError> {
    let file = File::open(path)?;
    if compressed {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(name: &str) -> Option<InputFormat> {
        classify(Path::new(name)).ok()
    }

    #[test]
    fn test_classify_kinds() {
        let cases = [
            ("input.bam", InputKind::Bam, false),
            ("input.sam", InputKind::Sam, false),
            ("input.csv", InputKind::Csv, false),
            ("input.csv.gz", InputKind::Csv, true),
            ("input.tsv", InputKind::Tsv, false),
            ("input.fasta", InputKind::Fasta, false),
            ("input.fasta.gz", InputKind::Fasta, true),
            ("input.fa", InputKind::Fasta, false),
            ("input.fa.gz", InputKind::Fasta, true),
            ("input.fna.bgz", InputKind::Fasta, true),
            ("input.fastq", InputKind::Fastq, false),
            ("input.fastq.gz", InputKind::Fastq, true),
            ("input.fq", InputKind::Fastq, false),
            ("input.fq.gzip", InputKind::Fastq, true),
            ("/data/run.1/Sample.FQ.GZ", InputKind::Fastq, true),
        ];

        for (name, kind, compressed) in cases {
            assert_eq!(
                format(name),
                Some(InputFormat { kind, compressed }),
                "classifying {name}"
            );
        }
    }

    #[test]
    fn test_classify_unknown() {
        assert!(format("input.txt").is_none());
        assert!(format("input.gz").is_none());
        assert!(format("fq.gz").is_none());
        assert!(format("fastq").is_none());
        assert!(format("").is_none());

        let err = classify(Path::new("reads.txt")).unwrap_err();
        assert!(matches!(err, StreamError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_kind_helpers() {
        assert!(InputKind::Bam.is_aligned());
        assert!(InputKind::Sam.is_aligned());
        assert!(!InputKind::Fastq.is_aligned());
        assert_eq!(InputKind::Csv.separator(), Some(','));
        assert_eq!(InputKind::Tsv.separator(), Some('\t'));
        assert_eq!(InputKind::Fasta.separator(), None);
    }
}
