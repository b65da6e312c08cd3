use std::collections::HashMap;
use std::io::BufRead;
use tracing::warn;

use crate::core::record::{Record, UNMAPPED};
use crate::parsing::stream::StreamError;

/// Column holding the read bases
pub const SEQUENCE_FIELD: &str = "sequence";

/// Column names declared by the first line of a delimited file
#[derive(Debug, Clone)]
pub struct DelimitedHeader {
    columns: Vec<String>,
    separator: char,
    warn_on_mismatch: bool,
}

impl DelimitedHeader {
    /// Parse a header line and check that every `required` column is present.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::InvalidHeader` for an empty header or
    /// `StreamError::MissingField` (line 1) if a required column is absent.
    pub fn parse(
        line: &str,
        separator: char,
        required: &[&str],
        warn_on_mismatch: bool,
    ) -> Result<Self, StreamError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(StreamError::InvalidHeader("empty header line".to_string()));
        }

        let columns: Vec<String> = line.split(separator).map(str::to_string).collect();
        for field in required {
            if !columns.iter().any(|c| c == field) {
                return Err(StreamError::MissingField {
                    field: (*field).to_string(),
                    line: 1,
                });
            }
        }

        Ok(Self {
            columns,
            separator,
            warn_on_mismatch,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Split a data line into column -> value.
    ///
    /// A line with a different field count than the header is still parsed,
    /// pairing up only the first `min(fields, columns)` entries.
    pub fn parse_line(&self, line: &str) -> HashMap<String, String> {
        let fields: Vec<&str> = line.split(self.separator).collect();
        if fields.len() != self.columns.len() && self.warn_on_mismatch {
            warn!(
                expected = self.columns.len(),
                found = fields.len(),
                "Field count differs from header, possible corrupted parsing"
            );
        }

        self.columns
            .iter()
            .zip(fields)
            .map(|(column, value)| (column.clone(), value.to_string()))
            .collect()
    }
}

/// Reader for header-led delimited text with a `sequence` column.
pub struct DelimitedReader {
    reader: Box<dyn BufRead>,
    header: DelimitedHeader,
    line: String,
    line_number: usize,
}

impl DelimitedReader {
    /// Read the header line from `reader`.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Io` if the header cannot be read,
    /// `StreamError::InvalidHeader` if it is empty, or
    /// `StreamError::MissingField` if it has no `sequence` column.
    pub fn new(
        mut reader: Box<dyn BufRead>,
        separator: char,
        warn_on_mismatch: bool,
    ) -> Result<Self, StreamError> {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let header = DelimitedHeader::parse(&line, separator, &[SEQUENCE_FIELD], warn_on_mismatch)?;

        Ok(Self {
            reader,
            header,
            line: String::new(),
            line_number: 1,
        })
    }

    pub fn header(&self) -> &DelimitedHeader {
        &self.header
    }

    /// Read the next record, skipping blank lines
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Io` on read failure or `StreamError::MissingField`
    /// if a line is too short to hold the `sequence` column.
    pub fn read_record(&mut self) -> Result<Option<Record>, StreamError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }

            let mut fields = self.header.parse_line(line);
            let sequence = fields
                .remove(SEQUENCE_FIELD)
                .ok_or_else(|| StreamError::MissingField {
                    field: SEQUENCE_FIELD.to_string(),
                    line: self.line_number,
                })?;

            return Ok(Some(Record::new(sequence, UNMAPPED)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(content: &'static str, separator: char) -> Result<DelimitedReader, StreamError> {
        DelimitedReader::new(Box::new(Cursor::new(content.as_bytes())), separator, true)
    }

    #[test]
    fn test_parse_header() {
        let header = DelimitedHeader::parse("id,sequence,quality\n", ',', &["sequence"], false).unwrap();
        assert_eq!(header.columns().to_vec(), vec!["id", "sequence", "quality"]);
    }

    #[test]
    fn test_header_missing_required() {
        let err = DelimitedHeader::parse("id,bases", ',', &["sequence"], false).unwrap_err();
        assert!(matches!(err, StreamError::MissingField { line: 1, .. }));
    }

    #[test]
    fn test_empty_header() {
        assert!(matches!(
            reader("", ','),
            Err(StreamError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_parse_line_uses_shorter_length() {
        let header = DelimitedHeader::parse("a,b,c", ',', &[], true).unwrap();

        let short = header.parse_line("1,2");
        assert_eq!(short.len(), 2);
        assert_eq!(short["b"], "2");
        assert!(!short.contains_key("c"));

        let long = header.parse_line("1,2,3,4");
        assert_eq!(long.len(), 3);
        assert_eq!(long["c"], "3");
    }

    #[test]
    fn test_read_records() {
        let mut csv = reader("id,sequence\r\n1,ACGT\r\n\r\n2,TTAGGG\r\n", ',').unwrap();

        let first = csv.read_record().unwrap().unwrap();
        assert_eq!(first.sequence, "ACGT");
        assert_eq!(first.label, UNMAPPED);
        assert!(first.valid);

        let second = csv.read_record().unwrap().unwrap();
        assert_eq!(second.sequence, "TTAGGG");
        assert!(csv.read_record().unwrap().is_none());
    }

    #[test]
    fn test_tab_separated() {
        let mut tsv = reader("sequence\tname\nCCCTAA\tr1\n", '\t').unwrap();
        assert_eq!(tsv.read_record().unwrap().unwrap().sequence, "CCCTAA");
    }

    #[test]
    fn test_short_line_missing_sequence_is_fatal() {
        let mut csv = reader("id,name,sequence\n1,r1,ACGT\n2,r2\n", ',').unwrap();
        assert!(csv.read_record().unwrap().is_some());
        assert!(matches!(
            csv.read_record(),
            Err(StreamError::MissingField { line: 3, .. })
        ));
    }
}
