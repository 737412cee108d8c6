use crate::error::{FastqError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const PHRED33_OFFSET: i64 = 33;

/// Header, sequence and quality lines of one FASTQ entry, in file order.
pub type RawRecord = (String, String, String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Raw header line, leading `@` included.
    pub info: String,
    pub seq: String,
    pub quality: String,
}

impl Record {
    pub fn new(info: impl Into<String>, seq: impl Into<String>, quality: impl Into<String>) -> Self {
        Record {
            info: info.into(),
            seq: seq.into(),
            quality: quality.into(),
        }
    }

    #[inline]
    pub fn from_raw((info, seq, quality): RawRecord) -> Self {
        Record { info, seq, quality }
    }

    #[inline]
    pub fn into_raw(self) -> RawRecord {
        (self.info, self.seq, self.quality)
    }

    /// Read length in characters.
    #[inline]
    pub fn len(&self) -> usize {
        char_len(&self.seq)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn check_lengths(&self) -> Result<()> {
        check_lengths(&self.seq, &self.quality)
    }

    pub fn mean_quality(&self) -> Option<f64> {
        mean_phred33(&self.quality)
    }
}

#[inline]
pub(crate) fn char_len(s: &str) -> usize {
    if s.is_ascii() {
        s.len()
    } else {
        s.chars().count()
    }
}

/// Sequence and quality must hold the same number of characters.
#[inline]
pub(crate) fn check_lengths(seq: &str, quality: &str) -> Result<()> {
    let (seq_len, qual_len) = (char_len(seq), char_len(quality));
    if seq_len != qual_len {
        return Err(FastqError::LengthMismatch { seq_len, qual_len });
    }
    Ok(())
}

/// Arithmetic mean of the Phred+33 scores in `quality`; `None` for an empty string.
///
/// Scores are taken per character as its code point minus 33, so characters below `!`
/// contribute negative scores rather than being clamped.
pub fn mean_phred33(quality: &str) -> Option<f64> {
    let (sum, n) = quality
        .chars()
        .fold((0i64, 0usize), |(sum, n), c| (sum + c as i64 - PHRED33_OFFSET, n + 1));
    if n == 0 {
        return None;
    }
    Some(sum as f64 / n as f64)
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.info)?;
        writeln!(f, "{}", self.seq)?;
        writeln!(f, "+")?;
        f.write_str(&self.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_phred33() {
        assert_eq!(mean_phred33("IIII"), Some(40.0));
        assert_eq!(mean_phred33("!!!!"), Some(0.0));
        assert_eq!(mean_phred33("!J"), Some(20.5));
        assert_eq!(mean_phred33(""), None);
    }

    #[test]
    fn test_check_lengths() {
        assert!(Record::new("@r", "ACGT", "IIII").check_lengths().is_ok());
        match Record::new("@r", "ACGT", "III").check_lengths() {
            Err(FastqError::LengthMismatch {
                seq_len: 4,
                qual_len: 3,
            }) => {}
            other => panic!("Expected LengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_check_lengths_counts_characters() {
        let record = Record::new("@r", "AéGT", "IIII");
        assert!(record.check_lengths().is_ok());
        assert_eq!(record.len(), 4);

        match Record::new("@r", "AéG", "IIII").check_lengths() {
            Err(FastqError::LengthMismatch {
                seq_len: 3,
                qual_len: 4,
            }) => {}
            other => panic!("Expected LengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_display_is_fastq() {
        let record = Record::new("@read1 lane=1", "ACGT", "IIII");
        assert_eq!(record.to_string(), "@read1 lane=1\nACGT\n+\nIIII");
    }

    #[test]
    fn test_raw_conversion() {
        let raw = ("@r".to_string(), "AC".to_string(), "II".to_string());
        let record = Record::from_raw(raw.clone());
        assert_eq!(record.info, "@r");
        assert_eq!(record.into_raw(), raw);
    }
}
