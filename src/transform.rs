use crate::{
    chunk::Chunk,
    error::Result,
    record::{char_len, check_lengths, mean_phred33, RawRecord, Record},
};

/// Work applied to one chunk on a worker thread.
///
/// Implementations must be pure functions of the chunk and their own parameters; the
/// scheduler calls `apply` from several threads at once.
pub trait Transform: Sync {
    type Output: Send;

    fn apply(&self, chunk: Chunk) -> Result<Self::Output>;
}

impl<F, O> Transform for F
where
    F: Fn(Chunk) -> Result<O> + Sync,
    O: Send,
{
    type Output = O;

    fn apply(&self, chunk: Chunk) -> Result<O> {
        self(chunk)
    }
}

/// Number of complete records in a chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCount;

impl Transform for RecordCount {
    type Output = usize;

    fn apply(&self, chunk: Chunk) -> Result<usize> {
        Ok(chunk.len())
    }
}

/// Removes a fixed number of bases from both ends of every read.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndTrimmer {
    five_prime: usize,
    three_prime: usize,
}

impl EndTrimmer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn five_prime(mut self, bases: usize) -> Self {
        self.five_prime = bases;
        self
    }

    pub fn three_prime(mut self, bases: usize) -> Self {
        self.three_prime = bases;
        self
    }

    /// Trims in characters, so multi-byte symbols count as one base.
    pub fn trim(&self, (info, mut seq, mut quality): RawRecord) -> Result<Record> {
        check_lengths(&seq, &quality)?;

        let len = char_len(&seq);
        if self.five_prime.saturating_add(self.three_prime) >= len {
            seq.clear();
            quality.clear();
            return Ok(Record { info, seq, quality });
        }

        let (start, end) = (self.five_prime, len - self.three_prime);
        for field in [&mut seq, &mut quality] {
            let (from, to) = (byte_offset(field, start), byte_offset(field, end));
            field.truncate(to);
            field.drain(..from);
        }
        Ok(Record { info, seq, quality })
    }

    pub fn trim_records(&self, records: Vec<RawRecord>) -> Result<Vec<Record>> {
        records.into_iter().map(|raw| self.trim(raw)).collect()
    }
}

impl Transform for EndTrimmer {
    type Output = Vec<Record>;

    fn apply(&self, chunk: Chunk) -> Result<Vec<Record>> {
        self.trim_records(chunk.records)
    }
}

/// Keeps reads whose mean Phred+33 quality reaches `min_quality`.
#[derive(Debug, Clone, Copy)]
pub struct QualityFilter {
    min_quality: f64,
}

impl QualityFilter {
    pub fn new(min_quality: f64) -> Self {
        QualityFilter { min_quality }
    }

    pub fn min_quality(&self) -> f64 {
        self.min_quality
    }

    /// Reads with an empty quality string never pass.
    pub fn passes(&self, seq: &str, quality: &str) -> Result<bool> {
        check_lengths(seq, quality)?;
        Ok(mean_phred33(quality).is_some_and(|mean| mean >= self.min_quality))
    }

    pub fn filter_records(&self, records: Vec<RawRecord>) -> Result<Vec<Record>> {
        let mut kept = Vec::with_capacity(records.len());
        for raw in records {
            if self.passes(&raw.1, &raw.2)? {
                kept.push(Record::from_raw(raw));
            }
        }
        Ok(kept)
    }
}

impl Transform for QualityFilter {
    type Output = Vec<Record>;

    fn apply(&self, chunk: Chunk) -> Result<Vec<Record>> {
        self.filter_records(chunk.records)
    }
}

/// Cuts `seq[start..end]` out of every read, with slice-style clipping of the bounds.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    start: isize,
    end: isize,
}

impl Extractor {
    pub fn new(start: isize, end: isize) -> Self {
        Extractor { start, end }
    }

    pub fn extract_records(&self, records: Vec<RawRecord>) -> Vec<String> {
        records
            .iter()
            .map(|(_, seq, _)| slice_clamped(seq, self.start, self.end))
            .collect()
    }
}

impl Transform for Extractor {
    type Output = Vec<String>;

    fn apply(&self, chunk: Chunk) -> Result<Vec<String>> {
        Ok(self.extract_records(chunk.records))
    }
}

#[inline]
fn clamp_index(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        (index as usize).min(len)
    }
}

/// Byte position of character `index` in `s`, or `s.len()` past the end.
#[inline]
fn byte_offset(s: &str, index: usize) -> usize {
    if s.is_ascii() {
        return index.min(s.len());
    }
    s.char_indices().nth(index).map_or(s.len(), |(at, _)| at)
}

/// Characters `start..end` of `s`. Negative bounds count from the end, out-of-range
/// bounds clamp, and an empty range yields an empty string.
pub fn slice_clamped(s: &str, start: isize, end: isize) -> String {
    if s.is_ascii() {
        let (start, end) = (clamp_index(start, s.len()), clamp_index(end, s.len()));
        return if start < end {
            s[start..end].to_string()
        } else {
            String::new()
        };
    }

    let len = s.chars().count();
    let (start, end) = (clamp_index(start, len), clamp_index(end, len));
    if start >= end {
        return String::new();
    }
    s.chars().skip(start).take(end - start).collect()
}
