use crate::{error::Result, record::RawRecord, source::LineSource};
use tracing::{debug, warn};

pub const LINES_PER_RECORD: usize = 4;

// Upper bound on the line vector preallocation; chunk sizes are often in the millions.
const MAX_PREALLOC_LINES: usize = 64 * 1024;

/// A batch of raw records read in one loader burst, tagged with its position in read order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub records: Vec<RawRecord>,
}

impl Chunk {
    pub fn new(index: usize, records: Vec<RawRecord>) -> Self {
        Chunk { index, records }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads up to `chunk_size * 4` lines from `source`. Fewer lines means the source ran out;
/// an empty vector means it was already exhausted.
pub fn load_chunk(source: &mut LineSource, chunk_size: usize) -> Result<Vec<String>> {
    let limit = chunk_size.saturating_mul(LINES_PER_RECORD);
    let mut lines = Vec::with_capacity(limit.min(MAX_PREALLOC_LINES));

    while lines.len() < limit {
        match source.next_line()? {
            Some(line) => lines.push(line),
            None => break,
        }
    }

    Ok(lines)
}

/// Groups lines into `(header, sequence, quality)` tuples, skipping the `+` line.
///
/// A trailing group of fewer than four lines is dropped; the number of dropped lines is
/// returned alongside the records.
pub fn group_records(lines: Vec<String>) -> (Vec<RawRecord>, usize) {
    let dangling = lines.len() % LINES_PER_RECORD;
    let mut records = Vec::with_capacity(lines.len() / LINES_PER_RECORD);
    let mut iter = lines.into_iter();

    while let (Some(info), Some(seq), Some(_plus), Some(quality)) =
        (iter.next(), iter.next(), iter.next(), iter.next())
    {
        records.push((info, seq, quality));
    }

    (records, dangling)
}

/// Sequential producer of [`Chunk`]s over a borrowed line source.
pub struct ChunkLoader<'a> {
    source: &'a mut LineSource,
    chunk_size: usize,
    next_index: usize,
    dropped_lines: usize,
    done: bool,
}

impl<'a> ChunkLoader<'a> {
    pub fn new(source: &'a mut LineSource, chunk_size: usize) -> Self {
        ChunkLoader {
            source,
            chunk_size,
            next_index: 0,
            dropped_lines: 0,
            done: false,
        }
    }

    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        while !self.done {
            let lines = match load_chunk(self.source, self.chunk_size) {
                Ok(lines) => lines,
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };
            if lines.is_empty() {
                self.done = true;
                break;
            }

            let (records, dangling) = group_records(lines);
            if dangling > 0 {
                warn!(
                    dangling_lines = dangling,
                    path = %self.source.path().display(),
                    "Dropping truncated record at end of input"
                );
                self.dropped_lines += dangling;
            }
            if records.is_empty() {
                continue;
            }

            let index = self.next_index;
            self.next_index += 1;
            debug!(chunk = index, records = records.len(), "Loaded chunk");
            return Ok(Some(Chunk::new(index, records)));
        }

        Ok(None)
    }

    /// Chunks produced so far.
    pub fn chunks_loaded(&self) -> usize {
        self.next_index
    }

    /// Lines discarded because they did not complete a record.
    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }
}

impl<'a> Iterator for ChunkLoader<'a> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
