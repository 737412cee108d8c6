use crate::{
    aggregate::{Aggregator, OrderedConcat, Summation},
    chunk::ChunkLoader,
    config::ReaderConfig,
    error::Result,
    record::Record,
    scheduler::Scheduler,
    sink::{ColumnarSink, DEFAULT_COLUMN},
    source::LineSource,
    transform::{EndTrimmer, Extractor, QualityFilter, RecordCount, Transform},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn, Span};

/// Result of [`FastqReader::extract_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    InMemory(Vec<String>),
    Saved(PathBuf),
}

/// Chunked parallel FASTQ reader.
///
/// The reader owns its line source. Every operation starts from the beginning of the file,
/// and the source is reopened once an operation finishes, so calls do not share a cursor.
pub struct FastqReader {
    config: ReaderConfig,
    source: LineSource,
    needs_reset: bool,
    span: Span,
}

impl FastqReader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        FastqReaderBuilder::new().open(path)
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: ReaderConfig) -> Result<Self> {
        FastqReaderBuilder::new().config(config).open(path)
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    fn rewind(&mut self) -> Result<()> {
        if self.needs_reset {
            self.source.reopen()?;
            self.needs_reset = false;
        }
        Ok(())
    }

    /// Lazily yields records one 4-line group at a time, on the calling thread.
    ///
    /// Each call restarts from the top of the file.
    pub fn records(&mut self) -> Result<Records<'_>> {
        self.rewind()?;
        self.needs_reset = true;
        Ok(Records {
            source: &mut self.source,
            span: self.span.clone(),
            done: false,
        })
    }

    fn run<T, A>(&mut self, transform: &T, aggregator: A) -> Result<A::Output>
    where
        T: Transform,
        A: Aggregator<T::Output>,
    {
        self.rewind()?;
        self.needs_reset = true;

        let scheduler = Scheduler::new(self.config.workers)
            .queue_depth(self.config.effective_queue_depth())
            .span(self.span.clone());
        let mut loader = ChunkLoader::new(&mut self.source, self.config.chunk_size);
        let result = scheduler.run(loader.by_ref(), transform, aggregator);
        debug!(
            chunks = loader.chunks_loaded(),
            dropped_lines = loader.dropped_lines(),
            "Input consumed"
        );

        if let Err(e) = self.rewind() {
            warn!(error = %e, "Could not reopen source after operation");
        }
        result
    }

    /// Number of complete 4-line records in the file.
    pub fn count_reads(&mut self) -> Result<usize> {
        let _entered = self.span.clone().entered();
        let count = self.run(&RecordCount, Summation::new())?;
        info!(reads = count, "Counted reads");
        Ok(count)
    }

    /// Removes `five_prime` bases from the start and `three_prime` from the end of every
    /// read's sequence and quality. Reads shorter than the combined trim become empty.
    pub fn trim(&mut self, five_prime: usize, three_prime: usize) -> Result<Vec<Record>> {
        let _entered = self.span.clone().entered();
        let trimmer = EndTrimmer::new()
            .five_prime(five_prime)
            .three_prime(three_prime);
        let trimmed = self.run(&trimmer, OrderedConcat::new())?;
        info!(
            reads = trimmed.len(),
            five_prime, three_prime, "Trimmed reads"
        );
        Ok(trimmed)
    }

    /// Reads whose mean Phred+33 quality is at least `threshold`, in file order.
    pub fn filter_quality(&mut self, threshold: f64) -> Result<Vec<Record>> {
        let _entered = self.span.clone().entered();
        let kept = self.run(&QualityFilter::new(threshold), OrderedConcat::new())?;
        info!(reads = kept.len(), threshold, "Filtered reads by mean quality");
        Ok(kept)
    }

    /// `seq[start..end]` of every read, in file order. Bounds follow slice clipping rules:
    /// negative values count from the end and out-of-range values clamp.
    pub fn extract(&mut self, start: isize, end: isize) -> Result<Vec<String>> {
        let _entered = self.span.clone().entered();
        let extracted = self.run(&Extractor::new(start, end), OrderedConcat::new())?;
        info!(reads = extracted.len(), start, end, "Extracted subsequences");
        Ok(extracted)
    }

    /// Like [`extract`](Self::extract) but persists the column to `sink` under `name`.
    pub fn extract_to<S: ColumnarSink + ?Sized>(
        &mut self,
        start: isize,
        end: isize,
        sink: &S,
        name: &str,
    ) -> Result<PathBuf> {
        let extracted = self.extract(start, end)?;
        let _entered = self.span.clone().entered();
        let path = sink.write_column(name, DEFAULT_COLUMN, extracted)?;
        info!(path = %path.display(), "Saved extracted subsequences");
        Ok(path)
    }

    pub fn extract_with(
        &mut self,
        start: isize,
        end: isize,
        save: Option<(&dyn ColumnarSink, &str)>,
    ) -> Result<Extracted> {
        match save {
            Some((sink, name)) => self.extract_to(start, end, sink, name).map(Extracted::Saved),
            None => self.extract(start, end).map(Extracted::InMemory),
        }
    }
}

/// Sequential record iterator returned by [`FastqReader::records`].
pub struct Records<'a> {
    source: &'a mut LineSource,
    span: Span,
    done: bool,
}

impl<'a> Records<'a> {
    fn next_record(&mut self) -> Result<Option<Record>> {
        let Some(info) = self.source.next_line()? else {
            return Ok(None);
        };
        let mut rest = [None, None, None];
        for (i, slot) in rest.iter_mut().enumerate() {
            match self.source.next_line()? {
                Some(line) => *slot = Some(line),
                None => {
                    warn!(
                        parent: &self.span,
                        dangling_lines = i + 1,
                        "Dropping truncated record at end of input"
                    );
                    return Ok(None);
                }
            }
        }
        match rest {
            [Some(seq), Some(_plus), Some(quality)] => Ok(Some(Record { info, seq, quality })),
            _ => Ok(None),
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.next_record();
        if !matches!(next, Ok(Some(_))) {
            self.done = true;
        }
        next.transpose()
    }
}

#[derive(Default)]
pub struct FastqReaderBuilder {
    config: ReaderConfig,
    span: Option<Span>,
}

impl FastqReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Sizes the worker pool to rayon's global thread count.
    pub fn available_parallelism(mut self) -> Self {
        self.config.workers = rayon::current_num_threads();
        self
    }

    pub fn chunk_size(mut self, records: usize) -> Self {
        self.config.chunk_size = records;
        self
    }

    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.config.queue_depth = depth;
        self
    }

    pub fn config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Span the reader logs under. Defaults to a `fastq_reader` span carrying the path.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<FastqReader> {
        self.config.validate()?;
        let path = path.as_ref();
        let span = self
            .span
            .unwrap_or_else(|| info_span!("fastq_reader", path = %path.display()));
        let source = LineSource::open(path)?;
        debug!(
            parent: &span,
            workers = self.config.workers,
            chunk_size = self.config.chunk_size,
            "Opened FASTQ source"
        );

        Ok(FastqReader {
            config: self.config,
            source,
            needs_reset: false,
            span,
        })
    }
}
