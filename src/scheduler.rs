use crate::{
    aggregate::Aggregator,
    chunk::Chunk,
    error::{FastqError, Result},
    transform::Transform,
};
use crossbeam_channel::{bounded, unbounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, trace, Span};

/// Scatter/gather over a fixed set of worker threads.
///
/// Chunks are handed to `workers` threads through a bounded queue, so a loader that runs
/// ahead of the workers blocks instead of buffering the whole input. Every result comes back
/// tagged with its chunk index and is merged by the aggregator, which owns the ordering.
#[derive(Debug, Clone)]
pub struct Scheduler {
    workers: usize,
    queue_depth: usize,
    span: Span,
}

impl Scheduler {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Scheduler {
            workers,
            queue_depth: workers * 2,
            span: Span::current(),
        }
    }

    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Span entered by every worker thread, so their events nest under the caller's.
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `transform` over every chunk and folds the outputs into `aggregator`.
    ///
    /// Chunks are pulled from `chunks` on the calling thread. The first failure, either from
    /// the chunk source or from a transform, stops further loading; queued chunks are
    /// drained without being processed and the failure is returned. Transform failures are
    /// wrapped in [`FastqError::Worker`].
    pub fn run<I, T, A>(&self, chunks: I, transform: &T, aggregator: A) -> Result<A::Output>
    where
        I: IntoIterator<Item = Result<Chunk>>,
        T: Transform,
        A: Aggregator<T::Output>,
    {
        let (chunk_tx, chunk_rx) = bounded::<Chunk>(self.queue_depth);
        let (result_tx, result_rx) = unbounded::<(usize, Result<T::Output>)>();
        let cancelled = AtomicBool::new(false);

        debug!(
            workers = self.workers,
            queue_depth = self.queue_depth,
            "Starting chunk scheduler"
        );

        thread::scope(|scope| {
            for worker in 0..self.workers {
                let chunk_rx = chunk_rx.clone();
                let result_tx = result_tx.clone();
                let cancelled = &cancelled;
                let span = self.span.clone();

                scope.spawn(move || {
                    let _entered = span.enter();
                    let mut processed = 0usize;
                    for chunk in chunk_rx.iter() {
                        if cancelled.load(Ordering::Relaxed) {
                            continue;
                        }
                        let index = chunk.index;
                        let result = transform.apply(chunk);
                        if result.is_err() {
                            cancelled.store(true, Ordering::Relaxed);
                        }
                        if result_tx.send((index, result)).is_err() {
                            break;
                        }
                        processed += 1;
                    }
                    trace!(worker, processed, "Worker exiting");
                });
            }
            drop(chunk_rx);
            drop(result_tx);

            let mut gather = Gather {
                aggregator,
                failure: None,
                cancelled: &cancelled,
                merged: 0,
            };

            for chunk in chunks {
                if cancelled.load(Ordering::Relaxed) {
                    break;
                }
                match chunk {
                    Ok(chunk) => {
                        if chunk_tx.send(chunk).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        gather.fail(e);
                        break;
                    }
                }
                for (index, result) in result_rx.try_iter() {
                    gather.merge(index, result);
                }
            }
            drop(chunk_tx);

            for (index, result) in result_rx.iter() {
                gather.merge(index, result);
            }

            gather.finish::<T::Output>()
        })
    }
}

struct Gather<'a, A> {
    aggregator: A,
    failure: Option<FastqError>,
    cancelled: &'a AtomicBool,
    merged: usize,
}

impl<'a, A> Gather<'a, A> {
    fn fail(&mut self, error: FastqError) {
        self.cancelled.store(true, Ordering::Relaxed);
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    fn merge<T>(&mut self, index: usize, result: Result<T>)
    where
        A: Aggregator<T>,
    {
        if self.failure.is_some() {
            return;
        }
        match result {
            Ok(batch) => match self.aggregator.accept(index, batch) {
                Ok(()) => self.merged += 1,
                Err(e) => self.fail(e),
            },
            Err(e) => {
                debug!(chunk = index, error = %e, "Chunk transform failed");
                self.fail(FastqError::Worker {
                    chunk: index,
                    source: Box::new(e),
                })
            }
        }
    }

    fn finish<T>(self) -> Result<A::Output>
    where
        A: Aggregator<T>,
    {
        if let Some(e) = self.failure {
            return Err(e);
        }
        debug!(chunks = self.merged, "Scheduler drained");
        self.aggregator.finish()
    }
}
