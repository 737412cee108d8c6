pub mod aggregate;
pub mod chunk;
pub mod config;
pub mod error;
pub mod reader;
pub mod record;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod transform;
pub mod writer;

pub use aggregate::{Aggregator, OrderedConcat, Summation};
pub use chunk::{group_records, load_chunk, Chunk, ChunkLoader};
pub use config::ReaderConfig;
pub use error::{FastqError, Result};
pub use reader::{Extracted, FastqReader, FastqReaderBuilder, Records};
pub use record::{mean_phred33, RawRecord, Record};
pub use scheduler::Scheduler;
pub use sink::{ColumnarSink, ParquetSink};
pub use source::{Compression, LineSource};
pub use transform::{slice_clamped, EndTrimmer, Extractor, QualityFilter, RecordCount, Transform};
pub use writer::FastqWriter;
