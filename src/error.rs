use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FastqError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot open {}: {source}", path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Sequence and quality lengths don't match (seq: {seq_len}, qual: {qual_len})")]
    LengthMismatch { seq_len: usize, qual_len: usize },

    #[error("Invalid record: {msg}")]
    InvalidRecord { msg: String },

    #[error("Worker failed on chunk {chunk}: {source}")]
    Worker {
        chunk: usize,
        #[source]
        source: Box<FastqError>,
    },

    /// The computed column is handed back in `unsaved` so it is not lost with the write.
    #[error("Failed to write {}: {reason}", path.display())]
    SinkWrite {
        path: PathBuf,
        reason: String,
        unsaved: Vec<String>,
    },

    #[error("Invalid configuration: {msg}")]
    InvalidConfig { msg: String },
}

impl FastqError {
    /// Values that were computed but could not be persisted, if any.
    pub fn into_unsaved(self) -> Option<Vec<String>> {
        match self {
            FastqError::SinkWrite { unsaved, .. } => Some(unsaved),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FastqError>;
