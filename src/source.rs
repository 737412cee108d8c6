use crate::error::{FastqError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
}

impl Compression {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        if path.as_ref().extension().and_then(|s| s.to_str()) == Some("gz") {
            Compression::Gzip
        } else {
            Compression::Plain
        }
    }
}

/// Text line stream over a FASTQ file, decompressing `.gz` inputs transparently.
pub struct LineSource {
    path: PathBuf,
    compression: Compression,
    reader: Box<dyn BufRead + Send>,
    buf: String,
}

impl LineSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let compression = Compression::from_path(&path);
        let reader = Self::open_reader(&path, compression)?;
        Ok(LineSource {
            path,
            compression,
            reader,
            buf: String::new(),
        })
    }

    fn open_reader(path: &Path, compression: Compression) -> Result<Box<dyn BufRead + Send>> {
        let source_open = |source| FastqError::SourceOpen {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(source_open)?;
        let is_empty = file.metadata().map_err(source_open)?.len() == 0;

        let mut reader: Box<dyn BufRead + Send> = match compression {
            Compression::Plain => Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)),
            // A zero-byte .gz has no gzip header at all; read it as an empty stream.
            Compression::Gzip if is_empty => Box::new(io::empty()),
            Compression::Gzip => Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                MultiGzDecoder::new(BufReader::new(file)),
            )),
        };
        // Pull the first block so a corrupt gzip header fails here, not mid-operation.
        reader.fill_buf().map_err(source_open)?;
        Ok(reader)
    }

    /// Closes the current handle and starts over from the beginning of the file.
    pub fn reopen(&mut self) -> Result<()> {
        self.reader = Self::open_reader(&self.path, self.compression)?;
        Ok(())
    }

    /// Next line with its line terminator (`\n` or `\r\n`) removed, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.ends_with('\n') {
            self.buf.pop();
            if self.buf.ends_with('\r') {
                self.buf.pop();
            }
        }
        Ok(Some(self.buf.clone()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn drain(source: &mut LineSource) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = source.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_compression_from_path() {
        assert_eq!(Compression::from_path("reads.fastq.gz"), Compression::Gzip);
        assert_eq!(Compression::from_path("reads.fastq"), Compression::Plain);
        assert_eq!(Compression::from_path("reads"), Compression::Plain);
    }

    #[test]
    fn test_strips_line_endings() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"@r1\r\nACGT\n+\nIIII").unwrap();

        let mut source = LineSource::open(file.path()).unwrap();
        assert_eq!(drain(&mut source), vec!["@r1", "ACGT", "+", "IIII"]);
    }

    #[test]
    fn test_reopen_restarts() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a\nb\n").unwrap();

        let mut source = LineSource::open(file.path()).unwrap();
        assert_eq!(source.next_line().unwrap().as_deref(), Some("a"));
        source.reopen().unwrap();
        assert_eq!(drain(&mut source), vec!["a", "b"]);
    }

    #[test]
    fn test_gzip_source() {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"@r1\nACGT\n+\nIIII\n").unwrap();
        let mut file = NamedTempFile::with_suffix(".fastq.gz").unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();

        let mut source = LineSource::open(file.path()).unwrap();
        assert_eq!(source.compression(), Compression::Gzip);
        assert_eq!(drain(&mut source).len(), 4);
    }

    #[test]
    fn test_empty_gzip_file_has_no_lines() {
        let file = NamedTempFile::with_suffix(".fastq.gz").unwrap();

        let mut source = LineSource::open(file.path()).unwrap();
        assert_eq!(source.compression(), Compression::Gzip);
        assert!(source.next_line().unwrap().is_none());
        source.reopen().unwrap();
        assert!(drain(&mut source).is_empty());
    }

    #[test]
    fn test_missing_file() {
        match LineSource::open("/nonexistent/reads.fastq") {
            Err(FastqError::SourceOpen { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/reads.fastq"))
            }
            _ => panic!("Expected SourceOpen error"),
        }
    }

    #[test]
    fn test_corrupt_gzip_fails_on_open() {
        let mut file = NamedTempFile::with_suffix(".fastq.gz").unwrap();
        file.write_all(b"this is not gzip data").unwrap();

        assert!(matches!(
            LineSource::open(file.path()),
            Err(FastqError::SourceOpen { .. })
        ));
    }
}
