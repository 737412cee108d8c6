use crate::{error::Result, record::Record, source::Compression};
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub enum FastqWriter<W: Write> {
    Plain(BufWriter<W>),
    Gzip(GzEncoder<BufWriter<W>>),
}

impl FastqWriter<File> {
    /// Creates `path`, gzip-compressing when it ends in `.gz`.
    pub fn to_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;

        match Compression::from_path(path) {
            Compression::Gzip => Ok(FastqWriter::Gzip(GzEncoder::new(
                BufWriter::new(file),
                flate2::Compression::default(),
            ))),
            Compression::Plain => Ok(FastqWriter::Plain(BufWriter::new(file))),
        }
    }
}

impl<W: Write> FastqWriter<W> {
    pub fn new(writer: W) -> Self {
        FastqWriter::Plain(BufWriter::new(writer))
    }

    pub fn new_gzip(writer: W, level: flate2::Compression) -> Self {
        FastqWriter::Gzip(GzEncoder::new(BufWriter::new(writer), level))
    }

    fn inner(&mut self) -> &mut dyn Write {
        match self {
            FastqWriter::Plain(w) => w,
            FastqWriter::Gzip(w) => w,
        }
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let writer = self.inner();
        writer.write_all(record.info.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.write_all(record.seq.as_bytes())?;
        writer.write_all(b"\n+\n")?;
        writer.write_all(record.quality.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_records<'r, I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let mut written = 0;
        for record in records {
            self.write_record(record)?;
            written += 1;
        }
        Ok(written)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner().flush()?;
        Ok(())
    }

    /// Flushes and, for gzip output, writes the stream trailer.
    pub fn finish(self) -> Result<()> {
        match self {
            FastqWriter::Plain(mut w) => w.flush()?,
            FastqWriter::Gzip(w) => {
                w.finish()?.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::MultiGzDecoder;
    use std::io::Read;

    #[test]
    fn test_write_records() {
        let records = vec![
            Record::new("@r1 desc", "ACGT", "IIII"),
            Record::new("@r2", "", ""),
        ];
        let mut buffer = Vec::new();
        {
            let mut writer = FastqWriter::new(&mut buffer);
            assert_eq!(writer.write_records(&records).unwrap(), 2);
            writer.finish().unwrap();
        }
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "@r1 desc\nACGT\n+\nIIII\n@r2\n\n+\n\n"
        );
    }

    #[test]
    fn test_gzip_output() {
        let mut buffer = Vec::new();
        {
            let mut writer = FastqWriter::new_gzip(&mut buffer, flate2::Compression::fast());
            writer.write_record(&Record::new("@r1", "AC", "II")).unwrap();
            writer.finish().unwrap();
        }
        let mut text = String::new();
        MultiGzDecoder::new(&buffer[..])
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "@r1\nAC\n+\nII\n");
    }
}
