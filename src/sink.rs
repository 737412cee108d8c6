use crate::error::{FastqError, Result};
use arrow::array::StringArray;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_COLUMN: &str = "extracted";
pub const DEFAULT_NAME: &str = "extracted";

/// Destination for a single named column of strings.
pub trait ColumnarSink {
    /// Persists `values` as column `column` under `name`, returning where it was written.
    ///
    /// On failure the values are returned inside [`FastqError::SinkWrite`].
    fn write_column(&self, name: &str, column: &str, values: Vec<String>) -> Result<PathBuf>;
}

/// Writes `<dir>/<name>.parquet`.
#[derive(Debug, Clone)]
pub struct ParquetSink {
    dir: PathBuf,
}

impl Default for ParquetSink {
    fn default() -> Self {
        ParquetSink {
            dir: PathBuf::from("."),
        }
    }
}

impl ParquetSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        ParquetSink {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.parquet", name))
    }

    fn write_batch(path: &Path, column: &str, values: &[String]) -> std::result::Result<(), String> {
        let schema = Arc::new(Schema::new(vec![Field::new(column, DataType::Utf8, false)]));
        let array = StringArray::from_iter_values(values.iter());
        let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(array)])
            .map_err(|e| e.to_string())?;

        let file = File::create(path).map_err(|e| e.to_string())?;
        let mut writer = ArrowWriter::try_new(file, schema, None).map_err(|e| e.to_string())?;
        writer.write(&batch).map_err(|e| e.to_string())?;
        writer.close().map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl ColumnarSink for ParquetSink {
    fn write_column(&self, name: &str, column: &str, values: Vec<String>) -> Result<PathBuf> {
        let path = self.path_for(name);
        match Self::write_batch(&path, column, &values) {
            Ok(()) => Ok(path),
            Err(reason) => Err(FastqError::SinkWrite {
                path,
                reason,
                unsaved: values,
            }),
        }
    }
}
