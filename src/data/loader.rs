//! Raw dataset loading

use crate::error::{FraudGuardError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Sub-directory of the data directory that holds raw datasets
pub const RAW_SUBDIR: &str = "raw";

/// Location where `fname` is expected under `data_dir`
pub fn raw_data_path(data_dir: impl AsRef<Path>, fname: &str) -> PathBuf {
    data_dir.as_ref().join(RAW_SUBDIR).join(fname)
}

/// Load a raw dataset from `<data_dir>/raw/<fname>`.
///
/// Fails with [`FraudGuardError::DataNotFound`] naming the expected location
/// when the file is absent. Column types are whatever the reader infers.
pub fn load_raw_data(data_dir: impl AsRef<Path>, fname: &str) -> Result<DataFrame> {
    let path = raw_data_path(data_dir, fname);
    info!(path = %path.display(), "Loading data");

    if !path.exists() {
        return Err(FraudGuardError::DataNotFound { path });
    }

    let df = read_table(&path)?;
    info!(rows = df.height(), columns = df.width(), "Loaded dataset");
    Ok(df)
}

/// Read a CSV, JSON or Parquet file, picking the reader by extension
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let df = match ext.as_str() {
        "csv" | "" => CsvReadOptions::default()
            .with_infer_schema_length(Some(1000))
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        "json" => JsonReader::new(File::open(path)?).finish()?,
        "parquet" => ParquetReader::new(File::open(path)?).finish()?,
        other => {
            return Err(FraudGuardError::DataError(format!(
                "Unsupported file format: {}",
                other
            )))
        }
    };

    Ok(df)
}
