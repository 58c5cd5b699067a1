use crate::store::Table;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Table file not found: {0} (run `pcmp init` to create an empty store)")]
    Missing(PathBuf),

    #[error("Failed to read table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed row {row} in {path}: {source}")]
    Parse {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to encode row for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write table {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid id sequence file {path}: {source}")]
    Sequence {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Table {0} has no id column")]
    Unkeyed(Table),
}
