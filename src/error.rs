use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::index::Identifier;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file {path:?} not found")]
    Missing { path: PathBuf },
    #[error("failed to read spreadsheet {path:?}: {source}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to read csv index {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("sheet '{sheet}' not found in {path:?}")]
    SheetMissing { path: PathBuf, sheet: String },
    #[error("{path:?} has no header row")]
    Empty { path: PathBuf },
    #[error("column '{column}' not found in {path:?}")]
    ColumnMissing { path: PathBuf, column: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("response from {url} is not a table: {reason}")]
    NotTabular { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create output directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("record {position} (AID {identifier}): {source}")]
    Fetch {
        position: usize,
        identifier: Identifier,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Write(#[from] WriteError),
}
