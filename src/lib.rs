pub mod batch;
pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod table;

pub use batch::{BatchFetcher, BatchReport, Progress};
pub use config::FetchConfig;
pub use error::{BatchError, FetchError, LoadError, WriteError};
pub use fetch::{HttpTableSource, TableSource};
pub use index::{load_identifiers, Identifier};
pub use table::Table;
