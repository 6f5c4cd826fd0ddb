use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use bioassay_fetch::FetchConfig;

#[derive(Parser, Debug)]
#[command(
    name = "bioassay-fetch",
    about = "Download the PubChem datatable for every AID listed in a spreadsheet",
    version
)]
pub struct Cli {
    /// JSON config file; flags below override its fields.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Spreadsheet (xlsx/xls/ods) or CSV holding the identifier column.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// URL prefix the identifier is appended to.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory the downloaded tables are written to.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Header of the identifier column.
    #[arg(long)]
    pub column: Option<String>,

    /// Worksheet name (defaults to the first sheet).
    #[arg(long)]
    pub sheet: Option<String>,

    /// Output file extension.
    #[arg(long)]
    pub extension: Option<String>,

    /// Log the planned requests without fetching or writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Write debug-level entries to the log file.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn resolve_config(&self) -> Result<FetchConfig> {
        let mut config = match &self.config {
            Some(path) => FetchConfig::from_file(path)?,
            None => FetchConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(column) = &self.column {
            config.id_column = column.clone();
        }
        if let Some(sheet) = &self.sheet {
            config.sheet = Some(sheet.clone());
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.clone();
        }

        config.normalize();
        config.validate()?;
        Ok(config)
    }
}
