use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/assay/pcget.cgi?query=download&record_type=datatable&actvty=all&response_type=save&aid=";
pub const DEFAULT_INPUT_PATH: &str = "../data/literature/KYHelal_etal_2016_JCIM_supplement.xlsx";
pub const DEFAULT_OUTPUT_DIR: &str = "../data/1-raw/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub input_path: PathBuf,
    pub base_url: String,
    pub output_dir: PathBuf,
    pub id_column: String,
    pub extension: String,
    pub sheet: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            id_column: "AID".to_string(),
            extension: "csv".to_string(),
            sheet: None,
        }
    }
}

impl FetchConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        log::info!("Loading config from: {:?}", path);
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let mut config: FetchConfig =
            serde_json::from_str(&text).context("Failed to parse config JSON")?;

        config.normalize();
        config.validate()?;
        Ok(config)
    }

    // ".csv" and "csv" name the same extension.
    pub fn normalize(&mut self) {
        self.extension = self.extension.trim_start_matches('.').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            anyhow::bail!("Config input_path is empty");
        }

        if self.base_url.is_empty() {
            anyhow::bail!("Config base_url is empty");
        }

        if self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("Config output_dir is empty");
        }

        if self.id_column.trim().is_empty() {
            anyhow::bail!("Config id_column is empty");
        }

        if self.extension.is_empty()
            || self.extension.starts_with('.')
            || self.extension.contains(['/', '\\'])
        {
            anyhow::bail!("Config extension {:?} is not a file extension", self.extension);
        }

        Ok(())
    }
}
