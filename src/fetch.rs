use reqwest::blocking::Client;
use std::time::Duration;

use crate::error::FetchError;
use crate::table::Table;

pub trait TableSource {
    fn fetch_table(&self, url: &str) -> Result<Table, FetchError>;
}

pub struct HttpTableSource {
    client: Client,
}

impl HttpTableSource {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .user_agent(concat!("bioassay-fetch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl TableSource for HttpTableSource {
    fn fetch_table(&self, url: &str) -> Result<Table, FetchError> {
        log::info!("Fetching table from {}", url);

        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(transport)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let body = response.text().map_err(transport)?;

        let table = Table::parse(&body).map_err(|reason| FetchError::NotTabular {
            url: url.to_string(),
            reason,
        })?;

        log::debug!(
            "Parsed {} rows x {} columns from {}",
            table.rows.len(),
            table.columns.len(),
            url
        );
        Ok(table)
    }
}
