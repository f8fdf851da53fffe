use crate::config::FetcherConfig;
use crate::errors::FetchError;
use crate::scrape::{build_row, extract_session, extract_values, session_url};
use crate::storage::DatasetStore;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use tracing::{debug, info};

/// One scrape-and-append pipeline. Build it per run; it holds no state between runs.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
    store: DatasetStore,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let store = DatasetStore::from_config(&config.store)?;
        Self::with_store(config, store)
    }

    /// Uses `store` in place of the one `config.store` describes.
    pub fn with_store(config: FetcherConfig, store: DatasetStore) -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::builder().build()?,
            config,
            store,
        })
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub async fn run(&self) -> Result<String, FetchError> {
        self.run_at(Local::now().date_naive()).await
    }

    /// Runs the pipeline stamping the row with `today` and returns the appended line.
    pub async fn run_at(&self, today: NaiveDate) -> Result<String, FetchError> {
        let html = self.load_page().await?;
        let session = extract_session(&html)?;
        debug!(sheet_id = %session.sheet_id, "found session blob");

        let url = session_url(&self.config.dashboard_url, &session);
        let body = self.bootstrap(&url, &session.sheet_id).await?;
        let values = extract_values(&body)?;
        info!(count = values.len(), first = values[0], "extracted data values");

        let line = build_row(today, values, self.config.first_value_offset)?;
        self.store.append_line(&line).await?;
        info!(%line, store = %self.store, "fetch run complete");
        Ok(line)
    }

    async fn load_page(&self) -> Result<String, FetchError> {
        info!(url = %self.config.dashboard_url, "loading dashboard page");
        let resp = self
            .client
            .get(self.config.dashboard_url.clone())
            .query(&self.config.embed_params)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }

    async fn bootstrap(&self, url: &str, sheet_id: &str) -> Result<String, FetchError> {
        info!(%url, "requesting session data");
        let resp = self
            .client
            .post(url)
            .form(&[("sheet_id", sheet_id)])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}
