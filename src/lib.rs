pub mod app;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod fetcher;
pub mod handlers;
pub mod length_prefixed;
pub mod models;
pub mod scrape;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::{FetcherConfig, PresenterConfig, StoreConfig};
pub use errors::{FetchError, StorageError};
pub use fetcher::Fetcher;
pub use state::AppState;
pub use storage::DatasetStore;
