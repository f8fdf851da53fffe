//! One scrape-and-append run. Meant to be started by an external scheduler; a failed run
//! exits non-zero and leaves the dataset untouched.

use case_tracker::{Fetcher, FetcherConfig};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = match FetcherConfig::from_env(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(err) => {
            error!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let fetcher = match Fetcher::new(config) {
        Ok(fetcher) => fetcher,
        Err(err) => {
            error!("failed to start fetcher: {err}");
            return ExitCode::FAILURE;
        }
    };

    match fetcher.run().await {
        Ok(line) => {
            info!(%line, "row appended");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("fetch run failed: {err}");
            ExitCode::FAILURE
        }
    }
}
