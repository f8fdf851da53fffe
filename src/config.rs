//! Process configuration, read once from the environment at startup.

use std::{env, path::PathBuf};
use thiserror::Error;
use url::Url;

/// Query parameters that ask the dashboard for its bare embedded rendering.
pub const EMBED_PARAMS: &[(&str, &str)] = &[
    (":embed", "y"),
    (":showVizHome", "no"),
    (":host_url", "https://public.tableau.com/"),
    (":embed_code_version", "3"),
    (":tabs", "no"),
    (":toolbar", "no"),
    (":animate_transition", "yes"),
    (":display_static_image", "yes"),
    (":display_spinner", "no"),
    (":display_overlay", "yes"),
    (":display_count", "yes"),
    (":language", "en"),
    (":loadOrderID", "0"),
];

/// Added to the first scraped value. Calibrates for the upstream source resetting its total
/// once; not something to recompute per run.
pub const FIRST_VALUE_OFFSET: i64 = 80;

/// The first persisted row predates a correction in the source and is left off the chart.
pub const SKIP_FIRST_ROW: bool = true;

pub const DEFAULT_DATA_PATH: &str = "data/cases.csv";
pub const DEFAULT_OBJECT_KEY: &str = "msu_covid.csv";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Local(PathBuf),
    /// An S3 bucket. Credentials, region and endpoint come from the standard `AWS_*`
    /// variables when the store is built.
    Object { bucket: String, key: String },
}

impl StoreConfig {
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(bucket) = non_empty(lookup("AWS_STORAGE_BUCKET_NAME")) {
            return Ok(Self::Object {
                bucket,
                key: non_empty(lookup("DATASET_KEY"))
                    .unwrap_or_else(|| DEFAULT_OBJECT_KEY.to_string()),
            });
        }

        let path = non_empty(lookup("APP_DATA_PATH")).unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());
        Ok(Self::Local(PathBuf::from(path)))
    }
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub dashboard_url: Url,
    pub embed_params: Vec<(String, String)>,
    pub first_value_offset: i64,
    pub store: StoreConfig,
}

impl FetcherConfig {
    /// `dashboard_url` overrides `DASHBOARD_URL` when given (the `fetch` binary passes its
    /// first argument here).
    pub fn from_env(dashboard_url: Option<String>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| env::var(name).ok();
        match dashboard_url {
            Some(url) => Self::from_vars(|name| {
                if name == "DASHBOARD_URL" {
                    Some(url.clone())
                } else {
                    lookup(name)
                }
            }),
            None => Self::from_vars(lookup),
        }
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = non_empty(lookup("DASHBOARD_URL")).ok_or(ConfigError::Missing("DASHBOARD_URL"))?;
        let dashboard_url = parse_url("DASHBOARD_URL", raw)?;

        let first_value_offset = match non_empty(lookup("FIRST_VALUE_OFFSET")) {
            Some(raw) => raw.parse::<i64>().map_err(|err| ConfigError::Invalid {
                name: "FIRST_VALUE_OFFSET",
                value: raw.clone(),
                reason: err.to_string(),
            })?,
            None => FIRST_VALUE_OFFSET,
        };

        Ok(Self {
            dashboard_url,
            embed_params: EMBED_PARAMS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            first_value_offset,
            store: StoreConfig::from_vars(&lookup)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PresenterConfig {
    pub skip_first_row: bool,
    pub store: StoreConfig,
}

impl PresenterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let skip_first_row = match non_empty(lookup("SKIP_FIRST_ROW")) {
            Some(raw) => parse_flag("SKIP_FIRST_ROW", raw)?,
            None => SKIP_FIRST_ROW,
        };

        Ok(Self {
            skip_first_row,
            store: StoreConfig::from_vars(&lookup)?,
        })
    }
}

pub fn resolve_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_url(name: &'static str, raw: String) -> Result<Url, ConfigError> {
    Url::parse(&raw).map_err(|err| ConfigError::Invalid {
        name,
        value: raw.clone(),
        reason: err.to_string(),
    })
}

fn parse_flag(name: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}
