use crate::config::PresenterConfig;
use crate::storage::DatasetStore;
use std::sync::Arc;

/// Shared per-server values. Nothing here is mutated after startup; every request reads the
/// dataset fresh from `store`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DatasetStore>,
    pub settings: Arc<PresenterConfig>,
}

impl AppState {
    pub fn new(store: DatasetStore, settings: PresenterConfig) -> Self {
        Self {
            store: Arc::new(store),
            settings: Arc::new(settings),
        }
    }
}
