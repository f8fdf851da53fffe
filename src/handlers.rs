use crate::chart::render;
use crate::dataset::parse_dataset;
use crate::errors::AppError;
use crate::models::DashboardView;
use crate::state::AppState;
use crate::ui::render_dashboard;
use axum::{extract::State, response::Html};
use tracing::{debug, error, warn};

pub const MALFORMED_DATA: &str = "The case data could not be read. The chart will return after the next successful update.";

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let text = state.store.read().await.map_err(|err| {
        error!(store = %state.store, "failed to load dataset: {err}");
        AppError::from(err)
    })?;

    let view = match parse_dataset(&text) {
        Ok(dataset) => {
            debug!(rows = dataset.len(), "rendering dashboard");
            render(&dataset, &state.settings)
        }
        Err(err) => {
            warn!(store = %state.store, "dataset is malformed: {err}");
            DashboardView::Empty {
                message: MALFORMED_DATA.to_string(),
            }
        }
    };

    Ok(Html(render_dashboard(&view)))
}
