//! Router construction and the three API handlers.
//!
//! | Method   | Path                 | Operation         |
//! |----------|----------------------|-------------------|
//! | `GET`    | `/getWeather/{city}` | look up a city    |
//! | `GET`    | `/getHistory`        | list all searches |
//! | `DELETE` | `/delete`            | wipe history      |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use weather_core::model::{HistoryEnvelope, MSG_DELETED, MessageBody, WeatherEnvelope};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the complete router.
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/getWeather/{city}", get(get_weather))
        // A blank city never matches `{city}`; route it so it reaches validation.
        .route("/getWeather/", get(get_weather_blank))
        .route("/getWeather", get(get_weather_blank))
        .route("/getHistory", get(get_history))
        .route("/delete", delete(delete_history))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Any origin, method and header.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
}

async fn get_weather(
    State(state): State<Arc<AppState>>,
    Path(city): Path<String>,
) -> Result<Json<WeatherEnvelope>, ApiError> {
    lookup(&state, &city).await
}

async fn get_weather_blank(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WeatherEnvelope>, ApiError> {
    lookup(&state, "").await
}

async fn lookup(state: &AppState, city: &str) -> Result<Json<WeatherEnvelope>, ApiError> {
    let current = state.service.lookup(city).await?;
    Ok(Json(WeatherEnvelope { data: current.payload }))
}

async fn get_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HistoryEnvelope>, ApiError> {
    let weather = state.service.list_history().await?;
    Ok(Json(HistoryEnvelope { weather }))
}

async fn delete_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageBody>, ApiError> {
    let deleted = state.service.clear_history().await?;
    info!(deleted, "history deleted via API");
    Ok(Json(MessageBody::new(MSG_DELETED)))
}
