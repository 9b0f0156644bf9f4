//! HTTP error mapping.
//!
//! Handlers return `Result<T, ApiError>`. Client-correctable failures keep the
//! public message of the API contract; internal failures are logged in full and
//! answered with a generic body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;
use weather_core::WeatherError;
use weather_core::model::{
    MSG_CITY_NOT_FOUND, MSG_CITY_REQUIRED, MSG_INTERNAL_ERROR, MessageBody,
};

#[derive(Debug)]
pub struct ApiError(pub WeatherError);

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            WeatherError::Validation(_) => (StatusCode::BAD_REQUEST, MSG_CITY_REQUIRED),
            WeatherError::NotFound(_) => (StatusCode::NOT_FOUND, MSG_CITY_NOT_FOUND),
            WeatherError::Upstream(_) | WeatherError::Store(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL_ERROR)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(MessageBody::new(message))).into_response()
    }
}
