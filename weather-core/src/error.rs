use thiserror::Error;

/// Failures a weather lookup or a history operation can end in.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Required input was missing; the caller can correct it.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The provider has no data for the requested city.
    #[error("city not found: {0}")]
    NotFound(String),

    /// The provider could not be reached or answered with something unusable.
    #[error("upstream weather provider failed: {0:#}")]
    Upstream(#[from] anyhow::Error),

    /// The history store rejected a read or write.
    #[error("history store failed: {0}")]
    Store(#[from] sqlx::Error),
}

impl WeatherError {
    /// Whether the caller could fix the request and try again.
    pub fn is_client_error(&self) -> bool {
        matches!(self, WeatherError::Validation(_) | WeatherError::NotFound(_))
    }
}
