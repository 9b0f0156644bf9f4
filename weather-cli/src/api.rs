//! HTTP client for the weather backend.

use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use weather_core::model::{HistoryEnvelope, MessageBody, WeatherEnvelope};
use weather_core::provider::openweather::parse_current;
use weather_core::{CurrentWeather, HistoryRecord};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("city not found")]
    NotFound,

    #[error("backend answered {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("request to backend failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response from backend: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid backend URL '{0}'")]
    InvalidUrl(String),
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: Url,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { base_url, http: Client::new() })
    }

    /// `GET /getWeather/{city}`, with `city` percent-encoded as one path segment.
    pub async fn get_weather(&self, city: &str) -> Result<CurrentWeather, ClientError> {
        let url = self.endpoint(&["getWeather", city])?;
        let res = self.http.get(url).send().await?;
        let body = Self::success_body(res).await?;
        let envelope: WeatherEnvelope = serde_json::from_str(&body)?;
        Ok(parse_current(envelope.data)?)
    }

    /// `GET /getHistory`.
    pub async fn get_history(&self) -> Result<Vec<HistoryRecord>, ClientError> {
        let url = self.endpoint(&["getHistory"])?;
        let res = self.http.get(url).send().await?;
        let body = Self::success_body(res).await?;
        let envelope: HistoryEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.weather)
    }

    /// `DELETE /delete`. Returns the backend's confirmation message.
    pub async fn clear_history(&self) -> Result<String, ClientError> {
        let url = self.endpoint(&["delete"])?;
        let res = self.http.delete(url).send().await?;
        let body = Self::success_body(res).await?;
        let message: MessageBody = serde_json::from_str(&body)?;
        Ok(message.message)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn success_body(res: reqwest::Response) -> Result<String, ClientError> {
        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !status.is_success() {
            let message = serde_json::from_str::<MessageBody>(&body)
                .map(|m| m.message)
                .unwrap_or(body);
            return Err(ClientError::Status { status, message });
        }
        Ok(body)
    }
}
