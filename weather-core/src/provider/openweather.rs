use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::WeatherError,
    model::{CurrentWeather, WeatherSnapshot},
};

use super::{Units, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn request_current(&self, city: &str, units: Units) -> Result<CurrentWeather, WeatherError> {
        let url = format!("{}/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", units.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (current weather)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather current response body")?;

        // The provider reports "not found" inside the body, so look there before
        // trusting the transport status.
        let payload: Value = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(err) if status.is_success() => {
                return Err(anyhow!(err).context("Failed to parse OpenWeather current JSON").into());
            }
            Err(_) => {
                return Err(anyhow!(
                    "OpenWeather current request failed with status {}: {}",
                    status,
                    truncate_body(&body),
                )
                .into());
            }
        };

        if is_not_found(&payload) {
            debug!(%city, "OpenWeather reported city not found");
            return Err(WeatherError::NotFound(city.to_string()));
        }

        if !status.is_success() {
            warn!(%status, "OpenWeather current request failed");
            return Err(anyhow!(
                "OpenWeather current request failed with status {}: {}",
                status,
                truncate_body(&body),
            )
            .into());
        }

        Ok(parse_current(payload).context("OpenWeather current JSON is missing weather fields")?)
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: OwCoord,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

/// Normalize an OpenWeather "current weather" payload.
///
/// The payload is kept alongside the snapshot so it can be relayed as-is.
pub fn parse_current(payload: Value) -> Result<CurrentWeather, serde_json::Error> {
    let parsed = OwCurrentResponse::deserialize(&payload)?;

    let icon = parsed.weather.into_iter().next().and_then(|w| w.icon);

    let snapshot = WeatherSnapshot {
        city: parsed.name,
        country: parsed.sys.country,
        latitude: parsed.coord.lat,
        longitude: parsed.coord.lon,
        temperature_c: parsed.main.temp,
        humidity_pct: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
        icon,
    };

    Ok(CurrentWeather { snapshot, payload })
}

/// OpenWeather sends `cod` as the string `"404"`; accept the number too.
fn is_not_found(payload: &Value) -> bool {
    match payload.get("cod") {
        Some(Value::String(code)) => code == "404",
        Some(Value::Number(code)) => code.as_u64() == Some(404),
        _ => false,
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, city: &str, units: Units) -> Result<CurrentWeather, WeatherError> {
        self.request_current(city, units).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn london_payload() -> Value {
        json!({
            "coord": { "lon": -0.1257, "lat": 51.5085 },
            "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
            "main": { "temp": 15, "feels_like": 14.2, "humidity": 70 },
            "wind": { "speed": 4.1, "deg": 240 },
            "sys": { "country": "GB" },
            "name": "London",
            "cod": 200
        })
    }

    #[test]
    fn parse_current_normalizes_payload() {
        let current = parse_current(london_payload()).expect("payload parses");

        assert_eq!(current.snapshot.city, "London");
        assert_eq!(current.snapshot.country, "GB");
        assert_eq!(current.snapshot.latitude, 51.5085);
        assert_eq!(current.snapshot.longitude, -0.1257);
        assert_eq!(current.snapshot.temperature_c, 15.0);
        assert_eq!(current.snapshot.humidity_pct, 70);
        assert_eq!(current.snapshot.wind_speed, 4.1);
        assert_eq!(current.snapshot.icon.as_deref(), Some("04d"));
        assert_eq!(current.payload, london_payload());
    }

    #[test]
    fn parse_current_rejects_payload_without_main() {
        let err = parse_current(json!({ "name": "London", "cod": 200 }));
        assert!(err.is_err());
    }

    #[test]
    fn not_found_code_accepts_string_and_number() {
        assert!(is_not_found(&json!({ "cod": "404", "message": "city not found" })));
        assert!(is_not_found(&json!({ "cod": 404 })));
        assert!(!is_not_found(&json!({ "cod": 200 })));
        assert!(!is_not_found(&json!({ "cod": "401" })));
        assert!(!is_not_found(&json!({})));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
    }

    #[tokio::test]
    async fn fetch_current_sends_city_key_and_units() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", "KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london_payload()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
        let current = provider.fetch_current("London", Units::Metric).await.unwrap();

        assert_eq!(current.snapshot.city, "London");
        assert_eq!(current.payload["main"]["humidity"], 70);
    }

    #[tokio::test]
    async fn fetch_current_maps_cod_404_to_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "cod": "404", "message": "city not found" })),
            )
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
        let err = provider.fetch_current("Nowhereville", Units::Metric).await.unwrap_err();

        assert!(matches!(err, WeatherError::NotFound(city) if city == "Nowhereville"));
    }

    #[tokio::test]
    async fn fetch_current_maps_bad_credential_to_upstream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "cod": 401, "message": "Invalid API key." })),
            )
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("BAD".into(), mock_server.uri());
        let err = provider.fetch_current("London", Units::Metric).await.unwrap_err();

        assert!(matches!(err, WeatherError::Upstream(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn fetch_current_maps_non_json_error_to_upstream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
        let err = provider.fetch_current("London", Units::Metric).await.unwrap_err();

        assert!(matches!(err, WeatherError::Upstream(_)));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[tokio::test]
    async fn fetch_current_maps_malformed_success_to_upstream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cod": 200 })))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
        let err = provider.fetch_current("London", Units::Metric).await.unwrap_err();

        assert!(matches!(err, WeatherError::Upstream(_)));
    }

    #[tokio::test]
    async fn fetch_current_maps_unreachable_host_to_upstream() {
        // Nothing listens on port 9 locally; the connection is refused.
        let provider = OpenWeatherProvider::with_base_url("KEY".into(), "http://127.0.0.1:9".into());
        let err = provider.fetch_current("London", Units::Metric).await.unwrap_err();

        assert!(matches!(err, WeatherError::Upstream(_)));
    }
}
