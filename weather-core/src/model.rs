use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Body of a 400 response for a lookup without a city name.
pub const MSG_CITY_REQUIRED: &str = "City namerequired";
/// Body of a 404 response when the provider does not know the city.
pub const MSG_CITY_NOT_FOUND: &str = "City not found";
/// Body of any 500 response.
pub const MSG_INTERNAL_ERROR: &str = "Internal server error";
/// Body of a successful history wipe.
pub const MSG_DELETED: &str = "Delete successfully";

/// Normalized current conditions for one city, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    /// Provider icon code such as `"01d"`, if the provider sent one.
    pub icon: Option<String>,
}

/// A lookup result: the normalized snapshot plus the provider payload it came from.
///
/// The payload is what the HTTP API hands back under `data`, untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub snapshot: WeatherSnapshot,
    pub payload: Value,
}

/// One search event as persisted in the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub city_name: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    /// New record with a fresh id, stamped with the current time.
    pub fn new(city_name: impl Into<String>) -> Self {
        Self::at(city_name, Utc::now())
    }

    pub fn at(city_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            city_name: city_name.into(),
            timestamp,
        }
    }
}

/// Display unit for temperatures. Conversion happens at presentation time only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius reading into this unit.
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }
}

/// `200` body of `GET /getWeather/{city}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherEnvelope {
    pub data: Value,
}

/// `200` body of `GET /getHistory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEnvelope {
    pub weather: Vec<HistoryRecord>,
}

/// Any body that only carries a message: errors and delete confirmations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_record_serializes_with_mongo_style_id() {
        let record = HistoryRecord::new("Paris");
        let json = serde_json::to_value(&record).expect("record serializes");

        assert_eq!(json["_id"], record.id.as_str());
        assert_eq!(json["city_name"], "Paris");
        assert!(json["timestamp"].as_str().is_some());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn history_records_get_distinct_ids() {
        let a = HistoryRecord::new("Paris");
        let b = HistoryRecord::new("Paris");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn fahrenheit_conversion() {
        assert_eq!(TemperatureUnit::Fahrenheit.convert(0.0), 32.0);
        assert_eq!(TemperatureUnit::Fahrenheit.convert(100.0), 212.0);
        assert_eq!(TemperatureUnit::Celsius.convert(15.0), 15.0);
    }

    #[test]
    fn toggle_flips_between_units() {
        let unit = TemperatureUnit::default();
        assert_eq!(unit, TemperatureUnit::Celsius);
        assert_eq!(unit.toggled(), TemperatureUnit::Fahrenheit);
        assert_eq!(unit.toggled().toggled(), TemperatureUnit::Celsius);
        assert_eq!(unit.toggled().symbol(), "°F");
    }
}
