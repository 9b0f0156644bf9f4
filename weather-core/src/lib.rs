//! Core library for the weather lookup service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream weather provider client
//! - The search history store
//! - The weather service that ties them together
//! - Shared domain models and HTTP wire bodies
//!
//! It is used by `weather-server` and `weather-cli`.

pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod provider;
pub mod service;

pub use config::{ClientConfig, Config, ProviderConfig, ServerConfig};
pub use error::WeatherError;
pub use history::{HistoryStore, SqliteHistoryStore};
pub use model::{
    CurrentWeather, HistoryEnvelope, HistoryRecord, MessageBody, TemperatureUnit,
    WeatherEnvelope, WeatherSnapshot,
};
pub use provider::{Units, WeatherProvider, provider_from_config};
pub use service::WeatherService;
