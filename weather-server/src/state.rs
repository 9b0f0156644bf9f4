//! Shared application state injected into every handler.

use weather_core::WeatherService;

#[derive(Debug, Clone)]
pub struct AppState {
    pub service: WeatherService,
}
