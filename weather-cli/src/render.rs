//! Plain-text rendering of the session.

use std::fmt::Write;

use chrono::Local;
use weather_core::{HistoryRecord, TemperatureUnit, WeatherSnapshot};

use crate::session::{SearchSession, SearchStatus};

const BAR_WIDTH: f64 = 40.0;

/// Celsius is shown as a whole degree; Fahrenheit is converted from that and shown to one decimal.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    let whole = celsius.floor();
    match unit {
        TemperatureUnit::Celsius => format!("{whole:.0}{}", unit.symbol()),
        TemperatureUnit::Fahrenheit => format!("{:.1}{}", unit.convert(whole), unit.symbol()),
    }
}

pub fn render_snapshot(snapshot: &WeatherSnapshot, unit: TemperatureUnit) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format_temperature(snapshot.temperature_c, unit));
    let _ = writeln!(out, "{}", snapshot.city);
    let _ = writeln!(out, "{}", snapshot.country);
    let _ = writeln!(out, "Latitude: {}  Longitude: {}", snapshot.latitude, snapshot.longitude);
    let _ = writeln!(out, "Humidity: {}%", snapshot.humidity_pct);
    let _ = writeln!(out, "Wind Speed: {} km/h", snapshot.wind_speed);
    out
}

pub fn render_history(history: &[HistoryRecord]) -> String {
    if history.is_empty() {
        return "No Search history available\n".to_string();
    }

    let mut out = String::from("Search History\n");
    for entry in history {
        let local = entry.timestamp.with_timezone(&Local);
        let _ = writeln!(out, "  {} - {}", entry.city_name, local.format("%Y-%m-%d %H:%M:%S"));
    }
    out
}

/// Temperature and humidity observed this session, one row per point.
pub fn render_chart(temperatures: &[f64], humidities: &[u8]) -> String {
    if temperatures.is_empty() {
        return String::new();
    }

    let max_temp = temperatures.iter().fold(1.0_f64, |acc, t| acc.max(t.abs()));

    let mut out = String::from("Temperature and Humidity Over Time\n");
    for (i, temp) in temperatures.iter().enumerate() {
        let humidity = humidities.get(i).copied().unwrap_or_default();
        let temp_bar = "#".repeat((temp.abs() / max_temp * BAR_WIDTH / 2.0).round() as usize);
        let hum_bar = "=".repeat((f64::from(humidity) / 100.0 * BAR_WIDTH / 2.0).round() as usize);
        let _ = writeln!(
            out,
            "  Point {:<3} {:>5.0}°C {:<20} {:>3}% {}",
            i + 1,
            temp,
            temp_bar,
            humidity,
            hum_bar
        );
    }
    out
}

/// Everything the session currently shows, top to bottom.
pub fn render_session(session: &SearchSession) -> String {
    let mut out = String::new();

    if session.is_loading() {
        out.push_str("Loading...\n");
    }

    match session.status() {
        SearchStatus::NotFound => out.push_str("City not found\n"),
        SearchStatus::Error(message) => {
            let _ = writeln!(out, "{message}");
        }
        SearchStatus::Idle | SearchStatus::Loading | SearchStatus::Displaying => {}
    }

    if let Some(snapshot) = session.visible_snapshot() {
        out.push_str(&render_snapshot(snapshot, session.unit()));
        out.push('\n');
        out.push_str(&render_chart(session.temperatures(), session.humidities()));
        out.push('\n');
    }

    if let Some(notice) = session.notice() {
        let _ = writeln!(out, "{notice}");
    }

    out.push_str(&render_history(session.history()));
    out
}
