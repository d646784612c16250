//! Current-conditions client for the OpenWeatherMap `/data/2.5/weather` API.

use crate::location::Location;
use clap::ValueEnum;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("no weather API key configured (set --api-key or OPENWEATHER_API_KEY)")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("weather service returned status {0}")]
    Status(StatusCode),
    #[error("unexpected weather payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("weather payload has no condition entry")]
    MissingCondition,
}

/// Unit system requested from the service. Rain is always in mm and
/// humidity always in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    /// Kelvin and m/s
    Standard,
}

impl Units {
    /// Value of the `units` query parameter
    pub fn as_query(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub fn temperature_suffix(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => " K",
        }
    }

    pub fn speed_suffix(self) -> &'static str {
        match self {
            Units::Imperial => " mph",
            Units::Metric | Units::Standard => " m/s",
        }
    }
}

/// One point-in-time reading
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// In the unit system named by `units`
    pub temperature: f64,
    pub humidity_pct: f64,
    /// None when the service reports no rain block at all
    pub rain_1h_mm: Option<f64>,
    pub wind_speed: f64,
    pub description: String,
    pub units: Units,
}

impl WeatherSnapshot {
    /// Label/value rows for the weather panel
    pub fn summary_rows(&self) -> Vec<(&'static str, String)> {
        let rain = match self.rain_1h_mm {
            Some(mm) if mm != 0.0 => format!("{mm}"),
            _ => "0".to_string(),
        };
        vec![
            ("Condition", self.description.clone()),
            (
                "Temperature",
                format!("{}{}", self.temperature, self.units.temperature_suffix()),
            ),
            ("Humidity", format!("{}%", self.humidity_pct)),
            ("Rain (1h)", format!("{rain} mm")),
            ("Wind", format!("{}{}", self.wind_speed, self.units.speed_suffix())),
        ]
    }
}

#[derive(Deserialize)]
struct CurrentWeatherResponse {
    weather: Vec<Condition>,
    main: Main,
    #[serde(default)]
    rain: Option<Rain>,
    wind: Wind,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
}

#[derive(Deserialize)]
struct Main {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct Rain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Deserialize)]
struct Wind {
    speed: f64,
}

/// Decode a current-weather body requested in `units`.
/// A rain block without a `1h` figure still counts as a rain reading of 0.
pub fn parse_current(body: &str, units: Units) -> Result<WeatherSnapshot, WeatherError> {
    let data: CurrentWeatherResponse = serde_json::from_str(body)?;
    let description = data
        .weather
        .into_iter()
        .next()
        .map(|c| c.description)
        .ok_or(WeatherError::MissingCondition)?;

    Ok(WeatherSnapshot {
        temperature: data.main.temp,
        humidity_pct: data.main.humidity,
        rain_1h_mm: data.rain.map(|r| r.one_hour.unwrap_or(0.0)),
        wind_speed: data.wind.speed,
        description,
        units,
    })
}

/// Blocking client; run it off the UI thread
pub struct WeatherClient {
    http: Client,
    url: String,
    api_key: Option<String>,
    units: Units,
}

impl WeatherClient {
    pub fn new(http: Client, url: impl Into<String>, api_key: Option<String>, units: Units) -> Self {
        Self {
            http,
            url: url.into(),
            api_key,
            units,
        }
    }

    pub fn fetch_current(&self, at: Location) -> Result<WeatherSnapshot, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        debug!(lat = at.lat, lon = at.lon, units = self.units.as_query(), "fetching current weather");

        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lon", at.lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", self.units.as_query().to_string()),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status()));
        }
        parse_current(&response.text()?, self.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAINY: &str = r#"{
        "coord": {"lon": 78.96, "lat": 20.59},
        "weather": [{"id": 501, "main": "Rain", "description": "moderate rain", "icon": "10d"}],
        "main": {"temp": 27.4, "feels_like": 31.2, "humidity": 88, "pressure": 1004},
        "wind": {"speed": 5.1, "deg": 240},
        "rain": {"1h": 3.2},
        "name": "Nagpur"
    }"#;

    #[test]
    fn test_parse_with_rain() {
        let snapshot = parse_current(RAINY, Units::Metric).unwrap();
        assert_eq!(snapshot.description, "moderate rain");
        assert_eq!(snapshot.temperature, 27.4);
        assert_eq!(snapshot.humidity_pct, 88.0);
        assert_eq!(snapshot.rain_1h_mm, Some(3.2));
        assert_eq!(snapshot.wind_speed, 5.1);
    }

    #[test]
    fn test_parse_without_rain() {
        let body = r#"{"weather": [{"description": "clear sky"}],
            "main": {"temp": 31, "humidity": 40}, "wind": {"speed": 2}}"#;
        let snapshot = parse_current(body, Units::Metric).unwrap();
        assert_eq!(snapshot.rain_1h_mm, None);
        assert_eq!(snapshot.summary_rows()[3], ("Rain (1h)", "0 mm".to_string()));
    }

    #[test]
    fn test_rain_block_without_hourly_figure() {
        let body = r#"{"weather": [{"description": "light rain"}],
            "main": {"temp": 22, "humidity": 91}, "wind": {"speed": 1.5}, "rain": {"3h": 4.0}}"#;
        let snapshot = parse_current(body, Units::Metric).unwrap();
        assert_eq!(snapshot.rain_1h_mm, Some(0.0));
    }

    #[test]
    fn test_missing_condition() {
        let body = r#"{"weather": [], "main": {"temp": 22, "humidity": 91}, "wind": {"speed": 1.5}}"#;
        assert!(matches!(parse_current(body, Units::Metric), Err(WeatherError::MissingCondition)));
        assert!(matches!(parse_current("{}", Units::Metric), Err(WeatherError::Parse(_))));
    }

    #[test]
    fn test_summary_rows() {
        let rows = parse_current(RAINY, Units::Metric).unwrap().summary_rows();
        let labels: Vec<&str> = rows.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, ["Condition", "Temperature", "Humidity", "Rain (1h)", "Wind"]);
        assert_eq!(rows[1].1, "27.4°C");
        assert_eq!(rows[2].1, "88%");
        assert_eq!(rows[3].1, "3.2 mm");
        assert_eq!(rows[4].1, "5.1 m/s");
    }

    #[test]
    fn test_summary_rows_follow_unit_system() {
        let rows = parse_current(RAINY, Units::Imperial).unwrap().summary_rows();
        assert_eq!(rows[1].1, "27.4°F");
        assert_eq!(rows[3].1, "3.2 mm");
        assert_eq!(rows[4].1, "5.1 mph");

        let rows = parse_current(RAINY, Units::Standard).unwrap().summary_rows();
        assert_eq!(rows[1].1, "27.4 K");
        assert_eq!(rows[4].1, "5.1 m/s");
    }

    #[test]
    fn test_units_query_values() {
        assert_eq!(Units::default(), Units::Metric);
        assert_eq!(Units::Metric.as_query(), "metric");
        assert_eq!(Units::Imperial.as_query(), "imperial");
        assert_eq!(Units::Standard.as_query(), "standard");
    }

    #[test]
    fn test_missing_key_short_circuits() {
        let client = WeatherClient::new(Client::new(), DEFAULT_WEATHER_URL, None, Units::Metric);
        let result = client.fetch_current(Location { lat: 20.59, lon: 78.96 });
        assert!(matches!(result, Err(WeatherError::MissingApiKey)));
    }
}
