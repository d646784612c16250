use crate::geocode::DEFAULT_GEOCODE_URL;
use crate::location::{Location, LocationError, DEFAULT_IP_LOCATE_URL};
use crate::weather::{Units, DEFAULT_WEATHER_URL};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "flood-watch",
    version,
    about = "Terminal flood-risk map with live weather alerts"
)]
pub struct Config {
    /// Fixed latitude; skips the IP lookup (requires --lon)
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Fixed longitude (requires --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// OpenWeatherMap API key
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Unit system for temperature and wind speed
    #[arg(long, value_enum, default_value_t = Units::Metric)]
    pub units: Units,

    /// Current-weather endpoint
    #[arg(long, default_value = DEFAULT_WEATHER_URL)]
    pub weather_url: String,

    /// Place search endpoint
    #[arg(long, default_value = DEFAULT_GEOCODE_URL)]
    pub geocode_url: String,

    /// IP geolocation endpoint
    #[arg(long, default_value = DEFAULT_IP_LOCATE_URL)]
    pub ip_locate_url: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Directory holding Natural Earth basemap GeoJSON
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Extra flood-zone GeoJSON to overlay
    #[arg(short, long)]
    pub zones: Option<PathBuf>,

    /// Log file (the terminal belongs to the UI)
    #[arg(long, default_value = "flood-watch.log")]
    pub log_file: PathBuf,
}

impl Config {
    /// The position given on the command line, if any
    pub fn fixed_location(&self) -> Option<Result<Location, LocationError>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Location::new(lat, lon)),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
