//! Where the user is. A fixed position from the command line, or an
//! IP-based lookup against an ip-api.com compatible endpoint.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_IP_LOCATE_URL: &str = "http://ip-api.com/json/?fields=status,message,lat,lon";

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("location service returned status {0}")]
    Status(StatusCode),
    #[error("unexpected location payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("location lookup failed: {0}")]
    Lookup(String),
    #[error("coordinates out of range: lat {lat}, lon {lon}")]
    OutOfRange { lat: f64, lon: f64 },
}

/// A WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(LocationError::OutOfRange { lat, lon });
        }
        Ok(Self { lat, lon })
    }
}

/// Single-shot position source
pub trait LocationProvider: Send + Sync {
    fn current_position(&self) -> Result<Location, LocationError>;
}

/// Always answers with the configured position
pub struct FixedLocation(pub Location);

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> Result<Location, LocationError> {
        Ok(self.0)
    }
}

#[derive(Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

pub fn parse_ip_response(body: &str) -> Result<Location, LocationError> {
    let data: IpApiResponse = serde_json::from_str(body)?;
    if data.status != "success" {
        return Err(LocationError::Lookup(
            data.message.unwrap_or_else(|| data.status.clone()),
        ));
    }
    match (data.lat, data.lon) {
        (Some(lat), Some(lon)) => Location::new(lat, lon),
        _ => Err(LocationError::Lookup("response has no coordinates".to_string())),
    }
}

/// Approximate position from the public IP address
pub struct IpLocator {
    http: Client,
    url: String,
}

impl IpLocator {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

impl LocationProvider for IpLocator {
    fn current_position(&self) -> Result<Location, LocationError> {
        debug!(url = %self.url, "looking up position by IP");
        let response = self.http.get(&self.url).send()?;
        if !response.status().is_success() {
            return Err(LocationError::Status(response.status()));
        }
        parse_ip_response(&response.text()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let body = r#"{"status": "success", "lat": 21.1458, "lon": 79.0882}"#;
        let location = parse_ip_response(body).unwrap();
        assert_eq!(location, Location { lat: 21.1458, lon: 79.0882 });
    }

    #[test]
    fn test_parse_failure_message() {
        let body = r#"{"status": "fail", "message": "reserved range"}"#;
        match parse_ip_response(body) {
            Err(LocationError::Lookup(msg)) => assert_eq!(msg, "reserved range"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_coordinates() {
        let body = r#"{"status": "success"}"#;
        assert!(matches!(parse_ip_response(body), Err(LocationError::Lookup(_))));
    }

    #[test]
    fn test_range_check() {
        assert!(Location::new(91.0, 0.0).is_err());
        assert!(Location::new(0.0, -181.0).is_err());
        assert!(Location::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_fixed_provider() {
        let here = Location::new(20.5937, 78.9629).unwrap();
        assert_eq!(FixedLocation(here).current_position().unwrap(), here);
    }
}
