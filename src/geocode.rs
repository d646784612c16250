//! Place search against a Nominatim-compatible `/search` endpoint.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoder returned status {0}")]
    Status(StatusCode),
    #[error("unexpected geocoder payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("bad bounding box value {0:?}")]
    BoundingBox(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub name: String,
    pub bbox: BoundingBox,
}

#[derive(Deserialize)]
struct Place {
    display_name: String,
    /// [south, north, west, east] as decimal strings
    boundingbox: [String; 4],
}

/// First hit of a search response, if any
pub fn parse_search(body: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
    let places: Vec<Place> = serde_json::from_str(body)?;
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let mut edges = [0.0; 4];
    for (edge, raw) in edges.iter_mut().zip(&place.boundingbox) {
        *edge = raw.trim().parse().map_err(|_| GeocodeError::BoundingBox(raw.clone()))?;
    }
    let [south, north, west, east] = edges;

    Ok(Some(GeocodeHit {
        name: place.display_name,
        bbox: BoundingBox { south, north, west, east },
    }))
}

pub struct Geocoder {
    http: Client,
    url: String,
}

impl Geocoder {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    pub fn search(&self, query: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
        debug!(%query, "geocoding");
        let response = self
            .http
            .get(&self.url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status()));
        }
        parse_search(&response.text()?)
    }
}
