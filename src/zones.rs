//! Static flood-risk polygons and their display style.
//!
//! Zones come from GeoJSON: the embedded collection that ships with the
//! binary, plus any collection passed with `--zones`. Each feature carries a
//! `risk` property (`high`, `medium`, `low`) and a `description` shown in its
//! popup.

use crate::map::LineString;
use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, Value};
use ratatui::style::Color;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Simulated zones bundled with the binary
pub const EMBEDDED_ZONES: &str = include_str!("../assets/flood_zones.geojson");

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("expected a Feature or FeatureCollection")]
    NotFeatures,
}

/// Risk tag attached to a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneRisk {
    Low,
    Medium,
    High,
    Unknown,
}

impl ZoneRisk {
    /// Parse the `risk` property; anything unrecognised is `Unknown`
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("high") => ZoneRisk::High,
            Some("medium") => ZoneRisk::Medium,
            Some("low") => ZoneRisk::Low,
            _ => ZoneRisk::Unknown,
        }
    }

    /// Fixed fill color lookup
    pub fn color(self) -> ZoneColor {
        match self {
            ZoneRisk::High => ZoneColor::Red,
            ZoneRisk::Medium => ZoneColor::Orange,
            ZoneRisk::Low => ZoneColor::Yellow,
            ZoneRisk::Unknown => ZoneColor::Blue,
        }
    }
}

/// Zone fill colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneColor {
    Red,
    Orange,
    Yellow,
    Blue,
}

impl ZoneColor {
    pub const ALL: [ZoneColor; 4] = [ZoneColor::Blue, ZoneColor::Yellow, ZoneColor::Orange, ZoneColor::Red];

    pub fn name(self) -> &'static str {
        match self {
            ZoneColor::Red => "red",
            ZoneColor::Orange => "orange",
            ZoneColor::Yellow => "yellow",
            ZoneColor::Blue => "blue",
        }
    }

    pub fn terminal_color(self) -> Color {
        match self {
            ZoneColor::Red => Color::Red,
            ZoneColor::Orange => Color::Rgb(255, 165, 0),
            ZoneColor::Yellow => Color::Yellow,
            ZoneColor::Blue => Color::Blue,
        }
    }
}

/// Polygon style shared by every zone; only the fill varies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneStyle {
    pub fill: ZoneColor,
    pub outline: Color,
    pub weight: u8,
    pub fill_opacity: f64,
}

impl ZoneStyle {
    pub fn for_risk(risk: ZoneRisk) -> Self {
        Self {
            fill: risk.color(),
            outline: Color::White,
            weight: 2,
            fill_opacity: 0.7,
        }
    }
}

/// A risk-tagged polygon, exterior ring only (closed: first == last)
#[derive(Debug, Clone)]
pub struct FloodZoneFeature {
    pub risk: ZoneRisk,
    pub description: String,
    pub boundary: LineString,
}

impl FloodZoneFeature {
    pub fn style(&self) -> ZoneStyle {
        ZoneStyle::for_risk(self.risk)
    }

    pub fn popup(&self) -> String {
        format!("Flood Risk: {}", self.description)
    }

    /// (min_lon, min_lat, max_lon, max_lat)
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        self.boundary.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(x0, y0, x1, y1), &(lon, lat)| (x0.min(lon), y0.min(lat), x1.max(lon), y1.max(lat)),
        )
    }

    /// Even-odd ray cast against the boundary
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let (x0, y0, x1, y1) = self.bbox();
        if lon < x0 || lon > x1 || lat < y0 || lat > y1 {
            return false;
        }

        let ring = &self.boundary;
        let mut inside = false;
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (xi, yi) = ring[i];
            let (xj, yj) = ring[j];
            if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Parse a zone collection from GeoJSON text
pub fn parse_zones(text: &str) -> Result<Vec<FloodZoneFeature>, ZoneError> {
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => return Err(ZoneError::NotFeatures),
    };

    let mut zones = Vec::new();
    for feature in &features {
        zones.extend(zones_from_feature(feature));
    }
    Ok(zones)
}

/// The bundled simulated zones
pub fn embedded_zones() -> Result<Vec<FloodZoneFeature>, ZoneError> {
    parse_zones(EMBEDDED_ZONES)
}

/// Load an extra zone collection from disk
pub fn load_zones(path: &Path) -> Result<Vec<FloodZoneFeature>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading zones from {}", path.display()))?;
    let zones = parse_zones(&content).with_context(|| format!("parsing zones in {}", path.display()))?;
    debug!(count = zones.len(), path = %path.display(), "loaded flood zones");
    Ok(zones)
}

fn zones_from_feature(feature: &Feature) -> Vec<FloodZoneFeature> {
    let props = feature.properties.as_ref();
    let risk = ZoneRisk::parse(props.and_then(|p| p.get("risk")).and_then(|v| v.as_str()));
    let description = props
        .and_then(|p| p.get("description"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let exteriors: Vec<&Vec<Vec<f64>>> = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Polygon(rings)) => rings.first().into_iter().collect(),
        Some(Value::MultiPolygon(polygons)) => polygons.iter().filter_map(|rings| rings.first()).collect(),
        _ => {
            warn!(%description, "skipping zone without polygon geometry");
            return Vec::new();
        }
    };

    exteriors
        .into_iter()
        .filter_map(|ring| {
            let boundary = closed_ring(ring);
            if boundary.is_none() {
                warn!(%description, "skipping degenerate zone ring");
            }
            boundary
        })
        .map(|boundary| FloodZoneFeature {
            risk,
            description: description.clone(),
            boundary,
        })
        .collect()
}

/// Close the ring if needed; None when it has fewer than 3 distinct points
fn closed_ring(coords: &[Vec<f64>]) -> Option<LineString> {
    let mut ring: LineString = coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect();
    ring.dedup();

    let mut distinct: Vec<(f64, f64)> = Vec::with_capacity(ring.len());
    for point in &ring {
        if !distinct.contains(point) {
            distinct.push(*point);
        }
    }
    if distinct.len() < 3 {
        return None;
    }

    let first = ring[0];
    if ring.last() != Some(&first) {
        ring.push(first);
    }
    Some(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_lookup() {
        assert_eq!(ZoneRisk::parse(Some("high")).color().name(), "red");
        assert_eq!(ZoneRisk::parse(Some("medium")).color().name(), "orange");
        assert_eq!(ZoneRisk::parse(Some("low")).color().name(), "yellow");
        assert_eq!(ZoneRisk::parse(Some("extreme")).color().name(), "blue");
        assert_eq!(ZoneRisk::parse(Some("HIGH")).color().name(), "blue");
        assert_eq!(ZoneRisk::parse(None).color().name(), "blue");
    }

    #[test]
    fn test_fixed_style() {
        let style = ZoneStyle::for_risk(ZoneRisk::Medium);
        assert_eq!(style.fill, ZoneColor::Orange);
        assert_eq!(style.outline, Color::White);
        assert_eq!(style.weight, 2);
        assert_eq!(style.fill_opacity, 0.7);
    }

    #[test]
    fn test_embedded_zone() {
        let zones = embedded_zones().unwrap();
        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert_eq!(zone.risk, ZoneRisk::High);
        assert_eq!(zone.popup(), "Flood Risk: High flood risk area");
        assert_eq!(zone.boundary.first(), zone.boundary.last());
        assert_eq!(zone.bbox(), (78.9, 20.5, 78.95, 20.55));
    }

    #[test]
    fn test_contains() {
        let zone = &embedded_zones().unwrap()[0];
        assert!(zone.contains(78.92, 20.52));
        assert!(!zone.contains(78.96, 20.52));
        assert!(!zone.contains(78.92, 20.6));
    }

    #[test]
    fn test_open_ring_is_closed_and_degenerate_skipped() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"risk": "low", "description": "open"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1]]]}},
                {"type": "Feature", "properties": {"risk": "medium", "description": "sliver"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[0,0]]]}},
                {"type": "Feature", "properties": {"risk": "medium", "description": "repeated"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,0],[0,0]]]}},
                {"type": "Feature", "properties": {"risk": "medium", "description": "back and forth"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[0,0],[1,0],[0,0]]]}},
                {"type": "Feature", "properties": {"risk": "high"},
                 "geometry": {"type": "Point", "coordinates": [0,0]}}
            ]
        }"#;
        let zones = parse_zones(text).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].description, "open");
        assert_eq!(zones[0].boundary, vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
    }

    #[test]
    fn test_multipolygon_and_missing_props() {
        let text = r#"{"type": "Feature", "properties": null,
            "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0,0],[1,0],[1,1],[0,0]]],
                [[[5,5],[6,5],[6,6],[5,5]]]
            ]}}"#;
        let zones = parse_zones(text).unwrap();
        assert_eq!(zones.len(), 2);
        assert!(zones.iter().all(|z| z.risk == ZoneRisk::Unknown && z.description.is_empty()));
    }

    #[test]
    fn test_bare_geometry_rejected() {
        let text = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(matches!(parse_zones(text), Err(ZoneError::NotFeatures)));
        assert!(matches!(parse_zones("not json"), Err(ZoneError::Parse(_))));
    }
}
