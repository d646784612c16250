use crate::map::{LineString, Lod, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Clone, Copy)]
enum BasemapLayer {
    Coastline,
    Border,
}

/// Natural Earth files picked up from the data directory when present
const BASEMAP_FILES: [(&str, BasemapLayer, Lod); 6] = [
    ("ne_110m_coastline.json", BasemapLayer::Coastline, Lod::Low),
    ("ne_50m_coastline.json", BasemapLayer::Coastline, Lod::Medium),
    ("ne_10m_coastline.json", BasemapLayer::Coastline, Lod::High),
    ("ne_50m_borders.json", BasemapLayer::Border, Lod::Medium),
    ("ne_10m_borders.json", BasemapLayer::Border, Lod::High),
    ("ne_10m_admin_0_boundary_lines_land.json", BasemapLayer::Border, Lod::High),
];

/// Load every basemap file found in `data_dir`, parsing them in parallel.
/// Files that fail to parse are logged and skipped.
pub fn load_basemap(renderer: &mut MapRenderer, data_dir: &Path) {
    let loaded: Vec<_> = BASEMAP_FILES
        .par_iter()
        .filter_map(|&(filename, layer, lod)| {
            let path = data_dir.join(filename);
            path.exists().then(|| (filename, layer, lod, read_lines(&path)))
        })
        .collect();

    for (filename, layer, lod, lines) in loaded {
        match lines {
            Ok(lines) => {
                info!(file = filename, count = lines.len(), "loaded basemap layer");
                for line in lines {
                    match layer {
                        BasemapLayer::Coastline => renderer.add_coastline(line, lod),
                        BasemapLayer::Border => renderer.add_border(line, lod),
                    }
                }
            }
            Err(e) => warn!(file = filename, "failed to load basemap layer: {e:#}"),
        }
    }
}

/// Parse a GeoJSON file into its line features
fn read_lines(path: &Path) -> Result<Vec<LineString>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("parsing {}", path.display()))?;

    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut add_line),
    }
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|coords| add_line(to_line(coords))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Rough continent outlines for when no basemap files are available
pub fn generate_simple_world(renderer: &mut MapRenderer) {
    const OUTLINES: [&[(f64, f64)]; 6] = [
        // North America
        &[
            (-168.0, 65.0), (-141.0, 60.0), (-125.0, 48.0), (-117.0, 32.0),
            (-97.0, 25.0), (-82.0, 24.0), (-81.0, 31.0), (-70.0, 41.0),
            (-55.0, 47.0), (-64.0, 60.0), (-95.0, 62.0), (-130.0, 70.0),
            (-168.0, 65.0),
        ],
        // South America
        &[
            (-80.0, 10.0), (-60.0, 5.0), (-35.0, -5.0), (-40.0, -22.0),
            (-58.0, -38.0), (-68.0, -50.0), (-75.0, -52.0), (-72.0, -30.0),
            (-80.0, -5.0), (-80.0, 10.0),
        ],
        // Europe
        &[
            (-10.0, 36.0), (5.0, 43.0), (20.0, 40.0), (30.0, 40.0),
            (40.0, 43.0), (40.0, 55.0), (25.0, 65.0), (10.0, 71.0),
            (5.0, 58.0), (-10.0, 52.0), (-10.0, 36.0),
        ],
        // Africa
        &[
            (-17.0, 15.0), (-5.0, 35.0), (20.0, 33.0), (35.0, 30.0),
            (42.0, 12.0), (50.0, 12.0), (35.0, -20.0), (20.0, -35.0),
            (10.0, -15.0), (10.0, 0.0), (-10.0, 5.0), (-17.0, 15.0),
        ],
        // Asia, with the Indian subcontinent traced a little closer
        &[
            (35.0, 42.0), (50.0, 40.0), (57.0, 25.0), (67.0, 24.5),
            (70.0, 21.0), (73.0, 17.0), (75.0, 12.0), (77.5, 8.1),
            (80.2, 13.0), (82.0, 16.5), (87.0, 21.5), (92.0, 22.0),
            (98.0, 16.0), (105.0, 10.0), (110.0, 20.0), (122.0, 25.0),
            (130.0, 35.0), (140.0, 40.0), (145.0, 50.0), (135.0, 55.0),
            (130.0, 43.0), (110.0, 45.0), (90.0, 50.0), (60.0, 55.0),
            (35.0, 42.0),
        ],
        // Australia
        &[
            (115.0, -20.0), (130.0, -12.0), (145.0, -15.0), (153.0, -30.0),
            (145.0, -38.0), (130.0, -32.0), (115.0, -35.0), (115.0, -20.0),
        ],
    ];

    for outline in OUTLINES {
        renderer.add_coastline(outline.to_vec(), Lod::Low);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_mixed_geometries() {
        let geojson: GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0,0],[1,0],[1,1],[0,0]]], [[[2,2],[3,2],[3,3],[2,2]]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [5,5]}}
            ]
        }"#
        .parse()
        .unwrap();

        let mut lines = Vec::new();
        process_geojson_lines(&geojson, |line| lines.push(line));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], vec![(0.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_missing_dir_loads_nothing() {
        let mut renderer = MapRenderer::new();
        load_basemap(&mut renderer, Path::new("/nonexistent/flood-watch-data"));
        assert!(!renderer.has_data());
        generate_simple_world(&mut renderer);
        assert!(renderer.has_data());
        assert_eq!(renderer.coastlines_low.len(), 6);
    }
}
