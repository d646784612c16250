use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_line, draw_stroke, fill_polygon};
use crate::map::projection::Viewport;
use crate::zones::{FloodZoneFeature, ZoneColor};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on zoom factor
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    /// Where the location fix put the user
    User,
    /// A user-submitted flood report
    FloodReport,
}

impl MarkerKind {
    pub fn glyph(self) -> char {
        match self {
            MarkerKind::User => '◉',
            MarkerKind::FloodReport => '⚠',
        }
    }
}

/// A point marker with popup text
#[derive(Clone, Debug)]
pub struct Marker {
    pub lon: f64,
    pub lat: f64,
    pub kind: MarkerKind,
    pub popup: String,
}

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_coastlines: bool,
    pub show_borders: bool,
    pub show_zones: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_coastlines: true,
            show_borders: true,
            show_zones: true,
        }
    }
}

/// Canvases and glyphs for one frame, back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub zone_fills: Vec<(ZoneColor, BrailleCanvas)>,
    pub zone_outlines: BrailleCanvas,
    pub user_dot: BrailleCanvas,
    /// (char x, char y, kind) for marker glyphs
    pub markers: Vec<(u16, u16, MarkerKind)>,
}

/// Map renderer: multi-resolution basemap plus the flood overlay.
/// Overlay layers are append-only.
pub struct MapRenderer {
    pub coastlines_low: Vec<LineString>,
    pub coastlines_medium: Vec<LineString>,
    pub coastlines_high: Vec<LineString>,
    pub borders_medium: Vec<LineString>,
    pub borders_high: Vec<LineString>,
    pub zones: Vec<FloodZoneFeature>,
    pub markers: Vec<Marker>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            zones: Vec::new(),
            markers: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Coastlines for the given LOD, falling back to coarser data
    fn get_coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_low],
            Lod::Low => [&self.coastlines_low, &self.coastlines_low, &self.coastlines_low],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    /// Borders for the given LOD
    fn get_borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.borders_high.is_empty() => &self.borders_high,
            _ => &self.borders_medium,
        }
    }

    /// Render all layers for a `width` x `height` character area
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);
        let mut layers = MapLayers {
            coastlines: BrailleCanvas::new(width, height),
            borders: BrailleCanvas::new(width, height),
            zone_fills: ZoneColor::ALL
                .iter()
                .map(|&color| (color, BrailleCanvas::new(width, height)))
                .collect(),
            zone_outlines: BrailleCanvas::new(width, height),
            user_dot: BrailleCanvas::new(width, height),
            markers: Vec::new(),
        };

        if self.settings.show_coastlines {
            for line in self.get_coastlines(lod) {
                draw_linestring(&mut layers.coastlines, line, viewport);
            }
        }

        if self.settings.show_borders {
            for line in self.get_borders(lod) {
                draw_linestring(&mut layers.borders, line, viewport);
            }
        }

        if self.settings.show_zones {
            for zone in &self.zones {
                draw_zone(&mut layers, zone, viewport);
            }
        }

        for marker in &self.markers {
            let (px, py) = viewport.project(marker.lon, marker.lat);
            if px < 0 || py < 0 || !viewport.is_visible(px, py) {
                continue;
            }
            if marker.kind == MarkerKind::User {
                draw_circle(&mut layers.user_dot, px, py, 2);
            }
            let (cx, cy) = ((px / 2) as u16, (py / 4) as u16);
            if (cx as usize) < width && (cy as usize) < height {
                layers.markers.push((cx, cy, marker.kind));
            }
        }

        layers
    }

    /// Topmost marker drawn in the character cell under braille pixel (px, py)
    pub fn marker_at(&self, viewport: &Viewport, px: i32, py: i32) -> Option<&Marker> {
        let cell = (px.div_euclid(2), py.div_euclid(4));
        self.markers.iter().rev().find(|m| {
            let (mx, my) = viewport.project(m.lon, m.lat);
            (mx.div_euclid(2) - cell.0).abs() <= 1 && mx >= 0 && my >= 0 && my.div_euclid(4) == cell.1
        })
    }

    /// Topmost zone containing the point
    pub fn zone_at(&self, lon: f64, lat: f64) -> Option<&FloodZoneFeature> {
        self.zones.iter().rev().find(|z| z.contains(lon, lat))
    }

    /// Add coastline data at a specific LOD
    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    /// Add border data at a specific LOD
    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    pub fn add_zones(&mut self, zones: impl IntoIterator<Item = FloodZoneFeature>) {
        self.zones.extend(zones);
    }

    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    /// Check if any basemap data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_coastlines(&mut self) {
        self.settings.show_coastlines = !self.settings.show_coastlines;
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_zones(&mut self) {
        self.settings.show_zones = !self.settings.show_zones;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);
        if let Some((prev_x, prev_y)) = prev {
            // Skip antimeridian wraps
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}

/// Dithered fill in the zone's color, then the outline on top
fn draw_zone(layers: &mut MapLayers, zone: &FloodZoneFeature, viewport: &Viewport) {
    let ring: Vec<(i32, i32)> = zone.boundary.iter().map(|&(lon, lat)| viewport.project(lon, lat)).collect();
    let style = zone.style();

    let (min_x, min_y) = ring.iter().fold((i32::MAX, i32::MAX), |(x, y), p| (x.min(p.0), y.min(p.1)));
    let (max_x, max_y) = ring.iter().fold((i32::MIN, i32::MIN), |(x, y), p| (x.max(p.0), y.max(p.1)));
    if !viewport.line_might_be_visible((min_x, min_y), (max_x, max_y)) {
        return;
    }

    if let Some((_, canvas)) = layers.zone_fills.iter_mut().find(|(color, _)| *color == style.fill) {
        fill_polygon(canvas, &ring, style.fill_opacity);
    }
    for pair in ring.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        if viewport.line_might_be_visible((x0, y0), (x1, y1)) {
            draw_stroke(&mut layers.zone_outlines, x0, y0, x1, y1, style.weight);
        }
    }
}
