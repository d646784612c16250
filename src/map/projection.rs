use std::f64::consts::PI;

/// Zoom factor bounds (slippy levels ~1 through 18)
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 65_536.0;

/// Web Mercator stops being useful past this latitude
const MAX_LAT: f64 = 85.05112878;

/// Convert a slippy-map zoom level to the viewport's zoom factor.
/// Level 2 shows the whole world across the viewport width.
pub fn zoom_factor_for_level(level: u8) -> f64 {
    (2f64.powi(level as i32) / 4.0).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Inverse of [`zoom_factor_for_level`], fractional
pub fn level_for_zoom_factor(zoom: f64) -> f64 {
    (zoom * 4.0).log2()
}

/// Normalized Web Mercator x in [0, 1]
#[inline(always)]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Normalized Web Mercator y in [0, 1] (0 = north edge)
#[inline(always)]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline(always)]
fn inverse_mercator_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude
    pub center_lat: f64,
    /// Zoom factor (1.0 = world spans the canvas width)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Center on (lon, lat) at a slippy zoom level
    pub fn set_view(&mut self, lon: f64, lat: f64, level: u8) {
        self.center_lon = lon;
        self.center_lat = lat.clamp(-MAX_LAT, MAX_LAT);
        self.zoom = zoom_factor_for_level(level);
    }

    /// Largest zoom at which the box fits, centered on the box
    pub fn fit_bounds(&mut self, west: f64, south: f64, east: f64, north: f64) {
        let (x0, x1) = (mercator_x(west.min(east)), mercator_x(west.max(east)));
        let (y0, y1) = (mercator_y(north.max(south)), mercator_y(north.min(south)));

        self.center_lon = (x0 + x1) / 2.0 * 360.0 - 180.0;
        self.center_lat = inverse_mercator_y((y0 + y1) / 2.0);

        let span_x = (x1 - x0).max(f64::EPSILON);
        let span_y = (y1 - y0).max(f64::EPSILON);
        let fit_x = 1.0 / span_x;
        let fit_y = self.height as f64 / (self.width.max(1) as f64 * span_y);
        self.zoom = fit_x.min(fit_y).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.zoom * self.width.max(1) as f64;
        let x = mercator_x(self.center_lon) + dx as f64 / scale;
        let y = mercator_y(self.center_lat) + dy as f64 / scale;

        self.center_lon = x * 360.0 - 180.0;
        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
        self.center_lat = inverse_mercator_y(y.clamp(0.0, 1.0)).clamp(-85.0, 85.0);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.zoom * self.width.max(1) as f64;

        let x = (px as f64 - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py as f64 - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);

        (x * 360.0 - 180.0, inverse_mercator_y(y))
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.zoom * self.width as f64;

        let px = (mercator_x(lon) - mercator_x(self.center_lon)) * scale + self.width as f64 / 2.0;
        let py = (mercator_y(lat) - mercator_y(self.center_lat)) * scale + self.height as f64 / 2.0;

        (px as i32, py as i32)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        let (x, y) = vp.project(0.0, 0.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, 10);
        assert!(vp.center_lat < 0.0);
    }

    #[test]
    fn test_unproject_round_trip() {
        let vp = Viewport::new(78.9629, 20.5937, zoom_factor_for_level(13), 400, 200);
        let (px, py) = vp.project(78.92, 20.52);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 78.92).abs() < 0.001);
        assert!((lat - 20.52).abs() < 0.001);
    }

    #[test]
    fn test_zoom_levels() {
        assert_eq!(zoom_factor_for_level(2), 1.0);
        assert_eq!(zoom_factor_for_level(5), 8.0);
        assert_eq!(zoom_factor_for_level(13), 2048.0);
        assert_eq!(zoom_factor_for_level(0), MIN_ZOOM);
        assert!((level_for_zoom_factor(8.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_view() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 200, 100);
        vp.set_view(78.9, 20.5, 13);
        assert_eq!(vp.zoom, 2048.0);
        assert_eq!(vp.project(78.9, 20.5), (100, 50));
    }

    #[test]
    fn test_fit_bounds_contains_box() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 200, 100);
        vp.fit_bounds(78.9, 20.5, 78.95, 20.55);

        assert!((vp.center_lon - 78.925).abs() < 1e-6);
        assert!((vp.center_lat - 20.525).abs() < 0.001);

        let (x0, y0) = vp.project(78.9, 20.55);
        let (x1, y1) = vp.project(78.95, 20.5);
        assert!(x0 >= -1 && x1 <= 201);
        assert!(y0 >= -1 && y1 <= 101);
        // Tight on at least one axis
        assert!(x1 - x0 >= 190 || y1 - y0 >= 90);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = Viewport::new(0.0, 0.0, MAX_ZOOM, 100, 100);
        vp.zoom_in();
        assert_eq!(vp.zoom, MAX_ZOOM);
        let mut vp = Viewport::new(0.0, 0.0, MIN_ZOOM, 100, 100);
        vp.zoom_out_at(10, 10);
        assert_eq!(vp.zoom, MIN_ZOOM);
    }
}
