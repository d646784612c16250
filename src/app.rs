use crate::location::Location;
use crate::map::{level_for_zoom_factor, MapRenderer, Marker, MarkerKind, Viewport};
use crate::risk::{classify, RiskAssessment};
use crate::tasks::{LocatePurpose, Task, TaskOutcome};
use crate::weather::WeatherSnapshot;
use std::collections::VecDeque;
use tracing::{error, info, warn};

/// Initial view: the subcontinent, whole-country zoom
pub const DEFAULT_CENTER: (f64, f64) = (78.9629, 20.5937);
pub const DEFAULT_ZOOM_LEVEL: u8 = 5;
/// Zoom level after a location fix
pub const LOCATED_ZOOM_LEVEL: u8 = 13;

pub const REPORT_PROMPT: &str = "Report flood in your current area?";
pub const REPORT_THANKS: &str = "Thank you for your flood report! This will help others.";
pub const REPORT_POPUP: &str = "User-reported flood\nReported just now";
pub const USER_POPUP: &str = "Your Location";

/// What a confirm dialog does when accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    ReportFlood,
}

/// Modal dialogs, shown one at a time in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Alert(String),
    Confirm { prompt: String, action: ConfirmAction },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Destination,
    Search,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Destination => "Destination",
            PromptKind::Search => "Search",
        }
    }
}

/// Single-line text entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub buffer: String,
}

/// Popup anchored to a map position
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub lon: f64,
    pub lat: f64,
    pub text: String,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Set once the current press has moved; a press without movement is a click
    dragged: bool,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Most recent reading and its assessment; no history is kept
    pub weather: Option<WeatherSnapshot>,
    pub assessment: Option<RiskAssessment>,
    pub dialogs: VecDeque<Dialog>,
    pub prompt: Option<Prompt>,
    pub popup: Option<Popup>,
    /// One-line notice for the status bar
    pub status: Option<String>,
    /// Tasks waiting to be handed to the worker
    outbox: Vec<Task>,
}

impl App {
    pub fn new(width: usize, height: usize) -> Self {
        let (pixel_width, pixel_height) = Self::map_pixels(width, height);
        let mut viewport = Viewport::new(0.0, 0.0, 1.0, pixel_width, pixel_height);
        viewport.set_view(DEFAULT_CENTER.0, DEFAULT_CENTER.1, DEFAULT_ZOOM_LEVEL);

        Self {
            viewport,
            map_renderer: MapRenderer::new(),
            should_quit: false,
            last_mouse: None,
            dragged: false,
            mouse_pos: None,
            weather: None,
            assessment: None,
            dialogs: VecDeque::new(),
            prompt: None,
            popup: None,
            status: None,
            outbox: Vec::new(),
        }
    }

    /// Braille pixels available to the map for a terminal of `width` x `height`.
    /// Braille gives 2x4 pixels per character; the map loses its border,
    /// the status bar and the weather panel.
    fn map_pixels(width: usize, height: usize) -> (usize, usize) {
        let inner_width = width.saturating_sub(2 + crate::ui::PANEL_WIDTH as usize);
        let inner_height = height.saturating_sub(3);
        (inner_width * 2, inner_height * 4)
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = Self::map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
    }

    /// Kick off the initial location fix
    pub fn start(&mut self) {
        self.outbox.push(Task::Locate(LocatePurpose::Startup));
    }

    /// Tasks queued since the last call
    pub fn take_tasks(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.outbox)
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Terminal cell to braille pixel, inside the map border
    fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
        ((col.saturating_sub(1)) as i32 * 2, (row.saturating_sub(1)) as i32 * 4)
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    pub fn reset_view(&mut self) {
        self.viewport
            .set_view(DEFAULT_CENTER.0, DEFAULT_CENTER.1, DEFAULT_ZOOM_LEVEL);
        self.popup = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Current zoom as a slippy level
    pub fn zoom_level(&self) -> String {
        format!("z{:.1}", level_for_zoom_factor(self.viewport.zoom))
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.4}°{}, {:.4}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn start_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Pan by the mouse movement since the last drag event
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - col as i32) * 2;
            let dy = (last_y as i32 - row as i32) * 4;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx, dy);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Mouse released: a press that never moved counts as a click
    pub fn end_drag(&mut self, col: u16, row: u16) {
        let was_click = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if was_click {
            self.click_at(col, row);
        }
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Mouse position in braille pixel coordinates (for the cursor marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| Self::cell_to_pixel(col, row))
    }

    /// Open the popup of whatever sits under the cursor: markers first, then zones
    pub fn click_at(&mut self, col: u16, row: u16) {
        // Border cells, the weather panel and the status row are not map
        if col == 0 || row == 0 {
            return;
        }
        let (px, py) = Self::cell_to_pixel(col, row);
        if px as usize >= self.viewport.width || py as usize >= self.viewport.height {
            return;
        }

        if let Some(marker) = self.map_renderer.marker_at(&self.viewport, px, py) {
            self.popup = Some(Popup {
                lon: marker.lon,
                lat: marker.lat,
                text: marker.popup.clone(),
            });
            return;
        }

        let (lon, lat) = self.viewport.unproject(px, py);
        self.popup = self
            .map_renderer
            .zone_at(lon, lat)
            .filter(|_| self.map_renderer.settings.show_zones)
            .map(|zone| Popup {
                lon,
                lat,
                text: zone.popup(),
            });
    }

    /// The dialog currently holding focus
    pub fn active_dialog(&self) -> Option<&Dialog> {
        self.dialogs.front()
    }

    fn alert(&mut self, message: impl Into<String>) {
        self.dialogs.push_back(Dialog::Alert(message.into()));
    }

    /// Close the front dialog. `accepted` is OK for confirms, ignored for alerts.
    pub fn answer_dialog(&mut self, accepted: bool) {
        if let Some(Dialog::Confirm { action, .. }) = self.dialogs.pop_front() {
            if accepted {
                self.run_confirmed(action);
            }
        }
    }

    fn run_confirmed(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::ReportFlood => self.outbox.push(Task::Locate(LocatePurpose::Report)),
        }
    }

    /// "Get route": ask for a destination
    pub fn request_route(&mut self) {
        self.prompt = Some(Prompt {
            kind: PromptKind::Destination,
            buffer: String::new(),
        });
    }

    /// Geocoder search box
    pub fn request_search(&mut self) {
        self.prompt = Some(Prompt {
            kind: PromptKind::Search,
            buffer: String::new(),
        });
    }

    /// "Report flood": confirm before taking a fresh position
    pub fn request_flood_report(&mut self) {
        self.dialogs.push_back(Dialog::Confirm {
            prompt: REPORT_PROMPT.to_string(),
            action: ConfirmAction::ReportFlood,
        });
    }

    pub fn prompt_input(&mut self, ch: char) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.buffer.push(ch);
        }
    }

    pub fn prompt_backspace(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.buffer.pop();
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    pub fn submit_prompt(&mut self) {
        let Some(Prompt { kind, buffer }) = self.prompt.take() else {
            return;
        };
        match kind {
            PromptKind::Destination if buffer.is_empty() => self.alert("Please enter a destination"),
            // No routing engine behind this yet
            PromptKind::Destination => {
                self.alert(format!("Finding safest route to {buffer} (avoiding flood zones)"))
            }
            PromptKind::Search if buffer.trim().is_empty() => {}
            PromptKind::Search => self.outbox.push(Task::Geocode(buffer.trim().to_string())),
        }
    }

    /// Fold a finished background task into the state
    pub fn apply(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Located { purpose, result: Ok(at) } => match purpose {
                LocatePurpose::Startup => self.on_located(at),
                LocatePurpose::Report => self.on_report_located(at),
            },
            TaskOutcome::Located { purpose, result: Err(e) } => {
                warn!(?purpose, "location unavailable: {e}");
                self.status = Some(format!("Location unavailable: {e}"));
            }
            TaskOutcome::Weather { result: Ok(snapshot), .. } => self.on_weather(snapshot),
            TaskOutcome::Weather { at, result: Err(e) } => {
                error!(lat = at.lat, lon = at.lon, "error fetching weather: {e}");
            }
            TaskOutcome::Geocoded { query, result: Ok(Some(hit)) } => {
                info!(%query, name = %hit.name, "geocode hit");
                let b = hit.bbox;
                self.viewport.fit_bounds(b.west, b.south, b.east, b.north);
                self.status = Some(hit.name);
            }
            TaskOutcome::Geocoded { result: Ok(None), .. } => self.alert("Nothing found."),
            TaskOutcome::Geocoded { query, result: Err(e) } => {
                error!(%query, "geocoding failed: {e}");
            }
        }
    }

    fn on_located(&mut self, at: Location) {
        info!(lat = at.lat, lon = at.lon, "location fix");
        self.map_renderer.add_marker(Marker {
            lon: at.lon,
            lat: at.lat,
            kind: MarkerKind::User,
            popup: USER_POPUP.to_string(),
        });
        self.popup = Some(Popup {
            lon: at.lon,
            lat: at.lat,
            text: USER_POPUP.to_string(),
        });
        self.viewport.set_view(at.lon, at.lat, LOCATED_ZOOM_LEVEL);
        self.outbox.push(Task::Weather(at));
    }

    fn on_weather(&mut self, snapshot: WeatherSnapshot) {
        let assessment = classify(&snapshot);
        info!(level = assessment.level.label(), "flood risk assessed");
        self.alert(assessment.alert_text());
        self.weather = Some(snapshot);
        self.assessment = Some(assessment);
    }

    fn on_report_located(&mut self, at: Location) {
        // Reports stay local; there is no backend to send them to
        info!(lat = at.lat, lon = at.lon, "flood report placed");
        self.map_renderer.add_marker(Marker {
            lon: at.lon,
            lat: at.lat,
            kind: MarkerKind::FloodReport,
            popup: REPORT_POPUP.to_string(),
        });
        self.alert(REPORT_THANKS);
    }
}
