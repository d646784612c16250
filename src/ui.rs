use crate::app::{App, Dialog, Popup};
use crate::braille::BrailleCanvas;
use crate::map::{MapLayers, MarkerKind, Viewport};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

/// Columns reserved for the weather panel
pub const PANEL_WIDTH: u16 = 30;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map + panel
            Constraint::Length(1), // Status bar or prompt
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(PANEL_WIDTH)])
        .split(rows[0]);

    let map_inner = render_map(frame, app, columns[0]);
    render_weather_panel(frame, app, columns[1]);

    if app.prompt.is_some() {
        render_prompt(frame, app, rows[1]);
    } else {
        render_status_bar(frame, app, rows[1]);
    }

    if let Some(popup) = &app.popup {
        render_popup(frame, popup, &app.viewport, map_inner);
    }
    if let Some(dialog) = app.active_dialog() {
        render_dialog(frame, dialog, area);
    }
}

/// Draw the bordered map, returning its inner area
fn render_map(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Flood Watch ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport);

    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let (cx, cy) = ((px / 2) as u16, (py / 4) as u16);
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
    inner
}

/// Custom widget that paints braille layers with glyphs overlaid
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate().take(area.height as usize) {
            let y = area.y + row_idx as u16;
            for (col_idx, ch) in row_str.chars().enumerate().take(area.width as usize) {
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                buf[(area.x + col_idx as u16, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: basemap, zone fills, zone outlines, markers
        Self::render_layer(&self.layers.coastlines, Color::Cyan, area, buf);
        Self::render_layer(&self.layers.borders, Color::DarkGray, area, buf);
        for (color, canvas) in &self.layers.zone_fills {
            Self::render_layer(canvas, color.terminal_color(), area, buf);
        }
        Self::render_layer(&self.layers.zone_outlines, Color::White, area, buf);
        Self::render_layer(&self.layers.user_dot, Color::LightBlue, area, buf);

        for &(cx, cy, kind) in &self.layers.markers {
            if cx >= area.width || cy >= area.height {
                continue;
            }
            let style = match kind {
                MarkerKind::User => Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD),
                MarkerKind::FloodReport => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            };
            buf[(area.x + cx, area.y + cy)].set_char(kind.glyph()).set_style(style);
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

fn render_weather_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Current Weather ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    // An unfilled panel means no reading has arrived
    let mut lines = Vec::new();
    if let Some(weather) = &app.weather {
        for (label, value) in weather.summary_rows() {
            lines.push(Line::from(vec![
                Span::styled(format!("{label}: "), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(value),
            ]));
        }
    }
    if let Some(assessment) = &app.assessment {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("Flood risk: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                assessment.level.label(),
                Style::default().fg(assessment.level.color()).add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let settings = &app.map_renderer.settings;

    let mut spans = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", dim),
        Span::styled(
            if settings.show_zones { "[Z]ones " } else { "[z]ones " },
            Style::default().fg(if settings.show_zones { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            if settings.show_coastlines { "[C]oast " } else { "[c]oast " },
            Style::default().fg(if settings.show_coastlines { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            if settings.show_borders { "[B]order " } else { "[b]order " },
            Style::default().fg(if settings.show_borders { Color::Green } else { Color::DarkGray }),
        ),
    ];
    if let Some(status) = &app.status {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Magenta)));
    }
    spans.push(Span::styled(
        " | g:route f:report /:search hjkl:pan +/-:zoom r:reset q:quit",
        dim,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let Some(prompt) = &app.prompt else {
        return;
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {}: ", prompt.kind.label()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(prompt.buffer.clone()),
        Span::styled("█", Style::default().fg(Color::Gray)),
        Span::styled("  Enter:go Esc:cancel", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Popup box just above its anchor, clamped to the map area
fn render_popup(frame: &mut Frame, popup: &Popup, viewport: &Viewport, map: Rect) {
    let mut viewport = viewport.clone();
    viewport.width = map.width as usize * 2;
    viewport.height = map.height as usize * 4;

    let (px, py) = viewport.project(popup.lon, popup.lat);
    if px < 0 || py < 0 || px / 2 >= map.width as i32 || py / 4 >= map.height as i32 {
        return;
    }

    let text_width = popup.text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    let width = (text_width + 4).min(map.width);
    let height = (popup.text.lines().count() as u16 + 2).min(map.height);

    let anchor_x = map.x + (px / 2) as u16;
    let anchor_y = map.y + (py / 4) as u16;
    let x = anchor_x
        .saturating_sub(width / 2)
        .clamp(map.x, map.x + map.width - width);
    let y = anchor_y
        .saturating_sub(height)
        .clamp(map.y, map.y + map.height - height);
    let rect = Rect::new(x, y, width, height);

    let lines: Vec<Line> = popup
        .text
        .lines()
        .enumerate()
        .map(|(i, l)| {
            let style = if i == 0 { Style::default().add_modifier(Modifier::BOLD) } else { Style::default() };
            Line::styled(l.to_string(), style)
        })
        .collect();

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        ),
        rect,
    );
}

fn render_dialog(frame: &mut Frame, dialog: &Dialog, area: Rect) {
    let (title, message, hint) = match dialog {
        Dialog::Alert(message) => (" Alert ", message.as_str(), "[Enter] OK"),
        Dialog::Confirm { prompt, .. } => (" Confirm ", prompt.as_str(), "[y] OK   [n] Cancel"),
    };

    let width = (message.chars().count() as u16 + 4).clamp(24, area.width.saturating_sub(4).max(24));
    let rect = centered(area, width.min(area.width), 6.min(area.height));

    let body = vec![
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::styled(hint, Style::default().fg(Color::DarkGray)),
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(body).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        ),
        rect,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskOutcome;
    use crate::weather::{Units, WeatherSnapshot};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..height {
            for x in 0..width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_weather_panel_and_alert() {
        let mut app = App::new(120, 30);
        app.apply(TaskOutcome::Weather {
            at: crate::location::Location { lat: 20.5, lon: 78.9 },
            result: Ok(WeatherSnapshot {
                temperature: 24.5,
                humidity_pct: 91.0,
                rain_1h_mm: Some(2.0),
                wind_speed: 3.0,
                description: "light rain".to_string(),
                units: Units::Metric,
            }),
        });

        let text = screen_text(&app, 120, 30);
        assert!(text.contains("Current Weather"));
        assert!(text.contains("Condition: light rain"));
        assert!(text.contains("Humidity: 91%"));
        assert!(text.contains("Flood risk: medium"));
        assert!(text.contains("Flood Alert: Moderate flood risk"));
    }

    #[test]
    fn test_empty_panel_before_weather() {
        let app = App::new(100, 24);
        let text = screen_text(&app, 100, 24);
        assert!(text.contains("Current Weather"));
        assert!(!text.contains("Condition:"));
        assert!(text.contains("g:route"));
    }

    #[test]
    fn test_prompt_replaces_status_bar() {
        let mut app = App::new(100, 24);
        app.request_route();
        app.prompt_input('P');
        let text = screen_text(&app, 100, 24);
        assert!(text.contains("Destination: P"));
        assert!(!text.contains("g:route"));
    }
}
