use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use flood_watch::app::{App, Dialog};
use flood_watch::config::Config;
use flood_watch::tasks::{Services, Worker};
use flood_watch::zones::FloodZoneFeature;
use flood_watch::{data, logging, zones};
use ratatui::DefaultTerminal;
use std::time::Duration;
use tracing::info;

fn main() -> Result<()> {
    let config = Config::parse();
    logging::init(&config.log_file)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting flood-watch");

    // Fail before touching the terminal if the inputs are bad
    let mut flood_zones = zones::embedded_zones()?;
    if let Some(path) = &config.zones {
        flood_zones.extend(zones::load_zones(path)?);
    }
    let worker = Worker::new(Services::from_config(&config)?);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config, flood_zones, &worker);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!("exiting with error: {e:#}");
    }
    result
}

fn build_app(terminal: &DefaultTerminal, config: &Config, flood_zones: Vec<FloodZoneFeature>) -> Result<App> {
    let size = terminal.size()?;
    let mut app = App::new(size.width as usize, size.height as usize);

    data::load_basemap(&mut app.map_renderer, &config.data_dir);
    // Fall back to simple world if no data loaded
    if !app.map_renderer.has_data() {
        data::generate_simple_world(&mut app.map_renderer);
    }
    app.map_renderer.add_zones(flood_zones);
    Ok(app)
}

/// Keys while a dialog is open
fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    let is_confirm = matches!(app.active_dialog(), Some(Dialog::Confirm { .. }));
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') if is_confirm => app.answer_dialog(true),
        KeyCode::Enter => app.answer_dialog(true),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer_dialog(false),
        KeyCode::Char(' ') if !is_confirm => app.answer_dialog(false),
        _ => {}
    }
}

/// Keys while a text prompt is open
fn handle_prompt_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Backspace => app.prompt_backspace(),
        KeyCode::Char(c) => app.prompt_input(c),
        _ => {}
    }
}

fn handle_map_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Actions
        KeyCode::Char('g') => app.request_route(),
        KeyCode::Char('f') => app.request_flood_report(),
        KeyCode::Char('/') => app.request_search(),

        // Layer toggles
        KeyCode::Char('z') | KeyCode::Char('Z') => app.map_renderer.toggle_zones(),
        KeyCode::Char('c') | KeyCode::Char('C') => app.map_renderer.toggle_coastlines(),
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),

        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),
        _ => {}
    }
}

/// Handle mouse events for panning, zooming and popups
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click to open a popup, drag to pan
        MouseEventKind::Down(MouseButton::Left) => app.start_drag(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    config: &Config,
    flood_zones: Vec<FloodZoneFeature>,
    worker: &Worker,
) -> Result<()> {
    let mut app = build_app(terminal, config, flood_zones)?;
    app.start();

    // Main loop
    loop {
        for task in app.take_tasks() {
            worker.submit(task);
        }
        for outcome in worker.drain() {
            app.apply(outcome);
        }

        terminal.draw(|frame| flood_watch::ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.active_dialog().is_some() {
                        handle_dialog_key(&mut app, key);
                    } else if app.prompt.is_some() {
                        handle_prompt_key(&mut app, key);
                    } else {
                        handle_map_key(&mut app, key);
                    }
                }
                Event::Mouse(mouse) if app.active_dialog().is_none() => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("shutting down");
    Ok(())
}
