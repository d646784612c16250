mod geometry;
mod projection;
mod renderer;

pub use projection::{level_for_zoom_factor, zoom_factor_for_level, Viewport};
pub use renderer::{LineString, Lod, MapLayers, MapRenderer, Marker, MarkerKind};
