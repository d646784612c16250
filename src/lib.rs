//! Terminal flood-risk map: a braille basemap with simulated risk zones,
//! current weather for the user's position and a threshold-based flood alert.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod geocode;
pub mod location;
pub mod logging;
pub mod map;
pub mod risk;
pub mod tasks;
pub mod ui;
pub mod weather;
pub mod zones;
