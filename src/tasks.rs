//! Background work. Each task runs once on its own thread and reports a
//! single [`TaskOutcome`] back to the UI thread over a channel.

use crate::config::Config;
use crate::geocode::{GeocodeError, GeocodeHit, Geocoder};
use crate::location::{
    FixedLocation, IpLocator, Location, LocationError, LocationProvider,
};
use crate::weather::{WeatherClient, WeatherError, WeatherSnapshot};
use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

/// Why a position was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatePurpose {
    /// Initial fix: center the map and fetch weather
    Startup,
    /// Place a flood report marker
    Report,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Locate(LocatePurpose),
    Weather(Location),
    Geocode(String),
}

#[derive(Debug)]
pub enum TaskOutcome {
    Located {
        purpose: LocatePurpose,
        result: Result<Location, LocationError>,
    },
    Weather {
        at: Location,
        result: Result<WeatherSnapshot, WeatherError>,
    },
    Geocoded {
        query: String,
        result: Result<Option<GeocodeHit>, GeocodeError>,
    },
}

/// External collaborators the tasks talk to
pub struct Services {
    pub locator: Box<dyn LocationProvider>,
    pub weather: WeatherClient,
    pub geocoder: Geocoder,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;

        let locator: Box<dyn LocationProvider> = match config.fixed_location() {
            Some(fixed) => Box::new(FixedLocation(fixed.context("invalid --lat/--lon")?)),
            None => Box::new(IpLocator::new(http.clone(), config.ip_locate_url.clone())),
        };

        Ok(Self {
            locator,
            weather: WeatherClient::new(
                http.clone(),
                config.weather_url.clone(),
                config.api_key.clone(),
                config.units,
            ),
            geocoder: Geocoder::new(http, config.geocode_url.clone()),
        })
    }

    /// Run a task to completion on the calling thread
    pub fn run(&self, task: Task) -> TaskOutcome {
        match task {
            Task::Locate(purpose) => TaskOutcome::Located {
                purpose,
                result: self.locator.current_position(),
            },
            Task::Weather(at) => TaskOutcome::Weather {
                at,
                result: self.weather.fetch_current(at),
            },
            Task::Geocode(query) => {
                let result = self.geocoder.search(&query);
                TaskOutcome::Geocoded { query, result }
            }
        }
    }
}

pub struct Worker {
    services: Arc<Services>,
    tx: Sender<TaskOutcome>,
    rx: Receiver<TaskOutcome>,
}

impl Worker {
    pub fn new(services: Services) -> Self {
        let (tx, rx) = unbounded();
        Self {
            services: Arc::new(services),
            tx,
            rx,
        }
    }

    /// Start `task` on a fresh thread
    pub fn submit(&self, task: Task) {
        debug!(?task, "submitting task");
        let services = Arc::clone(&self.services);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("flood-watch-task".to_string())
            .spawn(move || {
                // The receiver only goes away on shutdown
                let _ = tx.send(services.run(task));
            });
        if let Err(e) = spawned {
            error!("failed to spawn task thread: {e}");
        }
    }

    /// Outcomes that have arrived since the last call, without blocking
    pub fn drain(&self) -> impl Iterator<Item = TaskOutcome> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::{Units, DEFAULT_WEATHER_URL};
    use std::time::Duration;

    fn offline_services(at: Location) -> Services {
        let http = reqwest::blocking::Client::new();
        Services {
            locator: Box::new(FixedLocation(at)),
            weather: WeatherClient::new(http.clone(), DEFAULT_WEATHER_URL, None, Units::Metric),
            geocoder: Geocoder::new(http, "http://127.0.0.1:9/search"),
        }
    }

    #[test]
    fn test_run_locate() {
        let here = Location { lat: 20.5, lon: 78.9 };
        match offline_services(here).run(Task::Locate(LocatePurpose::Report)) {
            TaskOutcome::Located { purpose, result } => {
                assert_eq!(purpose, LocatePurpose::Report);
                assert_eq!(result.unwrap(), here);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_worker_delivers_outcome() {
        let here = Location { lat: 20.5, lon: 78.9 };
        let worker = Worker::new(offline_services(here));
        worker.submit(Task::Weather(here));

        let outcome = worker.rx.recv_timeout(Duration::from_secs(5)).unwrap();
        match outcome {
            TaskOutcome::Weather { at, result } => {
                assert_eq!(at, here);
                assert!(matches!(result, Err(WeatherError::MissingApiKey)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(worker.drain().count(), 0);
    }
}
