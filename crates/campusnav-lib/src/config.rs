//! Runtime configuration for the navigator and the directions gateway.
//!
//! # Environment Variables
//!
//! - `CAMPUSNAV_ORS_API_KEY`: directions provider API key
//! - `CAMPUSNAV_DIRECTIONS_URL`: provider base URL (default `https://api.openrouteservice.org`)
//! - `CAMPUSNAV_DEBOUNCE_MS`: quiescence window before a route query fires (default 500)
//! - `CAMPUSNAV_REQUEST_TIMEOUT_SECS`: HTTP timeout for directions requests (default 10)
//! - `CAMPUSNAV_LOCATIONS`: JSON file replacing the embedded location catalog

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::location::{Coordinates, LocationCatalog};
use crate::map::FitOptions;
use crate::position::PositionOptions;

pub const API_KEY_ENV: &str = "CAMPUSNAV_ORS_API_KEY";
pub const DIRECTIONS_URL_ENV: &str = "CAMPUSNAV_DIRECTIONS_URL";
pub const DEBOUNCE_ENV: &str = "CAMPUSNAV_DEBOUNCE_MS";
pub const REQUEST_TIMEOUT_ENV: &str = "CAMPUSNAV_REQUEST_TIMEOUT_SECS";
pub const LOCATIONS_ENV: &str = "CAMPUSNAV_LOCATIONS";

const DEFAULT_DIRECTIONS_URL: &str = "https://api.openrouteservice.org";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub api_key: Option<String>,
    pub directions_base_url: String,
    pub debounce_ms: u64,
    /// Number of alternatives requested from the provider.
    pub alternative_count: u8,
    /// Maximum share of path two alternatives may have in common.
    pub share_factor: f64,
    pub request_timeout_secs: u64,
    pub fit_padding: u32,
    pub fit_max_zoom: f64,
    pub fit_duration_ms: u64,
    pub initial_center: Coordinates,
    pub initial_zoom: f64,
    pub max_zoom: f64,
    pub position_timeout_ms: u64,
    /// Catalog file; the embedded campus dataset is used when unset.
    pub locations_path: Option<PathBuf>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            directions_base_url: DEFAULT_DIRECTIONS_URL.to_string(),
            debounce_ms: 500,
            alternative_count: 3,
            share_factor: 0.6,
            request_timeout_secs: 10,
            fit_padding: 50,
            fit_max_zoom: 18.0,
            fit_duration_ms: 1000,
            initial_center: Coordinates::new(-84.5831, 34.0390),
            initial_zoom: 17.0,
            max_zoom: 19.0,
            position_timeout_ms: 5000,
            locations_path: None,
        }
    }
}

impl NavigatorConfig {
    /// Defaults overlaid with any `CAMPUSNAV_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup for tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_key = Some(key);
        }
        if let Some(url) = lookup(DIRECTIONS_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.directions_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(value) = lookup(DEBOUNCE_ENV) {
            config.debounce_ms = parse_number(DEBOUNCE_ENV, &value)?;
        }
        if let Some(value) = lookup(REQUEST_TIMEOUT_ENV) {
            config.request_timeout_secs = parse_number(REQUEST_TIMEOUT_ENV, &value)?;
            if config.request_timeout_secs == 0 {
                return Err(Error::InvalidConfig {
                    key: REQUEST_TIMEOUT_ENV.to_string(),
                    message: "timeout must be at least one second".to_string(),
                });
            }
        }

        if let Some(path) = lookup(LOCATIONS_ENV).filter(|v| !v.trim().is_empty()) {
            config.locations_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_locations_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.locations_path = Some(path.into());
        self
    }

    /// Load the configured location catalog.
    pub fn load_catalog(&self) -> Result<LocationCatalog> {
        match &self.locations_path {
            Some(path) => LocationCatalog::from_path(path),
            None => LocationCatalog::embedded(),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Zoom for the initial campus view, never beyond `max_zoom`.
    pub fn initial_zoom(&self) -> f64 {
        self.initial_zoom.min(self.max_zoom)
    }

    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            padding: [self.fit_padding; 4],
            max_zoom: self.fit_max_zoom.min(self.max_zoom),
            duration: Duration::from_millis(self.fit_duration_ms),
        }
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_millis(self.position_timeout_ms),
            ..PositionOptions::default()
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| Error::InvalidConfig {
        key: key.to_string(),
        message: format!("expected a non-negative integer, got '{value}'"),
    })
}
