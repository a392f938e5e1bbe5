// Handlers for CLI subcommands. main.rs parses arguments and dispatches here.

pub mod locations;
pub mod navigate;
pub mod route;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use campusnav_lib::{
    FixtureRouteProvider, LocationCatalog, NavigatorConfig, OrsDirectionsClient, RouteProvider,
};

/// Environment configuration, with `--locations` taking precedence over `CAMPUSNAV_LOCATIONS`.
pub fn load_config(locations: Option<&Path>) -> Result<NavigatorConfig> {
    let config = NavigatorConfig::from_env().context("invalid CAMPUSNAV_* environment")?;
    Ok(match locations {
        Some(path) => config.with_locations_path(path),
        None => config,
    })
}

pub fn load_catalog(config: &NavigatorConfig) -> Result<LocationCatalog> {
    config.load_catalog().with_context(|| match &config.locations_path {
        Some(path) => format!("failed to load campus locations from {}", path.display()),
        None => "failed to load the built-in campus locations".to_string(),
    })
}

/// Saved-response provider for `--offline`, otherwise the live directions service.
pub fn build_provider(
    config: &NavigatorConfig,
    offline: Option<&Path>,
) -> Result<Arc<dyn RouteProvider>> {
    match offline {
        Some(path) => {
            let provider = FixtureRouteProvider::from_path(path).with_context(|| {
                format!("failed to read directions response from {}", path.display())
            })?;
            Ok(Arc::new(provider))
        }
        None => {
            let client = OrsDirectionsClient::new(config).context(
                "the directions service needs CAMPUSNAV_ORS_API_KEY; use --offline FILE to run without it",
            )?;
            Ok(Arc::new(client))
        }
    }
}
