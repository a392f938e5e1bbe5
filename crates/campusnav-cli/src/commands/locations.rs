//! Locations command handler for listing and resolving campus places.

use anyhow::Result;

use campusnav_lib::NavigatorConfig;

use crate::commands::load_catalog;

/// List every location, or resolve `query` to a single one.
///
/// An unresolved name fails with "did you mean" suggestions.
pub fn handle_locations(config: &NavigatorConfig, query: Option<&str>) -> Result<()> {
    let catalog = load_catalog(config)?;

    match query {
        Some(query) => {
            let location = catalog.require(query)?;
            println!("{} {}", location.name, location.coordinates);
        }
        None => {
            for location in catalog.iter() {
                println!("{} {}", location.name, location.coordinates);
            }
        }
    }
    Ok(())
}
