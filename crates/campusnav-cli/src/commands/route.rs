//! Route command handler: one request, printed as a panel or JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};

use campusnav_cli::output::{render_candidates, render_steps, OutputFormat, PanelMarks};
use campusnav_cli::terminal::ColorPalette;
use campusnav_lib::{NavigatorConfig, RouteQuery, TravelMode};

use crate::commands::{build_provider, load_catalog};

#[derive(Debug, Clone)]
pub struct RouteArgs {
    pub from: String,
    pub to: String,
    pub mode: TravelMode,
    pub format: OutputFormat,
    pub offline: Option<PathBuf>,
}

pub async fn handle_route(config: &NavigatorConfig, args: &RouteArgs) -> Result<()> {
    let catalog = load_catalog(config)?;
    let origin = catalog.require(&args.from)?;
    let destination = catalog.require(&args.to)?;

    let query = RouteQuery {
        origin: origin.coordinates,
        destination: destination.coordinates,
        mode: args.mode,
        origin_label: origin.name.clone(),
        destination_label: destination.name.clone(),
    };

    let provider = build_provider(config, args.offline.as_deref())?;
    let candidates = provider
        .request_routes(&query)
        .await
        .with_context(|| format!("unable to calculate a route to {}", query.destination_label))?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&candidates)?);
        }
        OutputFormat::Text => {
            let palette = ColorPalette::detect();
            print!(
                "{}",
                render_candidates(
                    &candidates,
                    PanelMarks {
                        selected: Some(0),
                        preview: None
                    },
                    |_| false,
                    &palette
                )
            );
            for candidate in &candidates {
                println!("\n{} directions:", candidate.summary);
                print!("{}", render_steps(&candidate.steps, None, &palette));
            }
        }
    }
    Ok(())
}
