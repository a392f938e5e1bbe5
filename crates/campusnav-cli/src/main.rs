use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use campusnav_cli::logging::{init_logging, LogFormat};
use campusnav_cli::output::OutputFormat;
use campusnav_lib::TravelMode;

mod commands;

#[derive(Parser, Debug)]
#[command(author, version, about = "Accessible campus route planner")]
struct Cli {
    /// Replace the built-in campus locations with a JSON catalog file.
    #[arg(long, global = true)]
    locations: Option<PathBuf>,

    /// Log output format (logs are written to stderr).
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List campus locations, or resolve one place name.
    Locations {
        /// Place name to resolve.
        query: Option<String>,
    },
    /// Request route alternatives between two campus locations.
    Route {
        /// Starting location.
        #[arg(long = "from")]
        from: String,
        /// Destination location.
        #[arg(long = "to")]
        to: String,
        /// Travel mode: walking or wheelchair.
        #[arg(long, default_value_t = TravelMode::Walking)]
        mode: TravelMode,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Answer from a saved directions response instead of the network.
        #[arg(long, value_name = "FILE")]
        offline: Option<PathBuf>,
    },
    /// Interactive navigation session driven by commands on stdin.
    Navigate {
        /// Answer from a saved directions response instead of the network.
        #[arg(long, value_name = "FILE")]
        offline: Option<PathBuf>,
        /// Replay live position fixes from a file of `lon,lat` lines.
        #[arg(long, value_name = "FILE")]
        fixes: Option<PathBuf>,
        /// Interval between replayed fixes, in milliseconds.
        #[arg(long, default_value_t = 1000)]
        fix_interval_ms: u64,
        /// Initial travel mode.
        #[arg(long, default_value_t = TravelMode::Walking)]
        mode: TravelMode,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let config = commands::load_config(cli.locations.as_deref())?;

    match cli.command {
        Command::Locations { query } => commands::locations::handle_locations(&config, query.as_deref()),
        Command::Route {
            from,
            to,
            mode,
            format,
            offline,
        } => {
            let args = commands::route::RouteArgs {
                from,
                to,
                mode,
                format,
                offline,
            };
            commands::route::handle_route(&config, &args).await
        }
        Command::Navigate {
            offline,
            fixes,
            fix_interval_ms,
            mode,
        } => {
            let args = commands::navigate::NavigateArgs {
                offline,
                fixes,
                fix_interval: std::time::Duration::from_millis(fix_interval_ms),
                mode,
            };
            commands::navigate::handle_navigate(&config, &args).await
        }
    }
}
