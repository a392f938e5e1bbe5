//! Navigate command handler: an interactive session over stdin.
//!
//! Each input line becomes a controller [`Command`]; notices raised by the
//! controller are printed after every line. The binary runs on a
//! current-thread runtime, so yielding once after a send lets the controller
//! apply the command before its effects are printed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use campusnav_cli::output::{
    render_bookmarks, render_directions, render_panel, render_scene, render_status,
};
use campusnav_cli::repl::{ReplCommand, HELP};
use campusnav_cli::terminal::ColorPalette;
use campusnav_cli::text_map::TextMap;
use campusnav_lib::{
    start_tracking, BaseLayer, BookmarkToggle, Command, ControllerHandle, NavigationController,
    Navigator, NavigatorConfig, Notice, ReplayPositionSource, TravelMode,
};

use crate::commands::{build_provider, load_catalog};

#[derive(Debug, Clone)]
pub struct NavigateArgs {
    pub offline: Option<PathBuf>,
    pub fixes: Option<PathBuf>,
    pub fix_interval: Duration,
    pub mode: TravelMode,
}

pub async fn handle_navigate(config: &NavigatorConfig, args: &NavigateArgs) -> Result<()> {
    let catalog = Arc::new(load_catalog(config)?);
    let provider = build_provider(config, args.offline.as_deref())?;
    let map = TextMap::mount("terminal").context("failed to mount the map view")?;

    let mut navigator = Navigator::new(catalog, map, config);
    navigator.set_mode(args.mode);

    let mut controller = NavigationController::new(navigator, provider, config.debounce());
    if let Some(path) = &args.fixes {
        let source = ReplayPositionSource::from_path(path, args.fix_interval)
            .with_context(|| format!("failed to read position fixes from {}", path.display()))?;
        let (stream, tracking) = start_tracking(source, config.position_options());
        controller = controller.with_position(stream, tracking);
    }

    let mut session = Session {
        handle: controller.spawn(),
        palette: ColorPalette::detect(),
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        match ReplCommand::parse(&line) {
            Ok(None) => {}
            Ok(Some(ReplCommand::Quit)) => break,
            Ok(Some(command)) => session.run(command).await?,
            Err(message) => println!("! {message}"),
        }
        session.report_notices();
    }

    let navigator = session
        .handle
        .shutdown()
        .await
        .context("navigation controller stopped unexpectedly")?;
    print!("{}", render_scene(navigator.map().scene()));
    Ok(())
}

struct Session {
    handle: ControllerHandle<TextMap>,
    palette: ColorPalette,
}

impl Session {
    async fn send(&self, command: Command) -> Result<()> {
        self.handle.send(command)?;
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn run(&mut self, command: ReplCommand) -> Result<()> {
        match command {
            ReplCommand::From(text) => self.send(Command::SetOrigin(text)).await?,
            ReplCommand::To(text) => self.send(Command::SetDestination(text)).await?,
            ReplCommand::Mode(None) => {
                self.send(Command::ToggleMode).await?;
                println!("Mode: {}", self.handle.snapshot().inputs.mode);
            }
            ReplCommand::Mode(Some(mode)) => {
                self.send(Command::SetMode(mode)).await?;
                println!("Mode: {mode}");
            }
            ReplCommand::Fix(fix) => self.send(Command::PositionFix(fix)).await?,
            ReplCommand::Select(id) => self.send(Command::Select(id)).await?,
            ReplCommand::Preview(id) => self.send(Command::Preview(id)).await?,
            ReplCommand::Unpreview => self.send(Command::ClearPreview).await?,
            ReplCommand::Bookmark(id) => self.send(Command::ToggleBookmark(id)).await?,
            ReplCommand::Bookmarks => print!("{}", render_bookmarks(&self.handle.snapshot())),
            ReplCommand::Go => self.send(Command::Confirm).await?,
            ReplCommand::Next => {
                self.send(Command::NextStep).await?;
                self.print_directions();
            }
            ReplCommand::Prev => {
                self.send(Command::PreviousStep).await?;
                self.print_directions();
            }
            ReplCommand::Steps => {
                self.send(Command::ToggleStepView).await?;
                self.print_directions();
            }
            ReplCommand::Layer => {
                self.send(Command::ToggleBaseLayer).await?;
                let layer = match self.handle.snapshot().base_layer {
                    BaseLayer::Standard => "standard",
                    BaseLayer::Satellite => "satellite",
                };
                println!("Base layer: {layer}");
            }
            ReplCommand::Cancel => {
                self.send(Command::Cancel).await?;
                println!("Navigation cancelled.");
            }
            ReplCommand::Arrive => self.send(Command::Arrive).await?,
            ReplCommand::Wait(duration) => tokio::time::sleep(duration).await,
            ReplCommand::Status => {
                let snapshot = self.handle.snapshot();
                print!("{}", render_status(&snapshot));
                print!("{}", render_panel(&snapshot, &self.palette));
            }
            ReplCommand::Help => print!("{HELP}"),
            ReplCommand::Quit => {}
        }
        Ok(())
    }

    fn print_directions(&self) {
        let snapshot = self.handle.snapshot();
        if snapshot.session.is_active {
            print!(
                "{}",
                render_directions(&snapshot.session, snapshot.step_view, &self.palette)
            );
        }
    }

    fn report_notices(&mut self) {
        while let Some(notice) = self.handle.try_notice() {
            match notice {
                Notice::RoutesReady { count } => {
                    let plural = if count == 1 { "" } else { "s" };
                    println!("Found {count} route{plural}.");
                    print!("{}", render_panel(&self.handle.snapshot(), &self.palette));
                }
                Notice::Rejected { message, .. } => {
                    println!("{}! {message}{}", self.palette.red, self.palette.reset)
                }
                Notice::RouteUnavailable { message } => println!(
                    "{}! Unable to calculate a route: {message}{}",
                    self.palette.red, self.palette.reset
                ),
                Notice::NavigationStarted { route } => {
                    let snapshot = self.handle.snapshot();
                    println!(
                        "Navigating Route {} to {}:",
                        route + 1,
                        snapshot.session.destination_label
                    );
                    print!(
                        "{}",
                        render_directions(&snapshot.session, snapshot.step_view, &self.palette)
                    );
                }
                Notice::Arrived { message, .. } => println!("{message}"),
                Notice::Bookmark {
                    toggle: BookmarkToggle::Added(_),
                } => println!("Route bookmarked."),
                Notice::Bookmark {
                    toggle: BookmarkToggle::Removed(_),
                } => println!("Bookmark removed."),
            }
        }
    }
}
