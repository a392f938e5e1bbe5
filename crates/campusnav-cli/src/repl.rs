//! Line commands understood by `campusnav navigate`.

use std::time::Duration;

use campusnav_lib::{Coordinates, TravelMode};

pub const HELP: &str = "\
Commands:
  from <place>        set the start location (empty or 'my location' uses the live position)
  to <place>          set the end location
  mode [walking|wheelchair]
                      set or toggle the travel mode
  fix <lon> <lat>     report a live position fix
  select <n>          choose route n
  preview <n>         highlight route n on the map
  unpreview           remove the highlight
  bookmark <n>        bookmark or un-bookmark route n
  bookmarks           list bookmarked routes
  go                  start navigating the selected route
  next | prev         move through the directions
  steps               switch between all steps and one step at a time
  layer               switch between standard and satellite maps
  cancel              stop and clear everything
  arrive              finish the active route
  wait <ms>           let pending work run
  status              show the current state
  help                show this list
  quit                exit
";

/// A parsed line of input. Route numbers are 1-based as shown in the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    From(String),
    To(String),
    Mode(Option<TravelMode>),
    Fix(Coordinates),
    Select(usize),
    Preview(usize),
    Unpreview,
    Bookmark(usize),
    Bookmarks,
    Go,
    Next,
    Prev,
    Steps,
    Layer,
    Cancel,
    Arrive,
    Wait(Duration),
    Status,
    Help,
    Quit,
}

impl ReplCommand {
    /// Parse one line. Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "from" => ReplCommand::From(rest.to_string()),
            "to" => ReplCommand::To(rest.to_string()),
            "mode" if rest.is_empty() => ReplCommand::Mode(None),
            "mode" => ReplCommand::Mode(Some(rest.parse()?)),
            "fix" => ReplCommand::Fix(parse_fix(rest)?),
            "select" => ReplCommand::Select(parse_rank(rest)?),
            "preview" => ReplCommand::Preview(parse_rank(rest)?),
            "unpreview" => ReplCommand::Unpreview,
            "bookmark" => ReplCommand::Bookmark(parse_rank(rest)?),
            "bookmarks" => ReplCommand::Bookmarks,
            "go" | "start" => ReplCommand::Go,
            "next" => ReplCommand::Next,
            "prev" | "previous" => ReplCommand::Prev,
            "steps" => ReplCommand::Steps,
            "layer" => ReplCommand::Layer,
            "cancel" => ReplCommand::Cancel,
            "arrive" => ReplCommand::Arrive,
            "wait" => ReplCommand::Wait(Duration::from_millis(
                rest.parse()
                    .map_err(|_| format!("'{rest}' is not a number of milliseconds"))?,
            )),
            "status" => ReplCommand::Status,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            other => {
                return Err(format!(
                    "Unknown command '{other}'. Type 'help' for a list of commands."
                ))
            }
        };
        Ok(Some(command))
    }
}

fn parse_rank(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(rank) if rank >= 1 => Ok(rank - 1),
        _ => Err(format!("'{text}' is not a route number")),
    }
}

fn parse_fix(text: &str) -> Result<Coordinates, String> {
    let mut parts = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    let lon = parts.next().and_then(|v| v.parse().ok());
    let lat = parts.next().and_then(|v| v.parse().ok());
    match (lon, lat, parts.next()) {
        (Some(lon), Some(lat), None) => Ok(Coordinates::new(lon, lat)),
        _ => Err(format!("'{text}' is not a 'lon lat' pair")),
    }
}
